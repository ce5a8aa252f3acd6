//! Cycle definitions such as `3M-` (every three months, short stub) or `1Y+`
//! (yearly, long stub).
//!
//! The count comes first, then the period letter (`D`, `W`, `M`, `Q`, `H`,
//! `Y`) and an optional stub marker. `-` keeps a short final period, `+`
//! folds it into the previous one. A missing marker means short stub.

use crate::error::ActusError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    Day,
    Week,
    Month,
    Quarter,
    HalfYear,
    Year,
}

impl Period {
    fn letter(&self) -> char {
        match self {
            Period::Day => 'D',
            Period::Week => 'W',
            Period::Month => 'M',
            Period::Quarter => 'Q',
            Period::HalfYear => 'H',
            Period::Year => 'Y',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c {
            'D' => Some(Period::Day),
            'W' => Some(Period::Week),
            'M' => Some(Period::Month),
            'Q' => Some(Period::Quarter),
            'H' => Some(Period::HalfYear),
            'Y' => Some(Period::Year),
            _ => None,
        }
    }

    /// Months in one period, None for day-based periods.
    pub fn months(&self) -> Option<u32> {
        match self {
            Period::Day | Period::Week => None,
            Period::Month => Some(1),
            Period::Quarter => Some(3),
            Period::HalfYear => Some(6),
            Period::Year => Some(12),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stub {
    #[default]
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cycle {
    pub count: u32,
    pub period: Period,
    pub stub: Stub,
}

impl Cycle {
    pub fn new(count: u32, period: Period, stub: Stub) -> Self {
        Self { count, period, stub }
    }

    pub fn months(count: u32) -> Self {
        Self::new(count, Period::Month, Stub::Short)
    }

    pub fn is_month_based(&self) -> bool {
        self.period.months().is_some()
    }

    /// Zero-length cycles would never advance.
    pub fn validate(&self, field: &'static str) -> Result<(), ActusError> {
        if self.count == 0 {
            return Err(ActusError::invalid_terms(field, "cycle count must be positive"));
        }
        Ok(())
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stub = match self.stub {
            Stub::Short => '-',
            Stub::Long => '+',
        };
        write!(f, "{}{}{}", self.count, self.period.letter(), stub)
    }
}

impl FromStr for Cycle {
    type Err = ActusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (body, stub) = match s.strip_suffix('+') {
            Some(rest) => (rest, Stub::Long),
            None => (s.strip_suffix('-').unwrap_or(s), Stub::Short),
        };
        let letter = body
            .chars()
            .last()
            .ok_or_else(|| ActusError::invalid_terms("cycle", "empty cycle"))?;
        let period = Period::from_letter(letter.to_ascii_uppercase())
            .ok_or_else(|| ActusError::invalid_terms("cycle", format!("unknown period in {s:?}")))?;
        let count = body[..body.len() - letter.len_utf8()]
            .parse::<u32>()
            .map_err(|_| ActusError::invalid_terms("cycle", format!("bad count in {s:?}")))?;
        let cycle = Cycle::new(count, period, stub);
        cycle.validate("cycle")?;
        Ok(cycle)
    }
}

impl TryFrom<String> for Cycle {
    type Error = ActusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cycle> for String {
    fn from(cycle: Cycle) -> Self {
        cycle.to_string()
    }
}
