// 1.0: all the primitives live here. contract type, role, status, event type, timestamps.
// each is a small enum or newtype so the compiler catches mixups between them.

use crate::fixed::Real;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "PAM")]
    PrincipalAtMaturity,
    #[serde(rename = "ANN")]
    Annuity,
    #[serde(rename = "CEG")]
    CreditEnhancementGuarantee,
    #[serde(rename = "CEC")]
    CreditEnhancementCollateral,
}

impl ContractType {
    pub fn code(&self) -> &'static str {
        match self {
            ContractType::PrincipalAtMaturity => "PAM",
            ContractType::Annuity => "ANN",
            ContractType::CreditEnhancementGuarantee => "CEG",
            ContractType::CreditEnhancementCollateral => "CEC",
        }
    }

    pub fn is_credit_enhancement(&self) -> bool {
        matches!(
            self,
            ContractType::CreditEnhancementGuarantee | ContractType::CreditEnhancementCollateral
        )
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// 1.1: role of the record creator. the sign decides cash flow direction:
// positive payoff = inflow for whoever holds this role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractRole {
    #[serde(rename = "RPA")]
    RealPositionAsset,
    #[serde(rename = "RPL")]
    RealPositionLiability,
    #[serde(rename = "BUY")]
    Buyer,
    #[serde(rename = "SEL")]
    Seller,
}

impl ContractRole {
    pub fn sign(&self) -> Real {
        match self {
            ContractRole::RealPositionAsset | ContractRole::Buyer => Real::ONE,
            ContractRole::RealPositionLiability | ContractRole::Seller => Real::NEG_ONE,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            ContractRole::RealPositionAsset => ContractRole::RealPositionLiability,
            ContractRole::RealPositionLiability => ContractRole::RealPositionAsset,
            ContractRole::Buyer => ContractRole::Seller,
            ContractRole::Seller => ContractRole::Buyer,
        }
    }
}

// 1.2: performance status. Terminated and Defaulted are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    #[serde(rename = "PF")]
    Performant,
    #[serde(rename = "DL")]
    Delinquent,
    #[serde(rename = "DF")]
    Defaulted,
    #[serde(rename = "TD")]
    Terminated,
}

impl ContractStatus {
    pub fn is_absorbing(&self) -> bool {
        matches!(self, ContractStatus::Defaulted | ContractStatus::Terminated)
    }

    /// How far a contract has fallen behind. Terminated is not a credit state.
    pub fn severity(&self) -> u8 {
        match self {
            ContractStatus::Performant | ContractStatus::Terminated => 0,
            ContractStatus::Delinquent => 1,
            ContractStatus::Defaulted => 2,
        }
    }

    // true when this observed status satisfies a credit-event trigger
    pub fn triggers(&self, covered: ContractStatus) -> bool {
        covered.severity() > 0 && self.severity() >= covered.severity()
    }

    pub fn code(&self) -> u8 {
        match self {
            ContractStatus::Performant => 0,
            ContractStatus::Delinquent => 1,
            ContractStatus::Defaulted => 2,
            ContractStatus::Terminated => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ContractStatus::Performant),
            1 => Some(ContractStatus::Delinquent),
            2 => Some(ContractStatus::Defaulted),
            3 => Some(ContractStatus::Terminated),
            _ => None,
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContractStatus::Performant => "PF",
            ContractStatus::Delinquent => "DL",
            ContractStatus::Defaulted => "DF",
            ContractStatus::Terminated => "TD",
        };
        f.write_str(s)
    }
}

// 1.3: lifecycle event types, serialized as their ACTUS codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "IED")]
    InitialExchange,
    #[serde(rename = "FP")]
    FeePayment,
    #[serde(rename = "PR")]
    PrincipalRedemption,
    #[serde(rename = "PRD")]
    Purchase,
    #[serde(rename = "IP")]
    InterestPayment,
    #[serde(rename = "IPCI")]
    InterestCapitalization,
    #[serde(rename = "CE")]
    CreditEvent,
    #[serde(rename = "RRF")]
    RateResetFixed,
    #[serde(rename = "RR")]
    RateReset,
    #[serde(rename = "TD")]
    Termination,
    #[serde(rename = "MD")]
    Maturity,
    #[serde(rename = "XD")]
    Exercise,
    #[serde(rename = "STD")]
    Settlement,
}

impl EventType {
    pub fn code(&self) -> &'static str {
        match self {
            EventType::InitialExchange => "IED",
            EventType::FeePayment => "FP",
            EventType::PrincipalRedemption => "PR",
            EventType::Purchase => "PRD",
            EventType::InterestPayment => "IP",
            EventType::InterestCapitalization => "IPCI",
            EventType::CreditEvent => "CE",
            EventType::RateResetFixed => "RRF",
            EventType::RateReset => "RR",
            EventType::Termination => "TD",
            EventType::Maturity => "MD",
            EventType::Exercise => "XD",
            EventType::Settlement => "STD",
        }
    }

    /// Periodic payments whose settlement can be observed as paid or missed.
    pub fn is_periodic_payment(&self) -> bool {
        matches!(
            self,
            EventType::InterestPayment | EventType::PrincipalRedemption | EventType::FeePayment
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// 1.4: unix timestamp in seconds. all dates in terms, state and events use this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Midnight UTC of the given calendar day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Self::from_datetime)
    }

    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self(dt.and_utc().timestamp())
    }

    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(self.0, 0).map(|dt| dt.naive_utc())
    }

    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0.saturating_add(days.saturating_mul(SECONDS_PER_DAY)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) if dt.num_seconds_from_midnight() == 0 => write!(f, "{}", dt.date()),
            Some(dt) => write!(f, "{}", dt),
            None => write!(f, "@{}", self.0),
        }
    }
}
