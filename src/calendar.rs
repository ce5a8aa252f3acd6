//! Date arithmetic on unix timestamps.
//!
//! Cycle dates are always computed as `anchor + i * cycle` from the anchor so
//! short months never drift the day of month. Business-day shifting is applied
//! last, after all date arithmetic.

use crate::cycle::{Cycle, Period};
use crate::error::ActusError;
use crate::types::{Timestamp, SECONDS_PER_DAY};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Calendar {
    #[default]
    #[serde(rename = "NC")]
    NoCalendar,
    #[serde(rename = "MF")]
    MondayToFriday,
}

impl Calendar {
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        match self {
            Calendar::NoCalendar => true,
            Calendar::MondayToFriday => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        }
    }
}

/// ACTUS business-day conventions.
///
/// `SC*` shifts the payment date and calculates accruals on the shifted date,
/// `CS*` calculates on the unshifted date and only shifts the payment.
/// `F` following, `MF` modified following, `P` preceding, `MP` modified
/// preceding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessDayConvention {
    #[default]
    #[serde(rename = "NOS")]
    NoShift,
    #[serde(rename = "SCF")]
    ShiftCalculateFollowing,
    #[serde(rename = "SCMF")]
    ShiftCalculateModifiedFollowing,
    #[serde(rename = "CSF")]
    CalculateShiftFollowing,
    #[serde(rename = "CSMF")]
    CalculateShiftModifiedFollowing,
    #[serde(rename = "SCP")]
    ShiftCalculatePreceding,
    #[serde(rename = "SCMP")]
    ShiftCalculateModifiedPreceding,
    #[serde(rename = "CSP")]
    CalculateShiftPreceding,
    #[serde(rename = "CSMP")]
    CalculateShiftModifiedPreceding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftRule {
    Following,
    ModifiedFollowing,
    Preceding,
    ModifiedPreceding,
}

impl BusinessDayConvention {
    fn rule(&self) -> Option<ShiftRule> {
        use BusinessDayConvention::*;
        match self {
            NoShift => None,
            ShiftCalculateFollowing | CalculateShiftFollowing => Some(ShiftRule::Following),
            ShiftCalculateModifiedFollowing | CalculateShiftModifiedFollowing => {
                Some(ShiftRule::ModifiedFollowing)
            }
            ShiftCalculatePreceding | CalculateShiftPreceding => Some(ShiftRule::Preceding),
            ShiftCalculateModifiedPreceding | CalculateShiftModifiedPreceding => {
                Some(ShiftRule::ModifiedPreceding)
            }
        }
    }

    /// True when accruals are calculated on the shifted date.
    pub fn shifts_calculation(&self) -> bool {
        use BusinessDayConvention::*;
        matches!(
            self,
            ShiftCalculateFollowing
                | ShiftCalculateModifiedFollowing
                | ShiftCalculatePreceding
                | ShiftCalculateModifiedPreceding
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndOfMonthConvention {
    #[default]
    #[serde(rename = "SD")]
    SameDay,
    #[serde(rename = "EOM")]
    EndOfMonth,
}

pub fn to_datetime(t: Timestamp) -> Result<NaiveDateTime, ActusError> {
    t.to_datetime().ok_or(ActusError::DateOutOfRange(t))
}

pub fn to_date(t: Timestamp) -> Result<NaiveDate, ActusError> {
    to_datetime(t).map(|dt| dt.date())
}

/// Last day of `month`, the day before the next month's first.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year.checked_add(1)?, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

/// Adds months, clamping the day to the target month's length.
/// With `end_of_month` the result is always the last day of its month.
fn add_months(date: NaiveDate, months: i64, end_of_month: bool, t: Timestamp) -> Result<NaiveDate, ActusError> {
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = i32::try_from(total.div_euclid(12)).map_err(|_| ActusError::DateOutOfRange(t))?;
    let month = total.rem_euclid(12) as u32 + 1;
    let last = last_day_of_month(year, month).ok_or(ActusError::DateOutOfRange(t))?.day();
    let day = if end_of_month { last } else { date.day().min(last) };
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ActusError::DateOutOfRange(t))
}

/// `anchor + index * cycle`, keeping the anchor's time of day.
///
/// End-of-month rolling applies only when the convention asks for it, the
/// cycle is month based and the anchor itself is a month end.
pub fn cycle_date(
    anchor: Timestamp,
    cycle: &Cycle,
    index: u32,
    eom: EndOfMonthConvention,
) -> Result<Timestamp, ActusError> {
    let dt = to_datetime(anchor)?;
    let date = dt.date();
    let out_of_range = ActusError::DateOutOfRange(anchor);
    let steps = i64::from(cycle.count)
        .checked_mul(i64::from(index))
        .ok_or(out_of_range.clone())?;
    let shifted = match cycle.period.months() {
        Some(months) => {
            let roll = eom == EndOfMonthConvention::EndOfMonth && is_last_day_of_month(date);
            let total = steps
                .checked_mul(i64::from(months))
                .ok_or(out_of_range.clone())?;
            add_months(date, total, roll, anchor)?
        }
        None => {
            let days = match cycle.period {
                Period::Week => steps.checked_mul(7).ok_or(out_of_range.clone())?,
                _ => steps,
            };
            Duration::try_days(days)
                .and_then(|d| date.checked_add_signed(d))
                .ok_or(out_of_range)?
        }
    };
    Ok(Timestamp::from_datetime(shifted.and_time(dt.time())))
}

/// Moves a timestamp onto a business day under the convention's rule.
pub fn shift_event_time(
    t: Timestamp,
    convention: BusinessDayConvention,
    calendar: Calendar,
) -> Result<Timestamp, ActusError> {
    let Some(rule) = convention.rule() else {
        return Ok(t);
    };
    let dt = to_datetime(t)?;
    let date = dt.date();
    if calendar.is_business_day(date) {
        return Ok(t);
    }
    let adjusted = match rule {
        ShiftRule::Following => roll(date, 1, calendar, t)?,
        ShiftRule::Preceding => roll(date, -1, calendar, t)?,
        ShiftRule::ModifiedFollowing => {
            let next = roll(date, 1, calendar, t)?;
            if next.month() == date.month() {
                next
            } else {
                roll(date, -1, calendar, t)?
            }
        }
        ShiftRule::ModifiedPreceding => {
            let prev = roll(date, -1, calendar, t)?;
            if prev.month() == date.month() {
                prev
            } else {
                roll(date, 1, calendar, t)?
            }
        }
    };
    let delta_days = (adjusted - date).num_days();
    Ok(Timestamp::from_secs(t.as_secs() + delta_days * SECONDS_PER_DAY))
}

/// The time accruals are measured to: shifted for SC conventions, raw for CS.
pub fn shift_calc_time(
    t: Timestamp,
    convention: BusinessDayConvention,
    calendar: Calendar,
) -> Result<Timestamp, ActusError> {
    if convention.shifts_calculation() {
        shift_event_time(t, convention, calendar)
    } else {
        Ok(t)
    }
}

fn roll(date: NaiveDate, step: i64, calendar: Calendar, t: Timestamp) -> Result<NaiveDate, ActusError> {
    let mut current = date;
    // a weekend calendar needs at most two steps
    for _ in 0..7 {
        current = Duration::try_days(step)
            .and_then(|d| current.checked_add_signed(d))
            .ok_or(ActusError::DateOutOfRange(t))?;
        if calendar.is_business_day(current) {
            break;
        }
    }
    Ok(current)
}
