//! Day-count conventions and year fractions.
//!
//! Fractions are measured between calendar dates, so the time of day on a
//! timestamp never changes an accrual. A period whose end is not after its
//! start accrues nothing.

use crate::calendar::{is_last_day_of_month, to_date};
use crate::error::ActusError;
use crate::fixed::Real;
use crate::types::Timestamp;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCountConvention {
    #[serde(rename = "A/AISDA")]
    ActualActualIsda,
    #[default]
    #[serde(rename = "A/360")]
    Actual360,
    #[serde(rename = "A/365")]
    Actual365,
    #[serde(rename = "30E/360ISDA")]
    ThirtyE360Isda,
    #[serde(rename = "30E/360")]
    ThirtyE360,
}

/// Year fraction from `start` to `end`.
///
/// `maturity` only matters for 30E/360 ISDA, where a period ending on a
/// February maturity keeps its actual end day.
pub fn year_fraction(
    start: Timestamp,
    end: Timestamp,
    convention: DayCountConvention,
    maturity: Option<Timestamp>,
) -> Result<Real, ActusError> {
    if end <= start {
        return Ok(Real::ZERO);
    }
    let s = to_date(start)?;
    let e = to_date(end)?;
    if e <= s {
        return Ok(Real::ZERO);
    }
    let fraction = match convention {
        DayCountConvention::Actual360 => Real::from_ratio(actual_days(s, e), 360)?,
        DayCountConvention::Actual365 => Real::from_ratio(actual_days(s, e), 365)?,
        DayCountConvention::ActualActualIsda => actual_actual_isda(s, e)?,
        DayCountConvention::ThirtyE360 => {
            let d1 = s.day().min(30);
            let d2 = e.day().min(30);
            Real::from_ratio(thirty_360_days(s, d1, e, d2), 360)?
        }
        DayCountConvention::ThirtyE360Isda => {
            let maturity_date = maturity.map(to_date).transpose()?;
            let d1 = if is_last_day_of_month(s) { 30 } else { s.day() };
            let february_maturity = e.month() == 2 && maturity_date == Some(e);
            let d2 = if is_last_day_of_month(e) && !february_maturity {
                30
            } else {
                e.day()
            };
            Real::from_ratio(thirty_360_days(s, d1, e, d2), 360)?
        }
    };
    Ok(fraction)
}

fn actual_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

fn thirty_360_days(start: NaiveDate, d1: u32, end: NaiveDate, d2: u32) -> i64 {
    let years = i64::from(end.year()) - i64::from(start.year());
    let months = i64::from(end.month()) - i64::from(start.month());
    360 * years + 30 * months + i64::from(d2) - i64::from(d1)
}

fn days_in_year(date: NaiveDate) -> i64 {
    if date.leap_year() {
        366
    } else {
        365
    }
}

// each calendar year's share is divided by that year's own length
fn actual_actual_isda(start: NaiveDate, end: NaiveDate) -> Result<Real, ActusError> {
    if start.year() == end.year() {
        return Ok(Real::from_ratio(actual_days(start, end), days_in_year(start))?);
    }
    let out_of_range = || ActusError::invalid_terms("day_count_convention", "date outside supported range");
    let next_year = NaiveDate::from_ymd_opt(start.year() + 1, 1, 1).ok_or_else(out_of_range)?;
    let end_year = NaiveDate::from_ymd_opt(end.year(), 1, 1).ok_or_else(out_of_range)?;

    let head = Real::from_ratio(actual_days(start, next_year), days_in_year(start))?;
    let whole_years = Real::from_int(i64::from(end.year() - start.year() - 1));
    let tail = Real::from_ratio(actual_days(end_year, end), days_in_year(end))?;
    Ok(head.add(whole_years)?.add(tail)?)
}
