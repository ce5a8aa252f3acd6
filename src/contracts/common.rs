// 9.1: accrual pieces shared by every contract type. R below is the role sign,
// Y the year fraction from the state's status date to the event's
// calculation time.

use crate::calendar::cycle_date;
use crate::calendar::EndOfMonthConvention;
use crate::day_count::year_fraction;
use crate::error::ActusError;
use crate::event::Event;
use crate::fixed::Real;
use crate::schedule::{anchor_or_next, cycle_dates, make_events};
use crate::state::State;
use crate::terms::{FeeBasis, Terms};
use crate::types::{EventType, Timestamp};

pub fn role_amount(terms: &Terms, amount: Real) -> Result<Real, ActusError> {
    Ok(terms.role_sign().mul(amount)?)
}

pub fn year_fraction_to(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    year_fraction(
        state.status_date,
        event.calc_time,
        terms.conventions.day_count_convention,
        terms.dates.maturity_date,
    )
}

/// Ipac + Y * Ipnr * Nt
pub fn interest_due(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    let y = year_fraction_to(terms, state, event)?;
    let accrual = y.mul(state.nominal_interest_rate)?.mul(state.notional_principal)?;
    Ok(state.accrued_interest.add(accrual)?)
}

/// Y * FER * Nt on a notional basis. Absolute fees do not accrue.
pub fn fee_accrual(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    match terms.fees.fee_basis {
        FeeBasis::Absolute => Ok(Real::ZERO),
        FeeBasis::Notional => {
            let y = year_fraction_to(terms, state, event)?;
            Ok(y.mul(terms.fees.fee_rate)?.mul(state.notional_principal)?)
        }
    }
}

/// Interest and fees rolled forward to the event's calculation time.
pub fn accrue(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = state.clone();
    next.accrued_interest = interest_due(terms, state, event)?;
    next.fee_accrued = state.fee_accrued.add(fee_accrual(terms, state, event)?)?;
    Ok(next)
}

pub fn pof_zero(_terms: &Terms, _state: &State, _event: &Event) -> Result<Real, ActusError> {
    Ok(Real::ZERO)
}

pub fn stf_terminate(_terms: &Terms, state: &State, _event: &Event) -> Result<State, ActusError> {
    Ok(state.terminated())
}

/// Exercise amount plus outstanding fees, both already signed by role.
pub fn pof_settlement(_terms: &Terms, state: &State, _event: &Event) -> Result<Real, ActusError> {
    Ok(state.exercise_amount.add(state.fee_accrued)?)
}

/// FP events over `[anchor, end]`, anchored one cycle after `base` by default.
pub fn fee_events(terms: &Terms, base: Timestamp, end: Timestamp) -> Result<Vec<Event>, ActusError> {
    let Some(cycle) = terms.fees.cycle_of_fee else {
        return Ok(Vec::new());
    };
    let anchor = anchor_or_next(terms.fees.cycle_anchor_date_of_fee, base, &cycle, terms)?;
    make_events(terms, EventType::FeePayment, cycle_dates(anchor, &cycle, end, true, terms)?)
}

// 9.2: once exercised, a credit enhancement settles after the settlement
// period and stops paying fees or maturing. the settlement is not shifted so
// it can never land before the exercise it follows.
pub fn exercise_events(terms: &Terms, state: Option<&State>, events: &mut Vec<Event>) -> Result<(), ActusError> {
    let Some(exercised) = state.and_then(|s| s.exercise_date) else {
        return Ok(());
    };
    events.retain(|e| {
        !(matches!(e.event_type, EventType::FeePayment | EventType::Maturity) && e.event_time > exercised)
    });
    let settlement = match terms.credit_enhancement.settlement_period {
        Some(period) => cycle_date(exercised, &period, 1, EndOfMonthConvention::SameDay)?,
        None => exercised,
    };
    events.push(Event::new(terms.contract_type, EventType::Settlement, settlement));
    Ok(())
}
