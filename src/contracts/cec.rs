// 9.6: credit enhancement collateral. on a qualifying credit event of the
// covered contract the collateral is called, capped by coverage times the
// covered exposure, and settles after the settlement period.

use super::ceg::guaranteed_amount;
use super::common::{exercise_events, role_amount};
use crate::error::ActusError;
use crate::event::Event;
use crate::external::decode_exposure;
use crate::fixed::Real;
use crate::schedule::make_event;
use crate::state::State;
use crate::terms::Terms;
use crate::types::EventType;

pub fn initial_state(terms: &Terms) -> Result<State, ActusError> {
    let mut state = State::new(terms.dates.status_date);
    state.maturity_date = terms.dates.maturity_date;
    state.notional_principal = role_amount(terms, terms.notional.notional_principal)?;
    state.fee_accrued = role_amount(terms, terms.fees.fee_accrued.unwrap_or(Real::ZERO))?.neg()?;
    Ok(state)
}

pub fn schedule(terms: &Terms, state: Option<&State>) -> Result<Vec<Event>, ActusError> {
    let mut events = vec![make_event(terms, EventType::Maturity, terms.maturity()?)?];
    exercise_events(terms, state, &mut events)?;
    Ok(events)
}

// Xa = R * min(collateral value, coverage * exposure)
pub fn stf_xd(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let exposure = decode_exposure(event)?;
    let mut next = state.clone();
    if state.exercise_date.is_some()
        || !exposure
            .status
            .triggers(terms.credit_enhancement.credit_event_type_covered)
    {
        return Ok(next);
    }
    let called = exposure
        .collateral_value
        .abs()?
        .min(guaranteed_amount(terms, &exposure)?);
    next.exercise_amount = role_amount(terms, called)?;
    next.exercise_date = Some(event.event_time);
    Ok(next)
}
