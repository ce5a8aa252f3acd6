// 9.4: annuity. constant total payment per period: each redemption pays the
// annuity amount minus the interest due, so principal grows as interest
// shrinks. everything except redemption and the annuity amount is PAM.

use super::common::{interest_due, role_amount};
use super::pam;
use crate::day_count::year_fraction;
use crate::error::ActusError;
use crate::event::Event;
use crate::fixed::Real;
use crate::schedule::{anchor_or_next, cycle_dates, make_events};
use crate::state::State;
use crate::terms::Terms;
use crate::types::{EventType, Timestamp};

pub fn initial_state(terms: &Terms) -> Result<State, ActusError> {
    let mut state = pam::initial_state(terms)?;
    if !state.notional_principal.is_zero() {
        state.next_principal_redemption_payment = next_payment(terms, &state, terms.dates.status_date)?;
    }
    Ok(state)
}

pub fn schedule(terms: &Terms) -> Result<Vec<Event>, ActusError> {
    pam::from_purchase(terms, lifetime_schedule(terms)?)
}

// interest follows the redemption cycle unless it has its own
pub fn lifetime_schedule(terms: &Terms) -> Result<Vec<Event>, ActusError> {
    let ied = terms.initial_exchange()?;
    let md = terms.maturity()?;
    let redemptions = make_events(terms, EventType::PrincipalRedemption, redemption_dates(terms, ied, md)?)?;

    let (interest_cycle, interest_anchor) = match terms.interest.cycle_of_interest_payment {
        Some(cycle) => (Some(cycle), terms.interest.cycle_anchor_date_of_interest_payment),
        None => (
            terms.redemption.cycle_of_principal_redemption,
            terms.redemption.cycle_anchor_date_of_principal_redemption,
        ),
    };
    pam::loan_schedule(terms, interest_cycle, interest_anchor, redemptions)
}

// unshifted redemption dates, maturity excluded
fn redemption_dates(terms: &Terms, ied: Timestamp, md: Timestamp) -> Result<Vec<Timestamp>, ActusError> {
    let cycle = terms
        .redemption
        .cycle_of_principal_redemption
        .ok_or_else(|| ActusError::invalid_terms("cycle_of_principal_redemption", "required for annuities"))?;
    let anchor = anchor_or_next(
        terms.redemption.cycle_anchor_date_of_principal_redemption,
        ied,
        &cycle,
        terms,
    )?;
    cycle_dates(anchor, &cycle, md, false, terms)
}

// 9.4.1: A = (Nt + Ipac) / sum_k prod_{i<=k} 1 / (1 + r * Y(t_{i-1}, t_i))
// over the redemption dates after `from`, maturity last. signs carry through
// from the state so a liability gets a negative amount.
pub fn annuity_amount(terms: &Terms, state: &State, from: Timestamp) -> Result<Real, ActusError> {
    let ied = terms.initial_exchange()?;
    let md = terms.maturity()?;
    let mut dates: Vec<Timestamp> = redemption_dates(terms, ied, md)?
        .into_iter()
        .filter(|d| *d > from)
        .collect();
    dates.push(md);

    let rate = state.nominal_interest_rate;
    let dcc = terms.conventions.day_count_convention;
    let mut discount = Real::ONE;
    let mut annuity_factor = Real::ZERO;
    let mut previous = from;
    for date in dates {
        let y = year_fraction(previous, date, dcc, Some(md))?;
        let growth = Real::ONE.add(rate.mul(y)?)?;
        discount = discount.div(growth)?;
        annuity_factor = annuity_factor.add(discount)?;
        previous = date;
    }

    let balance = state.notional_principal.add(state.accrued_interest)?;
    if annuity_factor.is_zero() {
        return Ok(balance);
    }
    Ok(balance.div(annuity_factor)?)
}

fn next_payment(terms: &Terms, state: &State, from: Timestamp) -> Result<Real, ActusError> {
    match terms.redemption.next_principal_redemption_payment {
        Some(amount) => role_amount(terms, amount),
        None => annuity_amount(terms, state, from),
    }
}

// 9.4.2: principal portion, Prnxt - (Ipac + Y * Ipnr * Nt), kept between
// zero and the outstanding notional in the role's direction
pub fn principal_due(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    let sign = terms.role_sign();
    let raw = state
        .next_principal_redemption_payment
        .sub(interest_due(terms, state, event)?)?;
    let outstanding = sign.mul(state.notional_principal)?;
    let magnitude = sign.mul(raw)?.max(Real::ZERO).min(outstanding.max(Real::ZERO));
    Ok(sign.mul(magnitude)?)
}

pub fn pof_pr(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    principal_due(terms, state, event)
}

pub fn stf_pr(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let principal = principal_due(terms, state, event)?;
    let mut next = pam::stf_accrue(terms, state, event)?;
    next.notional_principal = next.notional_principal.sub(principal)?;
    Ok(next)
}

pub fn stf_ied(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = pam::stf_ied(terms, state, event)?;
    next.next_principal_redemption_payment = next_payment(terms, &next, event.calc_time)?;
    Ok(next)
}

// a new rate means a new annuity over the remaining dates
pub fn stf_rr(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = pam::stf_rr(terms, state, event)?;
    next.next_principal_redemption_payment = annuity_amount(terms, &next, event.calc_time)?;
    Ok(next)
}

pub fn stf_rrf(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = pam::stf_rrf(terms, state, event)?;
    next.next_principal_redemption_payment = annuity_amount(terms, &next, event.calc_time)?;
    Ok(next)
}
