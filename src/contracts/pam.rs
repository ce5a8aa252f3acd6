// 9.3: principal at maturity. the notional is exchanged at IED and repaid in
// one piece at MD; interest, fees and rate resets run on their own cycles.
// ANN reuses the schedule and every formula here except redemption.

use super::common::{accrue, fee_accrual, fee_events, interest_due, role_amount};
use super::position_before;
use crate::calendar::cycle_date;
use crate::cycle::Cycle;
use crate::day_count::year_fraction;
use crate::error::ActusError;
use crate::event::Event;
use crate::external::{decode_credit_event, decode_rate};
use crate::fixed::Real;
use crate::schedule::{anchor_or_next, cycle_dates, make_event, make_events};
use crate::state::State;
use crate::terms::{FeeBasis, Terms};
use crate::types::{EventType, Timestamp};

// 9.3.1: state at the status date. a loan exchanged before it starts with
// the full notional, otherwise it waits for IED.
pub fn initial_state(terms: &Terms) -> Result<State, ActusError> {
    let ied = terms.initial_exchange()?;
    let mut state = State::new(terms.dates.status_date);
    state.maturity_date = terms.dates.maturity_date;
    if ied <= terms.dates.status_date {
        state.notional_principal = role_amount(terms, terms.notional.notional_principal)?;
        state.nominal_interest_rate = terms.interest.nominal_interest_rate;
        state.accrued_interest = role_amount(terms, terms.interest.accrued_interest.unwrap_or(Real::ZERO))?;
        state.fee_accrued = role_amount(terms, terms.fees.fee_accrued.unwrap_or(Real::ZERO))?;
    }
    Ok(state)
}

pub fn schedule(terms: &Terms) -> Result<Vec<Event>, ActusError> {
    from_purchase(terms, lifetime_schedule(terms)?)
}

/// Every event from IED to maturity, including those before a purchase.
pub fn lifetime_schedule(terms: &Terms) -> Result<Vec<Event>, ActusError> {
    loan_schedule(
        terms,
        terms.interest.cycle_of_interest_payment,
        terms.interest.cycle_anchor_date_of_interest_payment,
        Vec::new(),
    )
}

// 9.3.2: the loan schedule shared with ANN. `extra` carries the redemption
// events, which only annuities have.
pub(super) fn loan_schedule(
    terms: &Terms,
    interest_cycle: Option<Cycle>,
    interest_anchor: Option<Timestamp>,
    extra: Vec<Event>,
) -> Result<Vec<Event>, ActusError> {
    let ied = terms.initial_exchange()?;
    let md = terms.maturity()?;

    let mut events = vec![
        make_event(terms, EventType::InitialExchange, ied)?,
        make_event(terms, EventType::Maturity, md)?,
    ];
    if let Some(prd) = terms.dates.purchase_date {
        events.push(make_event(terms, EventType::Purchase, prd)?);
    }
    if let Some(td) = terms.dates.termination_date {
        events.push(make_event(terms, EventType::Termination, td)?);
    }
    events.extend(fee_events(terms, ied, md)?);
    events.extend(interest_events(terms, interest_cycle, interest_anchor, ied, md)?);
    events.extend(rate_reset_events(terms, ied, md)?);
    events.extend(extra);

    // cyclic events only exist once the notional does
    events.retain(|e| !is_cyclic(e.event_type) || e.schedule_time > ied);

    if let Some(td) = terms.dates.termination_date {
        let cutoff = make_event(terms, EventType::Termination, td)?.key();
        events.retain(|e| e.key() <= cutoff);
    }
    Ok(events)
}

// a holder who buys in later sees nothing before the purchase
pub(super) fn from_purchase(terms: &Terms, mut events: Vec<Event>) -> Result<Vec<Event>, ActusError> {
    if let Some(prd) = terms.dates.purchase_date {
        let start = make_event(terms, EventType::Purchase, prd)?.key();
        events.retain(|e| e.key() >= start);
    }
    Ok(events)
}

fn is_cyclic(event_type: EventType) -> bool {
    matches!(
        event_type,
        EventType::FeePayment
            | EventType::InterestPayment
            | EventType::InterestCapitalization
            | EventType::PrincipalRedemption
            | EventType::RateReset
            | EventType::RateResetFixed
    )
}

// without a cycle interest is paid once, at maturity. dates up to the
// capitalization end date capitalize instead of paying.
fn interest_events(
    terms: &Terms,
    cycle: Option<Cycle>,
    anchor: Option<Timestamp>,
    ied: Timestamp,
    md: Timestamp,
) -> Result<Vec<Event>, ActusError> {
    let mut dates = match cycle {
        Some(cycle) => {
            let anchor = anchor_or_next(anchor, ied, &cycle, terms)?;
            cycle_dates(anchor, &cycle, md, true, terms)?
        }
        None => vec![md],
    };
    let Some(capitalization_end) = terms.dates.capitalization_end_date else {
        return make_events(terms, EventType::InterestPayment, dates);
    };
    if capitalization_end > ied && capitalization_end < md && !dates.contains(&capitalization_end) {
        dates.push(capitalization_end);
        dates.sort();
    }
    dates
        .into_iter()
        .map(|date| {
            let event_type = if date <= capitalization_end {
                EventType::InterestCapitalization
            } else {
                EventType::InterestPayment
            };
            make_event(terms, event_type, date)
        })
        .collect()
}

// the first reset after the status date is fixed when the next rate is known
fn rate_reset_events(terms: &Terms, ied: Timestamp, md: Timestamp) -> Result<Vec<Event>, ActusError> {
    let rr = &terms.rate_reset;
    let Some(cycle) = rr.cycle_of_rate_reset else {
        return Ok(Vec::new());
    };
    let anchor = anchor_or_next(rr.cycle_anchor_date_of_rate_reset, ied, &cycle, terms)?;
    let mut events = make_events(terms, EventType::RateReset, cycle_dates(anchor, &cycle, md, false, terms)?)?;
    if rr.next_reset_rate.is_some() {
        if let Some(first) = events
            .iter_mut()
            .find(|e| e.event_time > terms.dates.status_date)
        {
            *first = make_event(terms, EventType::RateResetFixed, first.schedule_time)?;
        }
    }
    Ok(events)
}

// 9.3.3: payoffs

/// -R * (NT + PDIED)
pub fn pof_ied(terms: &Terms, _state: &State, _event: &Event) -> Result<Real, ActusError> {
    let outlay = terms.notional.notional_principal.add(terms.notional.premium_discount_at_ied)?;
    Ok(role_amount(terms, outlay)?.neg()?)
}

pub fn pof_ip(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    interest_due(terms, state, event)
}

pub fn pof_fp(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    match terms.fees.fee_basis {
        FeeBasis::Absolute => role_amount(terms, terms.fees.fee_rate),
        FeeBasis::Notional => Ok(state.fee_accrued.add(fee_accrual(terms, state, event)?)?),
    }
}

/// The buyer pays the price plus interest accrued to the purchase on the
/// position the seller hands over.
pub fn pof_prd(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    let held = position_before(terms, state, event)?;
    let price = role_amount(terms, terms.notional.price_at_purchase_date)?;
    Ok(price.add(interest_due(terms, &held, event)?)?.neg()?)
}

pub fn pof_td(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    let price = role_amount(terms, terms.notional.price_at_termination_date)?;
    Ok(price.add(interest_due(terms, state, event)?)?)
}

/// Remaining notional plus anything not yet paid out.
pub fn pof_md(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    let fees = state.fee_accrued.add(fee_accrual(terms, state, event)?)?;
    Ok(state
        .notional_principal
        .add(interest_due(terms, state, event)?)?
        .add(fees)?)
}

// 9.3.4: transitions. apply_event stamps status date and event key.

pub fn stf_ied(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = state.clone();
    next.notional_principal = role_amount(terms, terms.notional.notional_principal)?;
    next.nominal_interest_rate = terms.interest.nominal_interest_rate;
    next.accrued_interest = match (
        terms.interest.accrued_interest,
        terms.interest.cycle_anchor_date_of_interest_payment,
    ) {
        (Some(accrued), _) => role_amount(terms, accrued)?,
        // interest already running from an anchor before the exchange
        (None, Some(anchor)) if anchor < event.calc_time => {
            let y = year_fraction(
                anchor,
                event.calc_time,
                terms.conventions.day_count_convention,
                terms.dates.maturity_date,
            )?;
            y.mul(next.nominal_interest_rate)?.mul(next.notional_principal)?
        }
        _ => Real::ZERO,
    };
    next.fee_accrued = role_amount(terms, terms.fees.fee_accrued.unwrap_or(Real::ZERO))?;
    Ok(next)
}

pub fn stf_ip(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = accrue(terms, state, event)?;
    next.accrued_interest = Real::ZERO;
    Ok(next)
}

pub fn stf_ipci(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = accrue(terms, state, event)?;
    next.notional_principal = next.notional_principal.add(next.accrued_interest)?;
    next.accrued_interest = Real::ZERO;
    Ok(next)
}

pub fn stf_fp(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = accrue(terms, state, event)?;
    next.fee_accrued = Real::ZERO;
    Ok(next)
}

pub fn stf_prd(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    accrue(terms, &position_before(terms, state, event)?, event)
}

pub fn stf_accrue(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    accrue(terms, state, event)
}

// 9.3.5: rate = multiplier * market + spread. the change is bounded by the
// period floor/cap, then the rate itself by the life floor/cap.
pub fn reset_rate(terms: &Terms, current: Real, market: Real) -> Result<Real, ActusError> {
    let rr = &terms.rate_reset;
    let target = rr.rate_multiplier.mul(market)?.add(rr.rate_spread)?;
    let mut delta = target.sub(current)?;
    if let Some(floor) = rr.period_floor {
        delta = delta.max(floor);
    }
    if let Some(cap) = rr.period_cap {
        delta = delta.min(cap);
    }
    let mut rate = current.add(delta)?;
    if let Some(floor) = rr.life_floor {
        rate = rate.max(floor);
    }
    if let Some(cap) = rr.life_cap {
        rate = rate.min(cap);
    }
    Ok(rate)
}

pub fn stf_rr(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let market = decode_rate(event)?;
    let mut next = accrue(terms, state, event)?;
    next.nominal_interest_rate = reset_rate(terms, state.nominal_interest_rate, market)?;
    Ok(next)
}

pub fn stf_rrf(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = accrue(terms, state, event)?;
    if let Some(rate) = terms.rate_reset.next_reset_rate {
        next.nominal_interest_rate = rate;
    }
    Ok(next)
}

pub fn stf_ce(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let status = decode_credit_event(event)?;
    let mut next = accrue(terms, state, event)?;
    next.contract_status = status;
    next.non_performing_date.get_or_insert(event.event_time);
    Ok(next)
}

/// Date a delinquency started at `since` turns into a default.
pub fn default_deadline(terms: &Terms, since: Timestamp) -> Result<Option<Timestamp>, ActusError> {
    terms
        .performance
        .delinquency_period
        .map(|period| cycle_date(since, &period, 1, terms.conventions.end_of_month_convention))
        .transpose()
}
