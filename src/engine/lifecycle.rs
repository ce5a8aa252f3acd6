// 10.1 engine/lifecycle.rs: the pure kernel. every function reads terms,
// state and external data by reference and returns new values; nothing here
// keeps state between calls.

use super::results::{EventPayoff, Evaluation};
use crate::contracts::{self, apply_event};
use crate::error::ActusError;
use crate::event::{sort_events, Event};
use crate::external::ExternalData;
use crate::fixed::Real;
use crate::schedule::{generate_schedule, pending_schedule};
use crate::state::State;
use crate::terms::Terms;
use crate::types::Timestamp;
use log::{debug, warn};
use std::collections::VecDeque;

pub fn compute_initial_state(terms: &Terms) -> Result<State, ActusError> {
    terms.validate()?;
    contracts::initial_state(terms)
}

pub fn compute_expected_schedule(terms: &Terms) -> Result<Vec<Event>, ActusError> {
    generate_schedule(terms)
}

pub fn compute_pending_schedule(terms: &Terms, state: &State, timestamp: Timestamp) -> Result<Vec<Event>, ActusError> {
    pending_schedule(terms, state, timestamp)
}

// 10.1.1: scheduled and injected events still ahead of the state, payloads
// attached. an injected event on a scheduled key is ignored; observations
// are the way to feed scheduled events.
pub fn due_events(
    terms: &Terms,
    state: &State,
    timestamp: Timestamp,
    ext: &ExternalData,
) -> Result<Vec<Event>, ActusError> {
    let mut events: Vec<Event> = pending_schedule(terms, state, timestamp)?
        .into_iter()
        .map(|e| ext.attach(e))
        .collect();
    if !state.is_closed() {
        let watermark = state.watermark();
        events.extend(
            ext.unscheduled()
                .iter()
                .filter(|e| e.key() > watermark && e.event_time <= timestamp)
                .map(|e| ext.attach(e.clone())),
        );
    }
    sort_events(&mut events);
    events.dedup_by_key(|e| e.key());
    Ok(events)
}

fn apply_logged(
    terms: &Terms,
    state: &State,
    event: &Event,
    log_events: bool,
) -> Result<(EventPayoff, State), ActusError> {
    let (payoff, next) = apply_event(terms, state, event)?;
    if log_events {
        debug!(
            "{} {} at {}: payoff {}, status {}",
            terms.contract_id, event.event_type, event.event_time, payoff, next.contract_status
        );
    }
    Ok((EventPayoff::new(event, payoff), next))
}

// 10.1.2: apply everything due up to `timestamp` in key order. an exercise
// changes the schedule, so the due list is rebuilt when the exercise date
// moves. a closed contract stops the run.
pub(super) fn advance(
    terms: &Terms,
    state: &State,
    timestamp: Timestamp,
    ext: &ExternalData,
    log_events: bool,
) -> Result<Evaluation, ActusError> {
    let mut current = state.clone();
    let mut payoffs = Vec::new();
    let mut queue: VecDeque<Event> = due_events(terms, &current, timestamp, ext)?.into();
    while let Some(event) = queue.pop_front() {
        if current.is_closed() {
            break;
        }
        let exercised = current.exercise_date;
        let (payoff, next) = apply_logged(terms, &current, &event, log_events)?;
        payoffs.push(payoff);
        current = next;
        if current.exercise_date != exercised {
            queue = due_events(terms, &current, timestamp, ext)?.into();
        }
    }
    Ok(Evaluation {
        state: current,
        payoffs,
    })
}

// 10.1.3: the guarded step behind compute_next_state. the contract needs an
// expected schedule, and time only moves forward from the last applied event.
pub(super) fn step(
    terms: &Terms,
    state: &State,
    timestamp: Timestamp,
    ext: &ExternalData,
    log_events: bool,
) -> Result<Evaluation, ActusError> {
    let expected = generate_schedule(terms)?;
    let watermark = state.watermark();
    let Some(next) = expected.iter().find(|e| e.key() > watermark).or(expected.last()) else {
        return Err(ActusError::NoScheduleAvailable {
            contract_id: terms.contract_id.clone(),
        });
    };
    if timestamp < watermark.time {
        return Err(ActusError::StaleStateTransition {
            event_type: next.event_type,
            event_time: timestamp,
            last_event_time: watermark.time,
        });
    }
    advance(terms, state, timestamp, ext, log_events)
}

/// Applies every event due up to `timestamp` and returns the new state
/// together with the payoffs along the way.
pub fn evaluate_until(
    terms: &Terms,
    state: &State,
    timestamp: Timestamp,
    ext: &ExternalData,
) -> Result<Evaluation, ActusError> {
    step(terms, state, timestamp, ext, false)
}

pub fn compute_next_state(
    terms: &Terms,
    state: &State,
    timestamp: Timestamp,
    ext: &ExternalData,
) -> Result<State, ActusError> {
    Ok(evaluate_until(terms, state, timestamp, ext)?.state)
}

/// Dry run of an explicit schedule. Events the state already reflects are
/// skipped and the run stops once the contract closes.
pub fn evaluate_schedule(
    terms: &Terms,
    state: &State,
    schedule: &[Event],
    ext: &ExternalData,
) -> Result<Evaluation, ActusError> {
    terms.validate()?;
    let mut events: Vec<Event> = schedule.iter().map(|e| ext.attach(e.clone())).collect();
    sort_events(&mut events);

    let mut current = state.clone();
    let mut payoffs = Vec::new();
    for event in &events {
        if current.is_closed() {
            break;
        }
        if event.key() <= current.watermark() {
            continue;
        }
        let (payoff, next) = apply_logged(terms, &current, event, false)?;
        payoffs.push(payoff);
        current = next;
    }
    Ok(Evaluation {
        state: current,
        payoffs,
    })
}

/// Net cash flow of everything due up to `timestamp`; zero when nothing is.
pub fn compute_due_payoff(
    terms: &Terms,
    state: &State,
    timestamp: Timestamp,
    ext: &ExternalData,
) -> Result<Real, ActusError> {
    if due_events(terms, state, timestamp, ext)?.is_empty() {
        return Ok(Real::ZERO);
    }
    advance(terms, state, timestamp, ext, false)?.total()
}

pub fn validate_initial_state(terms: &Terms, expected: &State) -> Result<bool, ActusError> {
    let computed = compute_initial_state(terms)?;
    if computed != *expected {
        warn!("{}: initial state mismatch, computed {:?}", terms.contract_id, computed);
        return Ok(false);
    }
    Ok(true)
}

pub fn validate_next_state(
    terms: &Terms,
    state: &State,
    timestamp: Timestamp,
    ext: &ExternalData,
    expected: &State,
) -> Result<bool, ActusError> {
    let computed = compute_next_state(terms, state, timestamp, ext)?;
    if computed != *expected {
        warn!(
            "{}: next state at {} mismatch, computed {:?}",
            terms.contract_id, timestamp, computed
        );
        return Ok(false);
    }
    Ok(true)
}
