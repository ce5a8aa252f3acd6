// 8.0: schedule generation. every schedule is recomputed from terms (plus the
// state for exercise-dependent events); nothing is cached between calls.
// 8.1 enumerates cycle dates, 8.2 turns dates into events, 8.3 filters.

use crate::calendar::{cycle_date, shift_calc_time, shift_event_time};
use crate::contracts;
use crate::cycle::{Cycle, Stub};
use crate::error::ActusError;
use crate::event::{self, sort_events, Event};
use crate::state::State;
use crate::terms::Terms;
use crate::types::{EventType, Timestamp};

/// Upper bound on the dates one cycle may produce.
pub const MAX_CYCLE_DATES: u32 = 100_000;

// 8.1: anchor + i*cycle while strictly before `end`. a long stub folds the
// final partial period into the previous one by dropping the last regular
// date. `end` itself is appended when `include_end` is set.
pub fn cycle_dates(
    anchor: Timestamp,
    cycle: &Cycle,
    end: Timestamp,
    include_end: bool,
    terms: &Terms,
) -> Result<Vec<Timestamp>, ActusError> {
    cycle.validate("cycle")?;
    let eom = terms.conventions.end_of_month_convention;
    let mut dates = Vec::new();
    let mut index = 0u32;
    loop {
        let date = cycle_date(anchor, cycle, index, eom)?;
        if date >= end {
            let on_cycle = date == end;
            if cycle.stub == Stub::Long && !on_cycle && dates.len() > 1 {
                dates.pop();
            }
            break;
        }
        dates.push(date);
        index += 1;
        if index > MAX_CYCLE_DATES {
            return Err(ActusError::invalid_terms(
                "cycle",
                format!("{} produces more than {} dates", cycle, MAX_CYCLE_DATES),
            ));
        }
    }
    if include_end {
        dates.push(end);
    }
    Ok(dates)
}

/// Anchor of a cycle: the explicit anchor, or one cycle after `base`.
pub fn anchor_or_next(
    anchor: Option<Timestamp>,
    base: Timestamp,
    cycle: &Cycle,
    terms: &Terms,
) -> Result<Timestamp, ActusError> {
    match anchor {
        Some(anchor) => Ok(anchor),
        None => cycle_date(base, cycle, 1, terms.conventions.end_of_month_convention),
    }
}

// 8.2: shifting happens here, after all date arithmetic
pub fn make_event(terms: &Terms, event_type: EventType, schedule_time: Timestamp) -> Result<Event, ActusError> {
    let conv = &terms.conventions;
    Ok(Event {
        event_type,
        schedule_time,
        event_time: shift_event_time(schedule_time, conv.business_day_convention, conv.calendar)?,
        calc_time: shift_calc_time(schedule_time, conv.business_day_convention, conv.calendar)?,
        sequence: event::sequence(terms.contract_type, event_type),
        payload: None,
    })
}

pub fn make_events(
    terms: &Terms,
    event_type: EventType,
    dates: impl IntoIterator<Item = Timestamp>,
) -> Result<Vec<Event>, ActusError> {
    dates
        .into_iter()
        .map(|date| make_event(terms, event_type, date))
        .collect()
}

// 8.3: the expected schedule: everything strictly after the status date,
// in key order
pub fn generate_schedule(terms: &Terms) -> Result<Vec<Event>, ActusError> {
    terms.validate()?;
    let mut events = contracts::schedule(terms, None)?;
    events.retain(|e| e.event_time > terms.dates.status_date);
    sort_events(&mut events);
    Ok(events)
}

/// Scheduled events not yet applied to `state` that pay at or before
/// `timestamp`. A closed contract has nothing pending.
pub fn pending_schedule(terms: &Terms, state: &State, timestamp: Timestamp) -> Result<Vec<Event>, ActusError> {
    terms.validate()?;
    if state.is_closed() {
        return Ok(Vec::new());
    }
    let watermark = state.watermark();
    let mut events = contracts::schedule(terms, Some(state))?;
    events.retain(|e| e.key() > watermark && e.event_time <= timestamp);
    sort_events(&mut events);
    Ok(events)
}
