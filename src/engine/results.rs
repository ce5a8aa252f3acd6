// 10.0.2: result types for kernel operations.

use crate::error::ActusError;
use crate::event::Event;
use crate::fixed::Real;
use crate::state::State;
use crate::types::{ContractStatus, EventType, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayoff {
    pub event_type: EventType,
    pub event_time: Timestamp,
    pub calc_time: Timestamp,
    pub payoff: Real,
}

impl EventPayoff {
    pub fn new(event: &Event, payoff: Real) -> Self {
        Self {
            event_type: event.event_type,
            event_time: event.event_time,
            calc_time: event.calc_time,
            payoff,
        }
    }
}

/// State after a run of events, with the payoff of each event in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub state: State,
    pub payoffs: Vec<EventPayoff>,
}

impl Evaluation {
    pub fn total(&self) -> Result<Real, ActusError> {
        Ok(Real::checked_sum(self.payoffs.iter().map(|p| p.payoff))?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Uninitialized,
    Live(ContractStatus),
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Uninitialized => write!(f, "uninitialized"),
            Lifecycle::Live(status) => write!(f, "{}", status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub id: u64,
    pub timestamp: Timestamp,
    pub from_status: Lifecycle,
    pub to_status: Lifecycle,
    pub events: usize,
    pub net_payoff: Real,
}
