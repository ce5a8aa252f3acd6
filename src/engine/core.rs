// 10.0 engine/core.rs: one contract's engine. holds the terms, the committed
// state and the transition log; every computation is delegated to the pure
// functions in lifecycle.rs.

use super::config::EngineConfig;
use super::lifecycle;
use super::results::{Evaluation, Lifecycle, TransitionRecord};
use crate::error::ActusError;
use crate::event::Event;
use crate::external::ExternalData;
use crate::fixed::Real;
use crate::state::State;
use crate::terms::Terms;
use crate::types::Timestamp;
use log::info;

/** 10.2: main engine struct. the committed state is replaced, never edited */
#[derive(Debug)]
pub struct Engine {
    pub(super) terms: Terms,
    pub(super) config: EngineConfig,
    pub(super) state: Option<State>,
    pub(super) transitions: Vec<TransitionRecord>,
    pub(super) next_transition_id: u64,
}

impl Engine {
    pub fn new(terms: Terms, config: EngineConfig) -> Result<Self, ActusError> {
        terms.validate()?;
        Ok(Self {
            terms,
            config,
            state: None,
            transitions: Vec::new(),
            next_transition_id: 1,
        })
    }

    pub fn terms(&self) -> &Terms {
        &self.terms
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match &self.state {
            Some(state) => Lifecycle::Live(state.contract_status),
            None => Lifecycle::Uninitialized,
        }
    }

    fn committed(&self) -> Result<&State, ActusError> {
        self.state.as_ref().ok_or(ActusError::Uninitialized)
    }

    // already initialized: the committed state stays
    pub fn initialize(&mut self) -> Result<&State, ActusError> {
        if self.state.is_none() {
            let state = lifecycle::compute_initial_state(&self.terms)?;
            let to = Lifecycle::Live(state.contract_status);
            info!("{} initialized at {}", self.terms.contract_id, state.status_date);
            self.record_transition(state.status_date, Lifecycle::Uninitialized, to, 0, Real::ZERO);
            self.state = Some(state);
        }
        self.committed()
    }

    pub fn compute_next_state(&self, timestamp: Timestamp, ext: &ExternalData) -> Result<State, ActusError> {
        let state = self.committed()?;
        Ok(lifecycle::step(&self.terms, state, timestamp, ext, self.config.log_events)?.state)
    }

    pub fn compute_and_commit_next_state(
        &mut self,
        timestamp: Timestamp,
        ext: &ExternalData,
    ) -> Result<Evaluation, ActusError> {
        let state = self.committed()?;
        let from = Lifecycle::Live(state.contract_status);
        let evaluation = lifecycle::step(&self.terms, state, timestamp, ext, self.config.log_events)?;
        let net = evaluation.total()?;
        let to = Lifecycle::Live(evaluation.state.contract_status);

        info!(
            "{} committed {} events up to {}: net payoff {}, {} -> {}",
            self.terms.contract_id,
            evaluation.payoffs.len(),
            timestamp,
            net,
            from,
            to
        );
        self.record_transition(timestamp, from, to, evaluation.payoffs.len(), net);
        self.state = Some(evaluation.state.clone());
        Ok(evaluation)
    }

    pub fn validate_initial_state(&self, expected: &State) -> Result<bool, ActusError> {
        lifecycle::validate_initial_state(&self.terms, expected)
    }

    pub fn validate_next_state(
        &self,
        timestamp: Timestamp,
        ext: &ExternalData,
        expected: &State,
    ) -> Result<bool, ActusError> {
        lifecycle::validate_next_state(&self.terms, self.committed()?, timestamp, ext, expected)
    }

    pub fn compute_expected_schedule(&self) -> Result<Vec<Event>, ActusError> {
        lifecycle::compute_expected_schedule(&self.terms)
    }

    pub fn compute_pending_schedule(&self, timestamp: Timestamp) -> Result<Vec<Event>, ActusError> {
        lifecycle::compute_pending_schedule(&self.terms, self.committed()?, timestamp)
    }

    pub fn evaluate_schedule(&self, schedule: &[Event], ext: &ExternalData) -> Result<Evaluation, ActusError> {
        lifecycle::evaluate_schedule(&self.terms, self.committed()?, schedule, ext)
    }

    pub fn compute_due_payoff(&self, timestamp: Timestamp, ext: &ExternalData) -> Result<Real, ActusError> {
        lifecycle::compute_due_payoff(&self.terms, self.committed()?, timestamp, ext)
    }

    pub fn recent_transitions(&self, count: usize) -> &[TransitionRecord] {
        let start = self.transitions.len().saturating_sub(count);
        &self.transitions[start..]
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    fn record_transition(
        &mut self,
        timestamp: Timestamp,
        from_status: Lifecycle,
        to_status: Lifecycle,
        events: usize,
        net_payoff: Real,
    ) {
        self.transitions.push(TransitionRecord {
            id: self.next_transition_id,
            timestamp,
            from_status,
            to_status,
            events,
            net_payoff,
        });
        self.next_transition_id += 1;

        if self.transitions.len() > self.config.max_transitions {
            let drain_count = self.transitions.len() - self.config.max_transitions;
            self.transitions.drain(0..drain_count);
        }
    }
}
