// 11.0: portfolio evaluation. contracts are independent, so each one runs
// through the kernel on its own rayon task; outcomes come back in input order
// and one failing contract does not stop the others.

use crate::engine::{compute_initial_state, evaluate_until, Evaluation};
use crate::error::ActusError;
use crate::external::ExternalData;
use crate::fixed::Real;
use crate::state::State;
use crate::terms::Terms;
use crate::types::Timestamp;
use rayon::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct PortfolioEntry {
    pub terms: Terms,
    /// Committed state; None starts from the initial state.
    pub state: Option<State>,
    pub external: ExternalData,
}

impl PortfolioEntry {
    pub fn new(terms: Terms) -> Self {
        Self {
            terms,
            state: None,
            external: ExternalData::new(),
        }
    }

    pub fn with_state(mut self, state: State) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_external(mut self, external: ExternalData) -> Self {
        self.external = external;
        self
    }

    fn evaluate(&self, timestamp: Timestamp) -> Result<Evaluation, ActusError> {
        let state = match &self.state {
            Some(state) => state.clone(),
            None => compute_initial_state(&self.terms)?,
        };
        evaluate_until(&self.terms, &state, timestamp, &self.external)
    }
}

#[derive(Debug, Clone)]
pub struct ContractOutcome {
    pub contract_id: String,
    pub currency: String,
    pub result: Result<Evaluation, ActusError>,
}

pub fn evaluate_portfolio(entries: &[PortfolioEntry], timestamp: Timestamp) -> Vec<ContractOutcome> {
    let outcomes: Vec<ContractOutcome> = entries
        .par_iter()
        .map(|entry| ContractOutcome {
            contract_id: entry.terms.contract_id.clone(),
            currency: entry.terms.currency.clone(),
            result: entry.evaluate(timestamp),
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed > 0 {
        log::warn!("{} of {} contracts failed to evaluate", failed, outcomes.len());
    }
    outcomes
}

/// Net cash flow over the successful outcomes.
pub fn total_cash_flow(outcomes: &[ContractOutcome]) -> Result<Real, ActusError> {
    let mut total = Real::ZERO;
    for evaluation in outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
        total = total.add(evaluation.total()?)?;
    }
    Ok(total)
}

// 11.1: amounts in different currencies are never netted
pub fn cash_flow_by_currency(outcomes: &[ContractOutcome]) -> Result<BTreeMap<String, Real>, ActusError> {
    let mut totals = BTreeMap::new();
    for outcome in outcomes {
        if let Ok(evaluation) = &outcome.result {
            let entry = totals.entry(outcome.currency.clone()).or_insert(Real::ZERO);
            *entry = entry.add(evaluation.total()?)?;
        }
    }
    Ok(totals)
}
