// 9.0: contract formulas. one payoff and one transition function per
// (contract type, event type) pair, looked up in a static table. apply_event
// is the only place that runs them: it guards ordering, stamps the state and
// tracks payment performance.

pub mod ann;
pub mod cec;
pub mod ceg;
pub mod common;
pub mod pam;

use crate::error::ActusError;
use crate::event::{sort_events, Event};
use crate::external::decode_settlement;
use crate::fixed::Real;
use crate::state::State;
use crate::terms::Terms;
use crate::types::{ContractStatus, ContractType, EventType};

pub type PayoffFn = fn(&Terms, &State, &Event) -> Result<Real, ActusError>;
pub type TransitionFn = fn(&Terms, &State, &Event) -> Result<State, ActusError>;

#[derive(Debug, Clone, Copy)]
pub struct Formula {
    pub payoff: PayoffFn,
    pub transition: TransitionFn,
}

use common::{pof_settlement, pof_zero, stf_terminate};
use ContractType::{
    Annuity as ANN, CreditEnhancementCollateral as CEC, CreditEnhancementGuarantee as CEG,
    PrincipalAtMaturity as PAM,
};
use EventType::*;

const fn formula(payoff: PayoffFn, transition: TransitionFn) -> Formula {
    Formula { payoff, transition }
}

// 9.0.1: the dispatch table. a pair missing here is unsupported.
static FORMULAS: &[((ContractType, EventType), Formula)] = &[
    ((PAM, InitialExchange), formula(pam::pof_ied, pam::stf_ied)),
    ((PAM, FeePayment), formula(pam::pof_fp, pam::stf_fp)),
    ((PAM, Purchase), formula(pam::pof_prd, pam::stf_prd)),
    ((PAM, InterestPayment), formula(pam::pof_ip, pam::stf_ip)),
    ((PAM, InterestCapitalization), formula(pof_zero, pam::stf_ipci)),
    ((PAM, CreditEvent), formula(pof_zero, pam::stf_ce)),
    ((PAM, RateResetFixed), formula(pof_zero, pam::stf_rrf)),
    ((PAM, RateReset), formula(pof_zero, pam::stf_rr)),
    ((PAM, Termination), formula(pam::pof_td, stf_terminate)),
    ((PAM, Maturity), formula(pam::pof_md, stf_terminate)),
    ((ANN, InitialExchange), formula(pam::pof_ied, ann::stf_ied)),
    ((ANN, FeePayment), formula(pam::pof_fp, pam::stf_fp)),
    ((ANN, PrincipalRedemption), formula(ann::pof_pr, ann::stf_pr)),
    ((ANN, Purchase), formula(pam::pof_prd, pam::stf_prd)),
    ((ANN, InterestPayment), formula(pam::pof_ip, pam::stf_ip)),
    ((ANN, InterestCapitalization), formula(pof_zero, pam::stf_ipci)),
    ((ANN, CreditEvent), formula(pof_zero, pam::stf_ce)),
    ((ANN, RateResetFixed), formula(pof_zero, ann::stf_rrf)),
    ((ANN, RateReset), formula(pof_zero, ann::stf_rr)),
    ((ANN, Termination), formula(pam::pof_td, stf_terminate)),
    ((ANN, Maturity), formula(pam::pof_md, stf_terminate)),
    ((CEG, Purchase), formula(ceg::pof_prd, ceg::stf_prd)),
    ((CEG, FeePayment), formula(ceg::pof_fp, ceg::stf_fp)),
    ((CEG, Exercise), formula(pof_zero, ceg::stf_xd)),
    ((CEG, Settlement), formula(pof_settlement, stf_terminate)),
    ((CEG, Maturity), formula(pof_zero, stf_terminate)),
    ((CEC, Exercise), formula(pof_zero, cec::stf_xd)),
    ((CEC, Settlement), formula(pof_settlement, stf_terminate)),
    ((CEC, Maturity), formula(pof_zero, stf_terminate)),
];

pub fn lookup(contract_type: ContractType, event_type: EventType) -> Result<Formula, ActusError> {
    FORMULAS
        .iter()
        .find(|(key, _)| *key == (contract_type, event_type))
        .map(|(_, f)| *f)
        .ok_or(ActusError::UnsupportedEventType {
            contract_type,
            event_type,
        })
}

pub fn initial_state(terms: &Terms) -> Result<State, ActusError> {
    match terms.contract_type {
        PAM => pam::initial_state(terms),
        ANN => ann::initial_state(terms),
        CEG => ceg::initial_state(terms),
        CEC => cec::initial_state(terms),
    }
}

/// Unfiltered, unsorted events. With a state, exercise-dependent events
/// are included.
pub fn schedule(terms: &Terms, state: Option<&State>) -> Result<Vec<Event>, ActusError> {
    match terms.contract_type {
        PAM => pam::schedule(terms),
        ANN => ann::schedule(terms),
        CEG => ceg::schedule(terms, state),
        CEC => cec::schedule(terms, state),
    }
}

// 9.0.2: one event: ordering guard, payoff on the old state, transition,
// stamping, then performance tracking on the new state
pub fn apply_event(terms: &Terms, state: &State, event: &Event) -> Result<(Real, State), ActusError> {
    if state.is_closed() {
        return Err(ActusError::ContractClosed {
            status: state.contract_status,
        });
    }
    let watermark = state.watermark();
    if event.key() <= watermark {
        return Err(ActusError::StaleStateTransition {
            event_type: event.event_type,
            event_time: event.event_time,
            last_event_time: watermark.time,
        });
    }

    let formula = lookup(terms.contract_type, event.event_type)?;
    let payoff = (formula.payoff)(terms, state, event)?;
    let mut next = (formula.transition)(terms, state, event)?;
    next.status_date = event.calc_time.max(state.status_date);
    next.last_event = Some(event.key());
    track_performance(terms, &mut next, event)?;
    Ok((payoff, next))
}

// 9.0.3: a missed periodic payment makes the contract delinquent, a settled
// one cures it. delinquency older than the delinquency period is a default.
fn track_performance(terms: &Terms, next: &mut State, event: &Event) -> Result<(), ActusError> {
    if next.is_closed() {
        return Ok(());
    }
    if event.event_type.is_periodic_payment() {
        match decode_settlement(event)? {
            Some(true) => {
                if next.contract_status == ContractStatus::Performant {
                    next.contract_status = ContractStatus::Delinquent;
                }
                next.non_performing_date.get_or_insert(event.event_time);
            }
            Some(false) if next.contract_status == ContractStatus::Delinquent => {
                next.contract_status = ContractStatus::Performant;
                next.non_performing_date = None;
            }
            _ => {}
        }
    }
    if next.contract_status == ContractStatus::Delinquent {
        if let Some(since) = next.non_performing_date {
            if let Some(deadline) = pam::default_deadline(terms, since)? {
                if event.event_time >= deadline {
                    log::info!("{} defaulted, delinquent since {}", terms.contract_id, since);
                    next.contract_status = ContractStatus::Defaulted;
                }
            }
        }
    }
    Ok(())
}

fn lifetime_schedule(terms: &Terms) -> Result<Vec<Event>, ActusError> {
    match terms.contract_type {
        PAM => pam::lifetime_schedule(terms),
        ANN => ann::lifetime_schedule(terms),
        CEG | CEC => schedule(terms, None),
    }
}

// 9.0.4: the position just before `event` as the previous holder left it.
// events cut from the schedule by a purchase are replayed on the state and
// their payoffs dropped. resets need a market observation the holder never
// had, so the rate in force is kept.
pub fn position_before(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let watermark = state.watermark();
    let mut history: Vec<Event> = lifetime_schedule(terms)?
        .into_iter()
        .filter(|e| e.key() > watermark && e.key() < event.key() && e.event_type != RateReset)
        .collect();
    sort_events(&mut history);

    let mut position = state.clone();
    for past in &history {
        if position.is_closed() {
            break;
        }
        let formula = lookup(terms.contract_type, past.event_type)?;
        let mut next = (formula.transition)(terms, &position, past)?;
        next.status_date = past.calc_time.max(position.status_date);
        next.last_event = Some(past.key());
        position = next;
    }
    Ok(position)
}
