// 9.5: credit enhancement guarantee. the buyer pays a premium and fees; when
// the covered contract hits the covered credit status the guarantee is
// exercised for coverage times the covered exposure and settles after the
// settlement period.
// fees are stored from the buyer's point of view: an accruing fee is money
// owed, so it is negative for BUY.

use super::common::{exercise_events, fee_accrual, fee_events, role_amount};
use crate::error::ActusError;
use crate::event::Event;
use crate::external::{decode_exposure, CoveredExposure};
use crate::fixed::Real;
use crate::schedule::make_event;
use crate::state::State;
use crate::terms::{FeeBasis, GuaranteedExposure, Terms};
use crate::types::EventType;

pub fn initial_state(terms: &Terms) -> Result<State, ActusError> {
    let mut state = State::new(terms.dates.status_date);
    state.maturity_date = terms.dates.maturity_date;
    let covered = terms
        .credit_enhancement
        .coverage_of_credit_enhancement
        .mul(terms.notional.notional_principal)?;
    state.notional_principal = role_amount(terms, covered)?;
    state.fee_accrued = role_amount(terms, terms.fees.fee_accrued.unwrap_or(Real::ZERO))?.neg()?;
    Ok(state)
}

pub fn schedule(terms: &Terms, state: Option<&State>) -> Result<Vec<Event>, ActusError> {
    let md = terms.maturity()?;
    let base = terms.dates.purchase_date.unwrap_or(terms.dates.status_date);
    let mut events = vec![make_event(terms, EventType::Maturity, md)?];
    if let Some(prd) = terms.dates.purchase_date {
        events.push(make_event(terms, EventType::Purchase, prd)?);
    }
    events.extend(fee_events(terms, base, md)?);
    exercise_events(terms, state, &mut events)?;
    Ok(events)
}

/// Covered exposure times coverage, before the role sign.
pub fn guaranteed_amount(terms: &Terms, exposure: &CoveredExposure) -> Result<Real, ActusError> {
    let ce = &terms.credit_enhancement;
    let mut amount = exposure.notional_principal.abs()?;
    if ce.guaranteed_exposure == GuaranteedExposure::NominalPlusInterest {
        amount = amount.add(exposure.accrued_interest.abs()?)?;
    }
    Ok(ce.coverage_of_credit_enhancement.mul(amount)?)
}

fn accrue_fees(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = state.clone();
    next.fee_accrued = state.fee_accrued.sub(fee_accrual(terms, state, event)?)?;
    Ok(next)
}

/// -R * PPRD
pub fn pof_prd(terms: &Terms, _state: &State, _event: &Event) -> Result<Real, ActusError> {
    Ok(role_amount(terms, terms.notional.price_at_purchase_date)?.neg()?)
}

pub fn pof_fp(terms: &Terms, state: &State, event: &Event) -> Result<Real, ActusError> {
    match terms.fees.fee_basis {
        FeeBasis::Absolute => Ok(role_amount(terms, terms.fees.fee_rate)?.neg()?),
        FeeBasis::Notional => Ok(state.fee_accrued.sub(fee_accrual(terms, state, event)?)?),
    }
}

pub fn stf_prd(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    accrue_fees(terms, state, event)
}

pub fn stf_fp(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let mut next = accrue_fees(terms, state, event)?;
    next.fee_accrued = Real::ZERO;
    Ok(next)
}

// 9.5.1: exercise only on a qualifying status and only once. a notice that
// does not qualify just moves the status date.
pub fn stf_xd(terms: &Terms, state: &State, event: &Event) -> Result<State, ActusError> {
    let exposure = decode_exposure(event)?;
    let mut next = accrue_fees(terms, state, event)?;
    if state.exercise_date.is_some()
        || !exposure
            .status
            .triggers(terms.credit_enhancement.credit_event_type_covered)
    {
        return Ok(next);
    }
    next.exercise_amount = role_amount(terms, guaranteed_amount(terms, &exposure)?)?;
    next.exercise_date = Some(event.event_time);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TermsPreset;
    use crate::external::encode_exposure;
    use crate::types::{ContractStatus, ContractType, Timestamp};

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(y, m, d).unwrap()
    }

    fn guarantee() -> Terms {
        TermsPreset::Guarantee.terms("ceg", ts(2024, 1, 1)).unwrap()
    }

    fn notice(status: ContractStatus) -> Event {
        let exposure = CoveredExposure {
            status,
            notional_principal: Real::from_int(-400_000),
            accrued_interest: Real::from_int(-10_000),
            collateral_value: Real::ZERO,
        };
        Event::new(ContractType::CreditEnhancementGuarantee, EventType::Exercise, ts(2024, 6, 1))
            .with_payload(encode_exposure(&exposure))
    }

    #[test]
    fn buyer_owes_fees() {
        let terms = guarantee();
        let state = initial_state(&terms).unwrap();
        assert!(state.notional_principal.is_positive());
        let fp = Event::new(ContractType::CreditEnhancementGuarantee, EventType::FeePayment, ts(2024, 7, 1));
        assert!(pof_fp(&terms, &state, &fp).unwrap().is_negative());
        assert!(pof_prd(&terms, &state, &fp).unwrap().is_negative());
    }

    #[test]
    fn qualifying_default_exercises() {
        let mut terms = guarantee();
        terms.credit_enhancement.guaranteed_exposure = GuaranteedExposure::NominalPlusInterest;
        let state = initial_state(&terms).unwrap();
        let next = stf_xd(&terms, &state, &notice(ContractStatus::Defaulted)).unwrap();
        assert_eq!(next.exercise_date, Some(ts(2024, 6, 1)));
        let coverage = terms.credit_enhancement.coverage_of_credit_enhancement;
        assert_eq!(next.exercise_amount, coverage.mul(Real::from_int(410_000)).unwrap());
    }

    #[test]
    fn delinquency_does_not_trigger_default_cover() {
        let terms = guarantee();
        let state = initial_state(&terms).unwrap();
        let next = stf_xd(&terms, &state, &notice(ContractStatus::Delinquent)).unwrap();
        assert_eq!(next.exercise_date, None);
        assert_eq!(next.exercise_amount, Real::ZERO);
    }

    #[test]
    fn seller_exercise_is_an_outflow() {
        let mut terms = guarantee();
        terms.contract_role = crate::types::ContractRole::Seller;
        let state = initial_state(&terms).unwrap();
        let next = stf_xd(&terms, &state, &notice(ContractStatus::Defaulted)).unwrap();
        assert!(next.exercise_amount.is_negative());
    }
}
