//! End-to-end lifecycle tests
//!
//! Each contract type from terms to its final state, plus the boundary cases
//! of the kernel.

use actus_core::contracts::{apply_event, lookup};
use actus_core::*;
use rust_decimal_macros::dec;

fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    Timestamp::from_ymd(y, m, d).unwrap()
}

fn real(value: rust_decimal::Decimal) -> Real {
    Real::from_decimal(value).unwrap()
}

fn payoffs_of(eval: &Evaluation, event_type: EventType) -> Vec<Real> {
    eval.payoffs
        .iter()
        .filter(|p| p.event_type == event_type)
        .map(|p| p.payoff)
        .collect()
}

mod principal_at_maturity {
    use super::*;

    #[test]
    fn one_year_simple_interest_actual_360() {
        let mut terms = TermsPreset::BulletLoan.terms("pam-a360", ts(2024, 1, 1)).unwrap();
        let ied = terms.dates.initial_exchange_date.unwrap();
        terms.conventions.day_count_convention = DayCountConvention::Actual360;
        terms.interest.cycle_of_interest_payment = None;
        terms.dates.maturity_date = Some(ied.add_days(360));

        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2025, 6, 1), &ExternalData::new()).unwrap();

        assert_eq!(payoffs_of(&eval, EventType::InitialExchange), vec![Real::from_int(-1_000_000)]);
        assert_eq!(payoffs_of(&eval, EventType::InterestPayment), vec![Real::from_int(50_000)]);
        assert_eq!(payoffs_of(&eval, EventType::Maturity), vec![Real::from_int(1_000_000)]);
        assert_eq!(eval.state.contract_status, ContractStatus::Terminated);
        assert_eq!(eval.state.notional_principal, Real::ZERO);
    }

    #[test]
    fn interest_capitalizes_until_end_date() {
        let mut terms = TermsPreset::BulletLoan.terms("pam-ipci", ts(2024, 1, 1)).unwrap();
        terms.dates.capitalization_end_date = Some(ts(2025, 1, 2));

        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2025, 7, 2), &ExternalData::new()).unwrap();

        let capitalizations = payoffs_of(&eval, EventType::InterestCapitalization);
        assert_eq!(capitalizations, vec![Real::ZERO, Real::ZERO]);
        // 1,000,000 * 1.025 * 1.025, then half a year of interest on it
        assert_eq!(eval.state.notional_principal, real(dec!(1050625)));
        assert_eq!(payoffs_of(&eval, EventType::InterestPayment), vec![real(dec!(26265.625))]);
    }

    #[test]
    fn purchase_after_exchange_takes_over_the_funded_loan() {
        let mut terms = TermsPreset::BulletLoan.terms("pam-prd", ts(2024, 1, 1)).unwrap();
        terms.dates.purchase_date = Some(ts(2024, 6, 1));
        terms.notional.price_at_purchase_date = Real::from_int(990_000);
        assert!(terms.validate().is_ok());

        let ext = ExternalData::new();
        let state = compute_initial_state(&terms).unwrap();
        let bought = evaluate_until(&terms, &state, ts(2024, 6, 1), &ext).unwrap();
        assert_eq!(bought.payoffs.len(), 1);
        assert_eq!(bought.state.notional_principal, Real::from_int(1_000_000));
        assert_eq!(bought.state.nominal_interest_rate, real(dec!(0.05)));

        // price plus 149 days of 30E/360 interest the seller earned since IED
        let prd = payoffs_of(&bought, EventType::Purchase)[0];
        assert!(prd < Real::from_int(-1_010_694) && prd > Real::from_int(-1_010_695), "prd {}", prd);

        let rest = evaluate_until(&terms, &bought.state, ts(2030, 1, 1), &ext).unwrap();
        assert!(payoffs_of(&rest, EventType::InitialExchange).is_empty());
        let coupons = payoffs_of(&rest, EventType::InterestPayment);
        assert_eq!(coupons.len(), 10);
        // the first coupon repays what the buyer advanced at purchase
        let first_gap = coupons[0].sub(Real::from_int(25_000)).unwrap().abs().unwrap();
        assert!(first_gap < real(dec!(0.000001)));
        assert!(coupons[1..].iter().all(|c| *c == Real::from_int(25_000)));
        assert_eq!(payoffs_of(&rest, EventType::Maturity), vec![Real::from_int(1_000_000)]);
        assert_eq!(rest.state.contract_status, ContractStatus::Terminated);
    }

    #[test]
    fn purchase_before_exchange_leaves_funding_to_ied() {
        let mut terms = TermsPreset::BulletLoan.terms("pam-early-prd", ts(2024, 1, 1)).unwrap();
        terms.dates.initial_exchange_date = Some(ts(2024, 3, 1));
        terms.dates.purchase_date = Some(ts(2024, 2, 1));
        terms.notional.price_at_purchase_date = Real::from_int(5_000);

        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2024, 3, 1), &ExternalData::new()).unwrap();
        assert_eq!(payoffs_of(&eval, EventType::Purchase), vec![Real::from_int(-5_000)]);
        assert_eq!(payoffs_of(&eval, EventType::InitialExchange), vec![Real::from_int(-1_000_000)]);
        assert_eq!(eval.state.notional_principal, Real::from_int(1_000_000));
    }

    #[test]
    fn rate_resets_respect_caps() {
        let mut terms = TermsPreset::BulletLoan.terms("pam-rr", ts(2024, 1, 1)).unwrap();
        terms.rate_reset.cycle_of_rate_reset = Some(Cycle::months(6));
        terms.rate_reset.rate_spread = real(dec!(0.015));
        terms.rate_reset.period_cap = Some(real(dec!(0.01)));
        terms.rate_reset.life_cap = Some(real(dec!(0.08)));

        let mut ext = ExternalData::new();
        let fixings = [
            (ts(2024, 7, 2), dec!(0.04), dec!(0.055)),
            (ts(2025, 1, 2), dec!(0.055), dec!(0.065)),
            (ts(2025, 7, 2), dec!(0.07), dec!(0.075)),
            (ts(2026, 1, 2), dec!(0.09), dec!(0.08)),
        ];
        for (at, market, _) in fixings {
            ext.observe(at, EventType::RateReset, encode_rate(real(market)));
        }

        let mut state = compute_initial_state(&terms).unwrap();
        for (at, _, expected) in fixings {
            state = compute_next_state(&terms, &state, at, &ext).unwrap();
            assert_eq!(state.nominal_interest_rate, real(expected), "reset at {}", at);
        }
    }

    #[test]
    fn missing_fixing_is_reported() {
        let mut terms = TermsPreset::BulletLoan.terms("pam-rr", ts(2024, 1, 1)).unwrap();
        terms.rate_reset.cycle_of_rate_reset = Some(Cycle::months(6));
        let state = compute_initial_state(&terms).unwrap();
        let err = compute_next_state(&terms, &state, ts(2024, 12, 31), &ExternalData::new()).unwrap_err();
        assert!(matches!(
            err,
            ActusError::MissingExternalData {
                event_type: EventType::RateReset,
                ..
            }
        ));
    }

    #[test]
    fn known_next_rate_fixes_first_reset() {
        let mut terms = TermsPreset::BulletLoan.terms("pam-rrf", ts(2024, 1, 1)).unwrap();
        terms.rate_reset.cycle_of_rate_reset = Some(Cycle::months(12));
        terms.rate_reset.next_reset_rate = Some(real(dec!(0.06)));
        let schedule = compute_expected_schedule(&terms).unwrap();
        let first = schedule
            .iter()
            .find(|e| matches!(e.event_type, EventType::RateReset | EventType::RateResetFixed))
            .unwrap();
        assert_eq!(first.event_type, EventType::RateResetFixed);

        let state = compute_initial_state(&terms).unwrap();
        let next = compute_next_state(&terms, &state, ts(2025, 1, 2), &ExternalData::new()).unwrap();
        assert_eq!(next.nominal_interest_rate, real(dec!(0.06)));
    }

    #[test]
    fn credit_event_closes_the_loan() {
        let terms = TermsPreset::BulletLoan.terms("pam-ce", ts(2024, 1, 1)).unwrap();
        let mut ext = ExternalData::new();
        ext.inject(
            Event::new(terms.contract_type, EventType::CreditEvent, ts(2024, 3, 1))
                .with_payload(encode_credit_event(ContractStatus::Defaulted)),
        );
        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2030, 1, 1), &ext).unwrap();
        let types: Vec<_> = eval.payoffs.iter().map(|p| p.event_type).collect();
        assert_eq!(types, vec![EventType::InitialExchange, EventType::CreditEvent]);
        assert_eq!(eval.state.contract_status, ContractStatus::Defaulted);
        assert!(compute_pending_schedule(&terms, &eval.state, ts(2030, 1, 1)).unwrap().is_empty());
        assert_eq!(
            compute_due_payoff(&terms, &eval.state, ts(2030, 1, 1), &ext).unwrap(),
            Real::ZERO
        );
    }

    #[test]
    fn unresolved_delinquency_defaults() {
        let mut terms = TermsPreset::BulletLoan.terms("pam-dl", ts(2024, 1, 1)).unwrap();
        terms.performance.delinquency_period = Some(Cycle::months(9));
        let mut ext = ExternalData::new();
        ext.observe(ts(2024, 7, 2), EventType::InterestPayment, encode_settlement(true));
        ext.observe(ts(2025, 1, 2), EventType::InterestPayment, encode_settlement(true));
        ext.observe(ts(2025, 7, 2), EventType::InterestPayment, encode_settlement(true));

        let state = compute_initial_state(&terms).unwrap();
        let late = compute_next_state(&terms, &state, ts(2025, 1, 31), &ext).unwrap();
        assert_eq!(late.contract_status, ContractStatus::Delinquent);
        assert_eq!(late.non_performing_date, Some(ts(2024, 7, 2)));

        let defaulted = compute_next_state(&terms, &late, ts(2025, 12, 31), &ext).unwrap();
        assert_eq!(defaulted.contract_status, ContractStatus::Defaulted);
        // nothing after the default was applied
        assert_eq!(defaulted.last_event.map(|k| k.time), Some(ts(2025, 7, 2)));
    }
}

mod annuity {
    use super::*;

    fn mortgage(years: u32) -> Terms {
        let mut terms = TermsPreset::Mortgage.terms("ann", ts(2024, 1, 1)).unwrap();
        let ied = terms.dates.initial_exchange_date.unwrap();
        terms.dates.maturity_date =
            Some(calendar::cycle_date(ied, &Cycle::months(12), years, EndOfMonthConvention::SameDay).unwrap());
        terms
    }

    #[test]
    fn thirty_year_payment_matches_annuity_formula() {
        let terms = TermsPreset::Mortgage.terms("ann-30y", ts(2024, 1, 1)).unwrap();
        let state = compute_initial_state(&terms).unwrap();
        let funded = compute_next_state(&terms, &state, ts(2024, 1, 2), &ExternalData::new()).unwrap();
        // 300,000 at 4% over 360 months
        let expected = real(dec!(1432.2458));
        let diff = funded.next_principal_redemption_payment.sub(expected).unwrap().abs().unwrap();
        assert!(diff < real(dec!(0.001)), "payment {}", funded.next_principal_redemption_payment);
    }

    #[test]
    fn every_period_pays_the_annuity() {
        let terms = mortgage(2);
        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2030, 1, 1), &ExternalData::new()).unwrap();
        let annuity = {
            let funded = compute_next_state(&terms, &state, ts(2024, 1, 2), &ExternalData::new()).unwrap();
            funded.next_principal_redemption_payment
        };

        let redemptions: Vec<_> = eval
            .payoffs
            .iter()
            .filter(|p| p.event_type == EventType::PrincipalRedemption)
            .collect();
        assert_eq!(redemptions.len(), 23);
        for pr in redemptions {
            let interest = eval
                .payoffs
                .iter()
                .find(|p| p.event_type == EventType::InterestPayment && p.event_time == pr.event_time)
                .unwrap();
            assert_eq!(pr.payoff.add(interest.payoff).unwrap(), annuity);
        }

        // the last period clears the rest: within a cent of one more payment
        let md = terms.dates.maturity_date.unwrap();
        let last: Real = Real::checked_sum(
            eval.payoffs
                .iter()
                .filter(|p| p.event_time == md)
                .map(|p| p.payoff),
        )
        .unwrap();
        assert!(last.sub(annuity).unwrap().abs().unwrap() < real(dec!(0.01)));
        assert_eq!(eval.state.contract_status, ContractStatus::Terminated);
    }

    #[test]
    fn purchase_takes_over_the_amortized_balance() {
        let ext = ExternalData::new();
        let whole = mortgage(3);
        let seller = evaluate_until(&whole, &compute_initial_state(&whole).unwrap(), ts(2024, 6, 15), &ext).unwrap();
        let repaid_before = Real::checked_sum(payoffs_of(&seller, EventType::PrincipalRedemption)).unwrap();
        assert!(repaid_before.is_positive());

        let mut terms = mortgage(3);
        terms.dates.purchase_date = Some(ts(2024, 6, 15));
        terms.notional.price_at_purchase_date = Real::from_int(290_000);
        let state = compute_initial_state(&terms).unwrap();
        let bought = evaluate_until(&terms, &state, ts(2024, 6, 15), &ext).unwrap();
        assert_eq!(bought.payoffs.len(), 1);
        assert_eq!(bought.state.notional_principal, seller.state.notional_principal);
        assert_eq!(
            bought.state.next_principal_redemption_payment,
            seller.state.next_principal_redemption_payment
        );

        let rest = evaluate_until(&terms, &bought.state, ts(2030, 1, 1), &ext).unwrap();
        let repaid_after = Real::checked_sum(
            rest.payoffs
                .iter()
                .filter(|p| matches!(p.event_type, EventType::PrincipalRedemption | EventType::Maturity))
                .map(|p| p.payoff),
        )
        .unwrap();
        assert_eq!(repaid_before.add(repaid_after).unwrap(), Real::from_int(300_000));
    }

    #[test]
    fn principal_repaid_in_full() {
        let terms = mortgage(3);
        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2030, 1, 1), &ExternalData::new()).unwrap();
        let principal = Real::checked_sum(
            eval.payoffs
                .iter()
                .filter(|p| matches!(p.event_type, EventType::PrincipalRedemption | EventType::Maturity))
                .map(|p| p.payoff),
        )
        .unwrap();
        assert_eq!(principal, Real::from_int(300_000));
    }
}

mod credit_enhancement {
    use super::*;

    fn exposure(status: ContractStatus, notional: i64, collateral: i64) -> CoveredExposure {
        CoveredExposure {
            status,
            notional_principal: Real::from_int(notional),
            accrued_interest: Real::from_int(2_500),
            collateral_value: Real::from_int(collateral),
        }
    }

    fn notice(terms: &Terms, at: Timestamp, exposure: &CoveredExposure) -> ExternalData {
        let mut ext = ExternalData::new();
        ext.inject(Event::new(terms.contract_type, EventType::Exercise, at).with_payload(encode_exposure(exposure)));
        ext
    }

    fn fee_free_guarantee() -> Terms {
        let mut terms = TermsPreset::Guarantee.terms("ceg", ts(2024, 1, 1)).unwrap();
        terms.fees.cycle_of_fee = None;
        terms.fees.fee_rate = Real::ZERO;
        terms
    }

    #[test]
    fn guarantee_pays_coverage_times_notional() {
        let terms = fee_free_guarantee();
        let ext = notice(&terms, ts(2025, 5, 1), &exposure(ContractStatus::Defaulted, 500_000, 0));
        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2025, 12, 31), &ext).unwrap();

        assert_eq!(payoffs_of(&eval, EventType::Purchase), vec![Real::from_int(-2_000)]);
        assert_eq!(payoffs_of(&eval, EventType::Settlement), vec![Real::from_int(400_000)]);
        let settled = eval.payoffs.last().unwrap();
        assert_eq!(settled.event_time, ts(2025, 5, 11));
        assert_eq!(eval.state.contract_status, ContractStatus::Terminated);
    }

    #[test]
    fn guarantee_can_cover_interest() {
        let mut terms = fee_free_guarantee();
        terms.credit_enhancement.guaranteed_exposure = GuaranteedExposure::NominalPlusInterest;
        let ext = notice(&terms, ts(2025, 5, 1), &exposure(ContractStatus::Defaulted, 500_000, 0));
        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2025, 12, 31), &ext).unwrap();
        assert_eq!(payoffs_of(&eval, EventType::Settlement), vec![Real::from_int(402_000)]);
    }

    #[test]
    fn delinquency_alone_does_not_exercise_default_cover() {
        let terms = fee_free_guarantee();
        let ext = notice(&terms, ts(2025, 5, 1), &exposure(ContractStatus::Delinquent, 500_000, 0));
        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2030, 1, 1), &ext).unwrap();
        assert!(payoffs_of(&eval, EventType::Settlement).is_empty());
        assert_eq!(payoffs_of(&eval, EventType::Maturity), vec![Real::ZERO]);
        assert_eq!(eval.state.exercise_date, None);
    }

    #[test]
    fn collateral_call_is_capped() {
        let terms = TermsPreset::Collateral.terms("cec", ts(2024, 1, 1)).unwrap();
        let ext = notice(&terms, ts(2024, 9, 1), &exposure(ContractStatus::Delinquent, 400_000, 250_000));
        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2024, 12, 31), &ext).unwrap();
        assert_eq!(payoffs_of(&eval, EventType::Settlement), vec![Real::from_int(250_000)]);
        assert_eq!(eval.state.contract_status, ContractStatus::Terminated);
    }

    #[test]
    fn collateral_settlement_adds_fees() {
        let terms = TermsPreset::Collateral.terms("cec", ts(2024, 1, 1)).unwrap();
        let mut state = compute_initial_state(&terms).unwrap();
        state.exercise_amount = Real::from_int(100_000);
        state.fee_accrued = Real::from_int(5);
        let settlement = lookup(ContractType::CreditEnhancementCollateral, EventType::Settlement).unwrap();
        let event = Event::new(terms.contract_type, EventType::Settlement, ts(2024, 3, 1));
        assert_eq!((settlement.payoff)(&terms, &state, &event).unwrap(), Real::from_int(100_005));
    }

    #[test]
    fn credit_enhancements_reject_own_credit_events() {
        let terms = fee_free_guarantee();
        let mut ext = ExternalData::new();
        ext.inject(
            Event::new(terms.contract_type, EventType::CreditEvent, ts(2024, 6, 1))
                .with_payload(encode_credit_event(ContractStatus::Defaulted)),
        );
        let state = compute_initial_state(&terms).unwrap();
        let err = evaluate_until(&terms, &state, ts(2024, 12, 31), &ext).unwrap_err();
        assert_eq!(
            err,
            ActusError::UnsupportedEventType {
                contract_type: ContractType::CreditEnhancementGuarantee,
                event_type: EventType::CreditEvent,
            }
        );
    }

    #[test]
    fn exercise_without_exposure_is_reported() {
        let terms = fee_free_guarantee();
        let mut ext = ExternalData::new();
        ext.inject(Event::new(terms.contract_type, EventType::Exercise, ts(2024, 6, 1)));
        let state = compute_initial_state(&terms).unwrap();
        let err = evaluate_until(&terms, &state, ts(2024, 12, 31), &ext).unwrap_err();
        assert!(matches!(err, ActusError::MissingExternalData { .. }));
    }
}

mod boundaries {
    use super::*;

    #[test]
    fn empty_schedule_has_zero_due_payoff() {
        let mut terms = TermsPreset::BulletLoan.terms("done", ts(2024, 1, 1)).unwrap();
        terms.dates.status_date = ts(2035, 1, 1);
        assert!(compute_expected_schedule(&terms).unwrap().is_empty());
        let state = compute_initial_state(&terms).unwrap();
        let due = compute_due_payoff(&terms, &state, ts(2036, 1, 1), &ExternalData::new()).unwrap();
        assert_eq!(due, Real::ZERO);
    }

    #[test]
    fn zero_count_cycle_is_invalid() {
        let mut terms = TermsPreset::BulletLoan.terms("zero", ts(2024, 1, 1)).unwrap();
        terms.interest.cycle_of_interest_payment = Some(Cycle::new(0, Period::Month, Stub::Short));
        assert!(matches!(compute_initial_state(&terms), Err(ActusError::InvalidTerms { .. })));
        assert!(matches!(compute_expected_schedule(&terms), Err(ActusError::InvalidTerms { .. })));
        assert!(matches!(
            Engine::new(terms, EngineConfig::default()),
            Err(ActusError::InvalidTerms { .. })
        ));
    }

    #[test]
    fn closed_state_accepts_nothing() {
        let terms = TermsPreset::BulletLoan.terms("closed", ts(2024, 1, 1)).unwrap();
        let state = compute_initial_state(&terms).unwrap();
        let done = compute_next_state(&terms, &state, ts(2030, 1, 1), &ExternalData::new()).unwrap();
        assert_eq!(done.contract_status, ContractStatus::Terminated);
        let late = Event::new(terms.contract_type, EventType::InterestPayment, ts(2031, 1, 1));
        assert!(matches!(
            apply_event(&terms, &done, &late),
            Err(ActusError::ContractClosed { .. })
        ));
    }

    #[test]
    fn terms_load_from_json() {
        let json = r#"{
            "contract_id": "json-1",
            "contract_type": "PAM",
            "contract_role": "RPA",
            "currency": "EUR",
            "conventions": { "day_count_convention": "A/360" },
            "dates": {
                "status_date": 1704067200,
                "initial_exchange_date": 1704153600,
                "maturity_date": 1735689600
            },
            "notional": { "notional_principal": 250000000000000000000000 },
            "interest": { "nominal_interest_rate": 40000000000000000, "cycle_of_interest_payment": "3M-" }
        }"#;
        let terms = Terms::from_json(json).unwrap();
        assert_eq!(terms.contract_type, ContractType::PrincipalAtMaturity);
        assert_eq!(terms.notional.notional_principal, Real::from_int(250_000));
        assert!(!compute_expected_schedule(&terms).unwrap().is_empty());
    }
}
