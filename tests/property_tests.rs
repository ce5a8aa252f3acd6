//! Property-based tests for the lifecycle kernel.
//!
//! These tests verify invariants hold under random terms.

use actus_core::contracts::apply_event;
use actus_core::*;
use proptest::prelude::*;

fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    Timestamp::from_ymd(y, m, d).unwrap()
}

fn years_after(start: Timestamp, years: u32) -> Timestamp {
    calendar::cycle_date(start, &Cycle::new(years, Period::Year, Stub::Short), 1, EndOfMonthConvention::SameDay).unwrap()
}

fn loan(notional: i64, bps: i64, years: u32, months: u32, role: ContractRole) -> Terms {
    let mut terms = TermsPreset::BulletLoan.terms("prop-loan", ts(2024, 1, 1)).unwrap();
    let ied = terms.dates.initial_exchange_date.unwrap();
    terms.contract_role = role;
    terms.notional.notional_principal = Real::from_int(notional);
    terms.interest.nominal_interest_rate = Real::from_bps(bps);
    terms.interest.cycle_of_interest_payment = Some(Cycle::months(months));
    terms.dates.maturity_date = Some(years_after(ied, years));
    terms
}

fn mortgage(notional: i64, bps: i64, years: u32, role: ContractRole) -> Terms {
    let mut terms = TermsPreset::Mortgage.terms("prop-annuity", ts(2024, 1, 1)).unwrap();
    let ied = terms.dates.initial_exchange_date.unwrap();
    terms.contract_role = role;
    terms.notional.notional_principal = Real::from_int(notional);
    terms.interest.nominal_interest_rate = Real::from_bps(bps);
    terms.dates.maturity_date = Some(years_after(ied, years));
    terms
}

fn enhancement(collateral: bool, role: ContractRole, notional: i64, coverage_pct: i64) -> Terms {
    let preset = if collateral { TermsPreset::Collateral } else { TermsPreset::Guarantee };
    let mut terms = preset.terms("prop-enhancement", ts(2024, 1, 1)).unwrap();
    terms.contract_role = role;
    terms.notional.notional_principal = Real::from_int(notional);
    terms.credit_enhancement.coverage_of_credit_enhancement = Real::from_ratio(coverage_pct, 100).unwrap();
    terms
}

fn months_after(start: Timestamp, months: u32) -> Timestamp {
    calendar::cycle_date(start, &Cycle::months(months), 1, EndOfMonthConvention::SameDay).unwrap()
}

/// Mirrored roles hold the same balances with opposite signs.
fn mirrored(a: &State, b: &State) -> bool {
    let balances = [
        (a.notional_principal, b.notional_principal),
        (a.accrued_interest, b.accrued_interest),
        (a.fee_accrued, b.fee_accrued),
        (a.next_principal_redemption_payment, b.next_principal_redemption_payment),
        (a.exercise_amount, b.exercise_amount),
    ];
    balances
        .iter()
        .all(|(x, y)| x.abs().unwrap() == y.abs().unwrap() && *x == y.neg().unwrap())
        && a.nominal_interest_rate == b.nominal_interest_rate
        && a.contract_status == b.contract_status
        && a.status_date == b.status_date
        && a.exercise_date == b.exercise_date
}

// Strategies for generating test data
fn notional_strategy() -> impl Strategy<Value = i64> {
    1_000i64..10_000_000i64 // $1,000 to $10m
}

fn rate_strategy() -> impl Strategy<Value = i64> {
    0i64..=2_000i64 // 0% to 20% in bps
}

fn cycle_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![Just(1u32), Just(3u32), Just(6u32), Just(12u32)]
}

fn day_count_strategy() -> impl Strategy<Value = DayCountConvention> {
    prop_oneof![
        Just(DayCountConvention::ActualActualIsda),
        Just(DayCountConvention::Actual360),
        Just(DayCountConvention::Actual365),
        Just(DayCountConvention::ThirtyE360Isda),
        Just(DayCountConvention::ThirtyE360),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Same inputs, bit-identical outputs
    #[test]
    fn evaluation_is_deterministic(
        notional in notional_strategy(),
        bps in rate_strategy(),
        years in 1u32..=10,
        months in cycle_strategy(),
        dcc in day_count_strategy(),
    ) {
        let mut terms = loan(notional, bps, years, months, ContractRole::RealPositionAsset);
        terms.conventions.day_count_convention = dcc;
        let state = compute_initial_state(&terms).unwrap();
        let ext = ExternalData::new();
        let horizon = ts(2040, 1, 1);
        let first = evaluate_until(&terms, &state, horizon, &ext).unwrap();
        let second = evaluate_until(&terms, &state, horizon, &ext).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Expected schedule is ordered and strictly after the status date
    #[test]
    fn schedule_is_monotone(
        years in 1u32..=30,
        months in cycle_strategy(),
        with_fees in any::<bool>(),
    ) {
        let mut terms = loan(1_000_000, 500, years, months, ContractRole::RealPositionAsset);
        if with_fees {
            terms.fees.cycle_of_fee = Some(Cycle::months(months));
            terms.fees.fee_rate = Real::from_bps(10);
        }
        let schedule = compute_expected_schedule(&terms).unwrap();
        prop_assert!(schedule.windows(2).all(|w| w[0].key() <= w[1].key()));
        prop_assert!(schedule.iter().all(|e| e.event_time > terms.dates.status_date));
        // interest pays once per cycle plus maturity
        let coupons = schedule.iter().filter(|e| e.event_type == EventType::InterestPayment).count();
        prop_assert_eq!(coupons as u32, years * 12 / months);
    }

    /// Validating a computed state always succeeds, any number of times
    #[test]
    fn validation_is_idempotent(
        notional in notional_strategy(),
        bps in rate_strategy(),
        years in 1u32..=5,
        months_ahead in 1u32..60,
    ) {
        let terms = loan(notional, bps, years, 6, ContractRole::RealPositionAsset);
        let ext = ExternalData::new();
        let initial = compute_initial_state(&terms).unwrap();
        prop_assert!(validate_initial_state(&terms, &initial).unwrap());
        prop_assert!(validate_initial_state(&terms, &initial).unwrap());

        let at = calendar::cycle_date(ts(2024, 1, 1), &Cycle::months(months_ahead), 1, EndOfMonthConvention::SameDay).unwrap();
        let next = compute_next_state(&terms, &initial, at, &ext).unwrap();
        prop_assert!(validate_next_state(&terms, &initial, at, &ext, &next).unwrap());
        prop_assert!(validate_next_state(&terms, &initial, at, &ext, &next).unwrap());
    }

    /// Lender and borrower see the same cash flows with opposite signs
    #[test]
    fn loan_roles_are_symmetric(
        notional in notional_strategy(),
        bps in rate_strategy(),
        years in 1u32..=10,
        months in cycle_strategy(),
        months_ahead in 1u32..=120,
    ) {
        let ext = ExternalData::new();
        let horizon = ts(2040, 1, 1);
        let asset = loan(notional, bps, years, months, ContractRole::RealPositionAsset);
        let liability = loan(notional, bps, years, months, ContractRole::RealPositionLiability);
        let asset_state = compute_initial_state(&asset).unwrap();
        let liability_state = compute_initial_state(&liability).unwrap();

        let a = evaluate_until(&asset, &asset_state, horizon, &ext).unwrap();
        let l = evaluate_until(&liability, &liability_state, horizon, &ext).unwrap();
        prop_assert_eq!(a.payoffs.len(), l.payoffs.len());
        for (pa, pl) in a.payoffs.iter().zip(&l.payoffs) {
            prop_assert_eq!(pa.event_type, pl.event_type);
            prop_assert_eq!(pa.payoff, pl.payoff.neg().unwrap());
        }

        // mid-life balances are mirrored too
        let mid = months_after(ts(2024, 1, 2), months_ahead);
        let a_mid = evaluate_until(&asset, &asset_state, mid, &ext).unwrap();
        let l_mid = evaluate_until(&liability, &liability_state, mid, &ext).unwrap();
        prop_assert!(mirrored(&a_mid.state, &l_mid.state));
    }

    /// Same for annuities, including the annuity amount itself
    #[test]
    fn annuity_roles_are_symmetric(
        notional in notional_strategy(),
        bps in rate_strategy(),
        years in 1u32..=5,
        months_ahead in 1u32..=60,
    ) {
        let ext = ExternalData::new();
        let horizon = ts(2030, 1, 1);
        let asset = mortgage(notional, bps, years, ContractRole::RealPositionAsset);
        let liability = mortgage(notional, bps, years, ContractRole::RealPositionLiability);
        let asset_state = compute_initial_state(&asset).unwrap();
        let liability_state = compute_initial_state(&liability).unwrap();

        let a = evaluate_until(&asset, &asset_state, horizon, &ext).unwrap();
        let l = evaluate_until(&liability, &liability_state, horizon, &ext).unwrap();
        prop_assert_eq!(a.total().unwrap(), l.total().unwrap().neg().unwrap());
        prop_assert_eq!(a.state.contract_status, ContractStatus::Terminated);

        let mid = months_after(ts(2024, 1, 2), months_ahead);
        let a_mid = evaluate_until(&asset, &asset_state, mid, &ext).unwrap();
        let l_mid = evaluate_until(&liability, &liability_state, mid, &ext).unwrap();
        prop_assert!(mirrored(&a_mid.state, &l_mid.state));
    }

    /// Buyer and seller of a guarantee or collateral mirror each other
    /// through fees, exercise and settlement
    #[test]
    fn credit_enhancement_roles_are_symmetric(
        collateral in any::<bool>(),
        notional in notional_strategy(),
        coverage_pct in 1i64..=100,
        exercise_day in 1i64..700,
        exposure in notional_strategy(),
        interest in 0i64..100_000,
        collateral_value in 1i64..10_000_000,
    ) {
        let exercise_at = ts(2024, 1, 2).add_days(exercise_day);
        let covered = CoveredExposure {
            status: ContractStatus::Defaulted,
            notional_principal: Real::from_int(exposure),
            accrued_interest: Real::from_int(interest),
            collateral_value: Real::from_int(collateral_value),
        };
        let run = |role| {
            let terms = enhancement(collateral, role, notional, coverage_pct);
            let mut ext = ExternalData::new();
            ext.inject(
                Event::new(terms.contract_type, EventType::Exercise, exercise_at)
                    .with_payload(encode_exposure(&covered)),
            );
            let state = compute_initial_state(&terms).unwrap();
            let exercised = evaluate_until(&terms, &state, exercise_at, &ext).unwrap();
            let settled = evaluate_until(&terms, &state, ts(2030, 1, 1), &ext).unwrap();
            (state, exercised, settled)
        };
        let (buy_state, buy_exercised, buy_settled) = run(ContractRole::Buyer);
        let (sell_state, sell_exercised, sell_settled) = run(ContractRole::Seller);

        prop_assert!(mirrored(&buy_state, &sell_state));
        prop_assert!(buy_exercised.state.exercise_amount.is_positive());
        prop_assert!(mirrored(&buy_exercised.state, &sell_exercised.state));

        prop_assert_eq!(buy_settled.payoffs.len(), sell_settled.payoffs.len());
        prop_assert!(buy_settled.payoffs.iter().any(|p| p.event_type == EventType::Settlement));
        for (pb, ps) in buy_settled.payoffs.iter().zip(&sell_settled.payoffs) {
            prop_assert_eq!(pb.event_type, ps.event_type);
            prop_assert_eq!(pb.event_time, ps.event_time);
            prop_assert_eq!(pb.payoff, ps.payoff.neg().unwrap());
        }
        prop_assert!(mirrored(&buy_settled.state, &sell_settled.state));
        prop_assert_eq!(buy_settled.state.contract_status, ContractStatus::Terminated);
    }

    /// Nothing already applied can be applied again
    #[test]
    fn stale_transitions_are_rejected(
        years in 2u32..=10,
        months_ahead in 1u32..24,
        days_back in 1i64..400,
    ) {
        let terms = loan(1_000_000, 500, years, 3, ContractRole::RealPositionAsset);
        let ext = ExternalData::new();
        let state = compute_initial_state(&terms).unwrap();
        let at = calendar::cycle_date(ts(2024, 1, 2), &Cycle::months(months_ahead), 1, EndOfMonthConvention::SameDay).unwrap();
        let advanced = compute_next_state(&terms, &state, at, &ext).unwrap();
        let watermark = advanced.watermark();

        let earlier = watermark.time.add_days(-days_back);
        let stale = compute_next_state(&terms, &advanced, earlier, &ext);
        let is_stale = matches!(stale, Err(ActusError::StaleStateTransition { .. }));
        prop_assert!(is_stale);

        for event in compute_expected_schedule(&terms).unwrap().iter().filter(|e| e.key() <= watermark) {
            let replay = apply_event(&terms, &advanced, event);
            let is_stale = matches!(replay, Err(ActusError::StaleStateTransition { .. }));
            prop_assert!(is_stale);
        }
    }

    /// Total coupon over the life is notional * rate * years under 30E/360
    #[test]
    fn lifetime_interest_matches_simple_interest(
        notional in notional_strategy(),
        bps in rate_strategy(),
        years in 1u32..=10,
        months in cycle_strategy(),
    ) {
        let terms = loan(notional, bps, years, months, ContractRole::RealPositionAsset);
        let state = compute_initial_state(&terms).unwrap();
        let eval = evaluate_until(&terms, &state, ts(2040, 1, 1), &ExternalData::new()).unwrap();
        let interest = Real::checked_sum(
            eval.payoffs.iter().filter(|p| p.event_type == EventType::InterestPayment).map(|p| p.payoff),
        ).unwrap();
        let expected = Real::from_int(notional)
            .mul(Real::from_bps(bps)).unwrap()
            .mul(Real::from_int(i64::from(years))).unwrap();
        let tolerance = Real::from_ratio(1, 1_000_000).unwrap();
        prop_assert!(interest.sub(expected).unwrap().abs().unwrap() <= tolerance);
    }

    /// Portfolio evaluation matches evaluating each contract alone
    #[test]
    fn portfolio_matches_sequential(
        notionals in prop::collection::vec(notional_strategy(), 1..12),
        bps in rate_strategy(),
    ) {
        let entries: Vec<PortfolioEntry> = notionals
            .iter()
            .map(|n| PortfolioEntry::new(loan(*n, bps, 3, 6, ContractRole::RealPositionAsset)))
            .collect();
        let at = ts(2025, 6, 30);
        let outcomes = evaluate_portfolio(&entries, at);
        for (entry, outcome) in entries.iter().zip(&outcomes) {
            let state = compute_initial_state(&entry.terms).unwrap();
            let alone = evaluate_until(&entry.terms, &state, at, &entry.external).unwrap();
            prop_assert_eq!(outcome.result.as_ref().unwrap(), &alone);
        }
    }

    /// Fixed-point add and sub are inverse, mul by one is identity
    #[test]
    fn real_arithmetic_laws(a in -1_000_000_000i64..1_000_000_000i64, b in -1_000_000_000i64..1_000_000_000i64) {
        let x = Real::from_int(a);
        let y = Real::from_int(b);
        prop_assert_eq!(x.add(y).unwrap().sub(y).unwrap(), x);
        prop_assert_eq!(x.mul(Real::ONE).unwrap(), x);
        prop_assert_eq!(x.neg().unwrap().neg().unwrap(), x);
        if b != 0 {
            prop_assert_eq!(x.mul(y).unwrap().div(y).unwrap(), x);
        }
    }
}

#[test]
fn division_by_zero_is_an_error() {
    assert_eq!(Real::ONE.div(Real::ZERO), Err(MathError::DivisionByZero));
}

#[test]
fn overflow_is_an_error() {
    let huge = Real::from_raw(i128::MAX / 2);
    assert!(matches!(huge.mul(Real::from_int(4)), Err(MathError::Overflow { .. })));
    assert!(matches!(huge.add(huge).and_then(|v| v.add(huge)), Err(MathError::Overflow { .. })));
}
