//! ACTUS lifecycle simulation.
//!
//! Walks each supported contract type through its lifecycle: schedule
//! generation, payoffs, state transitions, credit events and a parallel
//! portfolio run.

use actus_core::*;
use rust_decimal_macros::dec;

fn main() -> Result<(), ActusError> {
    env_logger::init();

    println!("ACTUS Contract Lifecycle Simulation");
    println!("PAM, ANN, CEG and CEC on a fixed-point kernel\n");

    scenario_1_bullet_loan()?;
    scenario_2_mortgage()?;
    scenario_3_rate_reset()?;
    scenario_4_missed_payments()?;
    scenario_5_guarantee()?;
    scenario_6_collateral()?;
    scenario_7_portfolio()?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn date(y: i32, m: u32, d: u32) -> Result<Timestamp, ActusError> {
    Timestamp::from_ymd(y, m, d).ok_or_else(|| ActusError::invalid_terms("date", format!("{}-{}-{}", y, m, d)))
}

fn print_payoffs(evaluation: &Evaluation) -> Result<(), ActusError> {
    for p in &evaluation.payoffs {
        println!("    {} {:<5} {:>20}", p.event_time, p.event_type.code(), p.payoff);
    }
    println!("    net {:>33}", evaluation.total()?);
    Ok(())
}

/// Bullet loan from exchange to maturity.
fn scenario_1_bullet_loan() -> Result<(), ActusError> {
    println!("Scenario 1: Bullet Loan (PAM)\n");

    let terms = TermsPreset::BulletLoan.terms("loan-1", date(2024, 1, 1)?)?;
    let mut engine = Engine::new(terms, EngineConfig::default())?;
    engine.initialize()?;

    let schedule = engine.compute_expected_schedule()?;
    println!("  $1,000,000 at 5% for five years, {} scheduled events", schedule.len());

    let ext = ExternalData::new();
    println!("  Due by 2024-07-02: {}", engine.compute_due_payoff(date(2024, 7, 2)?, &ext)?);

    let first_year = engine.compute_and_commit_next_state(date(2024, 12, 31)?, &ext)?;
    println!("  First year:");
    print_payoffs(&first_year)?;

    let rest = engine.compute_and_commit_next_state(date(2030, 1, 1)?, &ext)?;
    println!("  Remaining lifecycle:");
    print_payoffs(&rest)?;
    println!("  Final status: {}\n", engine.lifecycle());
    Ok(())
}

/// Annuity: constant payment, shrinking interest.
fn scenario_2_mortgage() -> Result<(), ActusError> {
    println!("Scenario 2: Mortgage (ANN)\n");

    let terms = TermsPreset::Mortgage.terms("mortgage-1", date(2024, 1, 1)?)?;
    let mut state = compute_initial_state(&terms)?;
    let ext = ExternalData::new();

    println!("  $300,000 at 4% over 30 years, monthly");
    let mut at = date(2024, 2, 2)?;
    for month in 1..=6 {
        let evaluation = evaluate_until(&terms, &state, at, &ext)?;
        let split: Vec<String> = evaluation
            .payoffs
            .iter()
            .filter(|p| matches!(p.event_type, EventType::PrincipalRedemption | EventType::InterestPayment))
            .map(|p| format!("{} {}", p.event_type.code(), p.payoff))
            .collect();
        println!("  Month {}: {}", month, split.join(", "));
        state = evaluation.state;
        at = calendar::cycle_date(at, &Cycle::months(1), 1, EndOfMonthConvention::SameDay)?;
    }
    println!("  Outstanding: {}, payment {}\n", state.notional_principal, state.next_principal_redemption_payment);
    Ok(())
}

/// Floating loan fed by market observations.
fn scenario_3_rate_reset() -> Result<(), ActusError> {
    println!("Scenario 3: Rate Resets\n");

    let mut terms = TermsPreset::BulletLoan.terms("floater-1", date(2024, 1, 1)?)?;
    terms.rate_reset.cycle_of_rate_reset = Some(Cycle::months(6));
    terms.rate_reset.rate_spread = Real::from_decimal(dec!(0.015))?;
    terms.rate_reset.life_cap = Some(Real::from_decimal(dec!(0.08))?);
    terms.rate_reset.period_cap = Some(Real::from_decimal(dec!(0.01))?);

    let mut ext = ExternalData::new();
    let fixings = [(2024, 7, dec!(0.04)), (2025, 1, dec!(0.055)), (2025, 7, dec!(0.07))];
    for (y, m, rate) in fixings {
        ext.observe(date(y, m, 2)?, EventType::RateReset, encode_rate(Real::from_decimal(rate)?));
    }

    let mut state = compute_initial_state(&terms)?;
    for (y, m, rate) in fixings {
        state = compute_next_state(&terms, &state, date(y, m, 2)?, &ext)?;
        println!("  {}-{:02}: market {} -> contract rate {}", y, m, rate, state.nominal_interest_rate);
    }
    println!();
    Ok(())
}

/// Missed coupons push a loan into delinquency and then default.
fn scenario_4_missed_payments() -> Result<(), ActusError> {
    println!("Scenario 4: Missed Payments\n");

    let mut terms = TermsPreset::BulletLoan.terms("loan-2", date(2024, 1, 1)?)?;
    terms.performance.delinquency_period = Some(Cycle::months(9));
    let mut engine = Engine::new(terms, EngineConfig { log_events: true, ..Default::default() })?;
    engine.initialize()?;

    let mut ext = ExternalData::new();
    ext.observe(date(2024, 7, 2)?, EventType::InterestPayment, encode_settlement(true));
    ext.observe(date(2025, 1, 2)?, EventType::InterestPayment, encode_settlement(true));
    ext.observe(date(2025, 7, 2)?, EventType::InterestPayment, encode_settlement(true));

    for at in [date(2024, 8, 1)?, date(2025, 2, 1)?, date(2025, 8, 1)?] {
        engine.compute_and_commit_next_state(at, &ext)?;
        println!("  {}: {}", at, engine.lifecycle());
    }
    for record in engine.recent_transitions(3) {
        println!("  transition #{}: {} -> {} over {} events", record.id, record.from_status, record.to_status, record.events);
    }
    println!();
    Ok(())
}

/// Guarantee exercised after the covered loan defaults.
fn scenario_5_guarantee() -> Result<(), ActusError> {
    println!("Scenario 5: Guarantee (CEG)\n");

    let terms = TermsPreset::Guarantee.terms("guarantee-1", date(2024, 1, 1)?)?;
    let state = compute_initial_state(&terms)?;
    println!("  Covers 80% of $1,000,000 against default, covered amount {}", state.notional_principal);

    let exposure = CoveredExposure {
        status: ContractStatus::Defaulted,
        notional_principal: Real::from_int(750_000),
        accrued_interest: Real::from_int(12_500),
        collateral_value: Real::ZERO,
    };
    let mut ext = ExternalData::new();
    ext.inject(
        Event::new(terms.contract_type, EventType::Exercise, date(2025, 3, 15)?).with_payload(encode_exposure(&exposure)),
    );

    let evaluation = evaluate_until(&terms, &state, date(2026, 1, 1)?, &ext)?;
    print_payoffs(&evaluation)?;
    println!("  Status: {}\n", evaluation.state.contract_status);
    Ok(())
}

/// Collateral call capped by the collateral value.
fn scenario_6_collateral() -> Result<(), ActusError> {
    println!("Scenario 6: Collateral (CEC)\n");

    let terms = TermsPreset::Collateral.terms("collateral-1", date(2024, 1, 1)?)?;
    let state = compute_initial_state(&terms)?;

    let exposure = CoveredExposure {
        status: ContractStatus::Delinquent,
        notional_principal: Real::from_int(400_000),
        accrued_interest: Real::ZERO,
        collateral_value: Real::from_int(250_000),
    };
    let mut ext = ExternalData::new();
    ext.inject(
        Event::new(terms.contract_type, EventType::Exercise, date(2024, 9, 1)?).with_payload(encode_exposure(&exposure)),
    );

    let evaluation = evaluate_until(&terms, &state, date(2024, 12, 31)?, &ext)?;
    println!("  Exposure 400,000, collateral 250,000");
    print_payoffs(&evaluation)?;
    println!();
    Ok(())
}

/// Many independent contracts evaluated in parallel.
fn scenario_7_portfolio() -> Result<(), ActusError> {
    println!("Scenario 7: Portfolio\n");

    let start = date(2024, 1, 1)?;
    let presets = [TermsPreset::BulletLoan, TermsPreset::Mortgage, TermsPreset::Guarantee, TermsPreset::Collateral];
    let mut entries = Vec::new();
    for i in 0..1_000 {
        let preset = presets[i % presets.len()];
        entries.push(PortfolioEntry::new(preset.terms(&format!("book-{}", i), start)?));
    }

    let outcomes = evaluate_portfolio(&entries, date(2026, 12, 31)?);
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    println!("  {} contracts, {} failed", outcomes.len(), failed);
    for (currency, total) in cash_flow_by_currency(&outcomes)? {
        println!("  Net cash flow {}: {}", currency, total);
    }
    Ok(())
}
