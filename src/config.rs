// 12.0 config.rs: ready-made terms for the common contract shapes. each preset
// is a complete, valid Terms value anchored on a status date; callers tweak
// fields from there.
// 12.1 presets mirror the four contract types: bullet loan (PAM), mortgage
// (ANN), guarantee (CEG) and collateral (CEC).

use crate::calendar::cycle_date;
use crate::cycle::{Cycle, Period, Stub};
use crate::day_count::DayCountConvention;
use crate::error::ActusError;
use crate::fixed::Real;
use crate::terms::{
    Conventions, ContractDates, CreditEnhancementTerms, FeeBasis, FeeTerms, GuaranteedExposure, InterestTerms,
    NotionalTerms, PerformanceTerms, RateResetTerms, RedemptionTerms, Terms,
};
use crate::types::{ContractRole, ContractStatus, ContractType, Timestamp};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermsPreset {
    BulletLoan,
    Mortgage,
    Guarantee,
    Collateral,
}

fn years_after(start: Timestamp, years: u32) -> Result<Timestamp, ActusError> {
    cycle_date(start, &Cycle::new(years, Period::Year, Stub::Short), 1, Default::default())
}

fn decimal(value: rust_decimal::Decimal) -> Result<Real, ActusError> {
    Ok(Real::from_decimal(value)?)
}

impl TermsPreset {
    // 12.2: the exchange happens the day after the status date so the whole
    // lifecycle is still ahead of the contract
    pub fn terms(&self, contract_id: &str, status_date: Timestamp) -> Result<Terms, ActusError> {
        let start = status_date.add_days(1);
        let mut terms = Terms {
            contract_id: contract_id.to_string(),
            contract_type: ContractType::PrincipalAtMaturity,
            contract_role: ContractRole::RealPositionAsset,
            currency: "USD".to_string(),
            covered_contract_id: None,
            conventions: Conventions {
                day_count_convention: DayCountConvention::ThirtyE360,
                ..Default::default()
            },
            dates: ContractDates {
                status_date,
                ..Default::default()
            },
            notional: NotionalTerms::default(),
            interest: InterestTerms::default(),
            redemption: RedemptionTerms::default(),
            fees: FeeTerms::default(),
            rate_reset: RateResetTerms::default(),
            performance: PerformanceTerms::default(),
            credit_enhancement: CreditEnhancementTerms::default(),
        };

        match self {
            TermsPreset::BulletLoan => {
                terms.dates.initial_exchange_date = Some(start);
                terms.dates.maturity_date = Some(years_after(start, 5)?);
                terms.notional.notional_principal = Real::from_int(1_000_000);
                terms.interest.nominal_interest_rate = decimal(dec!(0.05))?;
                terms.interest.cycle_of_interest_payment = Some(Cycle::months(6));
            }
            TermsPreset::Mortgage => {
                terms.contract_type = ContractType::Annuity;
                terms.dates.initial_exchange_date = Some(start);
                terms.dates.maturity_date = Some(years_after(start, 30)?);
                terms.notional.notional_principal = Real::from_int(300_000);
                terms.interest.nominal_interest_rate = decimal(dec!(0.04))?;
                terms.redemption.cycle_of_principal_redemption = Some(Cycle::months(1));
                terms.performance.delinquency_period = Some(Cycle::months(3));
            }
            TermsPreset::Guarantee => {
                terms.contract_type = ContractType::CreditEnhancementGuarantee;
                terms.contract_role = ContractRole::Buyer;
                terms.covered_contract_id = Some(format!("{}-covered", contract_id));
                terms.dates.purchase_date = Some(start);
                terms.dates.maturity_date = Some(years_after(start, 5)?);
                terms.notional.notional_principal = Real::from_int(1_000_000);
                terms.notional.price_at_purchase_date = Real::from_int(2_000);
                terms.fees = FeeTerms {
                    fee_basis: FeeBasis::Notional,
                    fee_rate: decimal(dec!(0.01))?,
                    cycle_of_fee: Some(Cycle::months(3)),
                    ..Default::default()
                };
                terms.credit_enhancement = CreditEnhancementTerms {
                    coverage_of_credit_enhancement: decimal(dec!(0.8))?,
                    credit_event_type_covered: ContractStatus::Defaulted,
                    guaranteed_exposure: GuaranteedExposure::Nominal,
                    settlement_period: Some(Cycle::new(10, Period::Day, Stub::Short)),
                };
            }
            TermsPreset::Collateral => {
                terms.contract_type = ContractType::CreditEnhancementCollateral;
                terms.contract_role = ContractRole::Buyer;
                terms.covered_contract_id = Some(format!("{}-covered", contract_id));
                terms.dates.maturity_date = Some(years_after(start, 3)?);
                terms.notional.notional_principal = Real::from_int(500_000);
                terms.credit_enhancement = CreditEnhancementTerms {
                    coverage_of_credit_enhancement: Real::ONE,
                    credit_event_type_covered: ContractStatus::Delinquent,
                    guaranteed_exposure: GuaranteedExposure::Nominal,
                    settlement_period: Some(Cycle::new(5, Period::Day, Stub::Short)),
                };
            }
        }
        terms.validate()?;
        Ok(terms)
    }
}
