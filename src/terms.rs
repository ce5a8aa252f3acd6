// 4.0: contract terms. created once, validated once, never mutated.
// grouped the way the ACTUS data dictionary groups them. every optional
// group defaults so a JSON document only carries what the contract uses.

use crate::calendar::{BusinessDayConvention, Calendar, EndOfMonthConvention};
use crate::cycle::Cycle;
use crate::day_count::DayCountConvention;
use crate::error::ActusError;
use crate::fixed::Real;
use crate::types::{ContractRole, ContractStatus, ContractType, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeBasis {
    /// Fixed amount per fee payment.
    #[serde(rename = "A")]
    Absolute,
    /// Rate applied to the notional over the accrual period.
    #[default]
    #[serde(rename = "N")]
    Notional,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuaranteedExposure {
    #[default]
    #[serde(rename = "NO")]
    Nominal,
    #[serde(rename = "NI")]
    NominalPlusInterest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conventions {
    #[serde(default)]
    pub calendar: Calendar,
    #[serde(default)]
    pub business_day_convention: BusinessDayConvention,
    #[serde(default)]
    pub end_of_month_convention: EndOfMonthConvention,
    #[serde(default)]
    pub day_count_convention: DayCountConvention,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDates {
    pub status_date: Timestamp,
    #[serde(default)]
    pub initial_exchange_date: Option<Timestamp>,
    #[serde(default)]
    pub maturity_date: Option<Timestamp>,
    #[serde(default)]
    pub purchase_date: Option<Timestamp>,
    #[serde(default)]
    pub termination_date: Option<Timestamp>,
    #[serde(default)]
    pub capitalization_end_date: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionalTerms {
    pub notional_principal: Real,
    pub premium_discount_at_ied: Real,
    pub price_at_purchase_date: Real,
    pub price_at_termination_date: Real,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestTerms {
    pub nominal_interest_rate: Real,
    pub accrued_interest: Option<Real>,
    pub cycle_anchor_date_of_interest_payment: Option<Timestamp>,
    pub cycle_of_interest_payment: Option<Cycle>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedemptionTerms {
    pub cycle_anchor_date_of_principal_redemption: Option<Timestamp>,
    pub cycle_of_principal_redemption: Option<Cycle>,
    pub next_principal_redemption_payment: Option<Real>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeTerms {
    pub fee_basis: FeeBasis,
    pub fee_rate: Real,
    pub fee_accrued: Option<Real>,
    pub cycle_anchor_date_of_fee: Option<Timestamp>,
    pub cycle_of_fee: Option<Cycle>,
}

/// Rate reset parameters. Period cap and floor bound the change per reset,
/// life cap and floor bound the rate itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateResetTerms {
    pub cycle_anchor_date_of_rate_reset: Option<Timestamp>,
    pub cycle_of_rate_reset: Option<Cycle>,
    pub rate_spread: Real,
    pub rate_multiplier: Real,
    pub next_reset_rate: Option<Real>,
    pub life_cap: Option<Real>,
    pub life_floor: Option<Real>,
    pub period_cap: Option<Real>,
    pub period_floor: Option<Real>,
}

impl Default for RateResetTerms {
    fn default() -> Self {
        Self {
            cycle_anchor_date_of_rate_reset: None,
            cycle_of_rate_reset: None,
            rate_spread: Real::ZERO,
            rate_multiplier: Real::ONE,
            next_reset_rate: None,
            life_cap: None,
            life_floor: None,
            period_cap: None,
            period_floor: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceTerms {
    /// How long a missed payment may stay unresolved before the contract defaults.
    pub delinquency_period: Option<Cycle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditEnhancementTerms {
    pub coverage_of_credit_enhancement: Real,
    pub credit_event_type_covered: ContractStatus,
    pub guaranteed_exposure: GuaranteedExposure,
    pub settlement_period: Option<Cycle>,
}

impl Default for CreditEnhancementTerms {
    fn default() -> Self {
        Self {
            coverage_of_credit_enhancement: Real::ONE,
            credit_event_type_covered: ContractStatus::Defaulted,
            guaranteed_exposure: GuaranteedExposure::Nominal,
            settlement_period: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terms {
    pub contract_id: String,
    pub contract_type: ContractType,
    pub contract_role: ContractRole,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub covered_contract_id: Option<String>,
    #[serde(default)]
    pub conventions: Conventions,
    pub dates: ContractDates,
    #[serde(default)]
    pub notional: NotionalTerms,
    #[serde(default)]
    pub interest: InterestTerms,
    #[serde(default)]
    pub redemption: RedemptionTerms,
    #[serde(default)]
    pub fees: FeeTerms,
    #[serde(default)]
    pub rate_reset: RateResetTerms,
    #[serde(default)]
    pub performance: PerformanceTerms,
    #[serde(default)]
    pub credit_enhancement: CreditEnhancementTerms,
}

impl Terms {
    /// Parses and validates a terms document.
    pub fn from_json(json: &str) -> Result<Self, ActusError> {
        let terms: Terms = serde_json::from_str(json)?;
        terms.validate()?;
        Ok(terms)
    }

    pub fn to_json(&self) -> Result<String, ActusError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// +1 for RPA/BUY, -1 for RPL/SEL.
    pub fn role_sign(&self) -> Real {
        self.contract_role.sign()
    }

    pub fn maturity(&self) -> Result<Timestamp, ActusError> {
        self.dates
            .maturity_date
            .ok_or_else(|| ActusError::invalid_terms("maturity_date", "required"))
    }

    pub fn initial_exchange(&self) -> Result<Timestamp, ActusError> {
        self.dates
            .initial_exchange_date
            .ok_or_else(|| ActusError::invalid_terms("initial_exchange_date", "required"))
    }

    // 4.1: structural checks. anything that would make schedule generation
    // or a formula meaningless is rejected here, before any state exists.
    pub fn validate(&self) -> Result<(), ActusError> {
        if self.contract_id.trim().is_empty() {
            return Err(ActusError::invalid_terms("contract_id", "must not be empty"));
        }

        let role_fits = match self.contract_type {
            ContractType::PrincipalAtMaturity | ContractType::Annuity => matches!(
                self.contract_role,
                ContractRole::RealPositionAsset | ContractRole::RealPositionLiability
            ),
            ContractType::CreditEnhancementGuarantee | ContractType::CreditEnhancementCollateral => {
                matches!(self.contract_role, ContractRole::Buyer | ContractRole::Seller)
            }
        };
        if !role_fits {
            return Err(ActusError::invalid_terms(
                "contract_role",
                format!("{:?} is not a valid role for {}", self.contract_role, self.contract_type),
            ));
        }

        let cycles = [
            ("cycle_of_interest_payment", self.interest.cycle_of_interest_payment),
            ("cycle_of_principal_redemption", self.redemption.cycle_of_principal_redemption),
            ("cycle_of_fee", self.fees.cycle_of_fee),
            ("cycle_of_rate_reset", self.rate_reset.cycle_of_rate_reset),
            ("delinquency_period", self.performance.delinquency_period),
            ("settlement_period", self.credit_enhancement.settlement_period),
        ];
        for (field, cycle) in cycles {
            if let Some(cycle) = cycle {
                cycle.validate(field)?;
            }
        }

        let maturity = self.maturity()?;
        if self.notional.notional_principal.is_negative() {
            return Err(ActusError::invalid_terms("notional_principal", "must not be negative"));
        }
        if self.fees.fee_rate.is_negative() {
            return Err(ActusError::invalid_terms("fee_rate", "must not be negative"));
        }

        match self.contract_type {
            ContractType::PrincipalAtMaturity | ContractType::Annuity => {
                let ied = self.initial_exchange()?;
                if maturity <= ied {
                    return Err(ActusError::invalid_terms(
                        "maturity_date",
                        "must be after the initial exchange date",
                    ));
                }
                if !self.notional.notional_principal.is_positive() {
                    return Err(ActusError::invalid_terms("notional_principal", "must be positive"));
                }
                if let Some(td) = self.dates.termination_date {
                    if td <= ied {
                        return Err(ActusError::invalid_terms(
                            "termination_date",
                            "must be after the initial exchange date",
                        ));
                    }
                }
                if self.dates.capitalization_end_date.is_some()
                    && self.interest.cycle_of_interest_payment.is_none()
                    && self.contract_type == ContractType::PrincipalAtMaturity
                {
                    return Err(ActusError::invalid_terms(
                        "capitalization_end_date",
                        "needs an interest payment cycle",
                    ));
                }
            }
            ContractType::CreditEnhancementGuarantee | ContractType::CreditEnhancementCollateral => {
                let ce = &self.credit_enhancement;
                if ce.coverage_of_credit_enhancement.is_negative() {
                    return Err(ActusError::invalid_terms(
                        "coverage_of_credit_enhancement",
                        "must not be negative",
                    ));
                }
                if ce.credit_event_type_covered.severity() == 0 {
                    return Err(ActusError::invalid_terms(
                        "credit_event_type_covered",
                        "must be a delinquent or defaulted status",
                    ));
                }
            }
        }

        if self.contract_type == ContractType::Annuity && self.redemption.cycle_of_principal_redemption.is_none() {
            return Err(ActusError::invalid_terms(
                "cycle_of_principal_redemption",
                "required for annuities",
            ));
        }

        let rr = &self.rate_reset;
        if let (Some(floor), Some(cap)) = (rr.life_floor, rr.life_cap) {
            if floor > cap {
                return Err(ActusError::invalid_terms("life_floor", "must not exceed life_cap"));
            }
        }
        if let (Some(floor), Some(cap)) = (rr.period_floor, rr.period_cap) {
            if floor > cap {
                return Err(ActusError::invalid_terms("period_floor", "must not exceed period_cap"));
            }
        }

        Ok(())
    }
}
