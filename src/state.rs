// 6.0: contract state. one authoritative value per contract, produced by
// state transitions and replaced wholesale, never edited in place by callers.
// amounts carry the role sign: a lender's notional is positive, a borrower's
// negative.

use crate::event::EventKey;
use crate::fixed::Real;
use crate::types::{ContractStatus, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub contract_status: ContractStatus,
    /// Accrual reference: calculation time of the last applied event.
    pub status_date: Timestamp,
    /// Key of the last applied event. None means everything up to and
    /// including `status_date` is already reflected.
    pub last_event: Option<EventKey>,
    pub non_performing_date: Option<Timestamp>,
    pub exercise_date: Option<Timestamp>,
    pub maturity_date: Option<Timestamp>,
    pub notional_principal: Real,
    pub accrued_interest: Real,
    pub fee_accrued: Real,
    pub nominal_interest_rate: Real,
    pub next_principal_redemption_payment: Real,
    pub exercise_amount: Real,
}

impl State {
    /// A performant state with zero balances.
    pub fn new(status_date: Timestamp) -> Self {
        Self {
            contract_status: ContractStatus::Performant,
            status_date,
            last_event: None,
            non_performing_date: None,
            exercise_date: None,
            maturity_date: None,
            notional_principal: Real::ZERO,
            accrued_interest: Real::ZERO,
            fee_accrued: Real::ZERO,
            nominal_interest_rate: Real::ZERO,
            next_principal_redemption_payment: Real::ZERO,
            exercise_amount: Real::ZERO,
        }
    }

    /// Events at or below this key are already applied.
    pub fn watermark(&self) -> EventKey {
        self.last_event.unwrap_or_else(|| EventKey::end_of(self.status_date))
    }

    pub fn is_closed(&self) -> bool {
        self.contract_status.is_absorbing()
    }

    // 6.1: zero every balance and close the contract
    pub fn terminated(&self) -> Self {
        Self {
            contract_status: ContractStatus::Terminated,
            notional_principal: Real::ZERO,
            accrued_interest: Real::ZERO,
            fee_accrued: Real::ZERO,
            next_principal_redemption_payment: Real::ZERO,
            exercise_amount: Real::ZERO,
            ..self.clone()
        }
    }
}
