// 5.0: lifecycle events. an event is a pure value: what happens, when it was
// scheduled, when it pays, when it accrues to, and where it sits among events
// at the same instant.

use crate::types::{ContractType, EventType, Timestamp};
use serde::{Deserialize, Serialize};

/// Ordering key of an event. Events apply in ascending key order and a state
/// remembers the key of the last event it absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub time: Timestamp,
    pub sequence: u8,
}

impl EventKey {
    pub fn new(time: Timestamp, sequence: u8) -> Self {
        Self { time, sequence }
    }

    /// Key that sorts after every event at `time`.
    pub fn end_of(time: Timestamp) -> Self {
        Self { time, sequence: u8::MAX }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    /// Unadjusted cycle date.
    pub schedule_time: Timestamp,
    /// Business-day shifted payment time.
    pub event_time: Timestamp,
    /// Time accruals are measured to.
    pub calc_time: Timestamp,
    pub sequence: u8,
    #[serde(default)]
    pub payload: Option<Vec<u8>>,
}

impl Event {
    /// An event with no business-day adjustment, as used for injected events.
    pub fn new(contract_type: ContractType, event_type: EventType, time: Timestamp) -> Self {
        Self {
            event_type,
            schedule_time: time,
            event_time: time,
            calc_time: time,
            sequence: sequence(contract_type, event_type),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn key(&self) -> EventKey {
        EventKey::new(self.event_time, self.sequence)
    }
}

// 5.1: tie-break among events at the same instant. loans follow the ACTUS
// sequence with redemption ahead of interest so an annuity period settles
// its principal against the interest accrued up to the payment date.
// credit enhancements run the exercise chain before expiry.
pub fn sequence(contract_type: ContractType, event_type: EventType) -> u8 {
    use EventType::*;
    match contract_type {
        ContractType::PrincipalAtMaturity | ContractType::Annuity => match event_type {
            InitialExchange => 1,
            FeePayment => 2,
            PrincipalRedemption => 3,
            InterestPayment => 8,
            InterestCapitalization => 9,
            CreditEvent => 10,
            RateResetFixed => 11,
            RateReset => 12,
            Purchase => 14,
            Termination => 16,
            Maturity => 19,
            Exercise => 20,
            Settlement => 21,
        },
        ContractType::CreditEnhancementGuarantee | ContractType::CreditEnhancementCollateral => {
            match event_type {
                Purchase => 1,
                FeePayment => 2,
                CreditEvent => 3,
                Exercise => 4,
                Settlement => 5,
                Maturity => 6,
                InitialExchange => 7,
                PrincipalRedemption => 8,
                InterestPayment => 9,
                InterestCapitalization => 10,
                RateResetFixed => 11,
                RateReset => 12,
                Termination => 13,
            }
        }
    }
}

/// Sorts by key. The sort is stable so equal keys keep their insertion order.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by_key(Event::key);
}
