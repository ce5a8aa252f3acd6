// 3.0: one error enum for the whole engine. every failure is local and returned
// straight to the caller with the event type, time or field that caused it.

use crate::fixed::MathError;
use crate::types::{ContractStatus, ContractType, EventType, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActusError {
    #[error("Arithmetic overflow in {op}")]
    ArithmeticOverflow { op: &'static str },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Missing external data `{field}` for {event_type} at {time}")]
    MissingExternalData {
        event_type: EventType,
        time: Timestamp,
        field: &'static str,
    },

    #[error("Malformed external data for {event_type} at {time}: {reason}")]
    MalformedExternalData {
        event_type: EventType,
        time: Timestamp,
        reason: String,
    },

    #[error("Stale state transition: {event_type} at {event_time} does not follow {last_event_time}")]
    StaleStateTransition {
        event_type: EventType,
        event_time: Timestamp,
        last_event_time: Timestamp,
    },

    #[error("No schedule available for contract {contract_id}")]
    NoScheduleAvailable { contract_id: String },

    #[error("Invalid terms, {field}: {reason}")]
    InvalidTerms { field: &'static str, reason: String },

    #[error("No {event_type} formula registered for {contract_type}")]
    UnsupportedEventType {
        contract_type: ContractType,
        event_type: EventType,
    },

    #[error("Contract is closed with status {status}")]
    ContractClosed { status: ContractStatus },

    #[error("Timestamp {0:?} is outside the supported date range")]
    DateOutOfRange(Timestamp),

    #[error("Engine has no committed state")]
    Uninitialized,

    #[error("Terms document error: {0}")]
    Json(String),
}

impl ActusError {
    pub fn invalid_terms(field: &'static str, reason: impl Into<String>) -> Self {
        ActusError::InvalidTerms {
            field,
            reason: reason.into(),
        }
    }
}

impl From<MathError> for ActusError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::Overflow { op } => ActusError::ArithmeticOverflow { op },
            MathError::DivisionByZero => ActusError::DivisionByZero,
            MathError::InvalidLiteral => ActusError::invalid_terms("literal", "not a decimal number"),
        }
    }
}

impl From<serde_json::Error> for ActusError {
    fn from(err: serde_json::Error) -> Self {
        ActusError::Json(err.to_string())
    }
}
