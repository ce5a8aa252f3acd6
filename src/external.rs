// 7.0: external data. market observations and credit events arrive as opaque
// bytes keyed by (event time, event type). the kernel only attaches them to
// events; the contract formulas decode them with the functions in 7.1.

use crate::error::ActusError;
use crate::event::Event;
use crate::fixed::Real;
use crate::types::{ContractStatus, EventType, Timestamp};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalData {
    observations: BTreeMap<(Timestamp, EventType), Vec<u8>>,
    unscheduled: Vec<Event>,
}

impl ExternalData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the payload for the event of `event_type` paying at `time`.
    pub fn observe(&mut self, time: Timestamp, event_type: EventType, payload: Vec<u8>) -> &mut Self {
        self.observations.insert((time, event_type), payload);
        self
    }

    /// Adds an event the schedule does not know about, such as a credit event.
    pub fn inject(&mut self, event: Event) -> &mut Self {
        self.unscheduled.push(event);
        self
    }

    pub fn observation(&self, time: Timestamp, event_type: EventType) -> Option<&[u8]> {
        self.observations.get(&(time, event_type)).map(Vec::as_slice)
    }

    pub fn unscheduled(&self) -> &[Event] {
        &self.unscheduled
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty() && self.unscheduled.is_empty()
    }

    /// Fills an event's payload from the observations unless it carries one.
    pub fn attach(&self, mut event: Event) -> Event {
        if event.payload.is_none() {
            event.payload = self
                .observation(event.event_time, event.event_type)
                .map(<[u8]>::to_vec);
        }
        event
    }
}

/// What a credit-enhancement contract learns about its covered contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoveredExposure {
    pub status: ContractStatus,
    pub notional_principal: Real,
    pub accrued_interest: Real,
    pub collateral_value: Real,
}

// 7.1: payload layouts. integers are big-endian, amounts are raw Real values.
const REAL_LEN: usize = 16;
const EXPOSURE_LEN: usize = 1 + 3 * REAL_LEN;

const SETTLED: u8 = 0;
const MISSED: u8 = 1;

pub fn encode_rate(rate: Real) -> Vec<u8> {
    rate.raw().to_be_bytes().to_vec()
}

pub fn encode_settlement(missed: bool) -> Vec<u8> {
    vec![if missed { MISSED } else { SETTLED }]
}

pub fn encode_credit_event(status: ContractStatus) -> Vec<u8> {
    vec![status.code()]
}

pub fn encode_exposure(exposure: &CoveredExposure) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(EXPOSURE_LEN);
    bytes.push(exposure.status.code());
    bytes.extend_from_slice(&exposure.notional_principal.raw().to_be_bytes());
    bytes.extend_from_slice(&exposure.accrued_interest.raw().to_be_bytes());
    bytes.extend_from_slice(&exposure.collateral_value.raw().to_be_bytes());
    bytes
}

fn malformed(event: &Event, reason: impl Into<String>) -> ActusError {
    ActusError::MalformedExternalData {
        event_type: event.event_type,
        time: event.event_time,
        reason: reason.into(),
    }
}

fn required<'a>(event: &'a Event, field: &'static str) -> Result<&'a [u8], ActusError> {
    event
        .payload
        .as_deref()
        .ok_or(ActusError::MissingExternalData {
            event_type: event.event_type,
            time: event.event_time,
            field,
        })
}

fn read_real(event: &Event, bytes: &[u8]) -> Result<Real, ActusError> {
    let raw: [u8; REAL_LEN] = bytes
        .try_into()
        .map_err(|_| malformed(event, format!("expected {} bytes, got {}", REAL_LEN, bytes.len())))?;
    Ok(Real::from_raw(i128::from_be_bytes(raw)))
}

pub fn decode_rate(event: &Event) -> Result<Real, ActusError> {
    let bytes = required(event, "market_rate")?;
    read_real(event, bytes)
}

/// None when the payment carries no settlement observation.
pub fn decode_settlement(event: &Event) -> Result<Option<bool>, ActusError> {
    match event.payload.as_deref() {
        None => Ok(None),
        Some([SETTLED]) => Ok(Some(false)),
        Some([MISSED]) => Ok(Some(true)),
        Some(other) => Err(malformed(event, format!("bad settlement flag {:?}", other))),
    }
}

pub fn decode_credit_event(event: &Event) -> Result<ContractStatus, ActusError> {
    match required(event, "credit_event_status")? {
        [code] => match ContractStatus::from_code(*code) {
            Some(status) if status.severity() > 0 => Ok(status),
            _ => Err(malformed(event, format!("status code {} is not a credit event", code))),
        },
        other => Err(malformed(event, format!("expected 1 byte, got {}", other.len()))),
    }
}

pub fn decode_exposure(event: &Event) -> Result<CoveredExposure, ActusError> {
    let bytes = required(event, "covered_exposure")?;
    if bytes.len() != EXPOSURE_LEN {
        return Err(malformed(
            event,
            format!("expected {} bytes, got {}", EXPOSURE_LEN, bytes.len()),
        ));
    }
    let status = ContractStatus::from_code(bytes[0])
        .ok_or_else(|| malformed(event, format!("unknown status code {}", bytes[0])))?;
    let field = |i: usize| read_real(event, &bytes[1 + i * REAL_LEN..1 + (i + 1) * REAL_LEN]);
    Ok(CoveredExposure {
        status,
        notional_principal: field(0)?,
        accrued_interest: field(1)?,
        collateral_value: field(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContractType;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_ymd(y, m, d).unwrap()
    }

    fn event(event_type: EventType) -> Event {
        Event::new(ContractType::PrincipalAtMaturity, event_type, ts(2024, 7, 1))
    }

    #[test]
    fn attach_uses_event_time_and_type() {
        let mut data = ExternalData::new();
        data.observe(ts(2024, 7, 1), EventType::RateReset, encode_rate(Real::from_bps(425)));
        let rr = data.attach(event(EventType::RateReset));
        assert_eq!(decode_rate(&rr).unwrap(), Real::from_bps(425));

        // a different type at the same time gets nothing
        let ip = data.attach(event(EventType::InterestPayment));
        assert_eq!(ip.payload, None);
    }

    #[test]
    fn own_payload_wins_over_observation() {
        let mut data = ExternalData::new();
        data.observe(ts(2024, 7, 1), EventType::RateReset, encode_rate(Real::ONE));
        let rr = data.attach(event(EventType::RateReset).with_payload(encode_rate(Real::ZERO)));
        assert_eq!(decode_rate(&rr).unwrap(), Real::ZERO);
    }

    #[test]
    fn missing_rate_names_the_field() {
        let err = decode_rate(&event(EventType::RateReset)).unwrap_err();
        assert!(matches!(err, ActusError::MissingExternalData { field: "market_rate", .. }));
    }

    #[test]
    fn short_payload_is_malformed() {
        let rr = event(EventType::RateReset).with_payload(vec![1, 2, 3]);
        assert!(matches!(decode_rate(&rr), Err(ActusError::MalformedExternalData { .. })));
    }

    #[test]
    fn settlement_flags() {
        let ip = event(EventType::InterestPayment);
        assert_eq!(decode_settlement(&ip).unwrap(), None);
        assert_eq!(
            decode_settlement(&ip.clone().with_payload(encode_settlement(true))).unwrap(),
            Some(true)
        );
        assert_eq!(
            decode_settlement(&ip.clone().with_payload(encode_settlement(false))).unwrap(),
            Some(false)
        );
        assert!(decode_settlement(&ip.with_payload(vec![7])).is_err());
    }

    #[test]
    fn credit_event_must_be_a_credit_status() {
        let ce = event(EventType::CreditEvent);
        let defaulted = ce.clone().with_payload(encode_credit_event(ContractStatus::Defaulted));
        assert_eq!(decode_credit_event(&defaulted).unwrap(), ContractStatus::Defaulted);
        let performant = ce.with_payload(encode_credit_event(ContractStatus::Performant));
        assert!(decode_credit_event(&performant).is_err());
    }

    #[test]
    fn exposure_layout() {
        let exposure = CoveredExposure {
            status: ContractStatus::Delinquent,
            notional_principal: Real::from_int(-250_000),
            accrued_interest: Real::from_int(1_200),
            collateral_value: Real::from_int(90_000),
        };
        let bytes = encode_exposure(&exposure);
        assert_eq!(bytes.len(), 49);
        assert_eq!(bytes[0], 1);
        let xd = event(EventType::Exercise).with_payload(bytes);
        assert_eq!(decode_exposure(&xd).unwrap(), exposure);
    }
}
