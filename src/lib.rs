// actus-core: ACTUS contract lifecycle engine.
// schedules, payoffs and state transitions for PAM, ANN, CEG and CEC.
// all computation is deterministic fixed-point with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: ContractType, ContractRole, ContractStatus, EventType, Timestamp
//   2.x  fixed.rs: Real, signed 18-decimal fixed point
//   3.x  error.rs: ActusError
//        cycle.rs, calendar.rs, day_count.rs: cycles, date shifting, year fractions
//   4.x  terms.rs: contract terms + validation
//   5.x  event.rs: events, ordering key, sequence table
//   6.x  state.rs: contract state
//   7.x  external.rs: external data + payload codecs
//   8.x  schedule.rs: cycle enumeration, expected + pending schedules
//   9.x  contracts/: POF/STF per contract type, dispatch table
//   10.x engine/: pure kernel + Engine with committed state
//   11.x portfolio.rs: parallel evaluation of many contracts
//   12.x config.rs: terms presets

// core modules
pub mod error;
pub mod fixed;
pub mod types;

// dates
pub mod calendar;
pub mod cycle;
pub mod day_count;

// contract model
pub mod event;
pub mod external;
pub mod state;
pub mod terms;

// lifecycle
pub mod contracts;
pub mod engine;
pub mod schedule;

// integration modules
pub mod config;
pub mod portfolio;

// re exports for convenience
pub use calendar::{BusinessDayConvention, Calendar, EndOfMonthConvention};
pub use config::TermsPreset;
pub use cycle::{Cycle, Period, Stub};
pub use day_count::{year_fraction, DayCountConvention};
pub use engine::*;
pub use error::ActusError;
pub use event::{sort_events, Event, EventKey};
pub use external::*;
pub use fixed::{MathError, Real, RoundingMode};
pub use portfolio::{cash_flow_by_currency, evaluate_portfolio, total_cash_flow, ContractOutcome, PortfolioEntry};
pub use schedule::{generate_schedule, pending_schedule};
pub use state::State;
pub use terms::*;
pub use types::*;
