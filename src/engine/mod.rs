// 10.0: economics kernel. pure lifecycle functions over (terms, state,
// external data) plus the Engine, which holds one contract's committed state
// and a bounded log of its transitions.
// deterministic and event-driven with no external I/O.

mod config;
mod core;
pub mod lifecycle;
mod results;

pub use config::EngineConfig;
pub use core::Engine;
pub use lifecycle::{
    compute_due_payoff, compute_expected_schedule, compute_initial_state, compute_next_state,
    compute_pending_schedule, due_events, evaluate_schedule, evaluate_until, validate_initial_state,
    validate_next_state,
};
pub use results::{EventPayoff, Evaluation, Lifecycle, TransitionRecord};
