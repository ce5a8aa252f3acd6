//! Engine configuration options.

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of committed transitions to retain in memory.
    pub max_transitions: usize,
    /// Log every applied event at debug level.
    pub log_events: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_transitions: 100_000,
            log_events: false,
        }
    }
}
