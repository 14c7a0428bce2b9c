/// Engine configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; override via
/// environment variables in production.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Whether the expectation scheduler polls at all (default: `true`).
    /// Disabling it fully suppresses polling without affecting
    /// event-driven processing.
    pub scheduler_enabled: bool,
    /// Seconds between scheduler polls (default: `15`).
    pub scheduler_interval_secs: u64,
    /// Maximum expectations claimed per poll (default: `100`).
    pub scheduler_poll_limit: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler_enabled: true,
            scheduler_interval_secs: 15,
            scheduler_poll_limit: 100,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `SCHEDULER_ENABLED`       | `true`  |
    /// | `SCHEDULER_INTERVAL_SECS` | `15`    |
    /// | `SCHEDULER_POLL_LIMIT`    | `100`   |
    pub fn from_env() -> Self {
        let scheduler_enabled: bool = std::env::var("SCHEDULER_ENABLED")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("SCHEDULER_ENABLED must be true or false");

        let scheduler_interval_secs: u64 = std::env::var("SCHEDULER_INTERVAL_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("SCHEDULER_INTERVAL_SECS must be a valid u64");

        let scheduler_poll_limit: i64 = std::env::var("SCHEDULER_POLL_LIMIT")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("SCHEDULER_POLL_LIMIT must be a valid i64");

        Self {
            scheduler_enabled,
            scheduler_interval_secs,
            scheduler_poll_limit,
        }
    }
}
