use sentinel_core::CoreError;

/// Service-level error type.
///
/// Wraps [`CoreError`] for domain errors (e.g. `NotFound` from alert
/// lifecycle operations) and `sqlx::Error` for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error from `sentinel_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for service return values.
pub type EngineResult<T> = Result<T, EngineError>;
