use thiserror::Error;

/// The error taxonomy shared by every component of the engine.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("probe domain error: {0}")]
    ProbeDomain(String),

    #[error("operation timed out")]
    Timeout,

    #[error("orchestrator error: {0}")]
    Orchestrator(String),

    #[error("log reviewer rejected write: {0}")]
    Logging(String),

    #[error("internal invariant violation: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;
