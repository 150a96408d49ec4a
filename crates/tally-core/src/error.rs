use thiserror::Error;

/// Top-level error type for Tally.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Empty or malformed user input. Recovered locally and surfaced as a
    /// user-facing reply, never propagated as a fault.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No matching task. Recovered locally and surfaced as a user-facing reply.
    #[error("not found: {0}")]
    NotFound(String),

    /// Store failure. Not recoverable locally; the dispatcher replies with a
    /// generic failure text and leaves conversation state untouched.
    #[error("store error: {0}")]
    Store(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
