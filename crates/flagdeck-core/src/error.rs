//! Error types for flagdeck

use thiserror::Error;

/// Result type alias using flagdeck's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Flagdeck error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("Feature flag '{0}' not found. Run `flagdeck flags list` to see all flags.")]
    FlagNotFound(String),

    #[error("Revision '{0}' not found on this flag. Run `flagdeck revisions list` to see all revisions.")]
    RevisionNotFound(String),

    // Lifecycle errors (E100-E199)
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Flag '{0}' has no live revision to roll back")]
    NoActiveRevision(String),

    // Concurrency errors (E200-E299)
    #[error("Concurrent update detected for flag '{0}'. Reload the flag and retry.")]
    Conflict(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Stored data could not be parsed: {0}")]
    Parse(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::FlagNotFound(_) => "E001",
            Self::RevisionNotFound(_) => "E002",
            Self::InvalidStateTransition(_) => "E100",
            Self::NoActiveRevision(_) => "E101",
            Self::Conflict(_) => "E200",
            Self::DatabaseError(_) => "E400",
            Self::Parse(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Io(_) => "E900",
        }
    }
}
