//! Error types

use thiserror::Error;

/// Main error type for the streak service
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The day already counts toward the streak, so a freeze would be wasted
    #[error("Day {0} is already active")]
    AlreadyActive(crate::DayKey),

    #[error("No freeze tokens available")]
    NoFreezeAvailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a read-path retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
