//! Common error types for LSB

use thiserror::Error;
use uuid::Uuid;

/// Common result type for LSB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across LSB services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reviewer token did not resolve to a registered reviewer
    #[error("Unknown reviewer token")]
    UnknownReviewer,

    /// Reviewer exists but is deactivated; submissions are rejected
    #[error("Reviewer {0} is inactive")]
    InactiveReviewer(Uuid),

    /// Match id did not resolve to a catalog entry
    #[error("Unknown match: {0}")]
    UnknownMatch(Uuid),

    /// Vote value outside the ternary domain
    #[error("Invalid vote value: {0} (expected 0, 1, or 2)")]
    InvalidVoteValue(i64),

    /// Authoritative view source could not be reached and no snapshot exists
    #[error("Authoritative source unavailable: {0}")]
    SourceUnavailable(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
