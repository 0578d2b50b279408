//! Error type shared by the presence registry, message log, and sweeper.

use parlor_db::DbError;

use crate::clock::ClockError;

/// Errors surfaced by chat operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Another active participant already holds this name.
    #[error("name already taken: {0}")]
    NameTaken(String),

    /// No active participant has this name.
    #[error("participant not found: {0}")]
    NotFound(String),

    /// The sender of a message is not an active participant.
    #[error("sender is not an active participant: {0}")]
    InvalidSender(String),

    /// The request payload is malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested page size is not a positive integer.
    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    /// The document store rejected or failed the operation.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] DbError),

    /// The clock produced an instant that cannot be formatted.
    #[error("clock error: {0}")]
    Clock(#[from] ClockError),
}
