//! Common error types for Encore

use thiserror::Error;

/// Common result type for Encore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Encore crates
#[derive(Error, Debug)]
pub enum Error {
    /// Local store operation error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Remote store or proxy answered with a non-success status
    #[error("Remote error {status}: {message}")]
    Remote { status: u16, message: String },

    /// Transport failure talking to a remote service
    #[error("Network error: {0}")]
    Network(String),

    /// Write rejected by a uniqueness or foreign-key constraint
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Candidate already present in the caller's list
    #[error("Already added: {0}")]
    Duplicate(String),

    /// Operation needs a signed-in session
    #[error("Not signed in")]
    Unauthenticated,

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors raised before any network or store call.
    ///
    /// These are shown to the user but not logged.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::Duplicate(_) | Error::Unauthenticated
        )
    }
}
