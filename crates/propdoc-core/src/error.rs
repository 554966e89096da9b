//! Error types for the propdoc attachment engine.

use thiserror::Error;

use crate::models::RecordKind;

/// Result type alias using propdoc's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for attachment operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller supplied an invalid request (missing file, room index, title, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Field name is not present in the attachment field registry
    #[error("Unknown attachment field: {0}")]
    UnknownField(String),

    /// Owning record does not exist
    #[error("{kind} record not found: {id}")]
    RecordNotFound { kind: RecordKind, id: String },

    /// Object bytes failed to persist; no metadata mutation was attempted
    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    /// Record metadata write failed after bytes were persisted
    #[error("Metadata write failed: {0}")]
    MetadataWrite(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP-style status code for the upstream API layer.
    ///
    /// The core logic does not require these mappings; they exist so the
    /// calling layer can surface one consistent code per error kind.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::UnknownField(_) => 400,
            Error::RecordNotFound { .. } => 404,
            _ => 500,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors can embed full URLs; strip to the message so signed
        // tokens never reach callers.
        Error::Request(e.without_url().to_string())
    }
}
