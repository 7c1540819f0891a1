//! Error types for rolemask

use thiserror::Error;

/// The main error type for rolemask operations
#[derive(Debug, Error)]
pub enum RbacError {
    #[error("storage error: {0}")]
    Storage(#[from] heed::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} `{value}` already exists")]
    Duplicate { kind: &'static str, value: String },
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown permission `{0}`")]
    UnknownPermission(String),
    #[error("`password` is not a readable attribute")]
    PasswordNotReadable,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("corrupted record: {0}")]
    Corrupted(String),
}

impl RbacError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        RbacError::NotFound { kind, id: id.to_string() }
    }

    pub(crate) fn duplicate(kind: &'static str, value: impl Into<String>) -> Self {
        RbacError::Duplicate { kind, value: value.into() }
    }
}

/// Result type alias for rolemask operations
pub type Result<T> = std::result::Result<T, RbacError>;
