//! Domain error types
//!
//! These errors are framework-agnostic and represent pipeline-level failures.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Resource not found
    NotFound,
    /// Record carries no `001` control identifier and cannot be deduplicated
    MissingControlKey,
    /// Validation error with message
    Validation(String),
    /// Store unavailable or a statement failed
    Store(String),
    /// Source bytes could not be decoded into records
    Decode(String),
    /// No decoder is available for this kind of source file
    UnsupportedFileType(String),
    /// Filesystem error while reading a source file
    Io(String),
}

impl DomainError {
    /// Errors that abort the current pass instead of only the current record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DomainError::Store(_) | DomainError::Io(_))
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound => write!(f, "Resource not found"),
            DomainError::MissingControlKey => write!(f, "Missing control identifier (001)"),
            DomainError::Validation(msg) => write!(f, "Validation error: {}", msg),
            DomainError::Store(msg) => write!(f, "Store error: {}", msg),
            DomainError::Decode(msg) => write!(f, "Decode error: {}", msg),
            DomainError::UnsupportedFileType(kind) => {
                write!(f, "No decoder available for file type: {}", kind)
            }
            DomainError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Store(e.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_io_errors_abort_the_pass() {
        assert!(DomainError::Store("locked".into()).is_fatal());
        assert!(DomainError::Io("gone".into()).is_fatal());
        assert!(!DomainError::MissingControlKey.is_fatal());
        assert!(!DomainError::Decode("bad xml".into()).is_fatal());
    }

    #[test]
    fn db_errors_map_to_store() {
        let err: DomainError = sea_orm::DbErr::Custom("connection reset".into()).into();
        assert!(matches!(err, DomainError::Store(msg) if msg.contains("connection reset")));
    }
}
