//! Domain errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Not allowed: {0}")]
    NotAllowed(String),

    #[error("Call has ended: {0}")]
    CallEnded(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Whether the caller may safely repeat the request
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Conflict(_) | DomainError::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(DomainError::Storage("timeout".into()).is_retryable());
        assert!(DomainError::Conflict("version".into()).is_retryable());
        assert!(!DomainError::NotFound("call".into()).is_retryable());
        assert!(!DomainError::NotAllowed("admin".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = DomainError::NotFound("Call 42 does not exist".into());
        assert_eq!(err.to_string(), "Entity not found: Call 42 does not exist");
    }
}
