//! Structured error types with stable machine-readable codes
//!
//! Invalid input is rejected at the service boundary; integrity faults
//! indicate a violated invariant elsewhere and are surfaced, not swallowed.

use std::fmt;

/// Engine error types with proper categorization
#[derive(Debug)]
pub enum MemoryError {
    // Validation errors
    InvalidInput { field: String, reason: String },
    InvalidUserId(String),
    ContentTooLarge { size: usize, max: usize },

    // Integrity faults: the graph references data that is missing or of the
    // wrong kind. These are never branched on for recovery.
    DataIntegrity(String),

    // Generic wrapper for external errors
    Internal(anyhow::Error),
}

impl MemoryError {
    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::InvalidUserId(_) => "INVALID_USER_ID",
            Self::ContentTooLarge { .. } => "CONTENT_TOO_LARGE",
            Self::DataIntegrity(_) => "DATA_INTEGRITY",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason } => {
                format!("Invalid input for field '{field}': {reason}")
            }
            Self::InvalidUserId(msg) => format!("Invalid user ID: {msg}"),
            Self::ContentTooLarge { size, max } => {
                format!("Content too large: {size} bytes (max: {max} bytes)")
            }
            Self::DataIntegrity(msg) => format!("Data integrity fault: {msg}"),
            Self::Internal(err) => format!("Internal error: {err}"),
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MemoryError {}

/// Convert from anyhow::Error to MemoryError
impl From<anyhow::Error> for MemoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

/// Helper trait to convert validation errors
pub trait ValidationErrorExt<T> {
    fn map_validation_err(self, field: &str) -> Result<T>;
}

impl<T> ValidationErrorExt<T> for anyhow::Result<T> {
    fn map_validation_err(self, field: &str) -> Result<T> {
        self.map_err(|e| MemoryError::InvalidInput {
            field: field.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Type alias for Results using MemoryError
pub type Result<T> = std::result::Result<T, MemoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            MemoryError::InvalidUserId("test".to_string()).code(),
            "INVALID_USER_ID"
        );
        assert_eq!(
            MemoryError::DataIntegrity("dangling edge".to_string()).code(),
            "DATA_INTEGRITY"
        );
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = MemoryError::ContentTooLarge {
            size: 100_000,
            max: 50_000,
        };
        assert!(err.message().contains("100000"));
        assert!(err.message().contains("50000"));
    }

    #[test]
    fn test_validation_ext_maps_field_name() {
        let res: anyhow::Result<()> = Err(anyhow::anyhow!("cannot be empty"));
        let err = res.map_validation_err("user_id").unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
        assert!(err.message().contains("user_id"));
    }
}
