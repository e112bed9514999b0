//! Reelcheck Error Definitions
//!
//! Defines error types used throughout the engine.
//!
//! Only caller-input errors propagate out of the assessment entry point;
//! decode and per-check failures degrade into a lower score plus issues
//! so a report is always produced.

use thiserror::Error;

/// Engine error types
#[derive(Error, Debug)]
pub enum QaError {
    /// Caller supplied input the engine cannot work with.
    /// Retrying without correcting the input will fail again.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The video bytes could not be decoded into frames.
    /// Mapped by the engine to the `CorruptedFile` report path.
    #[error("Video decode failed: {0}")]
    Decode(String),

    /// A metric check failed internally.
    /// Caught by the engine; remaining checks still execute.
    #[error("Check '{check}' failed: {reason}")]
    CheckFailed { check: String, reason: String },

    /// A rule id was requested that the registry does not hold
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for engine operations
pub type QaResult<T> = Result<T, QaError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QaError::InvalidInput("zero-frame video".to_string());
        assert_eq!(err.to_string(), "Invalid input: zero-frame video");

        let err = QaError::CheckFailed {
            check: "clarity_check".to_string(),
            reason: "empty sample".to_string(),
        };
        assert!(err.to_string().contains("clarity_check"));
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: QaError = io.into();
        assert!(matches!(err, QaError::Io(_)));
    }
}
