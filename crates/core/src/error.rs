//! Error types for ragchat.
//!
//! A single error enum covers every failure category of the pipeline:
//! configuration, ingestion, retrieval, model calls, input validation and
//! prompt rendering. The variant decides how far an error may travel:
//! configuration errors abort startup, ingestion and retrieval errors are
//! absorbed by their callers, the rest abort a single turn.

use thiserror::Error;

/// Unified error type for ragchat.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing credential or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document source could not be read, parsed or chunked
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// A retrieval source failed or timed out
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Language model call failed
    #[error("Model error: {0}")]
    Model(String),

    /// Rejected user input or a disallowed session operation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Short category label, used when errors are shown to a user.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "configuration",
            AppError::Io(_) => "io",
            AppError::Ingestion(_) => "ingestion",
            AppError::Retrieval(_) => "retrieval",
            AppError::Model(_) => "model",
            AppError::Validation(_) => "validation",
            AppError::Prompt(_) => "prompt",
            AppError::Serialization(_) => "serialization",
            AppError::Other(_) => "other",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_category() {
        let err = AppError::Model("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Model error: quota exceeded");
        assert_eq!(err.kind(), "model");
    }

    #[test]
    fn test_yaml_error_converts_to_serialization() {
        let parsed: Result<Vec<u32>, _> = serde_yaml::from_str("not: [a list");
        let err: AppError = parsed.unwrap_err().into();
        assert_eq!(err.kind(), "serialization");
    }
}
