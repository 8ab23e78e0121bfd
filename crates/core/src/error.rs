//! Error types for medbill.
//!
//! One error enum covers every failure category in the workspace. The
//! retrieval core maps its failure modes onto the dedicated variants:
//! `DataLoad` at startup, `Embedding` per query and `Narrative` for the
//! optional language-model call (which callers swallow).

use thiserror::Error;

/// Unified error type for medbill.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Billing-code dataset missing, unreadable or unmappable
    #[error("Data load error: {0}")]
    DataLoad(String),

    /// Embedding backend unavailable or produced unusable vectors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Narrative generation failed or timed out
    #[error("Narrative generation error: {0}")]
    Narrative(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
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
    /// Whether the failure means search cannot be served at all.
    ///
    /// The presentation layer shows "search unavailable" for these instead of
    /// stale or partial results.
    pub fn is_search_unavailable(&self) -> bool {
        matches!(self, AppError::Embedding(_) | AppError::DataLoad(_))
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
    fn test_search_unavailable_classification() {
        assert!(AppError::Embedding("model offline".to_string()).is_search_unavailable());
        assert!(AppError::DataLoad("missing file".to_string()).is_search_unavailable());
        assert!(!AppError::Narrative("timeout".to_string()).is_search_unavailable());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::Embedding("dimension mismatch".to_string());
        assert_eq!(err.to_string(), "Embedding error: dimension mismatch");
    }
}
