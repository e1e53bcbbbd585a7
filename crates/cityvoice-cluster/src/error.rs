//! Error types for the clustering pipeline

use thiserror::Error;

/// Errors that can occur in the clustering pipeline
///
/// Only `Config` and `MissingCredential` ever escape a pipeline run; the rest
/// are produced per item or per cluster and recovered at that boundary.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Invalid configuration (unknown provider, bad thresholds)
    #[error("Configuration error: {0}")]
    Config(String),

    /// An LLM strategy was selected but no provider is available
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Invalid format in LLM response
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl From<serde_json::Error> for ClusterError {
    fn from(e: serde_json::Error) -> Self {
        ClusterError::JsonParse(e.to_string())
    }
}

impl From<cityvoice_llm::LlmError> for ClusterError {
    fn from(e: cityvoice_llm::LlmError) -> Self {
        match e {
            cityvoice_llm::LlmError::MissingCredential(what) => ClusterError::MissingCredential(what),
            other => ClusterError::Llm(other.to_string()),
        }
    }
}
