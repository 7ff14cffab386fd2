//! Error types
//!
//! `PipelineError` is what an evaluation can fail with; `ConfigError` is
//! what start-up (config file, model file) can fail with.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure of one evaluation request.
///
/// Sub-detector problems never surface here; they are swallowed inside the
/// detector that hit them.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    /// Input URL cannot be parsed (even with the `http://` fallback)
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// URL classifier missing, failed, timed out or returned garbage
    #[error("URL classifier unavailable: {0}")]
    ModelUnavailable(String),

    /// Page snapshot missing, unreadable or invalidated mid-scan
    #[error("page structure unavailable: {0}")]
    StructureAccess(String),
}

impl PipelineError {
    pub fn invalid_url(url: &str, reason: impl std::fmt::Display) -> Self {
        PipelineError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidUrl { .. } => "invalid_url",
            PipelineError::ModelUnavailable(_) => "model_unavailable",
            PipelineError::StructureAccess(_) => "structure_access",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid script pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("failed to load model: {0}")]
    Model(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_human_readable() {
        let err = PipelineError::invalid_url("::nope", "relative URL without a base");
        assert_eq!(
            err.to_string(),
            "invalid URL '::nope': relative URL without a base"
        );
        assert_eq!(err.kind(), "invalid_url");

        let err = PipelineError::ModelUnavailable("timed out after 50ms".to_string());
        assert!(err.to_string().contains("timed out"));
        assert_eq!(err.kind(), "model_unavailable");
    }
}
