//! Error types for the report pipeline

use finlens_llm::LLMError;
use std::time::Duration;
use thiserror::Error;

/// Pipeline errors
///
/// Per-document failures (`Extraction`, `Computation`, `Analysis`, `Timeout`)
/// never abort a batch; the orchestrator records them and moves on.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The extraction call failed or returned unusable output
    #[error("Extraction failed for {source_file}: {message}")]
    Extraction {
        source_file: String,
        message: String,
        /// Model text that could not be parsed as a JSON object
        raw_output: Option<String>,
    },

    /// A figure had a type that cannot be read as a number
    #[error("Cannot compute ratios for {company}: {field} {message}")]
    Computation {
        company: String,
        field: String,
        message: String,
    },

    /// Both market-analysis tiers failed
    #[error("Market analysis failed for {company}: {message}")]
    Analysis { company: String, message: String },

    /// An external call exceeded its budget
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: &'static str,
        elapsed: Duration,
    },

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Prompt rendering error
    #[error("Prompt error: {0}")]
    Prompt(#[from] finlens_prompt::PromptError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    /// Map a model-layer failure during extraction
    pub(crate) fn extraction(source_file: &str, err: LLMError) -> Self {
        match err {
            LLMError::Timeout(elapsed) => Self::Timeout {
                operation: "extraction",
                elapsed,
            },
            other => Self::Extraction {
                source_file: source_file.to_string(),
                message: other.to_string(),
                raw_output: None,
            },
        }
    }

    /// Whether this failure is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Model text attached to a malformed-output failure
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::Extraction { raw_output, .. } => raw_output.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReportError::Computation {
            company: "Acme".to_string(),
            field: "profit_and_loss.total_revenue".to_string(),
            message: "expected a number, found boolean".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot compute ratios for Acme: profit_and_loss.total_revenue expected a number, found boolean"
        );

        let err = ReportError::Timeout {
            operation: "market analysis",
            elapsed: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "market analysis timed out after 5s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_extraction_mapping() {
        let err = ReportError::extraction("a.pdf", LLMError::Timeout(Duration::from_secs(3)));
        assert!(err.is_timeout());

        let err = ReportError::extraction("a.pdf", LLMError::AuthenticationFailed);
        match err {
            ReportError::Extraction {
                source_file,
                message,
                raw_output,
            } => {
                assert_eq!(source_file, "a.pdf");
                assert!(message.contains("authentication"));
                assert!(raw_output.is_none());
            }
            other => panic!("Expected Extraction, got {other:?}"),
        }
    }
}
