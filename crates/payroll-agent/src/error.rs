//! Agent error types.
//!
//! All agent subsystems surface errors through [`AgentError`].  Each variant
//! carries enough context for callers to decide how to handle the failure,
//! and [`AgentError::is_retryable`] tells a caller whether repeating the same
//! turn with the same state may succeed.

use crate::workflow::Phase;

/// Unified error type for the payroll assistant runtime.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- LLM errors ----------------------------------------------------------
    /// The HTTP request to the LLM provider could not be completed.
    #[error("llm transport error: {reason}")]
    Transport { reason: String },

    /// The LLM provider answered with a non-success status.
    #[error("llm api returned {status}: {body}")]
    LlmStatus { status: u16, body: String },

    /// The LLM response could not be parsed into the expected format.
    #[error("llm response parse error: {reason}")]
    LlmParseFailed { reason: String },

    /// A model call did not finish within the configured timeout.
    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    /// The API key is missing for a provider that requires one.
    #[error("missing api key for provider: {provider}")]
    MissingApiKey { provider: String },

    // -- Stage errors --------------------------------------------------------
    /// The extraction stage produced no usable employee list.
    #[error("extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    /// Report generation was requested without both required flags.
    #[error(
        "report generation requires approval and an explicit trigger \
         (approved: {approved}, triggered: {triggered})"
    )]
    ReportPrecondition { approved: bool, triggered: bool },

    /// The model selected an operation outside the supported set.
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },

    /// The model selected a known operation with unusable arguments.
    #[error("invalid arguments for `{name}`: {reason}")]
    InvalidOperation { name: String, reason: String },

    // -- Workflow errors -----------------------------------------------------
    /// A phase change not allowed by the workflow state machine.
    #[error("invalid workflow transition: {from:?} -> {to:?}")]
    InvalidTransition { from: Phase, to: Phase },

    // -- Configuration errors ------------------------------------------------
    /// Configuration validation or loading failed.
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    /// Validation failed for input data.
    #[error("validation error: {reason}")]
    ValidationError { reason: String },

    // -- Upstream ------------------------------------------------------------
    /// An error from the payroll data model.
    #[error(transparent)]
    Core(#[from] payroll_core::CoreError),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Whether the failure is transient: the turn may be retried with the
    /// unchanged state.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::LlmStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Stage name used for timeouts raised by the HTTP client itself.
pub const HTTP_STAGE: &str = "llm request";

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                stage: HTTP_STAGE,
                secs: 0,
            }
        } else {
            Self::Transport {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(
            AgentError::Timeout {
                stage: "extraction",
                secs: 5
            }
            .is_retryable()
        );
        assert!(
            AgentError::LlmStatus {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            AgentError::LlmStatus {
                status: 429,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !AgentError::LlmStatus {
                status: 400,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !AgentError::ExtractionFailed {
                reason: "no employees".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn messages_are_readable() {
        let err = AgentError::ReportPrecondition {
            approved: false,
            triggered: true,
        };
        let text = err.to_string();
        assert!(text.contains("approved: false"));
        assert!(text.contains("triggered: true"));
    }
}
