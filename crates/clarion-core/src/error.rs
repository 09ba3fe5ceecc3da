//! Error types for the Clarion core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Clarion pipeline.
///
/// Failures of optional collaborators are converted into degraded results
/// at the point of call; the variants here describe what went wrong so the
/// caller can decide which fallback path applies. Only `EmptyUtterance`
/// is ever surfaced past the orchestrator.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ClarionError {
    /// The incoming utterance carried no text at all.
    #[error("utterance contains no text")]
    EmptyUtterance,

    /// Neither the pattern matcher nor the AI backend produced a usable
    /// classification.
    #[error("intent classification unavailable: {0}")]
    ClassificationUnavailable(String),

    /// A network collaborator call failed or was rejected.
    #[error("{collaborator} call failed: {message}")]
    ExternalCall {
        collaborator: String,
        message: String,
        retryable: bool,
    },

    /// A collaborator call exceeded its timeout budget.
    #[error("{what} timed out")]
    Timeout { what: String },

    /// No source for a contact lookup was reachable. The resource agent
    /// converts this into fallback knowledge base data before it can
    /// reach a caller.
    #[error("no contact source reachable for region '{region}'")]
    TotalSourceFailure { region: String },

    /// Serialization/deserialization error
    #[error("serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClarionError {
    /// Creates an ExternalCall error for the named collaborator.
    pub fn external(
        collaborator: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self::ExternalCall {
            collaborator: collaborator.into(),
            message: message.into(),
            retryable,
        }
    }

    /// Creates a Timeout error.
    pub fn timeout(what: impl Into<String>) -> Self {
        Self::Timeout { what: what.into() }
    }

    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether retrying the failed call might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalCall {
                retryable: true,
                ..
            } | Self::Timeout { .. }
        )
    }
}

impl From<serde_json::Error> for ClarionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ClarionError>`.
pub type Result<T> = std::result::Result<T, ClarionError>;
