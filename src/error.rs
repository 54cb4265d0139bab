//! Domain-specific error types for the fact-check pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::EvidenceOrigin;

/// Main error type for the fact-check pipeline
#[derive(Error, Debug)]
pub enum FactCheckError {
    #[error("Input error: {message}")]
    Input { message: String },

    #[error("Lookup error ({origin}): {message}")]
    Lookup {
        origin: EvidenceOrigin,
        message: String,
    },

    #[error("Reduction error for claim {index}: {message}")]
    Reduction { index: usize, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Timeout error: {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Run cancelled after {completed} of {total} claims were verified")]
    Cancelled { completed: usize, total: usize },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Caller-visible failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InputError,
    LookupError,
    ReductionError,
    InternalError,
    Cancelled,
}

/// Structured error body returned across the core boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl FactCheckError {
    pub fn input(message: impl Into<String>) -> Self {
        FactCheckError::Input {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FactCheckError::Input { .. } => ErrorKind::InputError,
            FactCheckError::Lookup { .. } | FactCheckError::Timeout { .. } => {
                ErrorKind::LookupError
            }
            FactCheckError::Reduction { .. } => ErrorKind::ReductionError,
            FactCheckError::Cancelled { .. } => ErrorKind::Cancelled,
            FactCheckError::Config { .. } | FactCheckError::Internal { .. } => {
                ErrorKind::InternalError
            }
        }
    }

    /// Project onto the caller-facing body. Lookup and reduction failures never reach the
    /// caller as run failures, so anything that does is reported as internal.
    pub fn to_body(&self) -> ErrorBody {
        let kind = match self.kind() {
            ErrorKind::LookupError | ErrorKind::ReductionError => ErrorKind::InternalError,
            other => other,
        };
        ErrorBody {
            kind,
            message: self.to_string(),
        }
    }
}

impl From<anyhow::Error> for FactCheckError {
    fn from(err: anyhow::Error) -> Self {
        FactCheckError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FactCheckError {
    fn from(err: serde_json::Error) -> Self {
        FactCheckError::Internal {
            message: format!("Serialization error: {}", err),
        }
    }
}

impl From<reqwest::Error> for FactCheckError {
    fn from(err: reqwest::Error) -> Self {
        FactCheckError::Internal {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl From<toml::de::Error> for FactCheckError {
    fn from(err: toml::de::Error) -> Self {
        FactCheckError::Config {
            message: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for FactCheckError {
    fn from(err: tokio::task::JoinError) -> Self {
        FactCheckError::Internal {
            message: format!("task failed: {}", err),
        }
    }
}

/// Result type alias for fact-check operations
pub type Result<T> = std::result::Result<T, FactCheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorbed_kinds_surface_as_internal() {
        let err = FactCheckError::Reduction {
            index: 2,
            message: "blank claim".into(),
        };
        assert_eq!(err.kind(), ErrorKind::ReductionError);
        assert_eq!(err.to_body().kind, ErrorKind::InternalError);

        let err = FactCheckError::input("text is required");
        assert_eq!(err.to_body().kind, ErrorKind::InputError);
        assert!(err.to_body().message.contains("text is required"));
    }
}
