use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("http error: {0}")]
    Http(String),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("completion provider not configured")]
    NotConfigured,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            CompletionError::Http(format!("request timed out: {}", err))
        } else {
            CompletionError::Http(err.to_string())
        }
    }
}

/// Opaque text-completion capability. The deterministic pipeline never depends on it.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    fn name(&self) -> &str;
}
