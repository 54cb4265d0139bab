use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Evidence, RegistryEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupStatus {
    Ok,
    Error,
}

/// Result envelope for every lookup. Providers report failure here instead of returning `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResponse<T> {
    pub status: LookupStatus,
    pub items: Vec<T>,
    pub message: Option<String>,
}

impl<T> LookupResponse<T> {
    pub fn ok(items: Vec<T>) -> Self {
        Self {
            status: LookupStatus::Ok,
            items,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: LookupStatus::Error,
            items: Vec::new(),
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == LookupStatus::Ok
    }
}

/// Search scoped to known fact-check publishers
#[async_trait]
pub trait SourceLookup: Send + Sync {
    async fn search(&self, claim_text: &str) -> LookupResponse<Evidence>;

    fn name(&self) -> &str;
}

/// Prior published fact-check determinations
#[async_trait]
pub trait RegistryLookup: Send + Sync {
    async fn search(&self, claim_text: &str) -> LookupResponse<RegistryEntry>;

    fn name(&self) -> &str;
}

/// Open-web search
#[async_trait]
pub trait GeneralSearch: Send + Sync {
    async fn search(&self, query: &str) -> LookupResponse<Evidence>;

    fn name(&self) -> &str;
}

/// Cut a snippet to at most `max_chars` characters on a char boundary.
pub fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
    let snippet = snippet.trim();
    if snippet.chars().count() <= max_chars {
        return snippet.to_string();
    }
    let mut out: String = snippet.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
