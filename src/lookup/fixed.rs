//! In-process lookups: canned results for offline runs and tests, and a stand-in for
//! providers that have no credentials.

use async_trait::async_trait;

use crate::lookup::traits::{GeneralSearch, LookupResponse, RegistryLookup, SourceLookup};
use crate::models::{Evidence, RegistryEntry};

/// Returns canned items. An item registered with a needle is only returned for claims that
/// contain it (case-insensitive); items without one are returned for every claim.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    hits: Vec<(Option<String>, Evidence)>,
    entries: Vec<(Option<String>, RegistryEntry)>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hit(mut self, hit: Evidence) -> Self {
        self.hits.push((None, hit));
        self
    }

    pub fn with_hit_for(mut self, needle: &str, hit: Evidence) -> Self {
        self.hits.push((Some(needle.to_lowercase()), hit));
        self
    }

    pub fn with_entry(mut self, entry: RegistryEntry) -> Self {
        self.entries.push((None, entry));
        self
    }

    pub fn with_entry_for(mut self, needle: &str, entry: RegistryEntry) -> Self {
        self.entries.push((Some(needle.to_lowercase()), entry));
        self
    }

    fn select<T: Clone>(items: &[(Option<String>, T)], claim_text: &str) -> Vec<T> {
        let lowered = claim_text.to_lowercase();
        items
            .iter()
            .filter(|(needle, _)| needle.as_deref().is_none_or(|n| lowered.contains(n)))
            .map(|(_, item)| item.clone())
            .collect()
    }
}

#[async_trait]
impl SourceLookup for StaticLookup {
    async fn search(&self, claim_text: &str) -> LookupResponse<Evidence> {
        LookupResponse::ok(Self::select(&self.hits, claim_text))
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[async_trait]
impl GeneralSearch for StaticLookup {
    async fn search(&self, query: &str) -> LookupResponse<Evidence> {
        LookupResponse::ok(Self::select(&self.hits, query))
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[async_trait]
impl RegistryLookup for StaticLookup {
    async fn search(&self, claim_text: &str) -> LookupResponse<RegistryEntry> {
        LookupResponse::ok(Self::select(&self.entries, claim_text))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Always fails with a fixed message
#[derive(Debug, Clone)]
pub struct UnavailableLookup {
    message: String,
}

impl UnavailableLookup {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl SourceLookup for UnavailableLookup {
    async fn search(&self, _claim_text: &str) -> LookupResponse<Evidence> {
        LookupResponse::error(self.message.clone())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[async_trait]
impl GeneralSearch for UnavailableLookup {
    async fn search(&self, _query: &str) -> LookupResponse<Evidence> {
        LookupResponse::error(self.message.clone())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[async_trait]
impl RegistryLookup for UnavailableLookup {
    async fn search(&self, _claim_text: &str) -> LookupResponse<RegistryEntry> {
        LookupResponse::error(self.message.clone())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::traits::LookupStatus;
    use crate::models::EvidenceOrigin;

    fn hit(url: &str) -> Evidence {
        Evidence {
            source_name: "example.org".into(),
            url: url.into(),
            snippet: "snippet".into(),
            origin: EvidenceOrigin::SiteSearch,
        }
    }

    #[tokio::test]
    async fn needles_scope_hits_to_matching_claims() {
        let lookup = StaticLookup::new()
            .with_hit(hit("https://a"))
            .with_hit_for("eiffel", hit("https://b"));
        let any = SourceLookup::search(&lookup, "Water is wet").await;
        assert_eq!(any.items.len(), 1);
        let scoped = SourceLookup::search(&lookup, "The Eiffel Tower is in Paris.").await;
        assert_eq!(scoped.items.len(), 2);
    }

    #[tokio::test]
    async fn unavailable_reports_error_status() {
        let lookup = UnavailableLookup::new("no key");
        let res = RegistryLookup::search(&lookup, "anything").await;
        assert_eq!(res.status, LookupStatus::Error);
        assert!(res.items.is_empty());
        assert_eq!(res.message.as_deref(), Some("no key"));
    }
}
