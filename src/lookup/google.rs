use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::VerificationConfig;
use crate::lookup::traits::{
    GeneralSearch, LookupResponse, RegistryLookup, SourceLookup, truncate_snippet,
};
use crate::models::{Evidence, EvidenceOrigin, RegistryEntry};

const CUSTOM_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
const FACT_CHECK_TOOLS_URL: &str = "https://factchecktools.googleapis.com/v1alpha1/claims:search";
/// The key travels in this header so it never appears in a request URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Shared HTTP knobs for the Google providers
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub timeout_ms: u64,
    pub retries: u32,
    pub snippet_chars: usize,
}

impl From<&VerificationConfig> for ProviderSettings {
    fn from(cfg: &VerificationConfig) -> Self {
        Self {
            timeout_ms: cfg.lookup_timeout_ms,
            retries: cfg.lookup_retries,
            snippet_chars: cfg.snippet_chars,
        }
    }
}

fn build_client(timeout_ms: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .context("Failed to build HTTP client")
}

/// GET with exponential backoff on transport errors, 429 and 5xx. Other statuses fail at once.
/// Errors are stripped of their URL before they reach logs or rationales.
async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    api_key: &str,
    params: &[(&str, &str)],
    retries: u32,
    provider: &str,
) -> Result<T> {
    let mut last_err: Option<anyhow::Error> = None;
    for i in 0..=retries {
        if i > 0 {
            let delay_ms = 200u64 * (1u64 << (i - 1));
            debug!("{} retry {} after {}ms", provider, i, delay_ms);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let request = client
            .get(url)
            .header(API_KEY_HEADER, api_key)
            .query(params);
        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                last_err = Some(
                    anyhow::Error::new(e.without_url())
                        .context(format!("{} request failed", provider)),
                );
                continue;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = anyhow::anyhow!("{} API error {}: {}", provider, status, body);
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_err = Some(err);
                continue;
            }
            return Err(err);
        }

        return response
            .json::<T>()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("Failed to parse {} response", provider));
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Unknown {} error", provider)))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(rename = "displayLink", default)]
    display_link: String,
}

/// Google Custom Search JSON API. Site-scoped for fact-check sites, unscoped for general search.
pub struct CustomSearchLookup {
    client: Client,
    api_key: String,
    engine_id: String,
    sites: Vec<String>,
    origin: EvidenceOrigin,
    settings: ProviderSettings,
    base_url: String,
}

impl CustomSearchLookup {
    pub fn site_search(
        api_key: String,
        engine_id: String,
        sites: Vec<String>,
        settings: ProviderSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout_ms)?,
            api_key,
            engine_id,
            sites,
            origin: EvidenceOrigin::SiteSearch,
            settings,
            base_url: CUSTOM_SEARCH_URL.to_string(),
        })
    }

    pub fn general(api_key: String, engine_id: String, settings: ProviderSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout_ms)?,
            api_key,
            engine_id,
            sites: Vec::new(),
            origin: EvidenceOrigin::GeneralSearch,
            settings,
            base_url: CUSTOM_SEARCH_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build_query(&self, claim_text: &str) -> String {
        if self.sites.is_empty() {
            return claim_text.to_string();
        }
        let scope = self
            .sites
            .iter()
            .map(|s| format!("site:{}", s))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("{} {}", claim_text, scope)
    }

    async fn fetch(&self, claim_text: &str) -> Result<Vec<Evidence>> {
        let query = self.build_query(claim_text);
        let parsed: SearchResponse = get_json(
            &self.client,
            &self.base_url,
            &self.api_key,
            &[
                ("cx", self.engine_id.as_str()),
                ("q", query.as_str()),
            ],
            self.settings.retries,
            "Custom Search",
        )
        .await?;

        Ok(parsed
            .items
            .into_iter()
            .filter(|item| !item.link.is_empty())
            .map(|item| Evidence {
                source_name: if item.display_link.is_empty() {
                    item.title
                } else {
                    item.display_link
                },
                url: item.link,
                snippet: truncate_snippet(&item.snippet, self.settings.snippet_chars),
                origin: self.origin,
            })
            .collect())
    }

    async fn respond(&self, claim_text: &str) -> LookupResponse<Evidence> {
        match self.fetch(claim_text).await {
            Ok(items) => {
                debug!("{}: {} hits", self.origin, items.len());
                LookupResponse::ok(items)
            }
            Err(e) => {
                warn!("{} failed: {:#}", self.origin, e);
                LookupResponse::error(format!("{:#}", e))
            }
        }
    }
}

#[async_trait]
impl SourceLookup for CustomSearchLookup {
    async fn search(&self, claim_text: &str) -> LookupResponse<Evidence> {
        self.respond(claim_text).await
    }

    fn name(&self) -> &str {
        "google-custom-search"
    }
}

#[async_trait]
impl GeneralSearch for CustomSearchLookup {
    async fn search(&self, query: &str) -> LookupResponse<Evidence> {
        self.respond(query).await
    }

    fn name(&self) -> &str {
        "google-custom-search"
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsSearchResponse {
    #[serde(default)]
    claims: Vec<ToolsClaim>,
}

#[derive(Debug, Deserialize)]
struct ToolsClaim {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "claimReview", default)]
    claim_review: Vec<ClaimReview>,
}

#[derive(Debug, Deserialize)]
struct ClaimReview {
    #[serde(default)]
    publisher: Option<Publisher>,
    #[serde(default)]
    url: String,
    #[serde(rename = "reviewDate", default)]
    review_date: Option<String>,
    #[serde(rename = "textualRating", default)]
    textual_rating: String,
}

#[derive(Debug, Deserialize)]
struct Publisher {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    site: Option<String>,
}

/// `reviewDate` is RFC 3339; only the calendar date is kept.
fn parse_review_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn flatten_claims(parsed: ClaimsSearchResponse, snippet_chars: usize) -> Vec<RegistryEntry> {
    let mut entries = Vec::new();
    for claim in parsed.claims {
        let reviewed = claim
            .text
            .as_deref()
            .map(|t| truncate_snippet(t, snippet_chars));
        for review in claim.claim_review {
            if review.textual_rating.trim().is_empty() {
                continue;
            }
            let publisher = review
                .publisher
                .and_then(|p| p.name.or(p.site))
                .unwrap_or_else(|| "unknown publisher".to_string());
            entries.push(RegistryEntry {
                rating: review.textual_rating.trim().to_string(),
                publisher,
                url: review.url,
                review_date: review.review_date.as_deref().and_then(parse_review_date),
                claim_reviewed: reviewed.clone(),
            });
        }
    }
    entries
}

/// Google Fact Check Tools `claims:search`
pub struct FactCheckToolsRegistry {
    client: Client,
    api_key: String,
    language: Option<String>,
    settings: ProviderSettings,
    base_url: String,
}

impl FactCheckToolsRegistry {
    pub fn new(api_key: String, language: Option<String>, settings: ProviderSettings) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout_ms)?,
            api_key,
            language,
            settings,
            base_url: FACT_CHECK_TOOLS_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(&self, claim_text: &str) -> Result<Vec<RegistryEntry>> {
        let mut params = vec![("query", claim_text)];
        if let Some(lang) = self.language.as_deref() {
            params.push(("languageCode", lang));
        }
        let parsed: ClaimsSearchResponse = get_json(
            &self.client,
            &self.base_url,
            &self.api_key,
            &params,
            self.settings.retries,
            "Fact Check Tools",
        )
        .await?;
        Ok(flatten_claims(parsed, self.settings.snippet_chars))
    }
}

#[async_trait]
impl RegistryLookup for FactCheckToolsRegistry {
    async fn search(&self, claim_text: &str) -> LookupResponse<RegistryEntry> {
        match self.fetch(claim_text).await {
            Ok(entries) => {
                debug!("fact-check registry: {} entries", entries.len());
                LookupResponse::ok(entries)
            }
            Err(e) => {
                warn!("fact-check registry failed: {:#}", e);
                LookupResponse::error(format!("{:#}", e))
            }
        }
    }

    fn name(&self) -> &str {
        "google-fact-check-tools"
    }
}
