//! extract → verify → report

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::clients::create_completer;
use crate::config::Config;
use crate::error::{FactCheckError, Result};
use crate::extractor::{ClaimExtractor, DEFAULT_MAX_CLAIMS, HeuristicExtractor, ModelClaimExtractor};
use crate::lookup::traits::truncate_snippet;
use crate::lookup::{Lookups, create_lookups};
use crate::models::{Evidence, EvidenceOrigin, Report};
use crate::report::ReportGenerator;
use crate::verifier::ClaimVerifier;

/// Caller-supplied source text is cut to this many characters.
pub const PROVIDED_SOURCE_CHARS: usize = 1000;

/// Core input: the text to check, an optional claim cap, and optional source texts to weigh
/// alongside the lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactCheckRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub max_claims: Option<usize>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

impl FactCheckRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            max_claims: None,
            sources: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }
}

/// Blank sources are skipped. A source that is a bare URL keeps it as its link.
fn provided_evidence(sources: &[String]) -> Vec<Evidence> {
    sources
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, s)| Evidence {
            source_name: format!("caller source {}", i + 1),
            url: if s.starts_with("http://") || s.starts_with("https://") {
                s.split_whitespace().next().unwrap_or_default().to_string()
            } else {
                String::new()
            },
            snippet: truncate_snippet(s, PROVIDED_SOURCE_CHARS),
            origin: EvidenceOrigin::Provided,
        })
        .collect()
}

#[derive(Clone)]
pub struct FactCheckPipeline {
    extractor: Arc<dyn ClaimExtractor>,
    verifier: ClaimVerifier,
    reporter: ReportGenerator,
    default_max_claims: usize,
}

impl FactCheckPipeline {
    pub fn new(extractor: Arc<dyn ClaimExtractor>, verifier: ClaimVerifier) -> Self {
        Self {
            extractor,
            verifier,
            reporter: ReportGenerator::new(),
            default_max_claims: DEFAULT_MAX_CLAIMS,
        }
    }

    pub fn with_default_max_claims(mut self, n: usize) -> Self {
        self.default_max_claims = n.max(1);
        self
    }

    /// Offline pipeline with a heuristic extractor over the given lookups.
    pub fn with_lookups(lookups: Lookups) -> Self {
        Self::new(
            Arc::new(HeuristicExtractor::new()),
            ClaimVerifier::new(lookups),
        )
    }

    /// Wire providers and the extractor from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let baseline = HeuristicExtractor::with_min_claim_chars(config.extraction.min_claim_chars);
        let extractor: Arc<dyn ClaimExtractor> = match create_completer(config)? {
            Some(completer) if config.extraction.model_filter => {
                info!("Claim extraction uses {} as a filter", completer.name());
                Arc::new(ModelClaimExtractor::new(
                    baseline,
                    completer,
                    Duration::from_millis(config.completion.timeout_ms),
                ))
            }
            _ => Arc::new(baseline),
        };
        let lookups = create_lookups(config)?;
        let verifier = ClaimVerifier::from_config(lookups, &config.verification);
        Ok(Self::new(extractor, verifier).with_default_max_claims(config.extraction.max_claims))
    }

    pub async fn run(&self, text: &str) -> Result<Report> {
        self.run_request(FactCheckRequest::new(text), CancellationToken::new())
            .await
    }

    pub async fn run_request(
        &self,
        request: FactCheckRequest,
        token: CancellationToken,
    ) -> Result<Report> {
        let text = request
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| FactCheckError::input("text must be a non-empty string"))?;
        let max_claims = request.max_claims.unwrap_or(self.default_max_claims);
        if max_claims == 0 {
            return Err(FactCheckError::input("max_claims must be at least 1"));
        }

        let provided = provided_evidence(request.sources.as_deref().unwrap_or_default());

        info!(
            "fact-check: extracting (chars={}, max_claims={}, sources={})",
            text.len(),
            max_claims,
            provided.len()
        );
        let extraction = self.extractor.extract(text, max_claims).await;
        info!(
            "fact-check: {} claims extracted ({} found)",
            extraction.claims.len(),
            extraction.total_claims_found
        );

        let verdicts = self
            .verifier
            .verify_with_evidence(extraction.claims, provided, token)
            .await?;
        info!("fact-check: {} verdicts", verdicts.len());

        let report = self
            .reporter
            .generate_with_found(verdicts, extraction.total_claims_found);
        info!("fact-check: report ready (reliability={:?})", report.reliability);
        Ok(report)
    }
}
