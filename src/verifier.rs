//! Claim verification: concurrent lookups per claim, bounded parallelism across claims

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::VerificationConfig;
use crate::error::{FactCheckError, Result};
use crate::lookup::{LookupResponse, Lookups};
use crate::models::{Claim, Evidence, EvidenceOrigin, Verdict};
use crate::reduce::{ClaimLookups, reduce, reduction_failure, source_applies};

pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 8000;
pub const DEFAULT_MAX_CONCURRENT_CLAIMS: usize = 4;

#[derive(Clone)]
pub struct ClaimVerifier {
    lookups: Lookups,
    lookup_timeout: Duration,
    max_concurrent_claims: usize,
}

impl ClaimVerifier {
    pub fn new(lookups: Lookups) -> Self {
        Self {
            lookups,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            max_concurrent_claims: DEFAULT_MAX_CONCURRENT_CLAIMS,
        }
    }

    pub fn from_config(lookups: Lookups, cfg: &VerificationConfig) -> Self {
        Self::new(lookups)
            .with_lookup_timeout(Duration::from_millis(cfg.lookup_timeout_ms))
            .with_max_concurrent_claims(cfg.max_concurrent_claims)
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_claims(mut self, n: usize) -> Self {
        self.max_concurrent_claims = n.max(1);
        self
    }

    /// One verdict per claim, in input order. Lookup and reduction failures stay inside
    /// their claim's slot.
    pub async fn verify(&self, claims: Vec<Claim>) -> Vec<Verdict> {
        self.run(claims, Arc::new(Vec::new()), &CancellationToken::new())
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// As `verify`, but stops when `token` fires and reports how far it got.
    pub async fn verify_with_cancel(
        &self,
        claims: Vec<Claim>,
        token: CancellationToken,
    ) -> Result<Vec<Verdict>> {
        self.verify_with_evidence(claims, Vec::new(), token).await
    }

    /// As `verify_with_cancel`, with caller-supplied evidence weighed alongside the lookups
    /// of every claim it shares terms with.
    pub async fn verify_with_evidence(
        &self,
        claims: Vec<Claim>,
        provided: Vec<Evidence>,
        token: CancellationToken,
    ) -> Result<Vec<Verdict>> {
        let total = claims.len();
        let slots = self.run(claims, Arc::new(provided), &token).await;
        let completed = slots.iter().filter(|s| s.is_some()).count();
        if token.is_cancelled() || completed < total {
            warn!("verification cancelled after {}/{} claims", completed, total);
            return Err(FactCheckError::Cancelled { completed, total });
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// `None` marks a slot abandoned by cancellation.
    async fn run(
        &self,
        claims: Vec<Claim>,
        provided: Arc<Vec<Evidence>>,
        token: &CancellationToken,
    ) -> Vec<Option<Verdict>> {
        info!(
            "Verifying {} claims (concurrency={}, lookup_timeout={}ms, provided_sources={})",
            claims.len(),
            self.max_concurrent_claims,
            self.lookup_timeout.as_millis(),
            provided.len()
        );

        // Dropping this future cancels every in-flight claim task.
        let run_token = token.child_token();
        let _guard = run_token.clone().drop_guard();

        futures_util::stream::iter(claims.into_iter().map(|claim| {
            let lookups = self.lookups.clone();
            let provided = provided.clone();
            let timeout = self.lookup_timeout;
            let task_token = run_token.clone();
            async move {
                if task_token.is_cancelled() {
                    return None;
                }
                let fallback = claim.clone();
                let handle = tokio::spawn(async move {
                    tokio::select! {
                        _ = task_token.cancelled() => None,
                        v = verify_claim(lookups, timeout, claim, &provided) => Some(v),
                    }
                });
                match handle.await {
                    Ok(slot) => slot,
                    Err(join_err) => {
                        let err = FactCheckError::Reduction {
                            index: fallback.index,
                            message: format!("verification task failed: {}", join_err),
                        };
                        warn!("{}", err);
                        Some(reduction_failure(fallback, &err.to_string()))
                    }
                }
            }
        }))
        .buffered(self.max_concurrent_claims)
        .collect()
        .await
    }
}

async fn bounded<T>(
    timeout: Duration,
    origin: EvidenceOrigin,
    lookup: impl Future<Output = LookupResponse<T>>,
) -> LookupResponse<T> {
    match tokio::time::timeout(timeout, lookup).await {
        Ok(resp) => {
            if !resp.is_ok() {
                let err = FactCheckError::Lookup {
                    origin,
                    message: resp.message.clone().unwrap_or_default(),
                };
                debug!("{}", err);
            }
            resp
        }
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            let err = FactCheckError::Timeout {
                operation: format!("{} lookup", origin),
                timeout_ms,
            };
            warn!("{}", err);
            LookupResponse::error(format!("timed out after {}ms", timeout_ms))
        }
    }
}

async fn verify_claim(
    lookups: Lookups,
    timeout: Duration,
    claim: Claim,
    provided: &[Evidence],
) -> Verdict {
    if claim.text.trim().is_empty() {
        let err = FactCheckError::Reduction {
            index: claim.index,
            message: "blank claim text".to_string(),
        };
        warn!("{}", err);
        return reduction_failure(claim, &err.to_string());
    }

    let text = claim.text.as_str();
    let (site, registry, general) = tokio::join!(
        bounded(timeout, EvidenceOrigin::SiteSearch, lookups.source.search(text)),
        bounded(timeout, EvidenceOrigin::Registry, lookups.registry.search(text)),
        async {
            match lookups.general.as_ref() {
                Some(g) => Some(bounded(timeout, EvidenceOrigin::GeneralSearch, g.search(text)).await),
                None => None,
            }
        }
    );

    let provided: Vec<Evidence> = provided
        .iter()
        .filter(|e| source_applies(text, &e.snippet))
        .cloned()
        .collect();

    let verdict = reduce(
        claim,
        ClaimLookups {
            site,
            registry,
            general,
            provided,
        },
    );
    debug!(
        "claim {} -> {} ({})",
        verdict.claim.index, verdict.label, verdict.confidence
    );
    verdict
}
