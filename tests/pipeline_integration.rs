use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fact_check::error::{ErrorKind, FactCheckError};
use fact_check::extractor::{ClaimExtractor, HeuristicExtractor};
use fact_check::lookup::{
    GeneralSearch, LookupResponse, Lookups, RegistryLookup, SourceLookup, StaticLookup,
    UnavailableLookup,
};
use fact_check::verifier::ClaimVerifier;
use fact_check::{
    Claim, Confidence, Evidence, EvidenceOrigin, Extraction, FactCheckPipeline, FactCheckRequest,
    RegistryEntry, VerdictLabel,
};
use tokio_util::sync::CancellationToken;

const EIFFEL: &str = "The Eiffel Tower is in Paris. It was built in 1889. I think it's beautiful.";

fn offline() -> Lookups {
    Lookups {
        source: Arc::new(StaticLookup::new()),
        registry: Arc::new(StaticLookup::new()),
        general: Some(Arc::new(StaticLookup::new())),
    }
}

fn false_rating() -> RegistryEntry {
    RegistryEntry {
        rating: "False".into(),
        publisher: "Snopes".into(),
        url: "https://www.snopes.com/fact-check/moon-cheese/".into(),
        review_date: None,
        claim_reviewed: Some("The moon is made of cheese".into()),
    }
}

/// Counts calls and panics on claims containing "explode".
#[derive(Default)]
struct CountingLookup {
    calls: AtomicUsize,
}

#[async_trait]
impl SourceLookup for CountingLookup {
    async fn search(&self, claim_text: &str) -> LookupResponse<Evidence> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if claim_text.contains("explode") {
            panic!("lookup blew up");
        }
        LookupResponse::ok(vec![])
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[derive(Default)]
struct CountingExtractor {
    calls: AtomicUsize,
}

#[async_trait]
impl ClaimExtractor for CountingExtractor {
    async fn extract(&self, text: &str, max_claims: usize) -> Extraction {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HeuristicExtractor::new().extract_sync(text, max_claims)
    }
}

struct SlowLookup(Duration);

#[async_trait]
impl RegistryLookup for SlowLookup {
    async fn search(&self, _claim_text: &str) -> LookupResponse<RegistryEntry> {
        tokio::time::sleep(self.0).await;
        LookupResponse::ok(vec![false_rating()])
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[async_trait]
impl GeneralSearch for SlowLookup {
    async fn search(&self, _query: &str) -> LookupResponse<Evidence> {
        tokio::time::sleep(self.0).await;
        LookupResponse::ok(vec![])
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[tokio::test]
async fn eiffel_text_yields_three_verdicts_in_order() {
    let pipeline = FactCheckPipeline::with_lookups(offline());
    let report = pipeline.run(EIFFEL).await.unwrap();
    assert_eq!(report.total_claims, 3);
    assert_eq!(report.total_claims_found, 3);
    let texts: Vec<&str> = report
        .verdicts
        .iter()
        .map(|v| v.claim.text.as_str())
        .collect();
    assert_eq!(
        texts,
        vec![
            "The Eiffel Tower is in Paris.",
            "It was built in 1889.",
            "I think it's beautiful."
        ]
    );
    assert_eq!(
        report.counts_by_label.values().sum::<usize>(),
        report.total_claims
    );
    for v in &report.verdicts {
        assert_eq!(v.label, VerdictLabel::Unverifiable);
        assert!(v.rationale.contains("no evidence found"));
    }
}

#[tokio::test]
async fn empty_input_fails_before_any_stage() {
    let extractor = Arc::new(CountingExtractor::default());
    let lookup = Arc::new(CountingLookup::default());
    let pipeline = FactCheckPipeline::new(
        extractor.clone(),
        ClaimVerifier::new(Lookups {
            source: lookup.clone(),
            registry: Arc::new(StaticLookup::new()),
            general: None,
        }),
    );

    for text in ["", "   \n\t"] {
        let err = pipeline.run(text).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputError);
    }
    let err = pipeline
        .run_request(
            FactCheckRequest {
                text: None,
                max_claims: None,
                sources: None,
            },
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputError);

    let err = pipeline
        .run_request(
            FactCheckRequest {
                text: Some(EIFFEL.into()),
                max_claims: Some(0),
                sources: None,
            },
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputError);

    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn order_and_cardinality_survive_partial_failure() {
    let lookup = Arc::new(CountingLookup::default());
    let verifier = ClaimVerifier::new(Lookups {
        source: lookup.clone(),
        registry: Arc::new(UnavailableLookup::new("registry down")),
        general: None,
    })
    .with_max_concurrent_claims(2);

    let claims = vec![
        Claim::new("Claim zero is a fact.", 0),
        Claim::new("This one will explode on lookup.", 1),
        Claim::new("", 2),
        Claim::new("Claim three is a fact.", 3),
    ];
    let verdicts = verifier.verify(claims.clone()).await;

    assert_eq!(verdicts.len(), 4);
    for (v, c) in verdicts.iter().zip(&claims) {
        assert_eq!(v.claim, *c);
    }
    assert_eq!(verdicts[1].label, VerdictLabel::Unverifiable);
    assert_eq!(verdicts[1].confidence, Confidence::Low);
    assert!(verdicts[1].rationale.contains("verification task failed"));
    assert!(verdicts[2].rationale.contains("blank claim text"));
    assert!(verdicts[3].rationale.contains("source unavailable: registry down"));
    // blank claim never reaches the lookups
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn all_lookups_failing_gives_unverifiable_low() {
    let pipeline = FactCheckPipeline::with_lookups(Lookups {
        source: Arc::new(UnavailableLookup::new("quota exceeded")),
        registry: Arc::new(UnavailableLookup::new("quota exceeded")),
        general: Some(Arc::new(UnavailableLookup::new("quota exceeded"))),
    });
    let report = pipeline.run(EIFFEL).await.unwrap();
    assert_eq!(report.count(VerdictLabel::Unverifiable), 3);
    for v in &report.verdicts {
        assert_eq!(v.confidence, Confidence::Low);
        assert!(v.rationale.contains("source unavailable"));
    }
    assert!(report.overall_assessment.contains("verify further"));
}

#[tokio::test]
async fn registry_false_rating_yields_false() {
    let registry = StaticLookup::new().with_entry_for("moon", false_rating());
    let pipeline = FactCheckPipeline::with_lookups(Lookups {
        source: Arc::new(StaticLookup::new()),
        registry: Arc::new(registry),
        general: None,
    });
    let report = pipeline
        .run("The moon is made of green cheese. Water boils at 100 degrees Celsius.")
        .await
        .unwrap();

    let moon = &report.verdicts[0];
    assert_eq!(moon.label, VerdictLabel::False);
    assert!(matches!(
        moon.confidence,
        Confidence::Medium | Confidence::High
    ));
    assert_eq!(moon.evidence[0].origin, EvidenceOrigin::Registry);
    assert_eq!(report.verdicts[1].label, VerdictLabel::Unverifiable);
    assert_eq!(report.count(VerdictLabel::False), 1);
}

#[tokio::test]
async fn slow_lookup_times_out_without_failing_the_claim() {
    let site = StaticLookup::new().with_hit(Evidence {
        source_name: "www.snopes.com".into(),
        url: "https://www.snopes.com/fact-check/eiffel".into(),
        snippet: "Yes, this is true: the tower stands on the Champ de Mars.".into(),
        origin: EvidenceOrigin::SiteSearch,
    });
    let verifier = ClaimVerifier::new(Lookups {
        source: Arc::new(site),
        registry: Arc::new(SlowLookup(Duration::from_secs(5))),
        general: Some(Arc::new(SlowLookup(Duration::from_secs(5)))),
    })
    .with_lookup_timeout(Duration::from_millis(50));

    let started = Instant::now();
    let verdicts = verifier
        .verify(vec![Claim::new("The Eiffel Tower is in Paris.", 0)])
        .await;
    assert!(started.elapsed() < Duration::from_secs(2));

    let v = &verdicts[0];
    assert_eq!(v.label, VerdictLabel::True);
    assert_eq!(v.confidence, Confidence::Medium);
    assert!(v.rationale.contains("source unavailable: timed out after 50ms"));
}

#[tokio::test]
async fn cancellation_stops_outstanding_lookups() {
    let pipeline = FactCheckPipeline::new(
        Arc::new(HeuristicExtractor::new()),
        ClaimVerifier::new(Lookups {
            source: Arc::new(StaticLookup::new()),
            registry: Arc::new(SlowLookup(Duration::from_secs(10))),
            general: None,
        })
        .with_lookup_timeout(Duration::from_secs(30)),
    );

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = pipeline
        .run_request(FactCheckRequest::new(EIFFEL), token)
        .await
        .unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(err.to_body().kind, ErrorKind::Cancelled);
    match err {
        FactCheckError::Cancelled { completed, total } => {
            assert_eq!(completed, 0);
            assert_eq!(total, 3);
        }
        other => panic!("expected cancellation, got {other}"),
    }
}

#[tokio::test]
async fn truncation_is_reported() {
    let text = "First claim is here. Second claim is here. Third claim is here. \
                Fourth claim is here. Fifth claim is here. Sixth claim is here.";
    let pipeline = FactCheckPipeline::with_lookups(offline());
    let report = pipeline
        .run_request(
            FactCheckRequest {
                text: Some(text.into()),
                max_claims: Some(2),
                sources: None,
            },
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(report.total_claims, 2);
    assert_eq!(report.total_claims_found, 6);
}
