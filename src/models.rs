//! Artifacts that flow between pipeline stages
//!
//! Each stage fully constructs its output and hands it forward:
//! `Extraction` → `Vec<Verdict>` → `Report`. Nothing here is mutated after construction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A discrete, checkable factual assertion taken verbatim from the input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    pub index: usize,
}

impl Claim {
    pub fn new(text: impl Into<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            index,
        }
    }
}

/// Output of the extraction stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub claims: Vec<Claim>,
    /// Candidate count before truncation to `max_claims`
    pub total_claims_found: usize,
}

/// Which lookup capability produced a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EvidenceOrigin {
    SiteSearch,
    Registry,
    GeneralSearch,
    /// Text the caller sent along with the request
    Provided,
}

impl EvidenceOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            EvidenceOrigin::SiteSearch => "fact-check site search",
            EvidenceOrigin::Registry => "fact-check registry",
            EvidenceOrigin::GeneralSearch => "general web search",
            EvidenceOrigin::Provided => "caller-supplied source",
        }
    }
}

impl fmt::Display for EvidenceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub source_name: String,
    pub url: String,
    pub snippet: String,
    pub origin: EvidenceOrigin,
}

/// A previously published fact-check determination from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub rating: String,
    pub publisher: String,
    pub url: String,
    #[serde(default)]
    pub review_date: Option<NaiveDate>,
    #[serde(default)]
    pub claim_reviewed: Option<String>,
}

impl RegistryEntry {
    pub fn to_evidence(&self) -> Evidence {
        let mut snippet = format!("Rated '{}' by {}", self.rating, self.publisher);
        if let Some(date) = self.review_date {
            snippet.push_str(&format!(" on {}", date));
        }
        if let Some(reviewed) = self.claim_reviewed.as_deref().filter(|c| !c.is_empty()) {
            snippet.push_str(&format!(" (reviewed claim: \"{}\")", reviewed));
        }
        Evidence {
            source_name: self.publisher.clone(),
            url: self.url.clone(),
            snippet,
            origin: EvidenceOrigin::Registry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VerdictLabel {
    True,
    False,
    PartiallyTrue,
    Unverifiable,
}

impl VerdictLabel {
    pub const ALL: [VerdictLabel; 4] = [
        VerdictLabel::True,
        VerdictLabel::False,
        VerdictLabel::PartiallyTrue,
        VerdictLabel::Unverifiable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictLabel::True => "True",
            VerdictLabel::False => "False",
            VerdictLabel::PartiallyTrue => "Partially true",
            VerdictLabel::Unverifiable => "Unverifiable",
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Numeric projection in [0, 1].
    pub fn score(&self) -> f32 {
        match self {
            Confidence::High => 0.9,
            Confidence::Medium => 0.6,
            Confidence::Low => 0.3,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Final determination for one claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub claim: Claim,
    pub label: VerdictLabel,
    pub confidence: Confidence,
    pub rationale: String,
    pub evidence: Vec<Evidence>,
}

/// Qualitative reliability of the whole input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reliability {
    High,
    Mixed,
    Low,
    Unknown,
}

/// Terminal artifact of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub total_claims: usize,
    pub total_claims_found: usize,
    pub counts_by_label: BTreeMap<VerdictLabel, usize>,
    pub verdicts: Vec<Verdict>,
    pub reliability: Reliability,
    pub overall_assessment: String,
}

impl Report {
    pub fn count(&self, label: VerdictLabel) -> usize {
        self.counts_by_label.get(&label).copied().unwrap_or(0)
    }
}
