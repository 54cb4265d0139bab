//! Per-claim verdict reduction
//!
//! Folds the lookup responses for one claim, plus any caller-supplied sources that bear on
//! it, into a single `Verdict`. Registry ratings take precedence over snippet stance; the
//! rationale names every origin, including the ones that failed.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lookup::LookupResponse;
use crate::models::{
    Claim, Confidence, Evidence, EvidenceOrigin, RegistryEntry, Verdict, VerdictLabel,
};

/// Normalized registry rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingClass {
    True,
    False,
    Mixed,
    Unrated,
}

/// Qualifiers that make a rating partial regardless of its other words
pub const MIXED_RATING_PATTERNS: &[&str] = &[
    "half",
    "mostly",
    "partly",
    "partially",
    "mix",
    "misleading",
    "missing context",
    "exaggerat",
];

pub const UNRATED_PATTERNS: &[&str] = &["unproven", "unverified", "unsupported"];

pub const FALSE_RATING_PATTERNS: &[&str] = &[
    "false",
    "pants on fire",
    "fake",
    "incorrect",
    "inaccurate",
    "untrue",
    "not true",
    "wrong",
    "hoax",
    "debunked",
];

pub const TRUE_RATING_PATTERNS: &[&str] = &["true", "correct", "accurate", "verified"];

/// A negation in front of a verification word: "not verified", "never confirmed".
static NEGATED_UNCONFIRMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:not|never|\w+n['’]t)\s+(?:\w+\s+)?(?:verified|confirmed|proven|supported|substantiated)\b",
    )
    .expect("negated confirmation regex")
});

/// A negation in front of a truth word: "not correct", "isn't true".
static NEGATED_TRUTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:not|never|\w+n['’]t)\s+(?:\w+\s+)?(?:true|correct|accurate|factual)\b")
        .expect("negated truth regex")
});

/// Negated phrases are read before the bare word lists, so "Not correct" is False and
/// "Not verified" is Unrated.
pub fn classify_rating(rating: &str) -> RatingClass {
    let r = rating.to_lowercase();
    let any = |patterns: &[&str]| patterns.iter().any(|p| r.contains(p));
    if any(MIXED_RATING_PATTERNS) {
        RatingClass::Mixed
    } else if NEGATED_UNCONFIRMED.is_match(&r) {
        RatingClass::Unrated
    } else if NEGATED_TRUTH.is_match(&r) {
        RatingClass::False
    } else if any(UNRATED_PATTERNS) {
        RatingClass::Unrated
    } else if any(FALSE_RATING_PATTERNS) {
        RatingClass::False
    } else if any(TRUE_RATING_PATTERNS) {
        RatingClass::True
    } else {
        RatingClass::Unrated
    }
}

/// How a search snippet bears on the claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Supports,
    Refutes,
    Inconclusive,
}

static REFUTE_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(false|fake|hoax|debunk(ed|s)?|myth|incorrect|inaccurate|untrue|(?:not|never|\w+n['’]t)\s+(?:\w+\s+)?(?:true|correct|accurate|factual)|no evidence|baseless|fabricated|pants on fire|misinformation|wrong)\b",
    )
    .expect("refute marker regex")
});

static SUPPORT_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(true|confirmed|correct|accurate|verified|factual|authentic|genuine)\b")
        .expect("support marker regex")
});

/// Negated confirmations ("not confirmed") are dropped as neutral, then refute markers are
/// matched and removed, so "not true" never counts as support.
pub fn classify_stance(snippet: &str) -> Stance {
    let snippet = NEGATED_UNCONFIRMED.replace_all(snippet, " ");
    let refutes = REFUTE_MARKERS.is_match(&snippet);
    let remainder = REFUTE_MARKERS.replace_all(&snippet, " ");
    let supports = SUPPORT_MARKERS.is_match(&remainder);
    match (supports, refutes) {
        (true, false) => Stance::Supports,
        (false, true) => Stance::Refutes,
        _ => Stance::Inconclusive,
    }
}

/// Lookup results for one claim. Timeouts arrive here as error responses.
#[derive(Debug, Clone)]
pub struct ClaimLookups {
    pub site: LookupResponse<Evidence>,
    pub registry: LookupResponse<RegistryEntry>,
    /// `None` when general search is disabled
    pub general: Option<LookupResponse<Evidence>>,
    /// Caller-supplied sources that share terms with the claim
    pub provided: Vec<Evidence>,
}

const TERM_STOPWORDS: &[&str] = &[
    "about", "after", "been", "from", "have", "into", "that", "their", "there", "they", "this",
    "were", "what", "when", "which", "with",
];

/// Lowercased words of four or more characters, minus common function words.
fn content_terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
        .map(str::to_lowercase)
        .filter(|w| !TERM_STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// A source bears on a claim when it shares at least two of the claim's content terms
/// (or the only one, for very short claims).
pub fn source_applies(claim_text: &str, source_text: &str) -> bool {
    let claim_terms = content_terms(claim_text);
    if claim_terms.is_empty() {
        return false;
    }
    let shared = content_terms(source_text)
        .intersection(&claim_terms)
        .count();
    shared >= claim_terms.len().min(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    True,
    False,
}

/// Aggregate stance of one search origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OriginStance {
    Empty,
    Consistent(Direction),
    Conflicting,
    Inconclusive,
}

#[derive(Debug, Default, Clone, Copy)]
struct StanceTally {
    supports: usize,
    refutes: usize,
    inconclusive: usize,
}

impl StanceTally {
    fn of(hits: &[Evidence]) -> Self {
        let mut t = Self::default();
        for hit in hits {
            match classify_stance(&hit.snippet) {
                Stance::Supports => t.supports += 1,
                Stance::Refutes => t.refutes += 1,
                Stance::Inconclusive => t.inconclusive += 1,
            }
        }
        t
    }

    fn total(&self) -> usize {
        self.supports + self.refutes + self.inconclusive
    }

    fn stance(&self) -> OriginStance {
        match (self.supports, self.refutes) {
            _ if self.total() == 0 => OriginStance::Empty,
            (0, 0) => OriginStance::Inconclusive,
            (_, 0) => OriginStance::Consistent(Direction::True),
            (0, _) => OriginStance::Consistent(Direction::False),
            _ => OriginStance::Conflicting,
        }
    }

    fn add(self, other: Self) -> Self {
        Self {
            supports: self.supports + other.supports,
            refutes: self.refutes + other.refutes,
            inconclusive: self.inconclusive + other.inconclusive,
        }
    }
}

fn direction_label(d: Direction) -> VerdictLabel {
    match d {
        Direction::True => VerdictLabel::True,
        Direction::False => VerdictLabel::False,
    }
}

fn describe_search(origin: EvidenceOrigin, resp: &LookupResponse<Evidence>) -> String {
    if !resp.is_ok() {
        return format!(
            "{}: source unavailable: {}",
            origin,
            resp.message.as_deref().unwrap_or("lookup failed")
        );
    }
    if resp.items.is_empty() {
        return format!("{}: no results", origin);
    }
    describe_hits(origin, &resp.items)
}

fn describe_hits(origin: EvidenceOrigin, hits: &[Evidence]) -> String {
    let t = StanceTally::of(hits);
    format!(
        "{}: {} result(s), {} supporting, {} refuting, {} inconclusive",
        origin,
        t.total(),
        t.supports,
        t.refutes,
        t.inconclusive
    )
}

fn describe_registry(resp: &LookupResponse<RegistryEntry>) -> String {
    let origin = EvidenceOrigin::Registry;
    if !resp.is_ok() {
        return format!(
            "{}: source unavailable: {}",
            origin,
            resp.message.as_deref().unwrap_or("lookup failed")
        );
    }
    if resp.items.is_empty() {
        return format!("{}: no prior fact-checks", origin);
    }
    let ratings = resp
        .items
        .iter()
        .map(|e| format!("'{}' by {}", e.rating, e.publisher))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}: rated {}", origin, ratings)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistryReading {
    Agree(Direction),
    Split,
}

/// `None` when no entry carries a usable rating.
fn read_registry(entries: &[RegistryEntry]) -> Option<RegistryReading> {
    let mut seen_true = false;
    let mut seen_false = false;
    for entry in entries {
        match classify_rating(&entry.rating) {
            RatingClass::True => seen_true = true,
            RatingClass::False => seen_false = true,
            RatingClass::Mixed => return Some(RegistryReading::Split),
            RatingClass::Unrated => {}
        }
    }
    match (seen_true, seen_false) {
        (false, false) => None,
        (true, false) => Some(RegistryReading::Agree(Direction::True)),
        (false, true) => Some(RegistryReading::Agree(Direction::False)),
        (true, true) => Some(RegistryReading::Split),
    }
}

/// Reduce one claim's lookups into its verdict.
pub fn reduce(claim: Claim, lookups: ClaimLookups) -> Verdict {
    let empty = LookupResponse::ok(Vec::new());
    let site_hits: &[Evidence] = if lookups.site.is_ok() {
        lookups.site.items.as_slice()
    } else {
        &[]
    };
    let general_resp = lookups.general.as_ref().unwrap_or(&empty);
    let general_hits: &[Evidence] = if general_resp.is_ok() {
        general_resp.items.as_slice()
    } else {
        &[]
    };
    let entries: &[RegistryEntry] = if lookups.registry.is_ok() {
        lookups.registry.items.as_slice()
    } else {
        &[]
    };

    let site_tally = StanceTally::of(site_hits);
    let general_tally = StanceTally::of(general_hits);
    let provided_tally = StanceTally::of(&lookups.provided);
    let search_stances = [
        site_tally.stance(),
        general_tally.stance(),
        provided_tally.stance(),
    ];

    let (label, confidence, conclusion) = match read_registry(entries) {
        Some(RegistryReading::Agree(dir)) => {
            let agreeing = 1 + search_stances
                .iter()
                .filter(|s| **s == OriginStance::Consistent(dir))
                .count();
            let opposed = search_stances.iter().any(|s| {
                matches!(s, OriginStance::Consistent(d) if *d != dir)
                    || *s == OriginStance::Conflicting
            });
            let confidence = if opposed {
                Confidence::Low
            } else if agreeing >= 2 {
                Confidence::High
            } else {
                Confidence::Medium
            };
            let label = direction_label(dir);
            let conclusion = if opposed {
                format!(
                    "Published fact-checks rate the claim {}, though some search results disagree",
                    label.as_str().to_lowercase()
                )
            } else {
                format!(
                    "Published fact-checks rate the claim {} ({} agreeing source(s))",
                    label.as_str().to_lowercase(),
                    agreeing
                )
            };
            (label, confidence, conclusion)
        }
        Some(RegistryReading::Split) => (
            VerdictLabel::PartiallyTrue,
            Confidence::Low,
            "Published fact-checks give mixed or disagreeing ratings".to_string(),
        ),
        None => {
            let combined = site_tally.add(general_tally).add(provided_tally);
            match combined.stance() {
                OriginStance::Empty if !entries.is_empty() => (
                    VerdictLabel::Unverifiable,
                    Confidence::Low,
                    "Unverifiable: prior fact-checks exist but carry no usable rating".to_string(),
                ),
                OriginStance::Empty => (
                    VerdictLabel::Unverifiable,
                    Confidence::Low,
                    "Unverifiable: no evidence found".to_string(),
                ),
                OriginStance::Conflicting => (
                    VerdictLabel::PartiallyTrue,
                    Confidence::Low,
                    "Gathered evidence conflicts on the claim".to_string(),
                ),
                OriginStance::Inconclusive => (
                    VerdictLabel::PartiallyTrue,
                    Confidence::Low,
                    "Gathered evidence mentions the claim but is inconclusive".to_string(),
                ),
                OriginStance::Consistent(dir) => {
                    let agreeing = search_stances
                        .iter()
                        .filter(|s| **s == OriginStance::Consistent(dir))
                        .count();
                    let confidence = if agreeing >= 2 {
                        Confidence::High
                    } else {
                        Confidence::Medium
                    };
                    let verb = match dir {
                        Direction::True => "support",
                        Direction::False => "refute",
                    };
                    (
                        direction_label(dir),
                        confidence,
                        format!("Gathered evidence consistently {} the claim", verb),
                    )
                }
            }
        }
    };

    let mut parts = vec![
        describe_search(EvidenceOrigin::SiteSearch, &lookups.site),
        describe_registry(&lookups.registry),
    ];
    if let Some(general) = lookups.general.as_ref() {
        parts.push(describe_search(EvidenceOrigin::GeneralSearch, general));
    }
    if !lookups.provided.is_empty() {
        parts.push(describe_hits(EvidenceOrigin::Provided, &lookups.provided));
    }
    let rationale = format!("{}. {}.", conclusion, parts.join("; "));

    let mut evidence: Vec<Evidence> = site_hits.to_vec();
    evidence.extend(entries.iter().map(RegistryEntry::to_evidence));
    evidence.extend(general_hits.iter().cloned());
    evidence.extend(lookups.provided.iter().cloned());

    Verdict {
        claim,
        label,
        confidence,
        rationale,
        evidence,
    }
}

/// Slot-filling verdict for a claim whose reduction failed.
pub fn reduction_failure(claim: Claim, message: &str) -> Verdict {
    Verdict {
        claim,
        label: VerdictLabel::Unverifiable,
        confidence: Confidence::Low,
        rationale: format!("Unverifiable: claim could not be processed ({})", message),
        evidence: Vec::new(),
    }
}
