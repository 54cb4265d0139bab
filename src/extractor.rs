//! Claim extraction: turn free-form text into a bounded, ordered list of candidate claims
//!
//! `HeuristicExtractor` is the deterministic baseline and always available.
//! `ModelClaimExtractor` asks a completion model which baseline candidates are factual
//! assertions (dropping opinions) and falls back to the baseline on any failure.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clients::TextCompleter;
use crate::models::{Claim, Extraction};

pub const DEFAULT_MAX_CLAIMS: usize = 5;
pub const DEFAULT_MIN_CLAIM_CHARS: usize = 10;

/// Joining extracted claims with this delimiter and extracting again yields the same claims.
pub const CLAIM_DELIMITER: &str = "\n\n";

#[async_trait]
pub trait ClaimExtractor: Send + Sync {
    /// Never fails; empty or all-too-short input yields an empty extraction.
    async fn extract(&self, text: &str, max_claims: usize) -> Extraction;
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？')
}

fn is_wide_terminator(c: char) -> bool {
    matches!(c, '。' | '！' | '？')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | ')' | ']' | '」' | '』')
}

/// Split text into sentence-like units. Units keep their terminating punctuation.
///
/// A boundary is a run of terminators (plus trailing closing quotes/brackets) followed by
/// whitespace or end of input, or a blank line. Full-width terminators always end a unit.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if c == '\n' {
            let rest = &text[i + 1..];
            if rest.trim_start_matches([' ', '\t', '\r']).starts_with('\n') {
                units.push(&text[start..i]);
                start = i + 1;
            }
            continue;
        }
        if !is_terminator(c) {
            continue;
        }

        let mut end = i + c.len_utf8();
        let mut wide = is_wide_terminator(c);
        while let Some(&(j, n)) = iter.peek() {
            if is_terminator(n) || is_closer(n) {
                wide |= is_wide_terminator(n);
                end = j + n.len_utf8();
                iter.next();
            } else {
                break;
            }
        }

        let at_boundary = match iter.peek() {
            None => true,
            Some(&(_, n)) => n.is_whitespace(),
        };
        if at_boundary || wide {
            units.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        units.push(&text[start..]);
    }
    units
}

/// Deterministic sentence-split extractor
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    min_claim_chars: usize,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self {
            min_claim_chars: DEFAULT_MIN_CLAIM_CHARS,
        }
    }

    pub fn with_min_claim_chars(min_claim_chars: usize) -> Self {
        Self {
            min_claim_chars: min_claim_chars.max(1),
        }
    }

    /// Length used for the noise threshold; trailing punctuation does not count.
    fn content_len(unit: &str) -> usize {
        unit.trim_end_matches(|c: char| is_terminator(c) || is_closer(c))
            .chars()
            .count()
    }

    /// All surviving candidates, untruncated, in order of appearance.
    pub fn candidates(&self, text: &str) -> Vec<String> {
        split_sentences(text)
            .into_iter()
            .map(str::trim)
            .filter(|unit| Self::content_len(unit) >= self.min_claim_chars)
            .map(str::to_string)
            .collect()
    }

    pub fn extract_sync(&self, text: &str, max_claims: usize) -> Extraction {
        build_extraction(self.candidates(text), max_claims)
    }
}

#[async_trait]
impl ClaimExtractor for HeuristicExtractor {
    async fn extract(&self, text: &str, max_claims: usize) -> Extraction {
        self.extract_sync(text, max_claims)
    }
}

fn build_extraction(candidates: Vec<String>, max_claims: usize) -> Extraction {
    let total_claims_found = candidates.len();
    let claims = candidates
        .into_iter()
        .take(max_claims)
        .enumerate()
        .map(|(index, text)| Claim { text, index })
        .collect();
    Extraction {
        claims,
        total_claims_found,
    }
}

const FILTER_INSTRUCTION: &str = "\
You are selecting verifiable factual claims from a list of sentences.
Rules:
1. Keep only specific, checkable statements of fact.
2. Exclude opinions, feelings and subjective judgements.
3. Prefer sentences containing dates, numbers, names of people or places.
Respond with a JSON array of the numbers of the sentences to keep, e.g. [1, 3]. No other text.";

pub fn build_filter_prompt(candidates: &[String]) -> String {
    let mut prompt = String::from(FILTER_INSTRUCTION);
    prompt.push_str("\n\nSentences:\n");
    for (i, c) in candidates.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, c));
    }
    prompt
}

/// Parse the model's 1-based selection. `None` means the reply was unusable.
pub fn parse_selection(raw: &str, candidate_count: usize) -> Option<BTreeSet<usize>> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }
    let numbers: Vec<serde_json::Value> = serde_json::from_str(&raw[start..=end]).ok()?;
    let mut selected = BTreeSet::new();
    for n in numbers {
        let n = match n {
            serde_json::Value::Number(n) => n.as_u64()?,
            serde_json::Value::String(s) => s.trim().parse::<u64>().ok()?,
            _ => return None,
        };
        let n = n as usize;
        if (1..=candidate_count).contains(&n) {
            selected.insert(n - 1);
        }
    }
    Some(selected)
}

/// Model-assisted extractor. Claims remain verbatim baseline candidates.
pub struct ModelClaimExtractor {
    baseline: HeuristicExtractor,
    completer: Arc<dyn TextCompleter>,
    timeout: Duration,
}

impl ModelClaimExtractor {
    pub fn new(
        baseline: HeuristicExtractor,
        completer: Arc<dyn TextCompleter>,
        timeout: Duration,
    ) -> Self {
        Self {
            baseline,
            completer,
            timeout,
        }
    }
}

#[async_trait]
impl ClaimExtractor for ModelClaimExtractor {
    async fn extract(&self, text: &str, max_claims: usize) -> Extraction {
        let candidates = self.baseline.candidates(text);
        if candidates.is_empty() {
            return Extraction::default();
        }

        let prompt = build_filter_prompt(&candidates);
        let reply = tokio::time::timeout(self.timeout, self.completer.complete(&prompt)).await;
        let selection = match reply {
            Ok(Ok(raw)) => {
                let parsed = parse_selection(&raw, candidates.len());
                if parsed.is_none() {
                    warn!(
                        "{} returned an unusable claim selection; using heuristic claims",
                        self.completer.name()
                    );
                }
                parsed
            }
            Ok(Err(e)) => {
                warn!("claim filter failed ({}); using heuristic claims", e);
                None
            }
            Err(_) => {
                warn!(
                    "claim filter timed out after {}ms; using heuristic claims",
                    self.timeout.as_millis()
                );
                None
            }
        };

        let Some(selected) = selection else {
            return build_extraction(candidates, max_claims);
        };

        debug!(
            "claim filter kept {} of {} candidates",
            selected.len(),
            candidates.len()
        );
        let kept = candidates
            .into_iter()
            .enumerate()
            .filter(|(i, _)| selected.contains(i))
            .map(|(_, c)| c)
            .collect();
        build_extraction(kept, max_claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::CompletionError;

    const EIFFEL: &str =
        "The Eiffel Tower is in Paris. It was built in 1889. I think it's beautiful.";

    fn texts(e: &Extraction) -> Vec<&str> {
        e.claims.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn eiffel_scenario_keeps_all_three_under_fallback_rule() {
        let e = HeuristicExtractor::new().extract_sync(EIFFEL, DEFAULT_MAX_CLAIMS);
        assert_eq!(
            texts(&e),
            vec![
                "The Eiffel Tower is in Paris.",
                "It was built in 1889.",
                "I think it's beautiful."
            ]
        );
        assert_eq!(e.total_claims_found, 3);
        let indices: Vec<usize> = e.claims.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn short_fragments_are_noise() {
        let e = HeuristicExtractor::new().extract_sync("Yes. No! Ok? Water boils at 100 C.", 5);
        assert_eq!(texts(&e), vec!["Water boils at 100 C."]);
    }

    #[test]
    fn empty_and_short_input_yield_no_claims() {
        let ex = HeuristicExtractor::new();
        assert!(ex.extract_sync("", 5).claims.is_empty());
        assert!(ex.extract_sync("   \n\n ", 5).claims.is_empty());
        assert!(ex.extract_sync("Hi. Sure.", 5).claims.is_empty());
    }

    #[test]
    fn decimals_and_abbreviations_do_not_split() {
        let e = HeuristicExtractor::new()
            .extract_sync("Pi is roughly 3.14 in most textbooks. The U.S.A has fifty states.", 5);
        assert_eq!(
            texts(&e),
            vec!["Pi is roughly 3.14 in most textbooks.", "The U.S.A has fifty states."]
        );
    }

    #[test]
    fn truncation_reports_total_found_and_reindexes() {
        let text = "First claim is here. Second claim is here. Third claim is here. \
                    Fourth claim is here. Fifth claim is here. Sixth claim is here. \
                    Seventh claim is here.";
        let e = HeuristicExtractor::new().extract_sync(text, 5);
        assert_eq!(e.claims.len(), 5);
        assert_eq!(e.total_claims_found, 7);
        assert_eq!(e.claims[4].index, 4);
        assert_eq!(e.claims[4].text, "Fifth claim is here.");
    }

    #[test]
    fn cardinality_is_bounded_and_monotonic() {
        let text = "Alpha claim sentence one. Beta claim sentence two! Gamma claim sentence three? \
                    Delta claim sentence four.";
        let ex = HeuristicExtractor::new();
        let mut prev = 0;
        for n in 0..8 {
            let len = ex.extract_sync(text, n).claims.len();
            assert!(len <= n);
            assert!(len >= prev);
            prev = len;
        }
        assert_eq!(prev, 4);
    }

    #[test]
    fn extraction_is_idempotent_on_joined_output() {
        let text = "Heading without a period\n\nThe moon orbits the Earth. \
                    \"It is 384,400 km away.\" Really?! Mars has two moons。火星には衛星が二つある。";
        let ex = HeuristicExtractor::new();
        let first = ex.extract_sync(text, 10);
        let joined = first
            .claims
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(CLAIM_DELIMITER);
        let second = ex.extract_sync(&joined, 10);
        assert_eq!(first.claims, second.claims);
        assert!(!first.claims.is_empty());
    }

    #[test]
    fn wide_terminators_split_without_spaces() {
        let units = split_sentences("東京は日本の首都です。富士山は日本で一番高い山です。");
        assert_eq!(units.len(), 2);
    }

    #[test]
    fn selection_parsing_tolerates_fences_and_ignores_out_of_range() {
        let sel = parse_selection("```json\n[1, \"3\", 9]\n```", 3).unwrap();
        assert_eq!(sel.into_iter().collect::<Vec<_>>(), vec![0, 2]);
        assert!(parse_selection("no idea", 3).is_none());
        assert!(parse_selection("[true]", 3).is_none());
        assert!(parse_selection("[]", 3).unwrap().is_empty());
    }

    struct Scripted(Result<String, ()>);

    #[async_trait]
    impl TextCompleter for Scripted {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            self.0.clone().map_err(|_| CompletionError::NotConfigured)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn model_filter_drops_opinions_but_keeps_text_verbatim() {
        let ex = ModelClaimExtractor::new(
            HeuristicExtractor::new(),
            Arc::new(Scripted(Ok("[1, 2]".into()))),
            Duration::from_secs(1),
        );
        let e = ex.extract(EIFFEL, 5).await;
        assert_eq!(
            texts(&e),
            vec!["The Eiffel Tower is in Paris.", "It was built in 1889."]
        );
        assert_eq!(e.total_claims_found, 2);
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_heuristic() {
        let ex = ModelClaimExtractor::new(
            HeuristicExtractor::new(),
            Arc::new(Scripted(Err(()))),
            Duration::from_secs(1),
        );
        let e = ex.extract(EIFFEL, 5).await;
        assert_eq!(e.claims.len(), 3);

        let ex = ModelClaimExtractor::new(
            HeuristicExtractor::new(),
            Arc::new(Scripted(Ok("I cannot help with that".into()))),
            Duration::from_secs(1),
        );
        assert_eq!(ex.extract(EIFFEL, 2).await.claims.len(), 2);
    }
}
