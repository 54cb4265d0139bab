//! Report aggregation and markdown rendering

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::models::{Reliability, Report, Verdict, VerdictLabel};

/// Pure fold of verdicts into a `Report`.
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, verdicts: Vec<Verdict>) -> Report {
        let found = verdicts.len();
        self.generate_with_found(verdicts, found)
    }

    /// `total_claims_found` is the extractor's count before truncation.
    pub fn generate_with_found(&self, verdicts: Vec<Verdict>, total_claims_found: usize) -> Report {
        let mut counts_by_label: BTreeMap<VerdictLabel, usize> =
            VerdictLabel::ALL.iter().map(|l| (*l, 0)).collect();
        for v in &verdicts {
            *counts_by_label.entry(v.label).or_insert(0) += 1;
        }

        let total_claims = verdicts.len();
        let reliability = reliability_of(&counts_by_label, total_claims);
        let overall_assessment = assess(
            &counts_by_label,
            total_claims,
            total_claims_found.max(total_claims),
            reliability,
        );

        Report {
            total_claims,
            total_claims_found: total_claims_found.max(total_claims),
            counts_by_label,
            verdicts,
            reliability,
            overall_assessment,
        }
    }
}

fn count(counts: &BTreeMap<VerdictLabel, usize>, label: VerdictLabel) -> usize {
    counts.get(&label).copied().unwrap_or(0)
}

pub fn reliability_of(counts: &BTreeMap<VerdictLabel, usize>, total: usize) -> Reliability {
    if total == 0 {
        return Reliability::Unknown;
    }
    let non_true = total - count(counts, VerdictLabel::True);
    let share = non_true as f64 / total as f64;
    if share <= 0.2 {
        Reliability::High
    } else if share <= 0.5 {
        Reliability::Mixed
    } else {
        Reliability::Low
    }
}

fn reliability_str(r: Reliability) -> &'static str {
    match r {
        Reliability::High => "high",
        Reliability::Mixed => "mixed",
        Reliability::Low => "low",
        Reliability::Unknown => "unknown",
    }
}

fn assess(
    counts: &BTreeMap<VerdictLabel, usize>,
    total: usize,
    found: usize,
    reliability: Reliability,
) -> String {
    if total == 0 {
        return "No checkable factual claims were found; overall reliability is unknown."
            .to_string();
    }

    let false_n = count(counts, VerdictLabel::False);
    let partial_n = count(counts, VerdictLabel::PartiallyTrue);
    let unverifiable_n = count(counts, VerdictLabel::Unverifiable);

    let mut out = format!(
        "Overall reliability is {}. {} claim(s) checked: {} true, {} false, {} partially true, {} unverifiable.",
        reliability_str(reliability),
        total,
        count(counts, VerdictLabel::True),
        false_n,
        partial_n,
        unverifiable_n
    );
    if found > total {
        let _ = write!(out, " Only the first {} of {} claims found were checked.", total, found);
    }
    if false_n > 0 {
        let _ = write!(out, " Correct or remove the {} false claim(s).", false_n);
    }
    if partial_n > 0 {
        let _ = write!(
            out,
            " Add context to the {} partially true claim(s).",
            partial_n
        );
    }
    if unverifiable_n * 2 >= total {
        out.push_str(" Many claims could not be checked; verify further with primary sources.");
    }
    out
}

impl Report {
    /// Human-readable report: overview, per-claim details, overall assessment.
    pub fn render_markdown(&self) -> String {
        let mut md = String::from("## Fact-Check Report\n\n### Overview\n");
        let _ = writeln!(md, "- Claims checked: {}", self.total_claims);
        if self.total_claims_found > self.total_claims {
            let _ = writeln!(md, "- Claims found: {}", self.total_claims_found);
        }
        let _ = writeln!(
            md,
            "- {}",
            VerdictLabel::ALL
                .iter()
                .map(|l| format!("{}: {}", l, self.count(*l)))
                .collect::<Vec<_>>()
                .join(" | ")
        );

        md.push_str("\n### Claim Details\n");
        if self.verdicts.is_empty() {
            md.push_str("\nNo claims to report.\n");
        }
        for v in &self.verdicts {
            let _ = writeln!(md, "\n#### Claim {}", v.claim.index + 1);
            let _ = writeln!(md, "1. **Claim**: {}", v.claim.text);
            let _ = writeln!(md, "2. **Verdict**: {}", v.label);
            let _ = writeln!(md, "3. **Basis**: {}", v.rationale);
            for e in &v.evidence {
                let _ = writeln!(md, "   - [{}]({}) ({})", e.source_name, e.url, e.origin);
            }
            let _ = writeln!(md, "4. **Confidence**: {}", v.confidence);
        }

        md.push_str("\n### Overall Assessment\n");
        let _ = writeln!(md, "- Reliability: {}", reliability_str(self.reliability));
        let _ = writeln!(md, "- {}", self.overall_assessment);
        md
    }
}
