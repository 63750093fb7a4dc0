//! Penalty bookkeeping shared by the check modules.

use serde_json::Value;
use siteaudit_core::{AuditIssue, Evidence, ModuleKey, ModuleResult, ScoreBand, Severity, MAX_SCORE};

/// Starts at 100 and subtracts a fixed penalty per issue. The final score is
/// clamped by [`ModuleResult::new`].
#[derive(Debug)]
pub(crate) struct Scorecard {
    key: ModuleKey,
    score: i32,
    issues: Vec<AuditIssue>,
    evidence: Evidence,
}

impl Scorecard {
    pub(crate) fn new(key: ModuleKey) -> Self {
        Self {
            key,
            score: i32::from(MAX_SCORE),
            issues: Vec::new(),
            evidence: Evidence::new(),
        }
    }

    pub(crate) fn penalize(&mut self, penalty: i32, issue: AuditIssue) {
        self.score -= penalty;
        self.issues.push(issue);
    }

    /// Records an issue that carries no penalty.
    pub(crate) fn note(&mut self, issue: AuditIssue) {
        self.issues.push(issue);
    }

    pub(crate) fn evidence(&mut self, key: &str, value: impl Into<Value>) {
        self.evidence.insert(key, value);
    }

    pub(crate) fn score(&self) -> i32 {
        self.score
    }

    pub(crate) fn finish(self) -> ModuleResult {
        let clamped = u8::try_from(self.score.clamp(0, i32::from(MAX_SCORE))).unwrap_or(0);
        let summary = summarize(self.key, clamped, &self.issues);
        ModuleResult::new(self.key, self.score, self.issues, summary, self.evidence)
    }
}

fn summarize(key: ModuleKey, score: u8, issues: &[AuditIssue]) -> String {
    let name = key.display_name();
    if issues.is_empty() {
        return format!("{name} scored {score}/100 with no issues found.");
    }
    let high = issues.iter().filter(|i| i.severity == Severity::High).count();
    let noun = if issues.len() == 1 { "issue" } else { "issues" };
    let band = match ScoreBand::from_score(score) {
        ScoreBand::Good => "is in good shape",
        ScoreBand::NeedsImprovement => "needs improvement",
        ScoreBand::NeedsWork => "needs work",
    };
    if high > 0 {
        format!(
            "{name} {band} ({score}/100): {} {noun} found, {high} high priority.",
            issues.len()
        )
    } else {
        format!("{name} {band} ({score}/100): {} {noun} found.", issues.len())
    }
}
