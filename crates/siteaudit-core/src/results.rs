//! Per-module check output: issues, evidence, and scores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::modules::ModuleKey;

/// Maximum score a module (or the overall audit) can report.
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Lenient parse used for text-generator output. Unknown values map to
    /// `Medium`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" | "severe" => Severity::High,
            "low" | "minor" | "info" => Severity::Low,
            _ => Severity::Medium,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-only facts attached to a single issue. Never re-parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueEvidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IssueEvidence {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.found.is_none()
            && self.actual.is_none()
            && self.expected.is_none()
            && self.count.is_none()
            && self.details.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditIssue {
    pub title: String,
    pub severity: Severity,
    pub technical_explanation: String,
    pub plain_language_explanation: String,
    pub suggested_fix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<IssueEvidence>,
}

impl AuditIssue {
    pub fn new(
        title: impl Into<String>,
        severity: Severity,
        technical_explanation: impl Into<String>,
        plain_language_explanation: impl Into<String>,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            severity,
            technical_explanation: technical_explanation.into(),
            plain_language_explanation: plain_language_explanation.into(),
            suggested_fix: suggested_fix.into(),
            evidence: None,
        }
    }

    /// Attaches evidence; an all-empty evidence block is dropped.
    #[must_use]
    pub fn with_evidence(mut self, evidence: IssueEvidence) -> Self {
        self.evidence = if evidence.is_empty() {
            None
        } else {
            Some(evidence)
        };
        self
    }
}

/// Module-level key/value facts. Null and empty values are refused on insert
/// so the persisted blob only carries observed facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Evidence(BTreeMap<String, Value>);

impl Evidence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        if is_blank(&value) {
            return;
        }
        self.0.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Qualitative band derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    NeedsImprovement,
    NeedsWork,
}

impl ScoreBand {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => ScoreBand::Good,
            60..=79 => ScoreBand::NeedsImprovement,
            _ => ScoreBand::NeedsWork,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Good => "good",
            ScoreBand::NeedsImprovement => "needs improvement",
            ScoreBand::NeedsWork => "needs work",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResult {
    pub module_key: ModuleKey,
    pub score: u8,
    pub issues: Vec<AuditIssue>,
    pub summary: String,
    pub evidence: Evidence,
}

impl ModuleResult {
    /// Builds a result, clamping `score` into `0..=100`.
    #[must_use]
    pub fn new(
        module_key: ModuleKey,
        score: i32,
        issues: Vec<AuditIssue>,
        summary: String,
        evidence: Evidence,
    ) -> Self {
        let score = u8::try_from(score.clamp(0, i32::from(MAX_SCORE))).unwrap_or(0);
        Self {
            module_key,
            score,
            issues,
            summary,
            evidence,
        }
    }

    /// Stand-in result for a module whose check could not run.
    #[must_use]
    pub fn degraded(module_key: ModuleKey, reason: &str) -> Self {
        let issue = AuditIssue::new(
            format!("{} check could not be completed", module_key.display_name()),
            Severity::High,
            format!("The {} check failed while analyzing the page: {reason}", module_key.as_str()),
            "We were not able to finish this part of the audit, so its score could not be calculated.",
            "Our team has been notified. Re-running the audit once the site is reachable usually resolves this.",
        );
        let mut evidence = Evidence::new();
        evidence.insert("degraded", true);
        Self {
            module_key,
            score: 0,
            issues: vec![issue],
            summary: format!(
                "The {} check could not be completed for this page.",
                module_key.display_name()
            ),
            evidence,
        }
    }

    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.evidence.get("degraded").and_then(Value::as_bool) == Some(true)
    }
}

/// `round(mean(scores))`, or 0 when there are no results.
#[must_use]
pub fn overall_score(results: &[ModuleResult]) -> u8 {
    if results.is_empty() {
        return 0;
    }
    let sum: u32 = results.iter().map(|r| u32::from(r.score)).sum();
    let count = u32::try_from(results.len()).unwrap_or(u32::MAX);
    // Integer half-up rounding; scores are non-negative.
    let rounded = (sum * 2 + count) / (count * 2);
    u8::try_from(rounded.min(u32::from(MAX_SCORE))).unwrap_or(MAX_SCORE)
}
