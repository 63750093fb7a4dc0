//! Audit record views read and written by the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::ModuleKey;
use crate::results::ModuleResult;

/// Maximum number of characters kept from an error's source chain.
pub const ERROR_STACK_MAX_CHARS: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pending,
    Running,
    GeneratingReport,
    Completed,
    Failed,
}

impl AuditStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Pending => "pending",
            AuditStatus::Running => "running",
            AuditStatus::GeneratingReport => "generating_report",
            AuditStatus::Completed => "completed",
            AuditStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(AuditStatus::Pending),
            "running" => Some(AuditStatus::Running),
            "generating_report" => Some(AuditStatus::GeneratingReport),
            "completed" => Some(AuditStatus::Completed),
            "failed" => Some(AuditStatus::Failed),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, AuditStatus::Completed | AuditStatus::Failed)
    }

    /// Whether the pipeline may move an audit from `self` to `next`.
    ///
    /// Any state may fail. `Failed` may restart (external retry sweep);
    /// `Completed` is final.
    #[must_use]
    pub fn can_transition_to(self, next: AuditStatus) -> bool {
        use AuditStatus::{Completed, Failed, GeneratingReport, Pending, Running};
        match (self, next) {
            (Completed, _) => false,
            (_, Failed) | (Pending | Running | GeneratingReport | Failed, Running) => true,
            (Running, GeneratingReport) | (GeneratingReport, Completed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of an audit record the pipeline needs to run it.
#[derive(Debug, Clone)]
pub struct AuditJob {
    pub id: Uuid,
    pub url: String,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub competitor_url: Option<String>,
    /// Purchased modules, in purchase order.
    pub modules: Vec<ModuleKey>,
    /// One-time token embedded in the emailed report link.
    pub access_token: String,
    pub status: AuditStatus,
}

/// Structured error snapshot persisted with a failed audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub error_name: String,
    pub error_message: String,
    pub error_stack: String,
    pub stage: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorEnvelope {
    /// Captures `err` and its `source()` chain.
    pub fn capture(
        error_name: impl Into<String>,
        stage: impl Into<String>,
        err: &(dyn std::error::Error + 'static),
    ) -> Self {
        let mut chain = Vec::new();
        let mut current = err.source();
        while let Some(source) = current {
            chain.push(source.to_string());
            current = source.source();
        }
        let stack = if chain.is_empty() {
            err.to_string()
        } else {
            format!("{err}\ncaused by: {}", chain.join("\ncaused by: "))
        };
        Self {
            error_name: error_name.into(),
            error_message: err.to_string(),
            error_stack: truncate_chars(&stack, ERROR_STACK_MAX_CHARS),
            stage: stage.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Page-level facts shown in the report header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub final_url: String,
    pub http_status: u16,
    pub has_redirect: bool,
    pub h1_text: Option<String>,
    pub h1_count: usize,
    pub h2_count: usize,
    pub word_count: usize,
    pub image_count: usize,
    pub images_with_alt: usize,
    pub internal_links: usize,
    pub external_links: usize,
}

/// The raw-result blob persisted after modules run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuditResult {
    pub url: String,
    pub page_analysis: PageAnalysis,
    pub modules: Vec<ModuleResult>,
    pub overall_score: u8,
}

pub(crate) fn truncate_chars(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => input[..idx].to_string(),
        None => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: Inner,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("inner cause")]
    struct Inner;

    #[test]
    fn status_round_trips() {
        for status in [
            AuditStatus::Pending,
            AuditStatus::Running,
            AuditStatus::GeneratingReport,
            AuditStatus::Completed,
            AuditStatus::Failed,
        ] {
            assert_eq!(AuditStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AuditStatus::parse("archived"), None);
    }

    #[test]
    fn happy_path_transitions_are_allowed() {
        assert!(AuditStatus::Pending.can_transition_to(AuditStatus::Running));
        assert!(AuditStatus::Running.can_transition_to(AuditStatus::GeneratingReport));
        assert!(AuditStatus::GeneratingReport.can_transition_to(AuditStatus::Completed));
    }

    #[test]
    fn any_live_state_can_fail() {
        for status in [
            AuditStatus::Pending,
            AuditStatus::Running,
            AuditStatus::GeneratingReport,
        ] {
            assert!(status.can_transition_to(AuditStatus::Failed));
        }
    }

    #[test]
    fn completed_is_final_and_steps_cannot_be_skipped() {
        assert!(!AuditStatus::Completed.can_transition_to(AuditStatus::Running));
        assert!(!AuditStatus::Completed.can_transition_to(AuditStatus::Failed));
        assert!(!AuditStatus::Pending.can_transition_to(AuditStatus::Completed));
        assert!(!AuditStatus::Running.can_transition_to(AuditStatus::Completed));
    }

    #[test]
    fn envelope_captures_source_chain() {
        let err = Outer { inner: Inner };
        let envelope = ErrorEnvelope::capture("FetchError", "fetch", &err);
        assert_eq!(envelope.error_name, "FetchError");
        assert_eq!(envelope.error_message, "outer failure");
        assert!(envelope.error_stack.contains("caused by: inner cause"));
        assert_eq!(envelope.stage, "fetch");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
