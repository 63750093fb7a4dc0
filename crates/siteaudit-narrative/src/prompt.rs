//! Prompt construction for the narrative report.

use serde_json::{json, Map, Value};
use siteaudit_core::{ModuleKey, ModuleResult};

use crate::generator::ChatMessage;

/// Longest string passed through from module output.
const MAX_STRING_CHARS: usize = 400;
/// Longest evidence value once serialized.
const MAX_EVIDENCE_CHARS: usize = 200;
/// Array evidence keeps this many leading items.
const MAX_EVIDENCE_ITEMS: usize = 5;

const SYSTEM_PROMPT: &str = "You are a website consultant writing an audit report for a small-business owner. \
Write in plain, friendly language and avoid jargon. Respond with a single JSON object and nothing else.";

/// Builds the system and user messages for one report.
pub(crate) fn build_messages(
    url: &str,
    overall_score: u8,
    customer_name: Option<&str>,
    purchased: &[ModuleKey],
    results: &[ModuleResult],
) -> Vec<ChatMessage> {
    let names: Vec<&str> = purchased.iter().map(|k| k.display_name()).collect();
    let payload = json!({
        "url": url,
        "overallScore": overall_score,
        "customerName": customer_name,
        "modules": purchased
            .iter()
            .filter_map(|key| results.iter().find(|r| r.module_key == *key))
            .map(trimmed_result)
            .collect::<Vec<_>>(),
    });

    let instructions = format!(
        "Write the audit report for the site below as JSON with exactly this shape:\n\
         {{\"executiveSummary\": [string, ...], \"topActions\": [string, ...], \
         \"modules\": [{{\"moduleName\": string, \"overview\": string, \
         \"issues\": [{{\"title\": string, \"severity\": \"high\"|\"medium\"|\"low\", \
         \"explanation\": string, \"fix\": string}}]}}]}}\n\
         Include exactly one entry in \"modules\" for each of these, using these names verbatim and in this order: {}.\n\
         Keep the executive summary to two or three short paragraphs and list at most five top actions.\n\n\
         Audit data:\n{}",
        names.join(", "),
        payload,
    );

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(instructions)]
}

fn trimmed_result(result: &ModuleResult) -> Value {
    let evidence: Map<String, Value> = result
        .evidence
        .iter()
        .map(|(k, v)| (k.clone(), trim_value(v)))
        .collect();
    let issues: Vec<Value> = result
        .issues
        .iter()
        .map(|issue| {
            json!({
                "title": cap(&issue.title),
                "severity": issue.severity.as_str(),
                "technicalExplanation": cap(&issue.technical_explanation),
                "plainLanguageExplanation": cap(&issue.plain_language_explanation),
                "suggestedFix": cap(&issue.suggested_fix),
            })
        })
        .collect();

    json!({
        "moduleName": result.module_key.display_name(),
        "score": result.score,
        "summary": cap(&result.summary),
        "evidence": evidence,
        "issues": issues,
    })
}

fn trim_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(truncate(s, MAX_EVIDENCE_CHARS)),
        Value::Array(items) => {
            let kept: Vec<Value> = items.iter().take(MAX_EVIDENCE_ITEMS).map(trim_value).collect();
            Value::Array(kept)
        }
        Value::Object(_) => {
            let raw = value.to_string();
            if raw.chars().count() <= MAX_EVIDENCE_CHARS {
                value.clone()
            } else {
                Value::String(truncate(&raw, MAX_EVIDENCE_CHARS))
            }
        }
        other => other.clone(),
    }
}

fn cap(s: &str) -> String {
    truncate(s, MAX_STRING_CHARS)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use siteaudit_core::{AuditIssue, IssueEvidence, Severity};

    use super::*;
    use crate::generator::MessageRole;

    fn mobile_result() -> ModuleResult {
        let mut result = ModuleResult::new(
            ModuleKey::Mobile,
            70,
            vec![AuditIssue::new(
                "No viewport tag",
                Severity::High,
                "Missing <meta name=viewport>",
                "Your site looks tiny on phones.",
                "Add a viewport meta tag.",
            )
            .with_evidence(IssueEvidence {
                found: Some(json!("secret-issue-evidence")),
                ..IssueEvidence::default()
            })],
            "Mobile needs work.".to_string(),
            siteaudit_core::Evidence::new(),
        );
        result.evidence.insert("viewport", "x".repeat(1_000));
        result
            .evidence
            .insert("tapTargets", json!([1, 2, 3, 4, 5, 6, 7, 8]));
        result
    }

    #[test]
    fn messages_are_role_tagged() {
        let messages = build_messages(
            "https://acme.example",
            70,
            None,
            &[ModuleKey::Mobile],
            &[mobile_result()],
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].role, MessageRole::User);
    }

    #[test]
    fn prompt_names_every_purchased_module_verbatim() {
        let messages = build_messages(
            "https://acme.example",
            70,
            Some("Dana"),
            &[ModuleKey::Mobile, ModuleKey::Social],
            &[mobile_result()],
        );
        let user = &messages[1].content;
        assert!(user.contains("Mobile Optimization, Social Media"));
        assert!(user.contains("\"customerName\":\"Dana\""));
    }

    #[test]
    fn issue_evidence_is_dropped_and_module_evidence_trimmed() {
        let value = trimmed_result(&mobile_result());
        let text = value.to_string();
        assert!(!text.contains("secret-issue-evidence"));
        let viewport = value["evidence"]["viewport"].as_str().unwrap();
        assert_eq!(viewport.chars().count(), MAX_EVIDENCE_CHARS + 1);
        assert_eq!(
            value["evidence"]["tapTargets"].as_array().unwrap().len(),
            MAX_EVIDENCE_ITEMS
        );
    }
}
