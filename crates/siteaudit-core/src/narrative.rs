//! Customer-facing prose report produced by the narrative synthesizer.

use serde::{Deserialize, Deserializer, Serialize};

/// The report as emailed to the customer.
///
/// Field names follow the JSON contract given to the text generator
/// (`executiveSummary`, `topActions`, `moduleName`). Missing fields default to
/// empty so a partially-formed response can still be repaired.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeReport {
    #[serde(default, deserialize_with = "string_or_list")]
    pub executive_summary: Vec<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    pub top_actions: Vec<String>,
    #[serde(default)]
    pub modules: Vec<NarrativeModule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeModule {
    #[serde(default, alias = "name", alias = "module")]
    pub module_name: String,
    #[serde(default, alias = "summary")]
    pub overview: String,
    #[serde(default)]
    pub issues: Vec<NarrativeIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeIssue {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_severity")]
    pub severity: String,
    #[serde(default, alias = "description", alias = "plainLanguageExplanation")]
    pub explanation: String,
    #[serde(default, alias = "suggestedFix", alias = "recommendation")]
    pub fix: String,
}

fn default_severity() -> String {
    "medium".to_string()
}

/// Accepts either a JSON string or an array of strings.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<serde_json::Value>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) if s.trim().is_empty() => Vec::new(),
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Object(map) => map
                    .get("action")
                    .or_else(|| map.get("title"))
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
        OneOrMany::Nothing(()) => Vec::new(),
    })
}
