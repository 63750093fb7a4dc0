//! Completeness repair: the report must cover exactly the purchased modules.

use siteaudit_core::{ModuleKey, ModuleResult, NarrativeIssue, NarrativeModule, NarrativeReport};

use crate::error::SynthesisError;

/// What [`repair_report`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Entries whose heading was rewritten to the canonical display name.
    pub renamed: usize,
    /// Headings dropped as unknown, unpurchased, or duplicate.
    pub dropped: Vec<String>,
    /// Modules written from raw results because the report left them out.
    pub synthesized: Vec<ModuleKey>,
}

/// Rewrites `report.modules` in place to one entry per purchased module, in
/// purchase order.
///
/// Headings are matched ignoring case, spacing and punctuation. Entries for
/// modules that were not purchased, and repeats, are dropped. A purchased
/// module the report omitted is rebuilt from its [`ModuleResult`]; if no
/// result exists for it the entry stays missing and
/// the completeness check reports it.
pub fn repair_report(
    report: &mut NarrativeReport,
    purchased: &[ModuleKey],
    results: &[ModuleResult],
) -> RepairOutcome {
    let mut outcome = RepairOutcome::default();
    let order = unique_keys(purchased);

    let mut matched: Vec<(ModuleKey, NarrativeModule)> = Vec::new();
    for mut module in std::mem::take(&mut report.modules) {
        let key = ModuleKey::from_display_name(&module.module_name)
            .filter(|k| order.contains(k) && !matched.iter().any(|(m, _)| m == k));
        let Some(key) = key else {
            outcome.dropped.push(module.module_name);
            continue;
        };
        if module.module_name != key.display_name() {
            module.module_name = key.display_name().to_string();
            outcome.renamed += 1;
        }
        matched.push((key, module));
    }

    for key in &order {
        if let Some(pos) = matched.iter().position(|(k, _)| k == key) {
            let (_, module) = matched.swap_remove(pos);
            report.modules.push(module);
        } else if let Some(result) = results.iter().find(|r| r.module_key == *key) {
            report.modules.push(module_from_result(result));
            outcome.synthesized.push(*key);
        }
    }

    outcome
}

/// Fails unless the report's module headings are exactly the purchased
/// display names.
///
/// # Errors
///
/// Returns [`SynthesisError::Incomplete`] naming missing and unexpected
/// headings.
pub(crate) fn ensure_complete(
    report: &NarrativeReport,
    purchased: &[ModuleKey],
) -> Result<(), SynthesisError> {
    let expected: Vec<&str> = unique_keys(purchased)
        .into_iter()
        .map(ModuleKey::display_name)
        .collect();
    let actual: Vec<&str> = report
        .modules
        .iter()
        .map(|m| m.module_name.as_str())
        .collect();

    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !actual.contains(name))
        .map(|name| (*name).to_string())
        .collect();
    let unexpected: Vec<String> = actual
        .iter()
        .filter(|name| !expected.contains(name))
        .map(|name| (*name).to_string())
        .collect();

    if missing.is_empty() && unexpected.is_empty() && actual.len() == expected.len() {
        Ok(())
    } else {
        Err(SynthesisError::Incomplete {
            missing,
            unexpected,
        })
    }
}

fn unique_keys(keys: &[ModuleKey]) -> Vec<ModuleKey> {
    let mut out: Vec<ModuleKey> = Vec::with_capacity(keys.len());
    for key in keys {
        if !out.contains(key) {
            out.push(*key);
        }
    }
    out
}

fn module_from_result(result: &ModuleResult) -> NarrativeModule {
    let mut issues: Vec<NarrativeIssue> = result
        .issues
        .iter()
        .map(|issue| NarrativeIssue {
            title: issue.title.clone(),
            severity: issue.severity.as_str().to_string(),
            explanation: issue.plain_language_explanation.clone(),
            fix: issue.suggested_fix.clone(),
        })
        .collect();
    if issues.is_empty() {
        issues.push(NarrativeIssue {
            title: "All checks passed".to_string(),
            severity: "low".to_string(),
            explanation: "We did not find any problems in this area.".to_string(),
            fix: "No action needed. Keep doing what you're doing.".to_string(),
        });
    }

    NarrativeModule {
        module_name: result.module_key.display_name().to_string(),
        overview: result.summary.clone(),
        issues,
    }
}
