//! Front-end performance signals visible in the HTML itself.

use serde_json::json;
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::SiteSnapshot;

use crate::page::{insecure_subresources, sample};
use crate::scorecard::Scorecard;

const NO_HTTPS_PENALTY: i32 = 20;
const LAZY_LOADING_MANY_PENALTY: i32 = 10;
const LAZY_LOADING_FEW_PENALTY: i32 = 5;
const BLOCKING_SCRIPTS_MANY_PENALTY: i32 = 10;
const BLOCKING_SCRIPTS_FEW_PENALTY: i32 = 5;
const INSECURE_RESOURCES_PENALTY: i32 = 10;
const HEAVY_HTML_PENALTY: i32 = 5;
const MANY_EXTERNAL_SCRIPTS_PENALTY: i32 = 5;

/// Counts at or above this are the "many" tier.
const MANY_THRESHOLD: usize = 3;
const HEAVY_HTML_BYTES: usize = 500_000;
const MAX_EXTERNAL_SCRIPTS: usize = 20;

#[must_use]
pub fn check(snapshot: &SiteSnapshot) -> ModuleResult {
    let doc = &snapshot.document;
    let mut card = Scorecard::new(ModuleKey::Performance);

    card.evidence("is_https", snapshot.is_https);
    if !snapshot.is_https {
        card.penalize(
            NO_HTTPS_PENALTY,
            AuditIssue::new(
                "Site is not served over HTTPS",
                Severity::High,
                format!("The page resolved to {} without TLS, which also rules out HTTP/2 and HTTP/3.", snapshot.final_url),
                "Your site loads over an older, unencrypted connection that is slower and marked \"Not secure\" by browsers.",
                "Install a TLS certificate (most hosts offer a free one) and redirect all HTTP traffic to HTTPS.",
            ),
        );
    }

    let image_count = doc.images().count();
    let not_lazy: Vec<&str> = doc
        .images()
        .filter(|img| !img.has_attr("loading"))
        .map(|img| img.attr("src").unwrap_or_default())
        .collect();
    card.evidence("image_count", image_count);
    card.evidence("images_without_loading_attr", not_lazy.len());
    if !not_lazy.is_empty() {
        let (penalty, severity) = tiered(not_lazy.len(), LAZY_LOADING_MANY_PENALTY, LAZY_LOADING_FEW_PENALTY);
        card.penalize(
            penalty,
            AuditIssue::new(
                format!("{} images load eagerly", not_lazy.len()),
                severity,
                "Images without a loading attribute are downloaded immediately, even when they sit far below the fold.",
                "Every picture on the page downloads up front, which slows down how fast visitors see the top of the page.",
                "Add loading=\"lazy\" to images below the fold (keep the main hero image eager).",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(not_lazy.len())),
                found: Some(json!(sample(&not_lazy, 5))),
                ..IssueEvidence::default()
            }),
        );
    }

    let blocking: Vec<&str> = doc
        .scripts()
        .iter()
        .filter_map(|s| s.attr("src").map(|src| (s, src)))
        .filter(|(s, _)| !s.has_attr("async") && !s.has_attr("defer") && !s.attr_is("type", "module"))
        .map(|(_, src)| src)
        .collect();
    card.evidence("render_blocking_scripts", blocking.len());
    if !blocking.is_empty() {
        let (penalty, severity) = tiered(blocking.len(), BLOCKING_SCRIPTS_MANY_PENALTY, BLOCKING_SCRIPTS_FEW_PENALTY);
        card.penalize(
            penalty,
            AuditIssue::new(
                format!("{} render-blocking scripts", blocking.len()),
                severity,
                "External <script> tags without async, defer or type=\"module\" halt HTML parsing until they download and execute.",
                "The browser has to stop and wait for these scripts before it can show your page.",
                "Add defer (or async for independent scripts) to each external script tag.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(blocking.len())),
                found: Some(json!(sample(&blocking, 5))),
                ..IssueEvidence::default()
            }),
        );
    }

    if snapshot.is_https {
        let insecure = insecure_subresources(snapshot);
        card.evidence("insecure_resources", insecure.len());
        if !insecure.is_empty() {
            card.penalize(
                INSECURE_RESOURCES_PENALTY,
                AuditIssue::new(
                    "Resources loaded over plain HTTP",
                    Severity::Medium,
                    format!("{} sub-resources use http:// URLs on an HTTPS page; browsers block or upgrade them, adding failed requests.", insecure.len()),
                    "Some files on your page are requested the old, insecure way, so browsers may refuse to load them.",
                    "Change these URLs to https:// or make them protocol-relative to your own domain.",
                )
                .with_evidence(IssueEvidence {
                    count: Some(json!(insecure.len())),
                    found: Some(json!(sample(&insecure, 5))),
                    ..IssueEvidence::default()
                }),
            );
        }
    }

    card.evidence("html_bytes", snapshot.content_length);
    if snapshot.content_length > HEAVY_HTML_BYTES {
        card.penalize(
            HEAVY_HTML_PENALTY,
            AuditIssue::new(
                "Large HTML document",
                Severity::Low,
                format!("The HTML payload is {} bytes, above the {HEAVY_HTML_BYTES}-byte guideline.", snapshot.content_length),
                "The page's code itself is very large, which takes longer to download on mobile connections.",
                "Remove inlined data and unused markup, and move large inline styles or scripts into cached files.",
            )
            .with_evidence(IssueEvidence {
                actual: Some(json!(snapshot.content_length)),
                expected: Some(json!(HEAVY_HTML_BYTES)),
                ..IssueEvidence::default()
            }),
        );
    }

    let own_host = snapshot.host();
    let external_scripts = doc
        .scripts()
        .iter()
        .filter_map(|s| s.attr("src"))
        .filter_map(|src| snapshot.resolve(src))
        .filter(|url| {
            url.host_str()
                .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
                != own_host
        })
        .count();
    card.evidence("external_scripts", external_scripts);
    if external_scripts > MAX_EXTERNAL_SCRIPTS {
        card.penalize(
            MANY_EXTERNAL_SCRIPTS_PENALTY,
            AuditIssue::new(
                "Too many third-party scripts",
                Severity::Low,
                format!("{external_scripts} scripts are loaded from other domains (guideline: at most {MAX_EXTERNAL_SCRIPTS})."),
                "Your page pulls in a lot of code from other companies, and each one adds delay.",
                "Audit tags and widgets, remove unused ones, and load the rest through a tag manager with deferred loading.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(external_scripts)),
                ..IssueEvidence::default()
            }),
        );
    }

    card.finish()
}

fn tiered(count: usize, many: i32, few: i32) -> (i32, Severity) {
    if count >= MANY_THRESHOLD {
        (many, Severity::Medium)
    } else {
        (few, Severity::Low)
    }
}
