//! Transport security, mixed content, form targets and response headers.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::SiteSnapshot;

use crate::page::{insecure_subresources, sample};
use crate::scorecard::Scorecard;

const NO_HTTPS_PENALTY: i32 = 40;
const MIXED_CONTENT_PENALTY: i32 = 5;
const INSECURE_FORM_PENALTY: i32 = 10;
const VERSION_DISCLOSURE_PENALTY: i32 = 5;
const MISSING_HEADERS_PENALTY: i32 = 5;

/// The header penalty only applies while the score still reads "good".
const MISSING_HEADERS_SCORE_FLOOR: i32 = 80;

/// `(header, display name)` pairs checked for presence.
const RECOMMENDED_HEADERS: [(&str, &str); 5] = [
    ("strict-transport-security", "Strict-Transport-Security"),
    ("x-frame-options", "X-Frame-Options"),
    ("x-content-type-options", "X-Content-Type-Options"),
    ("x-xss-protection", "X-XSS-Protection"),
    ("content-security-policy", "Content-Security-Policy"),
];

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+").expect("valid regex"));

#[must_use]
pub fn check(snapshot: &SiteSnapshot) -> ModuleResult {
    let doc = &snapshot.document;
    let mut card = Scorecard::new(ModuleKey::Security);

    card.evidence("is_https", snapshot.is_https);
    if snapshot.is_https {
        let insecure = insecure_subresources(snapshot);
        card.evidence("mixed_content_resources", insecure.len());
        if !insecure.is_empty() {
            card.penalize(
                MIXED_CONTENT_PENALTY,
                AuditIssue::new(
                    "Mixed content",
                    Severity::Low,
                    format!("{} sub-resources are requested over http:// from an HTTPS page. Modern browsers upgrade or block them, so this is not an active vulnerability.", insecure.len()),
                    "A few files on your secure page are requested the old, insecure way. Browsers usually handle this, but it can trigger warnings.",
                    "Update these references to https://.",
                )
                .with_evidence(IssueEvidence {
                    count: Some(json!(insecure.len())),
                    found: Some(json!(sample(&insecure, 5))),
                    ..IssueEvidence::default()
                }),
            );
        }

        let insecure_forms: Vec<&str> = doc
            .forms()
            .filter_map(|f| f.attr("action"))
            .map(str::trim)
            .filter(|action| action.get(..7).is_some_and(|s| s.eq_ignore_ascii_case("http://")))
            .collect();
        if !insecure_forms.is_empty() {
            card.penalize(
                INSECURE_FORM_PENALTY,
                AuditIssue::new(
                    "Forms submit over an insecure connection",
                    Severity::Medium,
                    "Form actions point to http:// URLs, so submitted data leaves the page unencrypted.",
                    "Information people type into your forms could be read by others on the same network.",
                    "Change every form action to an https:// URL.",
                )
                .with_evidence(IssueEvidence {
                    found: Some(json!(sample(&insecure_forms, 5))),
                    ..IssueEvidence::default()
                }),
            );
        }
    } else {
        card.penalize(
            NO_HTTPS_PENALTY,
            AuditIssue::new(
                "Site is not using HTTPS",
                Severity::High,
                format!("{} is served without TLS; all traffic, including form submissions, is unencrypted.", snapshot.final_url),
                "Browsers label your site \"Not secure\", and anything visitors send you can be intercepted.",
                "Install a TLS certificate and redirect all HTTP requests to HTTPS.",
            ),
        );
    }

    let disclosed: Vec<String> = ["server", "x-powered-by"]
        .iter()
        .filter_map(|name| snapshot.header(name).map(|v| (name, v)))
        .filter(|(_, value)| VERSION_RE.is_match(value))
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();
    if let Some(server) = snapshot.header("server") {
        card.evidence("server", server);
    }
    if !disclosed.is_empty() {
        card.penalize(
            VERSION_DISCLOSURE_PENALTY,
            AuditIssue::new(
                "Server software version is exposed",
                Severity::Low,
                "Response headers advertise exact software versions, which helps attackers match known exploits.",
                "Your server tells everyone exactly which software version it runs.",
                "Configure the web server to omit version numbers from Server and X-Powered-By headers.",
            )
            .with_evidence(IssueEvidence {
                found: Some(json!(disclosed)),
                ..IssueEvidence::default()
            }),
        );
    }

    let missing: Vec<&str> = RECOMMENDED_HEADERS
        .iter()
        .filter(|(header, _)| snapshot.header(header).is_none())
        .map(|(_, display)| *display)
        .collect();
    card.evidence("missing_security_headers", json!(missing));
    if !missing.is_empty() {
        let issue = AuditIssue::new(
            format!("{} recommended security headers missing", missing.len()),
            Severity::Low,
            format!("Missing response headers: {}.", missing.join(", ")),
            "Your server isn't sending a few optional instructions that help browsers protect visitors.",
            "Add the missing headers in your web server or CDN configuration.",
        )
        .with_evidence(IssueEvidence {
            found: Some(json!(missing)),
            ..IssueEvidence::default()
        });
        if card.score() >= MISSING_HEADERS_SCORE_FLOOR {
            card.penalize(MISSING_HEADERS_PENALTY, issue);
        } else {
            card.note(issue);
        }
    }

    card.finish()
}
