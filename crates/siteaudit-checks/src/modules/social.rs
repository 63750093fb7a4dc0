//! Open Graph, Twitter card and social-profile presence.

use serde_json::{json, Value};
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::SiteSnapshot;

use crate::jsonld::JsonLd;
use crate::scorecard::Scorecard;

const OG_TITLE_PENALTY: i32 = 10;
const OG_DESCRIPTION_PENALTY: i32 = 10;
const OG_IMAGE_PENALTY: i32 = 15;
const OG_URL_PENALTY: i32 = 5;
const TWITTER_CARD_PENALTY: i32 = 5;
const NO_PROFILES_PENALTY: i32 = 10;

const SOCIAL_HOSTS: &[(&str, &str)] = &[
    ("facebook.com", "Facebook"),
    ("instagram.com", "Instagram"),
    ("twitter.com", "X (Twitter)"),
    ("x.com", "X (Twitter)"),
    ("linkedin.com", "LinkedIn"),
    ("youtube.com", "YouTube"),
    ("tiktok.com", "TikTok"),
    ("pinterest.com", "Pinterest"),
    ("threads.net", "Threads"),
];

/// Path fragments of share/intent links, which are not profiles.
const SHARE_MARKERS: &[&str] = &["sharer", "/share", "intent/", "shareArticle", "/pin/create"];

fn platform_for(snapshot: &SiteSnapshot, link: &str) -> Option<&'static str> {
    if SHARE_MARKERS.iter().any(|m| link.contains(m)) {
        return None;
    }
    let url = snapshot.resolve(link)?;
    let host = url.host_str()?.to_ascii_lowercase();
    SOCIAL_HOSTS
        .iter()
        .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{domain}")))
        .map(|(_, name)| *name)
}

/// Distinct platforms linked from the page or listed in JSON-LD `sameAs`.
pub(crate) fn social_profiles(snapshot: &SiteSnapshot) -> Vec<&'static str> {
    let schema = JsonLd::collect(&snapshot.document);
    let same_as = schema.items.iter().flat_map(|item| match item.get("sameAs") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(list)) => list.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    });

    let mut platforms: Vec<&'static str> = Vec::new();
    let links = snapshot
        .document
        .anchors()
        .iter()
        .filter_map(|a| a.attr("href"))
        .chain(same_as);
    for link in links {
        if let Some(platform) = platform_for(snapshot, link) {
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
    }
    platforms
}

#[must_use]
pub fn check(snapshot: &SiteSnapshot) -> ModuleResult {
    let doc = &snapshot.document;
    let mut card = Scorecard::new(ModuleKey::Social);

    let tags: [(&str, i32, Severity, &str); 5] = [
        ("og:title", OG_TITLE_PENALTY, Severity::Medium, "the headline shown when your page is shared"),
        ("og:description", OG_DESCRIPTION_PENALTY, Severity::Medium, "the summary shown when your page is shared"),
        ("og:image", OG_IMAGE_PENALTY, Severity::High, "the preview image shown when your page is shared"),
        ("og:url", OG_URL_PENALTY, Severity::Low, "the address social networks credit shares to"),
        ("twitter:card", TWITTER_CARD_PENALTY, Severity::Low, "how your link previews on X (Twitter)"),
    ];

    for (tag, penalty, severity, purpose) in tags {
        let value = doc.meta_content(tag);
        card.evidence(tag, value.unwrap_or_default());
        if value.is_some() {
            continue;
        }
        card.penalize(
            penalty,
            AuditIssue::new(
                format!("Missing {tag} tag"),
                severity,
                format!("No <meta property=\"{tag}\"> (or name=) with content was found."),
                format!("Social networks have to guess {purpose}, which often looks broken or unappealing."),
                format!("Add a {tag} meta tag to the page <head>."),
            )
            .with_evidence(IssueEvidence {
                expected: Some(json!(tag)),
                ..IssueEvidence::default()
            }),
        );
    }

    let profiles = social_profiles(snapshot);
    card.evidence("social_profiles", json!(profiles));
    if profiles.is_empty() {
        card.penalize(
            NO_PROFILES_PENALTY,
            AuditIssue::new(
                "No links to social profiles",
                Severity::Medium,
                "No anchors or JSON-LD sameAs entries point to social network profiles.",
                "Visitors can't find you on social media from your site, and search engines can't connect your profiles to your business.",
                "Link your active social profiles from the footer and list them in Organization sameAs.",
            ),
        );
    }

    card.finish()
}
