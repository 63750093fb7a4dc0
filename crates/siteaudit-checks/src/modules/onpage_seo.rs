//! Title, meta description, heading, content-length and alt-text checks.

use serde_json::json;
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::SiteSnapshot;

use crate::page::{images_missing_alt, sample, visible_h1s};
use crate::scorecard::Scorecard;

const MISSING_TITLE_PENALTY: i32 = 20;
const TITLE_OUT_OF_RANGE_PENALTY: i32 = 10;
const TITLE_OFF_TARGET_PENALTY: i32 = 5;
const MISSING_META_PENALTY: i32 = 15;
const META_LENGTH_PENALTY: i32 = 5;
const MISSING_H1_PENALTY: i32 = 15;
const MULTIPLE_H1_PENALTY: i32 = 5;
const THIN_CONTENT_PENALTY: i32 = 10;
const MISSING_ALT_PENALTY: i32 = 10;

const TITLE_ACCEPTABLE: std::ops::RangeInclusive<usize> = 25..=65;
const TITLE_TARGET: std::ops::RangeInclusive<usize> = 50..=60;
const META_TARGET: std::ops::RangeInclusive<usize> = 120..=160;
const MIN_WORDS: usize = 300;

#[must_use]
pub fn check(snapshot: &SiteSnapshot) -> ModuleResult {
    let doc = &snapshot.document;
    let mut card = Scorecard::new(ModuleKey::OnPage);

    match doc.title() {
        None => card.penalize(
            MISSING_TITLE_PENALTY,
            AuditIssue::new(
                "Missing page title",
                Severity::High,
                "The document has no <title> element or it is empty.",
                "Search engines show the page title as the headline of your listing, and your page doesn't have one.",
                "Add a descriptive <title> of 50-60 characters that names your main service and location or brand.",
            ),
        ),
        Some(title) => {
            let len = title.chars().count();
            card.evidence("title", title);
            card.evidence("title_length", len);
            let evidence = IssueEvidence {
                actual: Some(json!(len)),
                expected: Some(json!("50-60 characters")),
                found: Some(json!(title)),
                ..IssueEvidence::default()
            };
            if !TITLE_ACCEPTABLE.contains(&len) {
                card.penalize(
                    TITLE_OUT_OF_RANGE_PENALTY,
                    AuditIssue::new(
                        if len < *TITLE_ACCEPTABLE.start() { "Page title is too short" } else { "Page title is too long" },
                        Severity::Medium,
                        format!("The title is {len} characters; titles outside 25-65 characters are truncated or under-used in search results."),
                        "Your page headline in Google is either cut off or too thin to tell people what you offer.",
                        "Rewrite the title to 50-60 characters with your most important keyword near the start.",
                    )
                    .with_evidence(evidence),
                );
            } else if !TITLE_TARGET.contains(&len) {
                card.penalize(
                    TITLE_OFF_TARGET_PENALTY,
                    AuditIssue::new(
                        "Page title length could be optimized",
                        Severity::Low,
                        format!("The title is {len} characters; 50-60 characters uses the full width of a search result."),
                        "Your page headline works, but a slightly different length would make better use of the space in search results.",
                        "Adjust the title to between 50 and 60 characters.",
                    )
                    .with_evidence(evidence),
                );
            }
        }
    }

    match snapshot.meta_description.as_deref() {
        None => card.penalize(
            MISSING_META_PENALTY,
            AuditIssue::new(
                "Missing meta description",
                Severity::High,
                "No <meta name=\"description\"> or og:description with content was found.",
                "Search engines will make up their own snippet for your listing, which is often less persuasive.",
                "Add a meta description of 120-160 characters that summarizes the page and ends with a call to action.",
            ),
        ),
        Some(description) => {
            let len = description.chars().count();
            card.evidence("meta_description_length", len);
            if !META_TARGET.contains(&len) {
                card.penalize(
                    META_LENGTH_PENALTY,
                    AuditIssue::new(
                        "Meta description length is off target",
                        Severity::Low,
                        format!("The meta description is {len} characters; 120-160 is the range search engines display in full."),
                        "The short summary under your search listing is either cut off or too brief.",
                        "Rewrite the meta description to 120-160 characters.",
                    )
                    .with_evidence(IssueEvidence {
                        actual: Some(json!(len)),
                        expected: Some(json!("120-160 characters")),
                        ..IssueEvidence::default()
                    }),
                );
            }
        }
    }

    let h1s = visible_h1s(doc);
    card.evidence("h1_count", h1s.len());
    if let Some(first) = h1s.first() {
        card.evidence("h1_text", first.text.as_str());
    }
    if h1s.is_empty() {
        card.penalize(
            MISSING_H1_PENALTY,
            AuditIssue::new(
                "No visible H1 heading",
                Severity::High,
                "The page has no visible <h1> outside navigation; hidden and screen-reader-only headings are not counted.",
                "Your page is missing a main headline, which helps both visitors and search engines understand what it's about.",
                "Add one visible <h1> near the top of the page describing its main topic.",
            ),
        );
    } else if h1s.len() > 1 {
        let texts: Vec<&str> = h1s.iter().map(|h| h.text.as_str()).collect();
        card.penalize(
            MULTIPLE_H1_PENALTY,
            AuditIssue::new(
                "Multiple H1 headings",
                Severity::Low,
                format!("{} visible <h1> elements compete as the primary heading.", h1s.len()),
                "Your page has more than one main headline, which blurs what the page is mainly about.",
                "Keep a single <h1> and demote the others to <h2>.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(h1s.len())),
                found: Some(json!(sample(&texts, 5))),
                ..IssueEvidence::default()
            }),
        );
    }

    let words = doc.word_count();
    card.evidence("word_count", words);
    if words < MIN_WORDS {
        card.penalize(
            THIN_CONTENT_PENALTY,
            AuditIssue::new(
                "Thin page content",
                Severity::Medium,
                format!("The page has {words} words of visible text; pages under {MIN_WORDS} words rarely rank for competitive queries."),
                "There isn't much text on the page, so search engines have little to go on when deciding whom to show it to.",
                "Expand the page with useful detail about your services, service area, and common customer questions.",
            )
            .with_evidence(IssueEvidence {
                actual: Some(json!(words)),
                expected: Some(json!(MIN_WORDS)),
                ..IssueEvidence::default()
            }),
        );
    }

    let missing_alt = images_missing_alt(doc);
    card.evidence("images_missing_alt", missing_alt.len());
    if !missing_alt.is_empty() {
        let srcs: Vec<&str> = missing_alt
            .iter()
            .filter_map(|img| img.attr("src"))
            .collect();
        card.penalize(
            MISSING_ALT_PENALTY,
            AuditIssue::new(
                format!("{} images missing alt text", missing_alt.len()),
                Severity::Medium,
                "Images without an alt attribute give search engines no description to index.",
                "Some pictures have no text description, so Google Images and screen readers can't tell what they show.",
                "Add a short, descriptive alt attribute to each meaningful image (use alt=\"\" for purely decorative ones).",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(missing_alt.len())),
                found: Some(json!(sample(&srcs, 5))),
                ..IssueEvidence::default()
            }),
        );
    }

    card.finish()
}
