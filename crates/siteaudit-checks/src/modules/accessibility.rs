//! WCAG-oriented markup checks that can be judged from static HTML.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::{Document, Element, SiteSnapshot};

use crate::page::sample;
use crate::scorecard::Scorecard;

const NO_LANG_PENALTY: i32 = 10;
const IMAGES_WITHOUT_ALT_PENALTY: i32 = 15;
const UNLABELED_CONTROLS_PENALTY: i32 = 10;
const EMPTY_LINKS_PENALTY: i32 = 10;
const EMPTY_BUTTONS_PENALTY: i32 = 10;
const SKIPPED_HEADINGS_PENALTY: i32 = 5;
const POSITIVE_TABINDEX_PENALTY: i32 = 5;
const AUTOPLAY_PENALTY: i32 = 5;

static IMG_WITH_ALT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*\balt\s*=\s*(?:"[^"]*\S[^"]*"|'[^']*\S[^']*')"#).expect("valid regex")
});

fn has_aria_name(el: &Element) -> bool {
    ["aria-label", "aria-labelledby", "title"]
        .iter()
        .any(|attr| el.attr(attr).is_some_and(|v| !v.trim().is_empty()))
}

fn unlabeled_controls(doc: &Document) -> Vec<&Element> {
    doc.form_controls()
        .filter(|c| {
            !c.attr("type").is_some_and(|t| {
                matches!(
                    t.trim().to_ascii_lowercase().as_str(),
                    "hidden" | "submit" | "button" | "reset" | "image"
                )
            })
        })
        .filter(|c| !c.is_hidden())
        .filter(|c| !has_aria_name(c))
        .filter(|c| {
            let by_for = c.attr("id").is_some_and(|id| {
                doc.labels()
                    .iter()
                    .any(|l| l.attr("for").is_some_and(|f| f.trim() == id.trim()))
            });
            let wrapped = doc.labels().iter().any(|l| Document::contains(l, c));
            !by_for && !wrapped
        })
        .collect()
}

fn empty_links(doc: &Document) -> Vec<&Element> {
    doc.anchors()
        .iter()
        .filter(|a| a.has_attr("href"))
        .filter(|a| !a.is_hidden())
        .filter(|a| a.text.is_empty() && !has_aria_name(a) && !IMG_WITH_ALT_RE.is_match(&a.inner_html))
        .collect()
}

fn empty_buttons(doc: &Document) -> Vec<&Element> {
    doc.buttons()
        .iter()
        .filter(|b| !b.is_hidden())
        .filter(|b| b.text.is_empty() && !has_aria_name(b) && !IMG_WITH_ALT_RE.is_match(&b.inner_html))
        .collect()
}

/// Heading jumps of more than one level (`h2` followed by `h4`), as
/// `(from, to)` pairs.
fn skipped_heading_levels(doc: &Document) -> Vec<(u8, u8)> {
    let levels: Vec<u8> = doc
        .all_headings()
        .iter()
        .filter(|h| !h.is_hidden())
        .filter_map(|h| h.name.strip_prefix('h').and_then(|l| l.parse().ok()))
        .collect();
    levels
        .windows(2)
        .filter(|pair| pair[1] > pair[0] + 1)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

#[must_use]
pub fn check(snapshot: &SiteSnapshot) -> ModuleResult {
    let doc = &snapshot.document;
    let mut card = Scorecard::new(ModuleKey::Accessibility);

    let lang = doc.html_lang();
    card.evidence("lang", lang.clone().unwrap_or_default());
    if lang.is_none() {
        card.penalize(
            NO_LANG_PENALTY,
            AuditIssue::new(
                "Page language not declared",
                Severity::Medium,
                "The <html> element has no lang attribute (WCAG 3.1.1).",
                "Screen readers don't know which language to read your page in and may mispronounce everything.",
                "Add lang=\"en\" (or your page's language) to the <html> tag.",
            ),
        );
    }

    let missing_alt: Vec<&str> = doc
        .images()
        .filter(|img| !img.has_attr("alt"))
        .filter(|img| !img.is_hidden())
        .filter(|img| !img.attr_is("role", "presentation") && !img.attr_is("role", "none"))
        .map(|img| img.attr("src").unwrap_or_default())
        .collect();
    card.evidence("images_without_alt", missing_alt.len());
    if !missing_alt.is_empty() {
        card.penalize(
            IMAGES_WITHOUT_ALT_PENALTY,
            AuditIssue::new(
                format!("{} images without alternative text", missing_alt.len()),
                Severity::High,
                "Non-decorative <img> elements lack an alt attribute (WCAG 1.1.1).",
                "People using screen readers hear a file name or nothing at all where your pictures are.",
                "Describe each meaningful image in its alt attribute; mark purely decorative images with alt=\"\".",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(missing_alt.len())),
                found: Some(json!(sample(&missing_alt, 5))),
                ..IssueEvidence::default()
            }),
        );
    }

    let unlabeled = unlabeled_controls(doc);
    card.evidence("unlabeled_form_controls", unlabeled.len());
    if !unlabeled.is_empty() {
        let names: Vec<&str> = unlabeled
            .iter()
            .map(|c| c.attr("name").or_else(|| c.attr("id")).unwrap_or(c.name.as_str()))
            .collect();
        card.penalize(
            UNLABELED_CONTROLS_PENALTY,
            AuditIssue::new(
                format!("{} form fields without labels", unlabeled.len()),
                Severity::Medium,
                "Form controls have no associated <label>, aria-label or aria-labelledby (WCAG 1.3.1, 4.1.2).",
                "Screen reader users can't tell what information a form field is asking for.",
                "Give every field a visible <label for=\"...\"> or an aria-label.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(unlabeled.len())),
                found: Some(json!(sample(&names, 5))),
                ..IssueEvidence::default()
            }),
        );
    }

    let links = empty_links(doc);
    card.evidence("links_without_text", links.len());
    if !links.is_empty() {
        let hrefs: Vec<&str> = links.iter().filter_map(|a| a.attr("href")).collect();
        card.penalize(
            EMPTY_LINKS_PENALTY,
            AuditIssue::new(
                format!("{} links without accessible text", links.len()),
                Severity::Medium,
                "Anchors have no text content, aria-label, title, or image alt text (WCAG 2.4.4).",
                "Some links are announced as just \"link\", so screen reader users can't tell where they go.",
                "Add descriptive link text, or an aria-label for icon-only links.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(links.len())),
                found: Some(json!(sample(&hrefs, 5))),
                ..IssueEvidence::default()
            }),
        );
    }

    let buttons = empty_buttons(doc);
    card.evidence("buttons_without_text", buttons.len());
    if !buttons.is_empty() {
        card.penalize(
            EMPTY_BUTTONS_PENALTY,
            AuditIssue::new(
                format!("{} buttons without accessible text", buttons.len()),
                Severity::Medium,
                "<button> elements have no text content or aria-label (WCAG 4.1.2).",
                "Some buttons are announced as just \"button\", with no hint of what they do.",
                "Add visible text or an aria-label to icon-only buttons.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(buttons.len())),
                ..IssueEvidence::default()
            }),
        );
    }

    let skips = skipped_heading_levels(doc);
    card.evidence("skipped_heading_levels", skips.len());
    if !skips.is_empty() {
        let jumps: Vec<String> = skips.iter().map(|(a, b)| format!("h{a} -> h{b}")).collect();
        card.penalize(
            SKIPPED_HEADINGS_PENALTY,
            AuditIssue::new(
                "Heading levels are skipped",
                Severity::Low,
                "The heading outline jumps more than one level (WCAG 1.3.1).",
                "Your headings skip levels, which makes the page outline confusing for people navigating by headings.",
                "Nest headings in order (h1, then h2, then h3) without skipping levels.",
            )
            .with_evidence(IssueEvidence {
                found: Some(json!(sample(&jumps, 5))),
                ..IssueEvidence::default()
            }),
        );
    }

    let positive_tabindex = doc
        .tags()
        .iter()
        .filter(|el| {
            el.attr("tabindex")
                .and_then(|t| t.trim().parse::<i32>().ok())
                .is_some_and(|t| t > 0)
        })
        .count();
    card.evidence("positive_tabindex", positive_tabindex);
    if positive_tabindex > 0 {
        card.penalize(
            POSITIVE_TABINDEX_PENALTY,
            AuditIssue::new(
                "Custom tab order",
                Severity::Low,
                format!("{positive_tabindex} elements use a positive tabindex, overriding the natural focus order (WCAG 2.4.3)."),
                "Keyboard users jump around the page in an unexpected order.",
                "Remove positive tabindex values; use 0 or -1 and order the markup instead.",
            ),
        );
    }

    let autoplay = doc
        .tags()
        .iter()
        .filter(|el| {
            (matches!(el.name.as_str(), "video" | "audio") && el.has_attr("autoplay"))
                || (el.name == "iframe"
                    && el
                        .attr("src")
                        .is_some_and(|src| src.to_ascii_lowercase().contains("autoplay=1")))
        })
        .count();
    card.evidence("autoplay_media", autoplay);
    if autoplay > 0 {
        card.penalize(
            AUTOPLAY_PENALTY,
            AuditIssue::new(
                "Media plays automatically",
                Severity::Low,
                "Audio or video starts without user action (WCAG 1.4.2).",
                "Sound or video that starts on its own can be disorienting and drowns out screen readers.",
                "Remove autoplay, or start muted with visible pause controls.",
            ),
        );
    }

    card.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::snapshot;

    #[test]
    fn accessible_page_scores_100() {
        let html = r#"<html lang="en"><body>
            <h1>Title</h1><h2>Section</h2><h3>Sub</h3><h2>Next</h2>
            <img src="a.png" alt="Team photo"><img src="d.png" alt="">
            <form><label for="email">Email</label><input id="email"><label>Name <input name="n"></label><input type="submit" value="Go"></form>
            <a href="/x">Read more</a><a href="/fb"><img src="fb.svg" alt="Facebook"></a><a href="/ig" aria-label="Instagram"></a>
            <button>Send</button><button aria-label="Close"></button>
        </body></html>"#;
        let result = check(&snapshot(html));
        assert_eq!(result.score, 100, "issues: {:?}", result.issues);
    }

    #[test]
    fn every_problem_is_counted_once() {
        let html = r#"<body>
            <h1>T</h1><h3>Skipped</h3>
            <img src="a.png"><img src="b.png">
            <input name="q">
            <a href="/x"></a>
            <button></button>
            <div tabindex="3">x</div>
            <video src="v.mp4" autoplay></video>
        </body>"#;
        let result = check(&snapshot(html));
        // 10 + 15 + 10 + 10 + 10 + 5 + 5 + 5
        assert_eq!(result.score, 30);
        assert_eq!(result.issues.len(), 8);
        assert_eq!(result.evidence.get("images_without_alt"), Some(&json!(2)));
    }

    #[test]
    fn skipped_levels_are_reported_as_pairs() {
        let doc = Document::parse("<h1>a</h1><h3>b</h3><h2>c</h2><h5>d</h5>");
        assert_eq!(skipped_heading_levels(&doc), vec![(1, 3), (2, 5)]);
    }

    #[test]
    fn hidden_controls_and_images_are_ignored() {
        let html = r#"<html lang="en"><input type="hidden" name="csrf"><img src="px.gif" aria-hidden="true"><input name="trap" style="display:none"></html>"#;
        assert_eq!(check(&snapshot(html)).score, 100);
    }
}
