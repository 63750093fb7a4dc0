//! Viewport, zoom, layout and touch-icon checks for small screens.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::SiteSnapshot;

use crate::scorecard::Scorecard;

const NO_VIEWPORT_PENALTY: i32 = 30;
const NOT_DEVICE_WIDTH_PENALTY: i32 = 10;
const ZOOM_DISABLED_PENALTY: i32 = 10;
const FIXED_WIDTH_PENALTY: i32 = 5;
const SMALL_FONT_PENALTY: i32 = 5;
const NO_SRCSET_PENALTY: i32 = 5;
const NO_TOUCH_ICON_PENALTY: i32 = 5;

const FIXED_WIDTH_MIN_PX: f32 = 600.0;
const MIN_FONT_PX: f32 = 12.0;
const MIN_MAXIMUM_SCALE: f32 = 2.0;
const SRCSET_IMAGE_THRESHOLD: usize = 5;

// `(?:^|[;\s])` keeps `max-width` from matching.
static INLINE_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[;\s])(?:min-)?width\s*:\s*(\d+(?:\.\d+)?)px").expect("valid regex")
});
static INLINE_FONT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)font-size\s*:\s*(\d+(?:\.\d+)?)px").expect("valid regex")
});

/// Parsed `<meta name="viewport">` content.
#[derive(Debug, Default, PartialEq)]
struct Viewport {
    device_width: bool,
    zoom_disabled: bool,
}

fn parse_viewport(content: &str) -> Viewport {
    let mut viewport = Viewport::default();
    for pair in content.split([',', ';']) {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim().to_ascii_lowercase();
        match key.as_str() {
            "width" => viewport.device_width = value == "device-width",
            "user-scalable" => {
                if value == "no" || value == "0" {
                    viewport.zoom_disabled = true;
                }
            }
            "maximum-scale" => {
                if value.parse::<f32>().is_ok_and(|scale| scale < MIN_MAXIMUM_SCALE) {
                    viewport.zoom_disabled = true;
                }
            }
            _ => {}
        }
    }
    viewport
}

fn inline_px_values<'a>(styles: impl Iterator<Item = &'a str>, re: &Regex) -> Vec<f32> {
    styles
        .flat_map(|style| {
            re.captures_iter(style)
                .filter_map(|cap| cap[1].parse::<f32>().ok())
                .collect::<Vec<_>>()
        })
        .collect()
}

#[must_use]
pub fn check(snapshot: &SiteSnapshot) -> ModuleResult {
    let doc = &snapshot.document;
    let mut card = Scorecard::new(ModuleKey::Mobile);

    match doc.meta_content("viewport") {
        None => card.penalize(
            NO_VIEWPORT_PENALTY,
            AuditIssue::new(
                "Missing viewport meta tag",
                Severity::High,
                "Without <meta name=\"viewport\">, mobile browsers render the page at desktop width and shrink it.",
                "On phones your site shows up as a tiny desktop page that visitors have to pinch and zoom to read.",
                "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"> to the page <head>.",
            ),
        ),
        Some(content) => {
            card.evidence("viewport", content);
            let viewport = parse_viewport(content);
            if !viewport.device_width {
                card.penalize(
                    NOT_DEVICE_WIDTH_PENALTY,
                    AuditIssue::new(
                        "Viewport does not match device width",
                        Severity::Medium,
                        format!("The viewport content \"{content}\" does not set width=device-width."),
                        "Your page isn't told to fit the width of the visitor's phone screen.",
                        "Set the viewport to width=device-width, initial-scale=1.",
                    ),
                );
            }
            if viewport.zoom_disabled {
                card.penalize(
                    ZOOM_DISABLED_PENALTY,
                    AuditIssue::new(
                        "Pinch-to-zoom is disabled",
                        Severity::Medium,
                        "The viewport sets user-scalable=no or a maximum-scale below 2, preventing zoom.",
                        "Visitors can't zoom in to read small text, which frustrates many mobile users.",
                        "Remove user-scalable=no and any maximum-scale below 2 from the viewport tag.",
                    ),
                );
            }
        }
    }

    let styles = || doc.tags().iter().filter_map(|el| el.attr("style"));

    let wide: Vec<f32> = inline_px_values(styles(), &INLINE_WIDTH_RE)
        .into_iter()
        .filter(|px| *px >= FIXED_WIDTH_MIN_PX)
        .collect();
    card.evidence("fixed_width_elements", wide.len());
    if !wide.is_empty() {
        card.penalize(
            FIXED_WIDTH_PENALTY,
            AuditIssue::new(
                "Fixed-width elements",
                Severity::Low,
                format!("{} inline styles set widths of {FIXED_WIDTH_MIN_PX}px or more, which overflow narrow screens.", wide.len()),
                "Some parts of the page are wider than a phone screen, causing sideways scrolling.",
                "Replace fixed pixel widths with max-width: 100% or responsive units.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(wide.len())),
                ..IssueEvidence::default()
            }),
        );
    }

    let small: Vec<f32> = inline_px_values(styles(), &INLINE_FONT_RE)
        .into_iter()
        .filter(|px| *px < MIN_FONT_PX)
        .collect();
    card.evidence("small_font_declarations", small.len());
    if !small.is_empty() {
        card.penalize(
            SMALL_FONT_PENALTY,
            AuditIssue::new(
                "Text too small on mobile",
                Severity::Low,
                format!("{} inline font sizes are below {MIN_FONT_PX}px.", small.len()),
                "Some text is too small to read comfortably on a phone.",
                "Use at least 16px for body text and no less than 12px anywhere.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(small.len())),
                ..IssueEvidence::default()
            }),
        );
    }

    let image_count = doc.images().count();
    let with_srcset = doc
        .tags()
        .iter()
        .filter(|el| matches!(el.name.as_str(), "img" | "source") && el.has_attr("srcset"))
        .count();
    card.evidence("images_with_srcset", with_srcset);
    if image_count > SRCSET_IMAGE_THRESHOLD && with_srcset == 0 {
        card.penalize(
            NO_SRCSET_PENALTY,
            AuditIssue::new(
                "No responsive images",
                Severity::Low,
                format!("{image_count} images and none use srcset, so phones download desktop-sized files."),
                "Phones download the same large pictures as desktops, which wastes data and slows the page.",
                "Serve multiple sizes with srcset/sizes or a <picture> element.",
            ),
        );
    }

    let has_touch_icon = doc.links_with_rel("apple-touch-icon").next().is_some()
        || doc.links_with_rel("apple-touch-icon-precomposed").next().is_some();
    card.evidence("apple_touch_icon", has_touch_icon);
    if !has_touch_icon {
        card.penalize(
            NO_TOUCH_ICON_PENALTY,
            AuditIssue::new(
                "Missing Apple touch icon",
                Severity::Low,
                "No <link rel=\"apple-touch-icon\"> was found.",
                "When someone saves your site to their home screen it will show a blurry screenshot instead of your logo.",
                "Add a 180x180 PNG and reference it with <link rel=\"apple-touch-icon\" href=\"...\">.",
            ),
        );
    }

    card.finish()
}
