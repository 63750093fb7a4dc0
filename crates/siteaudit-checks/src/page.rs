//! Page-level signals used by more than one module.

use siteaudit_fetcher::{Document, Element, SiteSnapshot};

/// Heading texts that are navigation chrome rather than page topics.
const BOILERPLATE_HEADINGS: &[&str] = &[
    "skip to content",
    "skip to main content",
    "main menu",
    "menu",
    "navigation",
    "search",
    "close",
    "open menu",
    "toggle navigation",
    "cart",
];

/// H1s a visitor actually sees: not hidden, not inside `<nav>`, not empty,
/// and not navigation boilerplate.
pub(crate) fn visible_h1s(document: &Document) -> Vec<&Element> {
    document
        .headings(1)
        .filter(|h| !h.is_hidden())
        .filter(|h| !h.is_in_nav())
        .filter(|h| !h.text.is_empty())
        .filter(|h| {
            let text = h.text.to_ascii_lowercase();
            !BOILERPLATE_HEADINGS.contains(&text.trim())
        })
        .collect()
}

/// Plain-`http://` sub-resources (images, scripts, frames, media,
/// stylesheets) referenced by the page.
pub(crate) fn insecure_subresources(snapshot: &SiteSnapshot) -> Vec<String> {
    let doc = &snapshot.document;
    let mut found: Vec<String> = doc
        .tags()
        .iter()
        .filter(|el| {
            matches!(
                el.name.as_str(),
                "img" | "script" | "iframe" | "source" | "video" | "audio" | "embed"
            )
        })
        .filter_map(|el| el.attr("src"))
        .chain(
            doc.link_tags()
                .filter(|l| {
                    l.attr("rel").is_some_and(|rel| {
                        rel.split_whitespace().any(|r| {
                            matches!(
                                r.to_ascii_lowercase().as_str(),
                                "stylesheet" | "icon" | "preload" | "apple-touch-icon"
                            )
                        })
                    })
                })
                .filter_map(|l| l.attr("href")),
        )
        .map(str::trim)
        .filter(|src| src.get(..7).is_some_and(|s| s.eq_ignore_ascii_case("http://")))
        .map(str::to_string)
        .collect();
    found.dedup();
    found
}

/// Images that must carry `alt`: everything except `role="presentation"` /
/// `role="none"`.
pub(crate) fn images_missing_alt(document: &Document) -> Vec<&Element> {
    document
        .images()
        .filter(|img| !img.has_attr("alt"))
        .filter(|img| !img.attr_is("role", "presentation") && !img.attr_is("role", "none"))
        .collect()
}

pub(crate) fn sample<T: AsRef<str>>(items: &[T], limit: usize) -> Vec<String> {
    items
        .iter()
        .take(limit)
        .map(|s| s.as_ref().to_string())
        .collect()
}
