//! Read-only structural view of a fetched HTML page.
//!
//! The page is parsed once with `scraper` (html5ever), which recovers from
//! malformed markup the way browsers do. The element tree is then flattened
//! into owned [`Element`]s in document order so the snapshot can be shared
//! across tasks; ancestry facts (hidden, inside `<nav>`, subtree span) are
//! resolved during that walk.

use std::collections::BTreeMap;

use scraper::{node::Element as NodeElement, ElementRef, Html};

/// Class names used by common frameworks for screen-reader-only content.
const SR_ONLY_CLASSES: [&str; 6] = [
    "sr-only",
    "screen-reader-text",
    "visually-hidden",
    "visuallyhidden",
    "screen-reader-only",
    "assistive-text",
];

/// Elements whose text never reaches the reader.
const NON_CONTENT: [&str; 8] = [
    "head", "title", "script", "style", "noscript", "template", "svg", "iframe",
];

/// One HTML element: tag name, attributes, and (for the paired elements the
/// checks inspect) the cleaned inner text and serialized inner HTML.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub inner_html: String,
    /// Position among all elements in document order.
    pub index: usize,
    /// Index of the last element nested inside this one (equal to `index`
    /// for elements without element children).
    pub subtree_end: usize,
    hidden: bool,
    in_nav: bool,
}

impl Element {
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Case-insensitive, whitespace-trimmed attribute comparison.
    #[must_use]
    pub fn attr_is(&self, name: &str, value: &str) -> bool {
        self.attr(name)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(value))
    }

    /// Whether the element's `class` list contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class").is_some_and(|classes| {
            classes
                .split_whitespace()
                .any(|c| c.eq_ignore_ascii_case(class))
        })
    }

    /// Hidden from sighted users or from assistive technology, either by its
    /// own attributes or by those of any ancestor.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether any ancestor is a `<nav>` element.
    #[must_use]
    pub fn is_in_nav(&self) -> bool {
        self.in_nav
    }
}

/// Parsed document handle held by a `SiteSnapshot`.
#[derive(Debug, Clone, Default)]
pub struct Document {
    tags: Vec<Element>,
    headings: Vec<Element>,
    anchors: Vec<Element>,
    scripts: Vec<Element>,
    buttons: Vec<Element>,
    labels: Vec<Element>,
    style_blocks: Vec<String>,
    title: Option<String>,
    text: String,
}

impl Document {
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let mut doc = Self {
            text: visible_text(&html),
            ..Self::default()
        };

        let elements = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap);
        for (index, el) in elements.enumerate() {
            let value = el.value();
            let name = value.name();
            let ancestors: Vec<ElementRef<'_>> =
                el.ancestors().filter_map(ElementRef::wrap).collect();
            let nested = el
                .descendants()
                .filter(|node| node.value().is_element())
                .count()
                .saturating_sub(1);

            let mut element = Element {
                name: name.to_string(),
                attrs: value
                    .attrs()
                    .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                    .collect(),
                index,
                subtree_end: index + nested,
                hidden: hides(value) || ancestors.iter().any(|a| hides(a.value())),
                in_nav: ancestors.iter().any(|a| a.value().name() == "nav"),
                ..Element::default()
            };
            let in_svg = ancestors.iter().any(|a| a.value().name() == "svg");

            match name {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    fill_content(&mut element, el);
                    doc.headings.push(element.clone());
                }
                "a" => {
                    fill_content(&mut element, el);
                    doc.anchors.push(element.clone());
                }
                "button" => {
                    fill_content(&mut element, el);
                    doc.buttons.push(element.clone());
                }
                "label" => {
                    fill_content(&mut element, el);
                    doc.labels.push(element.clone());
                }
                "script" => {
                    // Script bodies are code, not text.
                    let raw: String = el.text().collect();
                    element.text = raw.trim().to_string();
                    element.inner_html = raw;
                    doc.scripts.push(element.clone());
                }
                "style" => doc.style_blocks.push(el.text().collect()),
                "title" if doc.title.is_none() && !in_svg => {
                    doc.title = Some(joined_text(el)).filter(|t| !t.is_empty());
                }
                _ => {}
            }
            doc.tags.push(element);
        }

        doc
    }

    /// Every element in document order, including the implied
    /// `html`/`head`/`body`.
    #[must_use]
    pub fn tags(&self) -> &[Element] {
        &self.tags
    }

    /// Every element with the given (lower-case) name, in document order.
    pub fn elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.tags.iter().filter(move |el| el.name == name)
    }

    pub fn images(&self) -> impl Iterator<Item = &Element> {
        self.elements("img")
    }

    pub fn meta_tags(&self) -> impl Iterator<Item = &Element> {
        self.elements("meta")
    }

    pub fn link_tags(&self) -> impl Iterator<Item = &Element> {
        self.elements("link")
    }

    pub fn iframes(&self) -> impl Iterator<Item = &Element> {
        self.elements("iframe")
    }

    pub fn forms(&self) -> impl Iterator<Item = &Element> {
        self.elements("form")
    }

    /// `input`, `select`, and `textarea` elements.
    pub fn form_controls(&self) -> impl Iterator<Item = &Element> {
        self.tags
            .iter()
            .filter(|el| matches!(el.name.as_str(), "input" | "select" | "textarea"))
    }

    /// `content` of the first `<meta>` whose `name` or `property` matches `key`.
    #[must_use]
    pub fn meta_content(&self, key: &str) -> Option<&str> {
        self.meta_tags()
            .find(|m| m.attr_is("name", key) || m.attr_is("property", key))
            .and_then(|m| m.attr("content"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// `<link>` tags whose `rel` list contains `rel`.
    pub fn links_with_rel<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.link_tags().filter(move |l| {
            l.attr("rel").is_some_and(|r| {
                r.split_whitespace().any(|token| token.eq_ignore_ascii_case(rel))
            })
        })
    }

    /// Headings of one level (1–6), in document order.
    pub fn headings(&self, level: u8) -> impl Iterator<Item = &Element> {
        let name = format!("h{level}");
        self.headings.iter().filter(move |h| h.name == name)
    }

    #[must_use]
    pub fn all_headings(&self) -> &[Element] {
        &self.headings
    }

    #[must_use]
    pub fn anchors(&self) -> &[Element] {
        &self.anchors
    }

    #[must_use]
    pub fn scripts(&self) -> &[Element] {
        &self.scripts
    }

    #[must_use]
    pub fn buttons(&self) -> &[Element] {
        &self.buttons
    }

    #[must_use]
    pub fn labels(&self) -> &[Element] {
        &self.labels
    }

    #[must_use]
    pub fn style_blocks(&self) -> &[String] {
        &self.style_blocks
    }

    /// Raw bodies of `<script type="application/ld+json">` blocks.
    pub fn json_ld_blocks(&self) -> impl Iterator<Item = &str> {
        self.scripts
            .iter()
            .filter(|s| s.attr_is("type", "application/ld+json"))
            .map(|s| s.inner_html.trim())
            .filter(|body| !body.is_empty())
    }

    /// Lower-cased `lang` attribute of the `<html>` element.
    #[must_use]
    pub fn html_lang(&self) -> Option<String> {
        self.elements("html")
            .next()
            .and_then(|h| h.attr("lang"))
            .map(|l| l.trim().to_ascii_lowercase())
            .filter(|l| !l.is_empty())
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Visible body text with markup, scripts, and styles removed.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text
            .split_whitespace()
            .filter(|w| w.chars().any(char::is_alphanumeric))
            .count()
    }

    /// Whether `inner` is nested inside `outer` (e.g. an `<input>` wrapped
    /// by a `<label>`).
    #[must_use]
    pub fn contains(outer: &Element, inner: &Element) -> bool {
        inner.index > outer.index && inner.index <= outer.subtree_end
    }
}

/// Hidden by the element's own attributes.
fn hides(el: &NodeElement) -> bool {
    if el.attr("hidden").is_some()
        || el
            .attr("aria-hidden")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    let style: String = el
        .attr("style")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if style.contains("display:none") || style.contains("visibility:hidden") {
        return true;
    }
    el.attr("class").is_some_and(|classes| {
        classes
            .split_whitespace()
            .any(|c| SR_ONLY_CLASSES.iter().any(|sr| c.eq_ignore_ascii_case(sr)))
    })
}

fn fill_content(element: &mut Element, el: ElementRef<'_>) {
    element.text = joined_text(el);
    element.inner_html = el.inner_html();
}

fn joined_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

fn visible_text(html: &Html) -> String {
    let parts: Vec<&str> = html
        .root_element()
        .descendants()
        .filter(|node| {
            !node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| NON_CONTENT.contains(&a.value().name()))
        })
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect();
    clean_text(&parts.join(" "))
}

/// Collapses runs of whitespace into single spaces and trims the ends.
#[must_use]
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
