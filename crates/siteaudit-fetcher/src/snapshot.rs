//! Immutable snapshot of one fetched page.

use std::collections::BTreeMap;

use reqwest::Url;

use crate::document::Document;

/// Everything the check modules know about a page.
///
/// Built once per pipeline invocation and shared read-only (behind an `Arc`)
/// by every module. Only derived facts outlive the run.
#[derive(Debug, Clone)]
pub struct SiteSnapshot {
    pub url: String,
    pub final_url: String,
    pub http_status: u16,
    pub content_type: Option<String>,
    pub content_length: usize,
    pub is_https: bool,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub html: String,
    /// Response headers keyed by lower-cased name.
    pub headers: BTreeMap<String, String>,
    pub document: Document,
}

/// An `<a href>` resolved against the page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub url: Url,
    pub internal: bool,
}

impl SiteSnapshot {
    /// Assembles a snapshot from response parts, deriving title, meta
    /// description, and the HTTPS flag from the final URL and body.
    #[must_use]
    pub fn from_parts(
        url: &str,
        final_url: &str,
        http_status: u16,
        headers: BTreeMap<String, String>,
        html: String,
    ) -> Self {
        let headers: BTreeMap<String, String> = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        let document = Document::parse(&html);
        let title = document.title().map(str::to_string);
        let meta_description = document
            .meta_content("description")
            .or_else(|| document.meta_content("og:description"))
            .map(crate::document::clean_text)
            .filter(|d| !d.is_empty());
        let content_type = headers.get("content-type").cloned();
        let content_length = headers
            .get("content-length")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(html.len());
        let is_https = final_url
            .get(..8)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"));

        Self {
            url: url.to_string(),
            final_url: final_url.to_string(),
            http_status,
            content_type,
            content_length,
            is_https,
            title,
            meta_description,
            html,
            headers,
            document,
        }
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the request was redirected to a different URL.
    #[must_use]
    pub fn has_redirect(&self) -> bool {
        let canonical = |raw: &str| {
            Url::parse(raw).map_or_else(|_| raw.trim_end_matches('/').to_string(), |u| {
                u.as_str().trim_end_matches('/').to_string()
            })
        };
        canonical(&self.url) != canonical(&self.final_url)
    }

    /// Host of the final URL without a leading `www.`.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.final_url)
            .ok()
            .and_then(|u| u.host_str().map(strip_www))
    }

    /// Resolves a possibly-relative reference against the final URL.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Option<Url> {
        let base = Url::parse(&self.final_url).ok()?;
        base.join(reference.trim()).ok()
    }

    /// Every navigable `http(s)` link on the page, resolved and classified.
    /// `mailto:`, `tel:`, `javascript:` and fragment-only links are skipped.
    #[must_use]
    pub fn resolved_links(&self) -> Vec<ResolvedLink> {
        let own_host = self.host();
        self.document
            .anchors()
            .iter()
            .filter_map(|a| a.attr("href"))
            .map(str::trim)
            .filter(|href| {
                let lower = href.to_ascii_lowercase();
                !href.is_empty()
                    && !href.starts_with('#')
                    && !lower.starts_with("mailto:")
                    && !lower.starts_with("tel:")
                    && !lower.starts_with("javascript:")
                    && !lower.starts_with("data:")
            })
            .filter_map(|href| self.resolve(href))
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .map(|url| {
                let internal = url.host_str().map(strip_www) == own_host;
                ResolvedLink { url, internal }
            })
            .collect()
    }
}

fn strip_www(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    host.strip_prefix("www.").map_or(host.clone(), str::to_string)
}
