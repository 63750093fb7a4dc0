//! URL normalization for audit targets.

use reqwest::Url;

use crate::error::FetchError;

/// Parses a customer-supplied URL, prepending `https://` to bare hosts.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] for unparsable input, non-http(s)
/// schemes, or URLs without a host.
pub fn normalize_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl {
            url: raw.to_owned(),
            reason: "URL is empty".to_owned(),
        });
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| FetchError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl {
            url: raw.to_owned(),
            reason: format!("unsupported scheme \"{}\"", url.scheme()),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidUrl {
            url: raw.to_owned(),
            reason: "URL has no host".to_owned(),
        });
    }

    Ok(url)
}

/// Scheme + host (+ port) origin of a URL, e.g. `https://example.com`.
#[must_use]
pub fn site_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Host for rate limiting and log fields. Falls back to the full URL.
pub(crate) fn host_key(url: &Url) -> String {
    url.host_str()
        .map_or_else(|| url.as_str().to_owned(), str::to_ascii_lowercase)
}
