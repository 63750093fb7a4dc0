//! HTTP client for audit targets and their satellite resources.

mod origin;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};

use crate::error::FetchError;
use crate::rate_limit::RateLimiter;
use crate::snapshot::SiteSnapshot;

pub use origin::{normalize_url, site_origin};

pub(crate) const BROWSER_UA: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

/// Status and body of a satellite request (`robots.txt`, sitemaps).
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub final_url: String,
    pub body: String,
}

impl ProbeResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches pages into [`SiteSnapshot`]s and probes satellite URLs.
///
/// Every call carries an explicit deadline: the request future is raced
/// against `tokio::time::timeout` and dropped (cancelling the request) on
/// expiry. Nothing is retried here.
pub struct SiteFetcher {
    client: Client,
    timeout: Duration,
    limiter: Arc<RateLimiter>,
}

impl SiteFetcher {
    /// Creates a fetcher with the default page deadline and an injected
    /// rate limiter.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            timeout: Duration::from_secs(timeout_secs),
            limiter,
        })
    }

    /// Deadline applied by [`SiteFetcher::fetch`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches and parses the audit target page.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`]: the URL cannot be normalized.
    /// - [`FetchError::NotFound`] / [`FetchError::UnexpectedStatus`]: non-2xx response.
    /// - [`FetchError::Http`]: network, DNS, or TLS failure.
    /// - [`FetchError::Timeout`]: the deadline elapsed.
    pub async fn fetch(&self, url: &str) -> Result<SiteSnapshot, FetchError> {
        self.fetch_with_timeout(url, self.timeout, None).await
    }

    /// Like [`SiteFetcher::fetch`] with a caller-chosen deadline and an
    /// optional `User-Agent` override (browser-like fetches of third-party
    /// sites).
    ///
    /// # Errors
    ///
    /// Same as [`SiteFetcher::fetch`].
    pub async fn fetch_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
        user_agent_override: Option<&str>,
    ) -> Result<SiteSnapshot, FetchError> {
        let target = normalize_url(url)?;
        let requested = target.to_string();
        self.limiter.acquire(&origin::host_key(&target)).await;

        let request = async {
            let mut builder = self
                .client
                .get(target.clone())
                .header(
                    header::ACCEPT,
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                )
                .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
            if let Some(ua) = user_agent_override {
                builder = builder.header(header::USER_AGENT, ua);
            }

            let response = builder.send().await.map_err(|source| FetchError::Http {
                url: requested.clone(),
                source,
            })?;
            let status = response.status();
            let final_url = response.url().to_string();

            if status == StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound {
                    url: requested.clone(),
                });
            }
            if !status.is_success() {
                return Err(FetchError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: requested.clone(),
                });
            }

            let headers = collect_headers(response.headers());
            let html = response.text().await.map_err(|source| FetchError::Http {
                url: requested.clone(),
                source,
            })?;

            Ok(SiteSnapshot::from_parts(
                &requested,
                &final_url,
                status.as_u16(),
                headers,
                html,
            ))
        };

        let snapshot = with_deadline(&requested, timeout, request).await?;
        tracing::debug!(
            url = %snapshot.url,
            final_url = %snapshot.final_url,
            status = snapshot.http_status,
            bytes = snapshot.content_length,
            "fetched site snapshot"
        );
        Ok(snapshot)
    }

    /// `GET`s a satellite resource and returns its status and body whatever
    /// the status code.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`], [`FetchError::Timeout`], or
    /// [`FetchError::InvalidUrl`]; non-2xx statuses are not errors here.
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<ProbeResponse, FetchError> {
        let target = normalize_url(url)?;
        let requested = target.to_string();
        self.limiter.acquire(&origin::host_key(&target)).await;

        let request = async {
            let response = self
                .client
                .get(target.clone())
                .send()
                .await
                .map_err(|source| FetchError::Http {
                    url: requested.clone(),
                    source,
                })?;
            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let body = response.text().await.map_err(|source| FetchError::Http {
                url: requested.clone(),
                source,
            })?;
            Ok(ProbeResponse {
                status,
                final_url,
                body,
            })
        };

        with_deadline(&requested, timeout, request).await
    }

    /// Sends a `HEAD` request and returns the final status code.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`], [`FetchError::Timeout`], or
    /// [`FetchError::InvalidUrl`]; non-2xx statuses are not errors here.
    pub async fn head_status(&self, url: &str, timeout: Duration) -> Result<u16, FetchError> {
        let target = normalize_url(url)?;
        let requested = target.to_string();
        self.limiter.acquire(&origin::host_key(&target)).await;

        let request = async {
            let response = self
                .client
                .request(Method::HEAD, target.clone())
                .header(header::USER_AGENT, BROWSER_UA)
                .send()
                .await
                .map_err(|source| FetchError::Http {
                    url: requested.clone(),
                    source,
                })?;
            Ok(response.status().as_u16())
        };

        with_deadline(&requested, timeout, request).await
    }

    /// Browser-like `User-Agent` used for third-party page fetches.
    #[must_use]
    pub fn browser_user_agent() -> &'static str {
        BROWSER_UA
    }
}

async fn with_deadline<T, F>(url: &str, timeout: Duration, request: F) -> Result<T, FetchError>
where
    F: std::future::Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(url, timeout_ms = timeout.as_millis(), "request deadline elapsed");
            Err(FetchError::Timeout {
                url: url.to_owned(),
                timeout_ms: timeout.as_millis(),
            })
        }
    }
}

fn collect_headers(headers: &header::HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        out.entry(name.as_str().to_ascii_lowercase())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_owned());
    }
    out
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
