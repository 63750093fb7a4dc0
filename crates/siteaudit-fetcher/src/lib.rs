//! Page fetching and HTML inspection for site audits.
//!
//! [`SiteFetcher`] downloads the audited page into an immutable
//! [`SiteSnapshot`]; check modules read the snapshot's [`Document`] and use
//! the same fetcher for satellite requests (`robots.txt`, sitemaps, link
//! probes, competitor pages).

pub mod client;
pub mod document;
pub mod error;
pub mod rate_limit;
pub mod snapshot;

pub use client::{normalize_url, site_origin, ProbeResponse, SiteFetcher};
pub use document::{clean_text, Document, Element};
pub use error::FetchError;
pub use rate_limit::RateLimiter;
pub use snapshot::{ResolvedLink, SiteSnapshot};
