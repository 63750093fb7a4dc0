use siteaudit_fetcher::FetchError;
use thiserror::Error;

/// Failure of a single check module. Never fatal to the audit: the
/// aggregator turns it into a degraded result.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("sitemap XML parse error: {0}")]
    Sitemap(#[from] quick_xml::Error),

    #[error("cannot resolve \"{reference}\" against {base}")]
    Resolve { base: String, reference: String },
}
