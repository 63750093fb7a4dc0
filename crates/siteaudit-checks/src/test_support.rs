//! Fixtures shared by the module unit tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use siteaudit_fetcher::{RateLimiter, SiteFetcher, SiteSnapshot};

use crate::context::{CheckContext, CheckSettings};

pub(crate) const PAGE_URL: &str = "https://acme.example/";

pub(crate) fn snapshot(html: &str) -> SiteSnapshot {
    snapshot_with(PAGE_URL, &[], html)
}

pub(crate) fn snapshot_with(url: &str, headers: &[(&str, &str)], html: &str) -> SiteSnapshot {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    SiteSnapshot::from_parts(url, url, 200, headers, html.to_string())
}

pub(crate) fn fetcher() -> Arc<SiteFetcher> {
    Arc::new(
        SiteFetcher::new(5, "siteaudit-test/0.1", Arc::new(RateLimiter::unlimited()))
            .expect("test fetcher"),
    )
}

pub(crate) fn context(snapshot: SiteSnapshot) -> CheckContext {
    CheckContext::new(Arc::new(snapshot), fetcher(), Arc::new(CheckSettings::default()))
}

/// `count` words of filler prose.
pub(crate) fn words(count: usize) -> String {
    vec!["lorem"; count].join(" ")
}
