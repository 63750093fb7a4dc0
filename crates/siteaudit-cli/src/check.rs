//! `check` command: fetch and score a page without touching storage.

use std::sync::Arc;
use std::time::Duration;

use siteaudit_checks::{run_modules, CheckContext, CheckSettings};
use siteaudit_core::{AppConfig, ModuleKey, RawAuditResult};
use siteaudit_fetcher::{RateLimiter, SiteFetcher};

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; SiteAuditBot/0.1; +https://siteaudit.invalid/bot)";

pub(crate) async fn run(
    config: Option<&AppConfig>,
    url: &str,
    modules: &[ModuleKey],
    competitor: Option<String>,
) -> anyhow::Result<RawAuditResult> {
    let (fetcher, settings) = match config {
        Some(config) => (
            SiteFetcher::new(
                config.fetch_timeout_secs,
                &config.fetch_user_agent,
                Arc::new(RateLimiter::new(Duration::from_millis(
                    config.fetch_min_host_interval_ms,
                ))),
            )?,
            CheckSettings::from_config(config),
        ),
        None => (
            SiteFetcher::new(
                DEFAULT_TIMEOUT_SECS,
                DEFAULT_USER_AGENT,
                Arc::new(RateLimiter::unlimited()),
            )?,
            CheckSettings::default(),
        ),
    };
    let fetcher = Arc::new(fetcher);

    let snapshot = fetcher.fetch(url).await?;
    tracing::info!(url, final_url = %snapshot.final_url, "fetched page");

    let ctx = CheckContext::new(Arc::new(snapshot), fetcher, Arc::new(settings))
        .with_competitor(competitor);
    let aggregate = run_modules(&ctx, modules).await;
    Ok(aggregate.into_raw(url))
}
