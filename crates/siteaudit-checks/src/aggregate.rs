//! Fan-out over the purchased modules and roll-up of their results.

use std::sync::Arc;
use std::time::Instant;

use futures::future::{join_all, BoxFuture};
use siteaudit_core::{overall_score, ModuleKey, ModuleResult, PageAnalysis, RawAuditResult};
use siteaudit_fetcher::SiteSnapshot;
use tracing::Instrument;

use crate::context::CheckContext;
use crate::dispatch::run_check;
use crate::error::ModuleError;
use crate::page::visible_h1s;

/// Runs one module. Swappable so tests can inject failing modules.
pub type ModuleRunner = Arc<
    dyn Fn(ModuleKey, CheckContext) -> BoxFuture<'static, Result<ModuleResult, ModuleError>>
        + Send
        + Sync,
>;

/// Module results in purchase order plus page-level facts.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub modules: Vec<ModuleResult>,
    pub overall_score: u8,
    pub page_analysis: PageAnalysis,
}

impl AggregateResult {
    #[must_use]
    pub fn into_raw(self, url: &str) -> RawAuditResult {
        RawAuditResult {
            url: url.to_string(),
            page_analysis: self.page_analysis,
            modules: self.modules,
            overall_score: self.overall_score,
        }
    }
}

fn default_runner(
    key: ModuleKey,
    ctx: CheckContext,
) -> BoxFuture<'static, Result<ModuleResult, ModuleError>> {
    Box::pin(async move { run_check(key, &ctx).await })
}

/// Runs every purchased module concurrently against the shared snapshot.
///
/// Duplicate keys are collapsed. A module that returns an error or panics
/// is replaced by [`ModuleResult::degraded`]; its siblings are unaffected.
pub async fn run_modules(ctx: &CheckContext, keys: &[ModuleKey]) -> AggregateResult {
    run_modules_with(ctx, keys, Arc::new(default_runner)).await
}

/// [`run_modules`] with a caller-supplied module runner.
pub async fn run_modules_with(
    ctx: &CheckContext,
    keys: &[ModuleKey],
    runner: ModuleRunner,
) -> AggregateResult {
    let mut unique: Vec<ModuleKey> = Vec::with_capacity(keys.len());
    for key in keys {
        if !unique.contains(key) {
            unique.push(*key);
        }
    }

    let handles: Vec<_> = unique
        .iter()
        .map(|&key| {
            let task_ctx = ctx.clone();
            let runner = Arc::clone(&runner);
            let span = tracing::info_span!("module", module = %key);
            tokio::spawn(
                async move {
                    let started = Instant::now();
                    let outcome = runner(key, task_ctx).await;
                    if let Ok(result) = &outcome {
                        tracing::info!(
                            score = result.score,
                            issues = result.issues.len(),
                            elapsed_ms = started.elapsed().as_millis(),
                            "module finished"
                        );
                    }
                    outcome
                }
                .instrument(span),
            )
        })
        .collect();

    let joined = join_all(handles).await;

    let modules: Vec<ModuleResult> = unique
        .iter()
        .zip(joined)
        .map(|(&key, joined)| match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(module = %key, error = %e, "module failed; recording degraded result");
                ModuleResult::degraded(key, &e.to_string())
            }
            Err(join_err) => {
                let reason = if join_err.is_panic() {
                    "the check panicked"
                } else {
                    "the check was cancelled"
                };
                tracing::error!(module = %key, error = %join_err, "module task aborted; recording degraded result");
                ModuleResult::degraded(key, reason)
            }
        })
        .collect();

    AggregateResult {
        overall_score: overall_score(&modules),
        page_analysis: page_analysis(&ctx.snapshot),
        modules,
    }
}

/// Page-level header facts derived directly from the snapshot.
#[must_use]
pub fn page_analysis(snapshot: &SiteSnapshot) -> PageAnalysis {
    let doc = &snapshot.document;
    let h1s = visible_h1s(doc);
    let links = snapshot.resolved_links();
    let internal_links = links.iter().filter(|l| l.internal).count();
    PageAnalysis {
        final_url: snapshot.final_url.clone(),
        http_status: snapshot.http_status,
        has_redirect: snapshot.has_redirect(),
        h1_text: h1s.first().map(|h| h.text.clone()),
        h1_count: h1s.len(),
        h2_count: doc.headings(2).filter(|h| !h.is_hidden()).count(),
        word_count: doc.word_count(),
        image_count: doc.images().count(),
        images_with_alt: doc
            .images()
            .filter(|img| img.attr("alt").is_some_and(|a| !a.trim().is_empty()))
            .count(),
        internal_links,
        external_links: links.len() - internal_links,
    }
}
