//! Aggregator behavior: failure isolation, determinism and scoring.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use siteaudit_checks::{
    run_check, run_modules, run_modules_with, CheckContext, CheckSettings, ModuleError,
    ModuleRunner,
};
use siteaudit_core::{ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::{FetchError, RateLimiter, SiteFetcher, SiteSnapshot};

const PAGE: &str = r#"<html lang="en"><head>
<title>Acme Plumbing | Emergency Plumbers in Denver, CO 24/7</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="description" content="Family-owned Denver plumbers since 1982.">
<meta property="og:title" content="Acme Plumbing">
</head><body><h1>Denver plumbers</h1><p>1234 Main Street, Denver, CO 80202. Call 303-555-0100.</p>
<img src="/team.jpg" alt="Our team"></body></html>"#;

fn context() -> CheckContext {
    let snapshot = SiteSnapshot::from_parts(
        "https://acme.example/",
        "https://acme.example/",
        200,
        BTreeMap::new(),
        PAGE.to_string(),
    );
    let fetcher = SiteFetcher::new(5, "siteaudit-test/0.1", Arc::new(RateLimiter::unlimited()))
        .expect("failed to build test SiteFetcher");
    CheckContext::new(
        Arc::new(snapshot),
        Arc::new(fetcher),
        Arc::new(CheckSettings::default()),
    )
}

const PAGE_ONLY: [ModuleKey; 8] = [
    ModuleKey::Performance,
    ModuleKey::OnPage,
    ModuleKey::Mobile,
    ModuleKey::LocalBusiness,
    ModuleKey::Accessibility,
    ModuleKey::Security,
    ModuleKey::SchemaMarkup,
    ModuleKey::Social,
];

/// Fails `Mobile` with an error and panics inside `Security`; everything
/// else runs normally.
fn sabotaged(
    key: ModuleKey,
    ctx: CheckContext,
) -> BoxFuture<'static, Result<ModuleResult, ModuleError>> {
    Box::pin(async move {
        match key {
            ModuleKey::Mobile => Err(ModuleError::Fetch(FetchError::NotFound {
                url: "https://acme.example/robots.txt".to_string(),
            })),
            ModuleKey::Security => panic!("security check exploded"),
            other => run_check(other, &ctx).await,
        }
    })
}

fn sabotaged_runner() -> ModuleRunner {
    Arc::new(sabotaged)
}

#[tokio::test]
async fn failing_modules_degrade_without_affecting_siblings() {
    let ctx = context();
    let healthy = run_modules(&ctx, &PAGE_ONLY).await;
    let sabotaged = run_modules_with(&ctx, &PAGE_ONLY, sabotaged_runner()).await;

    assert_eq!(sabotaged.modules.len(), PAGE_ONLY.len());
    for (clean, result) in healthy.modules.iter().zip(&sabotaged.modules) {
        assert_eq!(clean.module_key, result.module_key);
        match result.module_key {
            ModuleKey::Mobile | ModuleKey::Security => {
                assert_eq!(result.score, 0);
                assert!(result.is_degraded());
                assert_eq!(result.issues.len(), 1);
                assert_eq!(result.issues[0].severity, Severity::High);
            }
            _ => assert_eq!(clean, result, "sibling {} changed", result.module_key),
        }
    }
}

#[tokio::test]
async fn panicking_module_is_reported_without_leaking_the_message() {
    let ctx = context();
    let result = run_modules_with(&ctx, &[ModuleKey::Security], sabotaged_runner()).await;
    let issue = &result.modules[0].issues[0];
    assert!(issue.technical_explanation.contains("panicked"));
    assert!(!issue.plain_language_explanation.contains("exploded"));
}

#[tokio::test]
async fn aggregation_is_deterministic_over_one_snapshot() {
    let ctx = context();
    let first = run_modules(&ctx, &PAGE_ONLY).await;
    let second = run_modules(&ctx, &PAGE_ONLY).await;
    let scores = |r: &[ModuleResult]| r.iter().map(|m| m.score).collect::<Vec<_>>();
    assert_eq!(scores(&first.modules), scores(&second.modules));
    assert_eq!(first.overall_score, second.overall_score);
    assert_eq!(first.page_analysis, second.page_analysis);
}

#[tokio::test]
async fn scores_stay_in_range_and_overall_is_rounded_mean() {
    let ctx = context();
    let result = run_modules(&ctx, &PAGE_ONLY).await;
    assert!(result.modules.iter().all(|m| m.score <= 100));
    let sum: u32 = result.modules.iter().map(|m| u32::from(m.score)).sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = f64::from(sum) / PAGE_ONLY.len() as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let expected = mean.round() as u8;
    assert_eq!(result.overall_score, expected);
}

#[tokio::test]
async fn raw_result_carries_page_analysis() {
    let ctx = context();
    let raw = run_modules(&ctx, &[ModuleKey::OnPage])
        .await
        .into_raw("https://acme.example/");
    assert_eq!(raw.url, "https://acme.example/");
    assert_eq!(raw.page_analysis.h1_text.as_deref(), Some("Denver plumbers"));
    assert_eq!(raw.modules.len(), 1);
    assert_eq!(raw.overall_score, raw.modules[0].score);
}
