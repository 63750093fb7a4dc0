//! Crawl-health and competitor modules against a local `wiremock` server.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use siteaudit_checks::modules::{competitors, crawl_health};
use siteaudit_checks::{CheckContext, CheckSettings};
use siteaudit_core::Severity;
use siteaudit_fetcher::{RateLimiter, SiteFetcher, SiteSnapshot};

fn context_for(server: &MockServer, html: &str, settings: CheckSettings) -> CheckContext {
    let url = format!("{}/", server.uri());
    let snapshot = SiteSnapshot::from_parts(&url, &url, 200, BTreeMap::new(), html.to_string());
    let fetcher = SiteFetcher::new(5, "siteaudit-test/0.1", Arc::new(RateLimiter::unlimited()))
        .expect("failed to build test SiteFetcher");
    CheckContext::new(Arc::new(snapshot), Arc::new(fetcher), Arc::new(settings))
}

async fn mount_get(server: &MockServer, at: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_head(server: &MockServer, at: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://acme.example/</loc></url>
  <url><loc>https://acme.example/services</loc></url>
</urlset>"#;

#[tokio::test]
async fn crawl_health_reads_robots_sitemap_and_probes_links() {
    let server = MockServer::start().await;
    let robots = format!("User-agent: *\nAllow: /\nSitemap: {}/sitemaps/main.xml\n", server.uri());
    mount_get(&server, "/robots.txt", 200, &robots).await;
    mount_get(&server, "/sitemaps/main.xml", 200, SITEMAP).await;
    mount_head(&server, "/ok", 200).await;
    mount_head(&server, "/gone", 404).await;
    mount_head(&server, "/busy", 429).await;
    mount_head(&server, "/form", 405).await;

    let html = r#"<head><link rel="canonical" href="/"></head>
        <a href="/ok">ok</a><a href="/gone">gone</a><a href="/busy">busy</a><a href="/form">form</a><a href="/ok#team">dup</a>"#;
    let ctx = context_for(&server, html, CheckSettings::default());

    let result = crawl_health::check(&ctx).await.expect("crawl health runs");

    assert_eq!(result.score, 95, "issues: {:?}", result.issues);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].title, "1 broken link");
    assert_eq!(result.evidence.get("sitemap_url_count"), Some(&json!(2)));
    assert_eq!(result.evidence.get("links_checked"), Some(&json!(4)));
    assert_eq!(result.evidence.get("has_redirect"), Some(&json!(false)));
}

#[tokio::test]
async fn crawl_health_flags_blocked_unindexable_pages() {
    let server = MockServer::start().await;
    mount_get(&server, "/robots.txt", 200, "User-agent: *\nDisallow: /\n").await;
    // /sitemap.xml is not mounted, so wiremock answers 404.

    let html = r#"<head><meta name="robots" content="noindex, nofollow"></head><p>Staging</p>"#;
    let ctx = context_for(&server, html, CheckSettings::default());

    let result = crawl_health::check(&ctx).await.expect("crawl health runs");

    // blocked -25, sitemap -10, noindex -30, canonical -5
    assert_eq!(result.score, 30);
    let high: Vec<&str> = result
        .issues
        .iter()
        .filter(|i| i.severity == Severity::High)
        .map(|i| i.title.as_str())
        .collect();
    assert_eq!(
        high,
        vec!["robots.txt blocks all crawlers", "Page is excluded from search results"]
    );
}

#[tokio::test]
async fn crawl_health_caps_broken_link_penalty() {
    let server = MockServer::start().await;
    mount_get(&server, "/robots.txt", 200, "User-agent: *\nAllow: /\n").await;
    mount_get(&server, "/sitemap.xml", 200, SITEMAP).await;

    let links: String = (0..7).map(|i| format!(r#"<a href="/dead-{i}">x</a>"#)).collect();
    let html = format!(r#"<link rel="canonical" href="/">{links}"#);
    let settings = CheckSettings {
        link_sample_size: 10,
        ..CheckSettings::default()
    };
    let ctx = context_for(&server, &html, settings);

    let result = crawl_health::check(&ctx).await.expect("crawl health runs");

    assert_eq!(result.score, 75);
    assert_eq!(result.evidence.get("broken_links"), Some(&json!(7)));
}

#[tokio::test]
async fn competitor_comparison_penalizes_gaps() {
    let server = MockServer::start().await;
    let competitor_page = format!(
        r#"<head><title>Best Denver Plumbers | Rival Plumbing Co</title>
           <meta name="description" content="Rival Plumbing offers round-the-clock plumbing repairs across Denver."></head>
           <p>{}</p>"#,
        vec!["pipe"; 900].join(" ")
    );
    mount_get(&server, "/rival", 200, &competitor_page).await;

    let subject = format!("<head><title>Acme</title></head><p>{}</p>", vec!["word"; 400].join(" "));
    let ctx = context_for(&server, &subject, CheckSettings::default())
        .with_competitor(Some(format!("{}/rival", server.uri())));

    let result = competitors::check(&ctx).await.expect("competitor check runs");

    // words -15, title -5, meta -10
    assert_eq!(result.score, 70, "issues: {:?}", result.issues);
    assert_eq!(result.evidence.get("comparison_available"), Some(&json!(true)));
    assert_eq!(result.evidence.get("competitor_word_count"), Some(&json!(900)));
}

#[tokio::test]
async fn competitor_open_graph_description_counts_as_meta() {
    let server = MockServer::start().await;
    let competitor_page = format!(
        r#"<head><title>Acme Rival</title>
           <meta property="og:description" content="Round-the-clock plumbing repairs across Denver."></head>
           <p>{}</p>"#,
        vec!["pipe"; 400].join(" ")
    );
    mount_get(&server, "/rival", 200, &competitor_page).await;

    let subject = format!("<head><title>Acme</title></head><p>{}</p>", vec!["word"; 400].join(" "));
    let ctx = context_for(&server, &subject, CheckSettings::default())
        .with_competitor(Some(format!("{}/rival", server.uri())));

    let result = competitors::check(&ctx).await.expect("competitor check runs");

    assert_eq!(result.evidence.get("competitor_meta_length"), Some(&json!(47)));
    assert!(result
        .issues
        .iter()
        .any(|i| i.title == "Competitor has a meta description and you don't"));
}

#[tokio::test]
async fn unreachable_competitor_falls_back_to_subject_only() {
    let server = MockServer::start().await;
    mount_get(&server, "/rival", 503, "down").await;

    let subject = format!(
        r#"<title>Acme Plumbing Denver</title><meta name="description" content="Plumbers"><p>{}</p>"#,
        vec!["word"; 350].join(" ")
    );
    let ctx = context_for(&server, &subject, CheckSettings::default())
        .with_competitor(Some(format!("{}/rival", server.uri())));

    let result = competitors::check(&ctx).await.expect("competitor check never fails");

    assert_eq!(result.score, 100);
    assert_eq!(result.issues.len(), 1);
    assert_eq!(result.issues[0].severity, Severity::Low);
    assert!(result.issues[0].technical_explanation.ends_with("could not be loaded."));
    assert!(!result.issues[0].technical_explanation.contains("503"));
    assert_eq!(result.evidence.get("comparison_available"), Some(&json!(false)));
}
