//! Crawlability: robots.txt, sitemap, sampled link health, indexability and
//! canonical URL.

use std::time::Duration;

use futures::future::join_all;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::json;
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::{SiteFetcher, SiteSnapshot};

use crate::context::CheckContext;
use crate::error::ModuleError;
use crate::page::sample;
use crate::scorecard::Scorecard;

const MISSING_ROBOTS_PENALTY: i32 = 10;
const BLOCKED_PENALTY: i32 = 25;
const MISSING_SITEMAP_PENALTY: i32 = 10;
const BROKEN_LINK_PENALTY: i32 = 5;
const BROKEN_LINKS_MAX_PENALTY: i32 = 25;
const NOINDEX_PENALTY: i32 = 30;
const MISSING_CANONICAL_PENALTY: i32 = 5;

/// Statuses that say "don't probe like this" rather than "this link is dead".
const NOT_BROKEN_STATUSES: [u16; 2] = [405, 429];

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RobotsTxt {
    pub(crate) blocks_all: bool,
    pub(crate) sitemaps: Vec<String>,
}

/// Reads the rules that matter here: whether the `*` group disallows `/`,
/// and every `Sitemap:` directive.
pub(crate) fn parse_robots(body: &str) -> RobotsTxt {
    let mut robots = RobotsTxt::default();
    let mut group_agents: Vec<String> = Vec::new();
    let mut in_rules = false;

    for line in body.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "user-agent" => {
                // A user-agent after rules starts a new group.
                if in_rules {
                    group_agents.clear();
                    in_rules = false;
                }
                group_agents.push(value.to_ascii_lowercase());
            }
            "disallow" => {
                in_rules = true;
                if value == "/" && group_agents.iter().any(|a| a == "*") {
                    robots.blocks_all = true;
                }
            }
            "allow" | "crawl-delay" => in_rules = true,
            "sitemap" if !value.is_empty() => robots.sitemaps.push(value.to_string()),
            _ => {}
        }
    }
    robots
}

/// Counts `<loc>` entries in a sitemap or sitemap index.
///
/// # Errors
///
/// Returns [`ModuleError::Sitemap`] when the document is not well-formed XML.
pub(crate) fn count_sitemap_urls(xml: &str) -> Result<usize, ModuleError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut count = 0;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"loc" => count += 1,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(count)
}

fn looks_like_sitemap(body: &str) -> bool {
    let head: String = body.chars().take(2_048).collect::<String>().to_ascii_lowercase();
    head.contains("<urlset") || head.contains("<sitemapindex")
}

async fn probe_link(fetcher: &SiteFetcher, url: String, timeout: Duration) -> Option<(String, String)> {
    match fetcher.head_status(&url, timeout).await {
        Ok(status) if status >= 400 && !NOT_BROKEN_STATUSES.contains(&status) => {
            Some((url, status.to_string()))
        }
        Ok(_) => None,
        Err(e) if e.is_timeout() => Some((url, "timeout".to_string())),
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "link probe failed");
            Some((url, "unreachable".to_string()))
        }
    }
}

/// Up to `limit` distinct links, internal ones first, fragments removed.
fn link_sample(snapshot: &SiteSnapshot, limit: usize) -> Vec<String> {
    let mut links = snapshot.resolved_links();
    links.sort_by_key(|l| !l.internal);
    let mut picked: Vec<String> = Vec::new();
    for mut link in links {
        link.url.set_fragment(None);
        let url = link.url.to_string();
        if url.trim_end_matches('/') == snapshot.final_url.trim_end_matches('/') {
            continue;
        }
        if !picked.contains(&url) {
            picked.push(url);
        }
        if picked.len() >= limit {
            break;
        }
    }
    picked
}

/// # Errors
///
/// Returns [`ModuleError::Resolve`] if the page URL cannot anchor
/// `/robots.txt`. Satellite request failures are findings, not errors.
pub async fn check(ctx: &CheckContext) -> Result<ModuleResult, ModuleError> {
    let snapshot = ctx.snapshot.as_ref();
    let settings = ctx.settings.as_ref();
    let mut card = Scorecard::new(ModuleKey::CrawlHealth);

    card.evidence("final_url", snapshot.final_url.as_str());
    card.evidence("has_redirect", snapshot.has_redirect());

    let robots_url = snapshot
        .resolve("/robots.txt")
        .ok_or_else(|| ModuleError::Resolve {
            base: snapshot.final_url.clone(),
            reference: "/robots.txt".to_string(),
        })?
        .to_string();

    let robots = match ctx.fetcher.get_text(&robots_url, settings.robots_timeout).await {
        Ok(resp) if resp.is_success() => Some(parse_robots(&resp.body)),
        Ok(resp) => {
            tracing::debug!(url = %robots_url, status = resp.status, "robots.txt not found");
            None
        }
        Err(e) => {
            tracing::debug!(url = %robots_url, error = %e, "robots.txt fetch failed");
            None
        }
    };
    card.evidence("robots_txt_found", robots.is_some());

    match &robots {
        None => card.penalize(
            MISSING_ROBOTS_PENALTY,
            AuditIssue::new(
                "robots.txt is missing",
                Severity::Medium,
                format!("{robots_url} did not return a successful response."),
                "Search engines look for a small instruction file on your site, and yours is missing.",
                "Publish a robots.txt that allows crawling and points to your sitemap.",
            ),
        ),
        Some(parsed) if parsed.blocks_all => card.penalize(
            BLOCKED_PENALTY,
            AuditIssue::new(
                "robots.txt blocks all crawlers",
                Severity::High,
                "robots.txt contains \"User-agent: *\" with \"Disallow: /\".",
                "Your site is telling Google and other search engines not to look at any of your pages.",
                "Remove the \"Disallow: /\" rule for User-agent: * (it is often left over from a staging site).",
            ),
        ),
        Some(_) => {}
    }

    let sitemap_url = robots
        .as_ref()
        .and_then(|r| r.sitemaps.first().cloned())
        .or_else(|| snapshot.resolve("/sitemap.xml").map(|u| u.to_string()));

    let mut sitemap_found = false;
    if let Some(url) = &sitemap_url {
        card.evidence("sitemap_url", url.as_str());
        match ctx.fetcher.get_text(url, settings.robots_timeout).await {
            Ok(resp) if resp.is_success() && looks_like_sitemap(&resp.body) => {
                sitemap_found = true;
                match count_sitemap_urls(&resp.body) {
                    Ok(count) => card.evidence("sitemap_url_count", count),
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "sitemap is not well-formed XML");
                        card.evidence("sitemap_parse_error", e.to_string());
                    }
                }
            }
            Ok(resp) => {
                tracing::debug!(url = %url, status = resp.status, "sitemap not found");
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "sitemap fetch failed");
            }
        }
    }
    card.evidence("sitemap_found", sitemap_found);
    if !sitemap_found {
        card.penalize(
            MISSING_SITEMAP_PENALTY,
            AuditIssue::new(
                "XML sitemap not found",
                Severity::Medium,
                format!(
                    "No sitemap was found at {}.",
                    sitemap_url.as_deref().unwrap_or("/sitemap.xml")
                ),
                "A sitemap is a list of your pages that helps search engines find all of them. We couldn't find one.",
                "Generate an XML sitemap (most CMSs do this automatically) and reference it in robots.txt.",
            ),
        );
    }

    let sampled = link_sample(snapshot, settings.link_sample_size);
    let probes = sampled
        .iter()
        .cloned()
        .map(|url| probe_link(&ctx.fetcher, url, settings.link_check_timeout));
    let broken: Vec<(String, String)> = join_all(probes).await.into_iter().flatten().collect();
    card.evidence("links_checked", sampled.len());
    card.evidence("broken_links", broken.len());
    if !broken.is_empty() {
        let penalty = (BROKEN_LINK_PENALTY * i32::try_from(broken.len()).unwrap_or(i32::MAX))
            .min(BROKEN_LINKS_MAX_PENALTY);
        let found: Vec<String> = broken.iter().map(|(url, why)| format!("{url} ({why})")).collect();
        card.penalize(
            penalty,
            AuditIssue::new(
                if broken.len() == 1 {
                    "1 broken link".to_string()
                } else {
                    format!("{} broken links", broken.len())
                },
                Severity::Medium,
                format!("{} of {} sampled links returned an error status or did not respond.", broken.len(), sampled.len()),
                "Some links on your page lead to dead ends, which frustrates visitors and wastes search engines' time.",
                "Update or remove the broken links listed below.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(broken.len())),
                found: Some(json!(sample(&found, 5))),
                ..IssueEvidence::default()
            }),
        );
    }

    let doc = &snapshot.document;
    let meta_noindex = doc
        .meta_tags()
        .filter(|m| m.attr_is("name", "robots") || m.attr_is("name", "googlebot"))
        .filter_map(|m| m.attr("content"))
        .any(|c| c.to_ascii_lowercase().contains("noindex"));
    let header_noindex = snapshot
        .header("x-robots-tag")
        .is_some_and(|v| v.to_ascii_lowercase().contains("noindex"));
    card.evidence("noindex", meta_noindex || header_noindex);
    if meta_noindex || header_noindex {
        card.penalize(
            NOINDEX_PENALTY,
            AuditIssue::new(
                "Page is excluded from search results",
                Severity::High,
                if meta_noindex {
                    "A robots meta tag contains noindex."
                } else {
                    "The X-Robots-Tag response header contains noindex."
                },
                "This page is telling search engines not to list it, so it can't be found on Google.",
                "Remove the noindex directive unless the page is intentionally private.",
            ),
        );
    }

    let canonical = doc
        .links_with_rel("canonical")
        .filter_map(|l| l.attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty());
    card.evidence("canonical_url", canonical.unwrap_or_default());
    if canonical.is_none() {
        card.penalize(
            MISSING_CANONICAL_PENALTY,
            AuditIssue::new(
                "Missing canonical URL",
                Severity::Low,
                "No <link rel=\"canonical\"> was found.",
                "Search engines may treat slightly different addresses for this page as duplicates.",
                "Add <link rel=\"canonical\" href=\"...\"> pointing at the preferred URL of the page.",
            ),
        );
    }

    Ok(card.finish())
}
