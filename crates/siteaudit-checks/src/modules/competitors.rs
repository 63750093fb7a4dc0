//! Side-by-side comparison with one customer-supplied competitor page.
//!
//! Never fails: an absent or unreachable competitor switches the module to a
//! subject-only mode with a no-penalty informational issue.

use serde_json::json;
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::{SiteFetcher, SiteSnapshot};

use crate::context::CheckContext;
use crate::error::ModuleError;
use crate::scorecard::Scorecard;

const WORD_GAP_PENALTY: i32 = 15;
const TITLE_GAP_PENALTY: i32 = 5;
const META_MISSING_PENALTY: i32 = 10;
const META_SHORT_PENALTY: i32 = 5;

const SOLO_THIN_CONTENT_PENALTY: i32 = 10;
const SOLO_MISSING_TITLE_PENALTY: i32 = 10;
const SOLO_MISSING_META_PENALTY: i32 = 10;

/// Competitor word count above this multiple of the subject's is a gap.
const WORD_GAP_RATIO: f64 = 1.5;
/// Subject meta description shorter than this fraction of the competitor's.
const META_SHORT_RATIO: f64 = 0.7;
const TITLE_RANGE: std::ops::RangeInclusive<usize> = 30..=60;
const SOLO_MIN_WORDS: usize = 300;

/// Length-relevant facts about one page.
#[derive(Debug, Clone, PartialEq)]
struct PageFacts {
    words: usize,
    title_len: Option<usize>,
    meta_len: Option<usize>,
}

impl PageFacts {
    fn of(snapshot: &SiteSnapshot) -> Self {
        Self {
            words: snapshot.document.word_count(),
            title_len: snapshot.document.title().map(|t| t.chars().count()),
            meta_len: snapshot
                .meta_description
                .as_deref()
                .map(|m| m.chars().count()),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator.max(1) as f64
}

/// # Errors
///
/// Infallible in practice; the signature matches the other network modules.
pub async fn check(ctx: &CheckContext) -> Result<ModuleResult, ModuleError> {
    let subject = PageFacts::of(&ctx.snapshot);
    let mut card = Scorecard::new(ModuleKey::Competitors);
    card.evidence("subject_word_count", subject.words);

    let Some(competitor_url) = ctx.competitor_url.as_deref() else {
        card.evidence("comparison_available", false);
        return Ok(solo(card, &subject, "No competitor URL was provided with this audit."));
    };
    card.evidence("competitor_url", competitor_url);

    let fetched = ctx
        .fetcher
        .fetch_with_timeout(
            competitor_url,
            ctx.settings.competitor_timeout,
            Some(SiteFetcher::browser_user_agent()),
        )
        .await;
    let competitor = match fetched {
        Ok(snapshot) => PageFacts::of(&snapshot),
        Err(e) => {
            tracing::info!(url = competitor_url, error = %e, "competitor unreachable; comparing subject only");
            card.evidence("comparison_available", false);
            return Ok(solo(
                card,
                &subject,
                &format!("The competitor page at {competitor_url} could not be loaded."),
            ));
        }
    };

    card.evidence("comparison_available", true);
    card.evidence("competitor_word_count", competitor.words);
    if let Some(len) = subject.title_len {
        card.evidence("subject_title_length", len);
    }
    if let Some(len) = competitor.title_len {
        card.evidence("competitor_title_length", len);
    }
    if let Some(len) = subject.meta_len {
        card.evidence("subject_meta_length", len);
    }
    if let Some(len) = competitor.meta_len {
        card.evidence("competitor_meta_length", len);
    }

    if ratio(competitor.words, subject.words) > WORD_GAP_RATIO {
        card.penalize(
            WORD_GAP_PENALTY,
            AuditIssue::new(
                "Competitor has substantially more content",
                Severity::Medium,
                format!("The competitor page has {} words versus {} on yours.", competitor.words, subject.words),
                "Your competitor explains their services in much more detail, which tends to help them rank above you.",
                "Expand your page with more detail about your services, pricing, process, and FAQs.",
            )
            .with_evidence(IssueEvidence {
                actual: Some(json!(subject.words)),
                expected: Some(json!(competitor.words)),
                ..IssueEvidence::default()
            }),
        );
    }

    let in_range = |len: Option<usize>| len.is_some_and(|l| TITLE_RANGE.contains(&l));
    if !in_range(subject.title_len) && in_range(competitor.title_len) {
        card.penalize(
            TITLE_GAP_PENALTY,
            AuditIssue::new(
                "Competitor's page title is better optimized",
                Severity::Low,
                format!(
                    "Your title is {} characters; the competitor's is {} (target 30-60).",
                    subject.title_len.unwrap_or(0),
                    competitor.title_len.unwrap_or(0)
                ),
                "Your competitor's headline in search results is a better length than yours.",
                "Rewrite your title to 30-60 characters.",
            ),
        );
    }

    match (subject.meta_len, competitor.meta_len) {
        (None, Some(_)) => card.penalize(
            META_MISSING_PENALTY,
            AuditIssue::new(
                "Competitor has a meta description and you don't",
                Severity::Medium,
                "The competitor page sets a meta description; yours does not.",
                "Your competitor controls the summary shown under their search listing, while yours is left to chance.",
                "Write a 120-160 character meta description for your page.",
            ),
        ),
        (Some(ours), Some(theirs)) if ratio(ours, theirs) < META_SHORT_RATIO => card.penalize(
            META_SHORT_PENALTY,
            AuditIssue::new(
                "Your meta description is much shorter than the competitor's",
                Severity::Low,
                format!("Your meta description is {ours} characters versus {theirs}."),
                "Your search-result summary says less than your competitor's.",
                "Expand your meta description toward 120-160 characters.",
            ),
        ),
        _ => {}
    }

    Ok(card.finish())
}

/// Subject-only checks used when no comparison is possible.
fn solo(mut card: Scorecard, subject: &PageFacts, reason: &str) -> ModuleResult {
    card.note(AuditIssue::new(
        "No competitor comparison available",
        Severity::Low,
        reason,
        "We couldn't compare your page with a competitor this time, so this section only reviews your own page.",
        "Provide a reachable competitor URL with your next audit for a side-by-side comparison.",
    ));

    if subject.words < SOLO_MIN_WORDS {
        card.penalize(
            SOLO_THIN_CONTENT_PENALTY,
            AuditIssue::new(
                "Page content is thin",
                Severity::Medium,
                format!("The page has {} words; competitive pages usually have at least {SOLO_MIN_WORDS}.", subject.words),
                "Your page has less text than typical competing pages.",
                "Add more useful content about your services.",
            ),
        );
    }
    if subject.title_len.is_none() {
        card.penalize(
            SOLO_MISSING_TITLE_PENALTY,
            AuditIssue::new(
                "Page has no title",
                Severity::Medium,
                "No <title> element was found.",
                "Competing pages almost always have a search headline; yours doesn't.",
                "Add a descriptive title of 30-60 characters.",
            ),
        );
    }
    if subject.meta_len.is_none() {
        card.penalize(
            SOLO_MISSING_META_PENALTY,
            AuditIssue::new(
                "Page has no meta description",
                Severity::Medium,
                "No meta description was found.",
                "Competing pages usually control their search summary; yours doesn't.",
                "Add a meta description of 120-160 characters.",
            ),
        );
    }
    card.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, snapshot, words};

    #[tokio::test]
    async fn no_competitor_url_runs_subject_only_checks() {
        let ctx = context(snapshot("<p>short page</p>"));
        let result = check(&ctx).await.unwrap();
        // thin -10, title -10, meta -10; informational issue is free
        assert_eq!(result.score, 70);
        assert_eq!(result.issues.len(), 4);
        assert_eq!(result.issues[0].title, "No competitor comparison available");
        assert_eq!(result.evidence.get("comparison_available"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn solo_mode_with_healthy_page_keeps_full_score() {
        let html = format!(
            r#"<title>Acme Plumbing Denver</title><meta name="description" content="Plumbers"><p>{}</p>"#,
            words(400)
        );
        let result = check(&context(snapshot(&html))).await.unwrap();
        assert_eq!(result.score, 100);
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn ratio_handles_empty_subject() {
        assert!(ratio(10, 0) > WORD_GAP_RATIO);
        assert!((ratio(3, 4) - 0.75).abs() < f64::EPSILON);
    }
}
