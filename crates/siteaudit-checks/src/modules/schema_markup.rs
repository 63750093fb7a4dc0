//! Structured-data coverage judged against the kind of site being audited.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::SiteSnapshot;

use crate::context::LocalSignalSettings;
use crate::jsonld::{JsonLd, LOCAL_BUSINESS_TYPES};
use crate::scorecard::Scorecard;

const NO_JSONLD_PENALTY: i32 = 30;
const INVALID_BLOCK_PENALTY: i32 = 10;
const MISSING_REQUIRED_PENALTY: i32 = 15;
const NO_SITE_STRUCTURE_PENALTY: i32 = 5;

/// Pages this long with article markers read as a publisher rather than a
/// blog.
const PUBLISHER_MIN_WORDS: usize = 1_500;

static THREE_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}\b").expect("valid regex"));
static ENTITY_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:LLC|L\.L\.C\.|Inc\.?|Ltd\.?|Co\.)(?:\s|$|[,)])").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteType {
    Publisher,
    Blog,
    LocalBusiness,
    Ecommerce,
    Saas,
    Enterprise,
    Unknown,
}

impl SiteType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SiteType::Publisher => "publisher",
            SiteType::Blog => "blog",
            SiteType::LocalBusiness => "local_business",
            SiteType::Ecommerce => "ecommerce",
            SiteType::Saas => "saas",
            SiteType::Enterprise => "enterprise",
            SiteType::Unknown => "unknown",
        }
    }

    /// Schema groups a site of this type should publish. Each inner slice is
    /// a set of interchangeable `@type`s; one of them satisfies the group.
    fn required(self) -> Vec<(&'static str, Vec<&'static str>)> {
        let organization = {
            let mut types = vec!["Organization", "Corporation"];
            types.extend_from_slice(LOCAL_BUSINESS_TYPES);
            types
        };
        match self {
            SiteType::Publisher => vec![
                ("NewsArticle", vec!["NewsArticle", "Article", "ReportageNewsArticle"]),
                ("Organization", vec!["NewsMediaOrganization", "Organization"]),
            ],
            SiteType::Blog => vec![
                ("BlogPosting", vec!["BlogPosting", "Article", "Blog"]),
                ("Person", vec!["Person", "Organization"]),
            ],
            SiteType::LocalBusiness => vec![("LocalBusiness", LOCAL_BUSINESS_TYPES.to_vec())],
            SiteType::Ecommerce => vec![
                ("Product", vec!["Product", "ProductGroup", "Offer"]),
                ("Organization", organization),
            ],
            SiteType::Saas => vec![
                ("SoftwareApplication", vec!["SoftwareApplication", "WebApplication", "Product"]),
                ("Organization", organization),
            ],
            SiteType::Enterprise | SiteType::Unknown => vec![("Organization", organization)],
        }
    }
}

const DOMAIN_HINTS: &[(&str, SiteType)] = &[
    ("nytimes.com", SiteType::Publisher),
    ("washingtonpost.com", SiteType::Publisher),
    ("theguardian.com", SiteType::Publisher),
    ("bbc.co.uk", SiteType::Publisher),
    ("bbc.com", SiteType::Publisher),
    ("cnn.com", SiteType::Publisher),
    ("reuters.com", SiteType::Publisher),
    ("bloomberg.com", SiteType::Publisher),
    ("forbes.com", SiteType::Publisher),
    ("medium.com", SiteType::Blog),
    ("substack.com", SiteType::Blog),
    ("wordpress.com", SiteType::Blog),
    ("blogspot.com", SiteType::Blog),
    ("ghost.io", SiteType::Blog),
    ("amazon.com", SiteType::Ecommerce),
    ("ebay.com", SiteType::Ecommerce),
    ("etsy.com", SiteType::Ecommerce),
    ("walmart.com", SiteType::Ecommerce),
    ("myshopify.com", SiteType::Ecommerce),
    ("slack.com", SiteType::Saas),
    ("notion.so", SiteType::Saas),
    ("atlassian.com", SiteType::Saas),
    ("hubspot.com", SiteType::Saas),
    ("salesforce.com", SiteType::Saas),
    ("zoom.us", SiteType::Saas),
    ("microsoft.com", SiteType::Enterprise),
    ("apple.com", SiteType::Enterprise),
    ("ibm.com", SiteType::Enterprise),
    ("oracle.com", SiteType::Enterprise),
    ("sap.com", SiteType::Enterprise),
];

const SCHEMA_HINTS: &[(&[&str], SiteType)] = &[
    (&["NewsArticle", "NewsMediaOrganization", "ReportageNewsArticle"], SiteType::Publisher),
    (&["BlogPosting", "Blog"], SiteType::Blog),
    (&["Product", "ProductGroup", "Offer", "AggregateOffer"], SiteType::Ecommerce),
    (&["SoftwareApplication", "WebApplication"], SiteType::Saas),
    (LOCAL_BUSINESS_TYPES, SiteType::LocalBusiness),
    (&["Corporation"], SiteType::Enterprise),
];

const CONTENT_HINTS: &[(&[&str], SiteType)] = &[
    (&["add to cart", "shopping cart", "free shipping", "checkout"], SiteType::Ecommerce),
    (&["free trial", "start for free", "request a demo", "book a demo"], SiteType::Saas),
    (&["breaking news", "latest news", "newsletter sign"], SiteType::Publisher),
    (&["posted on", "leave a comment", "read more", "recent posts"], SiteType::Blog),
    (&["investor relations", "fortune 500", "global offices"], SiteType::Enterprise),
    (&["call us today", "free estimate", "serving the", "licensed and insured"], SiteType::LocalBusiness),
];

/// Classifies the site and returns the winning signal for evidence.
pub(crate) fn detect_site_type(
    snapshot: &SiteSnapshot,
    schema: &JsonLd,
    settings: &LocalSignalSettings,
) -> (SiteType, &'static str) {
    if let Some(host) = snapshot.host() {
        let matched = DOMAIN_HINTS.iter().find(|(domain, _)| {
            host == *domain || host.ends_with(&format!(".{domain}"))
        });
        if let Some((_, site_type)) = matched {
            return (*site_type, "domain");
        }
    }

    if let Some((_, site_type)) = SCHEMA_HINTS
        .iter()
        .find(|(types, _)| schema.has_type(types))
    {
        return (*site_type, "schema");
    }

    let text = snapshot.document.text().to_lowercase();
    if let Some((_, site_type)) = CONTENT_HINTS
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|p| text.contains(p)))
    {
        // Long-form article pages read as publishers even with blog chrome.
        if *site_type == SiteType::Blog && snapshot.document.word_count() >= PUBLISHER_MIN_WORDS {
            return (SiteType::Publisher, "content");
        }
        return (*site_type, "content");
    }

    let raw_text = snapshot.document.text();
    if settings.entity_suffix_override
        && THREE_DIGITS_RE.is_match(raw_text)
        && ENTITY_SUFFIX_RE.is_match(raw_text)
    {
        return (SiteType::LocalBusiness, "entity_suffix");
    }

    (SiteType::Unknown, "none")
}

#[must_use]
pub fn check(snapshot: &SiteSnapshot, settings: &LocalSignalSettings) -> ModuleResult {
    let schema = JsonLd::collect(&snapshot.document);
    let (site_type, signal) = detect_site_type(snapshot, &schema, settings);
    let mut card = Scorecard::new(ModuleKey::SchemaMarkup);

    let types = schema.types();
    card.evidence("site_type", site_type.as_str());
    card.evidence("site_type_signal", signal);
    card.evidence("jsonld_blocks", schema.blocks);
    card.evidence("schema_types", json!(types));

    if schema.blocks == 0 {
        card.penalize(
            NO_JSONLD_PENALTY,
            AuditIssue::new(
                "No structured data",
                Severity::High,
                "The page has no <script type=\"application/ld+json\"> blocks.",
                "Your page doesn't include the behind-the-scenes code that lets Google show rich results like ratings, hours, or prices.",
                format!(
                    "Add JSON-LD for {} (at minimum {}).",
                    site_type.as_str().replace('_', " "),
                    site_type
                        .required()
                        .iter()
                        .map(|(name, _)| *name)
                        .collect::<Vec<_>>()
                        .join(" and ")
                ),
            ),
        );
        return card.finish();
    }

    if schema.invalid_blocks > 0 {
        card.penalize(
            INVALID_BLOCK_PENALTY,
            AuditIssue::new(
                "Structured data contains errors",
                Severity::Medium,
                format!("{} of {} JSON-LD blocks failed to parse as JSON.", schema.invalid_blocks, schema.blocks),
                "Some of your structured data is broken, so search engines ignore it.",
                "Validate the JSON-LD with Google's Rich Results Test and fix syntax errors such as trailing commas.",
            )
            .with_evidence(IssueEvidence {
                count: Some(json!(schema.invalid_blocks)),
                ..IssueEvidence::default()
            }),
        );
    }

    for (name, accepted) in site_type.required() {
        if schema.has_type(&accepted) {
            continue;
        }
        card.penalize(
            MISSING_REQUIRED_PENALTY,
            AuditIssue::new(
                format!("Missing {name} schema"),
                Severity::Medium,
                format!(
                    "No {name} node found; {} sites are expected to publish one.",
                    site_type.as_str().replace('_', " ")
                ),
                format!("Search engines look for {name} details on sites like yours, and your page doesn't provide them."),
                format!("Add a {name} JSON-LD block with its recommended properties."),
            )
            .with_evidence(IssueEvidence {
                expected: Some(json!(name)),
                found: Some(json!(types)),
                ..IssueEvidence::default()
            }),
        );
    }

    if !schema.has_type(&["WebSite", "BreadcrumbList"]) {
        card.penalize(
            NO_SITE_STRUCTURE_PENALTY,
            AuditIssue::new(
                "No WebSite or BreadcrumbList schema",
                Severity::Low,
                "Neither WebSite nor BreadcrumbList structured data is present.",
                "Google can't easily show your site name or page path in search results.",
                "Add WebSite JSON-LD on the home page and BreadcrumbList on inner pages.",
            ),
        );
    }

    card.finish()
}
