//! Local-business signals: address, phone, schema, map and opening hours.
//!
//! Address detection is layered. A strict street-line pattern is an
//! address on its own; a `City, ST 12345` fragment within the configured
//! window of normalized text after it is recorded as supporting evidence.
//! A city/state/ZIP fragment with no street line is a partial address. A
//! `LocalBusiness` JSON-LD node with a `streetAddress` always counts as
//! full.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Value};
use siteaudit_core::{AuditIssue, IssueEvidence, ModuleKey, ModuleResult, Severity};
use siteaudit_fetcher::SiteSnapshot;

use crate::context::LocalSignalSettings;
use crate::jsonld::{JsonLd, LOCAL_BUSINESS_TYPES};
use crate::scorecard::Scorecard;

const NO_SCHEMA_PENALTY: i32 = 10;
const NO_MAP_PENALTY: i32 = 5;
const NO_HOURS_PENALTY: i32 = 5;

static STREET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,6}\s+(?:[NSEW]\.?\s+)?(?:[A-Za-z0-9.'-]+\s+){0,4}(?:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|way|court|ct|place|pl|parkway|pkwy|highway|hwy|circle|cir|terrace|ter|trail|trl|square|sq)\b\.?",
    )
    .expect("valid regex")
});
static CITY_STATE_ZIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z.' -]{1,40},\s*[A-Z]{2}\.?\s+\d{5}(?:-\d{4})?\b").expect("valid regex")
});
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?1[\s.-]?)?(?:\(\d{3}\)|\b\d{3})[\s.-]?\d{3}[\s.-]\d{4}\b").expect("valid regex")
});
static DAY_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)(?:day|nesday|sday|urday)?\.?\s*(?:-|–|to|through|thru)\s*(?:mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)",
    )
    .expect("valid regex")
});
static TIME_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?::\d{2})?\s*(?:am|pm|a\.m\.|p\.m\.)\s*(?:-|–|to)\s*\d{1,2}(?::\d{2})?\s*(?:am|pm|a\.m\.|p\.m\.)")
        .expect("valid regex")
});

const MAP_HOSTS: &[&str] = &[
    "google.com/maps",
    "maps.google.",
    "maps.googleapis.com",
    "openstreetmap.org",
    "bing.com/maps",
    "api.mapbox.com",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressSignal {
    Full,
    Partial,
    Missing,
}

/// Classifies the address signal in normalized page text.
pub(crate) fn address_signal(text: &str) -> AddressSignal {
    if STREET_RE.is_match(text) {
        AddressSignal::Full
    } else if CITY_STATE_ZIP_RE.is_match(text) {
        AddressSignal::Partial
    } else {
        AddressSignal::Missing
    }
}

/// Whether some street line is followed by a city/state/ZIP fragment within
/// `proximity_chars` characters.
pub(crate) fn street_has_locality(text: &str, proximity_chars: usize) -> bool {
    let zips: Vec<_> = CITY_STATE_ZIP_RE.find_iter(text).collect();
    STREET_RE.find_iter(text).any(|street| {
        zips.iter().any(|zip| {
            zip.start() >= street.end()
                && text[street.end()..zip.start()].chars().count() <= proximity_chars
        })
    })
}

pub(crate) fn phone_numbers(snapshot: &SiteSnapshot) -> Vec<String> {
    let mut phones: Vec<String> = PHONE_RE
        .find_iter(snapshot.document.text())
        .map(|m| m.as_str().trim().to_string())
        .collect();
    phones.extend(
        snapshot
            .document
            .anchors()
            .iter()
            .filter_map(|a| a.attr("href"))
            .filter_map(|href| {
                let href = href.trim();
                href.get(..4)
                    .filter(|scheme| scheme.eq_ignore_ascii_case("tel:"))
                    .map(|_| href[4..].trim().to_string())
            })
            .filter(|number| !number.is_empty()),
    );
    phones.dedup();
    phones
}

fn schema_street_address(item: &Value) -> Option<&str> {
    let address = item.get("address")?;
    let street = match address {
        Value::Array(list) => list.iter().find_map(|a| a.get("streetAddress")),
        other => other.get("streetAddress"),
    }?;
    street.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn has_hours(snapshot: &SiteSnapshot, schema: &JsonLd) -> bool {
    let in_schema = schema.items.iter().any(|item| {
        item.get("openingHours").is_some() || item.get("openingHoursSpecification").is_some()
    });
    let text = snapshot.document.text();
    in_schema
        || DAY_RANGE_RE.is_match(text)
        || TIME_RANGE_RE.is_match(text)
        || text.to_ascii_lowercase().contains("open 24 hours")
}

fn penalty(configured: u32) -> i32 {
    i32::try_from(configured).unwrap_or(i32::MAX)
}

#[must_use]
pub fn check(snapshot: &SiteSnapshot, settings: &LocalSignalSettings) -> ModuleResult {
    let doc = &snapshot.document;
    let schema = JsonLd::collect(doc);
    let mut card = Scorecard::new(ModuleKey::LocalBusiness);

    let businesses: Vec<&Value> = schema.items_of(LOCAL_BUSINESS_TYPES).collect();
    let schema_street = businesses.iter().find_map(|b| schema_street_address(b));

    let address = if schema_street.is_some() {
        AddressSignal::Full
    } else {
        address_signal(doc.text())
    };
    card.evidence(
        "address",
        match address {
            AddressSignal::Full => "full",
            AddressSignal::Partial => "partial",
            AddressSignal::Missing => "missing",
        },
    );
    if let Some(street) = schema_street {
        card.evidence("schema_street_address", street);
    } else if address == AddressSignal::Full {
        card.evidence(
            "address_locality_nearby",
            street_has_locality(doc.text(), settings.address_proximity_chars),
        );
    }

    match address {
        AddressSignal::Full => {}
        AddressSignal::Partial => card.penalize(
            penalty(settings.partial_address_penalty),
            AuditIssue::new(
                "Incomplete business address",
                Severity::Medium,
                "A city/state/ZIP fragment was found but no street line near it.",
                "Your page mentions your city but not your full street address, so customers and Google can't pin down where you are.",
                "Show your full street address, city, state, and ZIP together, ideally in the footer of every page.",
            ),
        ),
        AddressSignal::Missing => card.penalize(
            penalty(settings.missing_address_penalty),
            AuditIssue::new(
                "No business address found",
                Severity::High,
                "Neither the page text nor LocalBusiness structured data contains a postal address.",
                "Customers searching nearby can't see where you are, and Google has a harder time showing you in local results.",
                "Add your full business address (matching your Google Business Profile exactly) to the page.",
            ),
        ),
    }

    let mut phones = phone_numbers(snapshot);
    phones.extend(
        businesses
            .iter()
            .filter_map(|b| b.get("telephone").and_then(Value::as_str))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
    );
    card.evidence("phone_numbers", json!(phones.iter().take(5).collect::<Vec<_>>()));
    if phones.is_empty() {
        card.penalize(
            penalty(settings.missing_phone_penalty),
            AuditIssue::new(
                "No phone number found",
                Severity::High,
                "No phone number pattern or tel: link was found on the page.",
                "Visitors ready to call you can't find a number, and a click-to-call link is one of the top actions on mobile.",
                "Display your phone number prominently and wrap it in a tel: link.",
            ),
        );
    }

    card.evidence("local_business_schema", !businesses.is_empty());
    if businesses.is_empty() {
        card.penalize(
            NO_SCHEMA_PENALTY,
            AuditIssue::new(
                "Missing LocalBusiness structured data",
                Severity::Medium,
                "No JSON-LD node of type LocalBusiness (or a subtype) was found.",
                "Google reads special behind-the-scenes code to confirm your business details, and your page doesn't include it.",
                "Add LocalBusiness JSON-LD with your name, address, phone, hours, and geo coordinates.",
            )
            .with_evidence(IssueEvidence {
                found: Some(json!(schema.types())),
                ..IssueEvidence::default()
            }),
        );
    }

    let has_map = doc.iframes().any(|frame| {
        frame
            .attr("src")
            .or_else(|| frame.attr("data-src"))
            .is_some_and(|src| {
                let src = src.to_ascii_lowercase();
                MAP_HOSTS.iter().any(|host| src.contains(host))
            })
    });
    card.evidence("map_embed", has_map);
    if !has_map {
        card.penalize(
            NO_MAP_PENALTY,
            AuditIssue::new(
                "No embedded map",
                Severity::Low,
                "No map iframe (Google Maps, OpenStreetMap, Bing, Mapbox) was found.",
                "A map helps visitors see at a glance where you are and how to get there.",
                "Embed a Google Map of your location on the contact or home page.",
            ),
        );
    }

    let hours = has_hours(snapshot, &schema);
    card.evidence("opening_hours", hours);
    if !hours {
        card.penalize(
            NO_HOURS_PENALTY,
            AuditIssue::new(
                "Opening hours not shown",
                Severity::Low,
                "No opening-hours text or openingHours structured data was found.",
                "Visitors can't tell when you're open, which can send them to a competitor.",
                "List your opening hours on the page and in your LocalBusiness structured data.",
            ),
        );
    }

    card.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::snapshot;

    const FULL_PAGE: &str = r#"<footer><p>Acme Plumbing, 1234 Main Street, Denver, CO 80202</p>
        <p>Call <a href="tel:+13035550100">(303) 555-0100</a></p>
        <p>Open Mon - Fri 8am - 5pm</p>
        <iframe src="https://www.google.com/maps/embed?pb=abc"></iframe></footer>
        <script type="application/ld+json">{"@type":"Plumber","name":"Acme"}</script>"#;

    #[test]
    fn complete_local_page_scores_100() {
        let result = check(&snapshot(FULL_PAGE), &LocalSignalSettings::default());
        assert_eq!(result.score, 100, "issues: {:?}", result.issues);
        assert_eq!(result.evidence.get("address"), Some(&json!("full")));
    }

    #[test]
    fn address_signal_layers() {
        let text = "Visit 1234 Main Street in beautiful downtown, Denver, CO 80202 today";
        assert_eq!(address_signal(text), AddressSignal::Full);
        assert_eq!(address_signal("Serving Denver, CO 80202"), AddressSignal::Partial);
        assert_eq!(address_signal("We serve the whole front range"), AddressSignal::Missing);
    }

    #[test]
    fn locality_must_sit_within_the_proximity_window() {
        let text = "Visit 1234 Main Street in beautiful downtown, Denver, CO 80202 today";
        assert!(street_has_locality(text, 100));
        assert!(!street_has_locality(text, 10));
        assert!(!street_has_locality("1450 Larimer Street, downtown", 100));
    }

    #[test]
    fn street_line_without_zip_is_an_address() {
        let html = "<p>Visit our shop at 1450 Larimer Street in downtown Denver. Call (303) 555-0100.</p>";
        let result = check(&snapshot(html), &LocalSignalSettings::default());
        assert_eq!(result.evidence.get("address"), Some(&json!("full")));
        assert_eq!(result.evidence.get("address_locality_nearby"), Some(&json!(false)));
        assert!(result.issues.iter().all(|i| !i.title.contains("address")));
        // schema -10, map -5, hours -5
        assert_eq!(result.score, 80);
    }

    #[test]
    fn schema_street_address_counts_as_full() {
        let html = r#"<script type="application/ld+json">{"@type":"LocalBusiness","address":{"streetAddress":"1 Elm St"},"telephone":"303-555-0100","openingHours":"Mo-Fr 08:00-17:00"}</script>
            <iframe src="https://maps.google.com/?q=acme"></iframe>"#;
        let result = check(&snapshot(html), &LocalSignalSettings::default());
        assert_eq!(result.score, 100, "issues: {:?}", result.issues);
    }

    #[test]
    fn bare_page_loses_configured_penalties() {
        let result = check(&snapshot("<p>Hello</p>"), &LocalSignalSettings::default());
        // address -25, phone -20, schema -10, map -5, hours -5
        assert_eq!(result.score, 35);

        let lenient = LocalSignalSettings {
            missing_address_penalty: 5,
            missing_phone_penalty: 5,
            ..LocalSignalSettings::default()
        };
        assert_eq!(check(&snapshot("<p>Hello</p>"), &lenient).score, 70);
    }

    #[test]
    fn partial_address_is_medium() {
        let html = FULL_PAGE.replace("1234 Main Street, ", "");
        let result = check(&snapshot(&html), &LocalSignalSettings::default());
        assert_eq!(result.score, 90);
        assert_eq!(result.issues[0].severity, Severity::Medium);
    }

    #[test]
    fn phone_detection_covers_text_and_tel_links() {
        let snap = snapshot(r#"<p>Call 303.555.0100</p><a href="tel:7205550199">Text us</a>"#);
        assert_eq!(phone_numbers(&snap), vec!["303.555.0100", "7205550199"]);
    }
}
