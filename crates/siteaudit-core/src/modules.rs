//! The fixed set of audit modules a customer can purchase.

use serde::{Deserialize, Serialize};

/// One purchasable audit check.
///
/// The serialized form (`"onpage_seo"`, `"local_seo"`, ...) is the key stored
/// on audit records by the checkout flow. [`ModuleKey::display_name`] is the
/// fixed lookup table used for report headings and completeness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKey {
    Performance,
    CrawlHealth,
    #[serde(rename = "onpage_seo")]
    OnPage,
    Mobile,
    #[serde(rename = "local_seo")]
    LocalBusiness,
    Accessibility,
    Security,
    SchemaMarkup,
    Social,
    Competitors,
}

impl ModuleKey {
    pub const ALL: [ModuleKey; 10] = [
        ModuleKey::Performance,
        ModuleKey::CrawlHealth,
        ModuleKey::OnPage,
        ModuleKey::Mobile,
        ModuleKey::LocalBusiness,
        ModuleKey::Accessibility,
        ModuleKey::Security,
        ModuleKey::SchemaMarkup,
        ModuleKey::Social,
        ModuleKey::Competitors,
    ];

    /// Stable storage key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKey::Performance => "performance",
            ModuleKey::CrawlHealth => "crawl_health",
            ModuleKey::OnPage => "onpage_seo",
            ModuleKey::Mobile => "mobile",
            ModuleKey::LocalBusiness => "local_seo",
            ModuleKey::Accessibility => "accessibility",
            ModuleKey::Security => "security",
            ModuleKey::SchemaMarkup => "schema_markup",
            ModuleKey::Social => "social",
            ModuleKey::Competitors => "competitors",
        }
    }

    /// Customer-facing heading for this module.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            ModuleKey::Performance => "Performance",
            ModuleKey::CrawlHealth => "Crawl Health",
            ModuleKey::OnPage => "On-Page SEO",
            ModuleKey::Mobile => "Mobile Optimization",
            ModuleKey::LocalBusiness => "Local SEO",
            ModuleKey::Accessibility => "Accessibility",
            ModuleKey::Security => "Security",
            ModuleKey::SchemaMarkup => "Schema Markup",
            ModuleKey::Social => "Social Media",
            ModuleKey::Competitors => "Competitor Overview",
        }
    }

    /// Parses a storage key. Unknown keys yield `None`.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|m| m.as_str() == key)
    }

    /// Resolves a free-form module heading (as written by a text generator)
    /// back to its key. Matching ignores case, spacing, and punctuation.
    #[must_use]
    pub fn from_display_name(name: &str) -> Option<Self> {
        let wanted = normalize_name(name);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|m| normalize_name(m.display_name()) == wanted || normalize_name(m.as_str()) == wanted)
    }
}

impl std::fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_round_trip_through_parse() {
        for key in ModuleKey::ALL {
            assert_eq!(ModuleKey::parse(key.as_str()), Some(key));
        }
    }

    #[test]
    fn serde_uses_storage_keys() {
        let json = serde_json::to_string(&ModuleKey::OnPage).unwrap();
        assert_eq!(json, "\"onpage_seo\"");
        let parsed: ModuleKey = serde_json::from_str("\"local_seo\"").unwrap();
        assert_eq!(parsed, ModuleKey::LocalBusiness);
    }

    #[test]
    fn display_names_are_unique() {
        let mut names: Vec<&str> = ModuleKey::ALL.iter().map(|m| m.display_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ModuleKey::ALL.len());
    }

    #[test]
    fn from_display_name_is_lenient() {
        assert_eq!(
            ModuleKey::from_display_name("mobile optimization"),
            Some(ModuleKey::Mobile)
        );
        assert_eq!(
            ModuleKey::from_display_name("On Page SEO"),
            Some(ModuleKey::OnPage)
        );
        assert_eq!(
            ModuleKey::from_display_name("crawl_health"),
            Some(ModuleKey::CrawlHealth)
        );
        assert_eq!(ModuleKey::from_display_name("Weather"), None);
        assert_eq!(ModuleKey::from_display_name("  "), None);
    }

    #[test]
    fn parse_rejects_unknown_keys() {
        assert_eq!(ModuleKey::parse("seo_magic"), None);
        assert_eq!(ModuleKey::parse(" Mobile "), Some(ModuleKey::Mobile));
    }
}
