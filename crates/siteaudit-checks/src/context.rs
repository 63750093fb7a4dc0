//! Inputs shared by every check module for one audit run.

use std::sync::Arc;
use std::time::Duration;

use siteaudit_core::AppConfig;
use siteaudit_fetcher::{SiteFetcher, SiteSnapshot};

/// Heuristics for the local-business check and the schema site-type
/// override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSignalSettings {
    /// Maximum gap (in characters of normalized page text) between a street
    /// line and its city/state/ZIP fragment for the pair to count as one
    /// address.
    pub address_proximity_chars: usize,
    pub missing_address_penalty: u32,
    pub partial_address_penalty: u32,
    pub missing_phone_penalty: u32,
    /// Treat an otherwise unclassified site as a local business when the page
    /// shows a three-digit run and a company suffix (`LLC`, `Inc`, ...).
    pub entity_suffix_override: bool,
}

impl Default for LocalSignalSettings {
    fn default() -> Self {
        Self {
            address_proximity_chars: 100,
            missing_address_penalty: 25,
            partial_address_penalty: 10,
            missing_phone_penalty: 20,
            entity_suffix_override: true,
        }
    }
}

/// Deadlines and thresholds for the check modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSettings {
    pub robots_timeout: Duration,
    pub link_check_timeout: Duration,
    pub link_sample_size: usize,
    pub competitor_timeout: Duration,
    pub local: LocalSignalSettings,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            robots_timeout: Duration::from_secs(5),
            link_check_timeout: Duration::from_secs(3),
            link_sample_size: 5,
            competitor_timeout: Duration::from_secs(10),
            local: LocalSignalSettings::default(),
        }
    }
}

impl CheckSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            robots_timeout: Duration::from_secs(config.robots_timeout_secs),
            link_check_timeout: Duration::from_secs(config.link_check_timeout_secs),
            link_sample_size: config.link_sample_size,
            competitor_timeout: Duration::from_secs(config.competitor_timeout_secs),
            local: LocalSignalSettings {
                address_proximity_chars: config.local_address_proximity_chars,
                missing_address_penalty: config.local_missing_address_penalty,
                partial_address_penalty: config.local_partial_address_penalty,
                missing_phone_penalty: config.local_missing_phone_penalty,
                entity_suffix_override: config.local_entity_suffix_override,
            },
        }
    }
}

/// Everything a module may read. Cheap to clone: each spawned module task
/// gets its own handle to the same snapshot.
#[derive(Clone)]
pub struct CheckContext {
    pub snapshot: Arc<SiteSnapshot>,
    pub competitor_url: Option<String>,
    pub fetcher: Arc<SiteFetcher>,
    pub settings: Arc<CheckSettings>,
}

impl CheckContext {
    #[must_use]
    pub fn new(
        snapshot: Arc<SiteSnapshot>,
        fetcher: Arc<SiteFetcher>,
        settings: Arc<CheckSettings>,
    ) -> Self {
        Self {
            snapshot,
            competitor_url: None,
            fetcher,
            settings,
        }
    }

    /// Sets the competitor URL; blank values are ignored.
    #[must_use]
    pub fn with_competitor(mut self, competitor_url: Option<String>) -> Self {
        self.competitor_url = competitor_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        self
    }
}
