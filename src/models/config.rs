//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{IncidentSelectors, ServiceType};
use crate::utils::{is_plain_region_path, normalize_region_path};

/// Smallest poll interval a region may use.
pub const MIN_SCAN_INTERVAL_SECS: u64 = 30;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP settings for the fetch client
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Selector overrides for the record extractor
    #[serde(default)]
    pub selectors: IncidentSelectors,

    /// Weekday and month names used in absolute timestamps
    #[serde(default)]
    pub locale: LocaleConfig,

    /// Monitored regions
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent", "empty"));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::validation("scraper.timeout_secs", "must_be_positive"));
        }
        url::Url::parse(&self.scraper.base_url)?;

        for (key, css) in self.selectors.css_entries() {
            scraper::Selector::parse(css)
                .map_err(|e| AppError::selector(format!("selectors.{key} = {css}"), format!("{e:?}")))?;
        }

        self.locale.validate()?;

        let mut seen = HashSet::new();
        for region in &self.regions {
            region.validate()?;
            let key = normalize_region_path(&region.region_path);
            if !seen.insert(key.clone()) {
                return Err(AppError::validation(
                    format!("regions.{key}"),
                    "already_configured",
                ));
            }
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Site root that region paths are appended to
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header identifying this client
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Weekday and month names, in calendar order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Monday first
    #[serde(default = "defaults::weekdays")]
    pub weekdays: Vec<String>,

    /// January first
    #[serde(default = "defaults::months")]
    pub months: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            weekdays: defaults::weekdays(),
            months: defaults::months(),
        }
    }
}

impl LocaleConfig {
    fn validate(&self) -> Result<()> {
        if self.weekdays.len() != 7 {
            return Err(AppError::validation("locale.weekdays", "expected_7_names"));
        }
        if self.months.len() != 12 {
            return Err(AppError::validation("locale.months", "expected_12_names"));
        }
        Ok(())
    }
}

/// One monitored region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Human-readable name of this instance
    pub instance_name: String,

    /// Path segment selecting the regional feed, e.g. "amsterdam-amstelland"
    pub region_path: String,

    /// Seconds between polls
    #[serde(default = "defaults::scan_interval")]
    pub scan_interval_secs: u64,

    /// Service types that count as a filter match
    #[serde(default)]
    pub filters: FilterConfig,

    /// Fields exposed as presentation attributes
    #[serde(default)]
    pub display: DisplayConfig,
}

impl RegionConfig {
    /// Create a region with default interval, filters and display flags.
    pub fn new(instance_name: impl Into<String>, region_path: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            region_path: region_path.into(),
            scan_interval_secs: defaults::scan_interval(),
            filters: FilterConfig::default(),
            display: DisplayConfig::default(),
        }
    }

    /// Region path without surrounding slashes; the monitor keys on this.
    pub fn key(&self) -> String {
        normalize_region_path(&self.region_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.instance_name.trim().is_empty() {
            return Err(AppError::validation("instance_name", "empty"));
        }
        if self.key().is_empty() {
            return Err(AppError::validation("region_path", "empty"));
        }
        if !is_plain_region_path(&self.region_path) {
            return Err(AppError::validation("region_path", "invalid_region_path"));
        }
        if self.scan_interval_secs < MIN_SCAN_INTERVAL_SECS {
            return Err(AppError::validation(
                "scan_interval_secs",
                "interval_too_short",
            ));
        }
        Ok(())
    }
}

/// Per-service inclusion flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub ambulance: bool,
    pub fire: bool,
    pub police: bool,
    /// Everything else: trauma helicopter, water rescue, unclassified
    pub other: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ambulance: true,
            fire: true,
            police: true,
            other: true,
        }
    }
}

impl FilterConfig {
    /// Whether a record of this service type passes the filter.
    pub fn allows(&self, service_type: ServiceType) -> bool {
        match service_type {
            ServiceType::Ambulance => self.ambulance,
            ServiceType::FireDepartment => self.fire,
            ServiceType::Police => self.police,
            _ => self.other,
        }
    }
}

/// Display flags for the scraped fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub priority_code: bool,
    pub message: bool,
    pub time: bool,
    pub city: bool,
    pub address: bool,
    pub postal_code: bool,
    pub latitude: bool,
    pub longitude: bool,
    pub service_type: bool,
    pub raw_time_str: bool,
    pub absolute_time_str: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            priority_code: true,
            message: true,
            time: true,
            city: true,
            address: true,
            postal_code: false,
            latitude: true,
            longitude: true,
            service_type: true,
            raw_time_str: false,
            absolute_time_str: false,
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "https://www.alarmfase1.nl/".into()
    }
    pub fn user_agent() -> String {
        "p2000-monitor/0.1 (+alarmfase1.nl scraper)".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn log_level() -> String {
        "info".into()
    }
    pub fn scan_interval() -> u64 {
        120
    }

    pub fn weekdays() -> Vec<String> {
        [
            "maandag", "dinsdag", "woensdag", "donderdag", "vrijdag", "zaterdag", "zondag",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    pub fn months() -> Vec<String> {
        [
            "januari",
            "februari",
            "maart",
            "april",
            "mei",
            "juni",
            "juli",
            "augustus",
            "september",
            "oktober",
            "november",
            "december",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}
