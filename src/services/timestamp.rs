//! Absolute timestamp normalization.
//!
//! The site renders timestamps like `zondag 6 april 2025 14:55:01`. Names are
//! resolved through an explicit [`CalendarNames`] table instead of the
//! process locale.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;

use crate::models::LocaleConfig;

static LABEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\p{L}+)\s+(\d{1,2})\s+(\p{L}+)\s+(\d{4})\s+(\d{1,2}):(\d{2}):(\d{2})$")
        .expect("timestamp pattern is valid")
});

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Lookup table from lowercase names to calendar values.
#[derive(Debug, Clone)]
pub struct CalendarNames {
    weekdays: HashMap<String, Weekday>,
    months: HashMap<String, u32>,
}

impl CalendarNames {
    /// Build from names in calendar order (Monday first, January first).
    pub fn new<S: AsRef<str>>(weekdays: &[S], months: &[S]) -> Self {
        Self {
            weekdays: weekdays
                .iter()
                .zip(WEEKDAYS)
                .map(|(name, day)| (name.as_ref().to_lowercase(), day))
                .collect(),
            months: months
                .iter()
                .zip(1..=12)
                .map(|(name, month)| (name.as_ref().to_lowercase(), month))
                .collect(),
        }
    }

    /// Dutch names as used by the site.
    pub fn dutch() -> Self {
        Self::from(&LocaleConfig::default())
    }

    pub fn weekday(&self, name: &str) -> Option<Weekday> {
        self.weekdays.get(&name.to_lowercase()).copied()
    }

    pub fn month(&self, name: &str) -> Option<u32> {
        self.months.get(&name.to_lowercase()).copied()
    }
}

impl From<&LocaleConfig> for CalendarNames {
    fn from(locale: &LocaleConfig) -> Self {
        Self::new(locale.weekdays.as_slice(), locale.months.as_slice())
    }
}

impl Default for CalendarNames {
    fn default() -> Self {
        Self::dutch()
    }
}

/// Parses absolute timestamp labels into naive wall-clock instants.
#[derive(Debug, Clone, Default)]
pub struct TimestampNormalizer {
    names: CalendarNames,
}

impl TimestampNormalizer {
    pub fn new(names: CalendarNames) -> Self {
        Self { names }
    }

    /// Parse a label, degrading to `None` on anything unexpected.
    ///
    /// The weekday must be a known name but is not checked against the date.
    pub fn normalize(&self, label: Option<&str>) -> Option<NaiveDateTime> {
        let label = label.map(str::trim).filter(|l| !l.is_empty())?;
        let parsed = self.parse(label);
        if parsed.is_none() {
            log::warn!("Failed to parse timestamp label '{}'", label);
        }
        parsed
    }

    fn parse(&self, label: &str) -> Option<NaiveDateTime> {
        let caps = LABEL_PATTERN.captures(label)?;
        self.names.weekday(&caps[1])?;

        let day: u32 = caps[2].parse().ok()?;
        let month = self.names.month(&caps[3])?;
        let year: i32 = caps[4].parse().ok()?;
        let hour: u32 = caps[5].parse().ok()?;
        let minute: u32 = caps[6].parse().ok()?;
        let second: u32 = caps[7].parse().ok()?;

        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_opt(hour, minute, second)?;
        Some(NaiveDateTime::new(date, time))
    }
}
