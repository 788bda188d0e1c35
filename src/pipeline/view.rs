//! Filtered subscriber view.
//!
//! Keeps showing the last record that passed the region's service filters
//! while newer records are filtered out.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use crate::models::{DisplayConfig, FilterConfig, IncidentRecord, RegionSnapshot};

/// Presentation state derived from coordinator snapshots.
#[derive(Debug, Clone)]
pub struct FilteredView {
    filters: FilterConfig,
    display: DisplayConfig,
    current: Option<IncidentRecord>,
    last_match: Option<IncidentRecord>,
    matches_filter: bool,
    last_update_attempt: Option<DateTime<Utc>>,
}

impl FilteredView {
    pub fn new(filters: FilterConfig, display: DisplayConfig) -> Self {
        Self {
            filters,
            display,
            current: None,
            last_match: None,
            matches_filter: true,
            last_update_attempt: None,
        }
    }

    /// Whether a record passes the filters. No record always matches.
    pub fn matches(&self, record: Option<&IncidentRecord>) -> bool {
        record.is_none_or(|r| self.filters.allows(r.service_type))
    }

    /// Take in the coordinator's current record.
    pub fn update(&mut self, record: Option<&IncidentRecord>) {
        self.matches_filter = self.matches(record);
        self.current = record.cloned();
        if self.matches_filter {
            self.last_match = self.current.clone();
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: &RegionSnapshot) {
        self.update(snapshot.record.as_ref());
        self.last_update_attempt = snapshot.last_update_attempt;
    }

    /// Whether the most recent record matched.
    pub fn matches_filter(&self) -> bool {
        self.matches_filter
    }

    /// The record to present: the current one if it matches, else the last match.
    pub fn displayed(&self) -> Option<&IncidentRecord> {
        if self.matches_filter {
            self.current.as_ref()
        } else {
            self.last_match.as_ref()
        }
    }

    /// Primary state value: the displayed priority code.
    pub fn state(&self) -> Option<&str> {
        self.displayed()?.priority_code.as_deref()
    }

    pub fn icon(&self) -> &'static str {
        self.displayed()
            .map(|r| r.service_type.icon())
            .unwrap_or("mdi:alert-circle-outline")
    }

    /// Enabled display fields of the displayed record.
    ///
    /// The priority code is the state itself and never repeated here.
    /// `matches_filter` and `last_update_attempt` are always present.
    pub fn attributes(&self) -> Option<Map<String, Value>> {
        let record = self.displayed()?;
        let d = &self.display;
        let mut attrs = Map::new();

        let fields: [(bool, &str, Value); 10] = [
            (d.message, "message", json!(record.message)),
            (
                d.time,
                "time",
                json!(record.time.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())),
            ),
            (d.city, "city", json!(record.city)),
            (d.address, "address", json!(record.address)),
            (d.postal_code, "postalcode", json!(record.postal_code)),
            (d.latitude, "latitude", json!(record.latitude)),
            (d.longitude, "longitude", json!(record.longitude)),
            (d.service_type, "service_type", json!(record.service_type)),
            (d.raw_time_str, "raw_time_str", json!(record.raw_time_label)),
            (
                d.absolute_time_str,
                "absolute_time_str",
                json!(record.absolute_time_label),
            ),
        ];
        for (enabled, key, value) in fields {
            if enabled {
                attrs.insert(key.to_string(), value);
            }
        }
        attrs.insert("matches_filter".to_string(), json!(self.matches_filter));
        attrs.insert(
            "last_update_attempt".to_string(),
            json!(self.last_update_attempt.map(|t| t.to_rfc3339())),
        );
        Some(attrs)
    }
}
