//! Diagnostics dump for a monitored region.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{IncidentRecord, RegionConfig, RegionSnapshot, Transition};

/// Serializable report of a region's configuration and coordinator state.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub config_entry: RegionConfig,
    pub coordinator_data: CoordinatorData,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorData {
    pub region_path: String,
    /// Whether the latest poll avoided a hard failure
    pub last_update_success: bool,
    pub last_update_error: bool,
    pub last_update_timestamp: Option<DateTime<Utc>>,
    pub update_interval: u64,
    pub consecutive_errors: u32,
    pub last_transition: Transition,
    pub data: Option<IncidentRecord>,
}

impl Diagnostics {
    pub fn new(region: &RegionConfig, snapshot: &RegionSnapshot) -> Self {
        Self {
            config_entry: region.clone(),
            coordinator_data: CoordinatorData {
                region_path: snapshot.region_path.clone(),
                last_update_success: snapshot.is_healthy(),
                last_update_error: !snapshot.is_healthy(),
                last_update_timestamp: snapshot.last_success,
                update_interval: region.scan_interval_secs,
                consecutive_errors: snapshot.consecutive_errors,
                last_transition: snapshot.transition,
                data: snapshot.record.clone(),
            },
        }
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
