//! Outbound state published to subscribers after every poll.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::IncidentRecord;

/// Result of the most recently completed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Error")]
    Error,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Ok => f.write_str("OK"),
            HealthStatus::Error => f.write_str("Error"),
        }
    }
}

/// How a poll changed the retained state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// No poll has completed yet
    Pending,
    /// A new, distinct record replaced the previous one
    Updated,
    /// The page returned the record already held
    Unchanged,
    /// No entry or no data; the previous record (if any) is kept
    Retained,
    /// Hard failure; the previous record is kept and the region is unhealthy
    Failed,
}

impl Transition {
    /// Only updates are observable changes of the record.
    pub fn is_update(&self) -> bool {
        matches!(self, Transition::Updated)
    }
}

/// Everything a presentation layer needs about one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSnapshot {
    pub instance_name: String,
    pub region_path: String,
    pub record: Option<IncidentRecord>,
    /// Whether `record` passes the region's service filters
    pub matches_filter: bool,
    pub status: HealthStatus,
    pub consecutive_errors: u32,
    pub last_success: Option<DateTime<Utc>>,
    /// When the poll behind this snapshot completed, successful or not
    pub last_update_attempt: Option<DateTime<Utc>>,
    pub transition: Transition,
}

impl RegionSnapshot {
    /// Snapshot of a region that has not been polled yet.
    pub fn pending(instance_name: impl Into<String>, region_path: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            region_path: region_path.into(),
            record: None,
            matches_filter: true,
            status: HealthStatus::Ok,
            consecutive_errors: 0,
            last_success: None,
            last_update_attempt: None,
            transition: Transition::Pending,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_updated_is_an_update() {
        assert!(Transition::Updated.is_update());
        for t in [
            Transition::Pending,
            Transition::Unchanged,
            Transition::Retained,
            Transition::Failed,
        ] {
            assert!(!t.is_update(), "{t:?}");
        }
    }

    #[test]
    fn pending_snapshot_is_healthy_and_empty() {
        let snapshot = RegionSnapshot::pending("Zeeland", "zeeland");
        assert!(snapshot.is_healthy());
        assert_eq!(snapshot.record, None);
        assert_eq!(snapshot.last_update_attempt, None);
        assert_eq!(snapshot.transition, Transition::Pending);
    }
}
