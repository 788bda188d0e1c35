//! Incident record data structure.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Coarse category of the dispatched service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ServiceType {
    #[serde(rename = "Ambulance")]
    Ambulance,
    #[serde(rename = "Fire Department")]
    FireDepartment,
    #[serde(rename = "Police")]
    Police,
    #[serde(rename = "Trauma Heli")]
    TraumaHeli,
    #[serde(rename = "KNRM / Water Rescue")]
    WaterRescue,
    #[default]
    #[serde(rename = "Other")]
    Other,
}

impl ServiceType {
    /// Display label as shown to users.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Ambulance => "Ambulance",
            ServiceType::FireDepartment => "Fire Department",
            ServiceType::Police => "Police",
            ServiceType::TraumaHeli => "Trauma Heli",
            ServiceType::WaterRescue => "KNRM / Water Rescue",
            ServiceType::Other => "Other",
        }
    }

    /// Material Design icon for presentation layers.
    pub fn icon(&self) -> &'static str {
        match self {
            ServiceType::Ambulance => "mdi:ambulance",
            ServiceType::FireDepartment => "mdi:fire-truck",
            ServiceType::Police => "mdi:police-car",
            ServiceType::TraumaHeli => "mdi:helicopter",
            ServiceType::WaterRescue => "mdi:lifebuoy",
            ServiceType::Other => "mdi:alert-circle-outline",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The latest dispatch entry scraped for a region.
///
/// Every field is extracted independently, so any of them may be `None`
/// while the rest are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IncidentRecord {
    /// Dispatch code such as "A1" or "P 2"
    pub priority_code: Option<String>,

    /// Free-text dispatch message
    pub message: Option<String>,

    /// Relative label as shown on the page ("5 minuten geleden")
    pub raw_time_label: Option<String>,

    /// Absolute timestamp label, verbatim
    pub absolute_time_label: Option<String>,

    /// Parsed from `absolute_time_label`
    pub time: Option<NaiveDateTime>,

    pub city: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Inferred service type
    pub service_type: ServiceType,
}

impl IncidentRecord {
    /// One-line summary for log output.
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} ({})",
            self.priority_code.as_deref().unwrap_or("-"),
            self.message.as_deref().unwrap_or(""),
            self.service_type
        )
    }
}
