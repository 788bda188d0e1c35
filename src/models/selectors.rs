// src/models/selectors.rs

//! CSS selectors for locating the latest incident on a region page.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping an incident entry.
///
/// All selectors except `entry_selector` are evaluated relative to the
/// matched entry element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentSelectors {
    /// Selector for entries inside the incident list; the first match wins
    pub entry_selector: String,

    /// Heading of the entry; one of the two structural anchors
    pub heading_selector: String,

    /// Bold priority code inside the heading link
    pub priority_selector: String,

    /// Preformatted message block; the other structural anchor
    pub message_selector: String,

    /// Time indicator carrying the relative label as text
    pub time_selector: String,

    /// Attribute of the time indicator holding the absolute timestamp
    pub time_title_attr: String,

    /// Paragraph holding the location sub-fields
    pub location_selector: String,

    /// City, relative to the location paragraph
    pub city_selector: String,

    /// Street address, relative to the location paragraph
    pub address_selector: String,

    /// Postal code, relative to the location paragraph
    pub postal_code_selector: String,

    /// Service icon element inside the heading link
    pub icon_selector: String,

    /// Entry attribute holding the latitude
    pub latitude_attr: String,

    /// Entry attribute holding the longitude
    pub longitude_attr: String,
}

impl Default for IncidentSelectors {
    fn default() -> Self {
        Self {
            entry_selector: "#calls .call".to_string(),
            heading_selector: "h2".to_string(),
            priority_selector: "h2 > a > b".to_string(),
            message_selector: "pre".to_string(),
            time_selector: "h2 > span".to_string(),
            time_title_attr: "title".to_string(),
            location_selector: "span > p:nth-child(2)".to_string(),
            city_selector: "a:nth-child(2) > span".to_string(),
            address_selector: "span".to_string(),
            postal_code_selector: "a:nth-child(3) > span".to_string(),
            icon_selector: "h2 > a > i".to_string(),
            latitude_attr: "latitude".to_string(),
            longitude_attr: "longitude".to_string(),
        }
    }
}

impl IncidentSelectors {
    /// All CSS selectors paired with the config key they come from.
    pub fn css_entries(&self) -> [(&'static str, &str); 10] {
        [
            ("entry_selector", &self.entry_selector),
            ("heading_selector", &self.heading_selector),
            ("priority_selector", &self.priority_selector),
            ("message_selector", &self.message_selector),
            ("time_selector", &self.time_selector),
            ("location_selector", &self.location_selector),
            ("city_selector", &self.city_selector),
            ("address_selector", &self.address_selector),
            ("postal_code_selector", &self.postal_code_selector),
            ("icon_selector", &self.icon_selector),
        ]
    }
}
