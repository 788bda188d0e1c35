// src/models/mod.rs

//! Domain models for the monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod incident;
mod selectors;
mod snapshot;

// Re-export all public types
pub use config::{
    Config, DisplayConfig, FilterConfig, LocaleConfig, LoggingConfig, MIN_SCAN_INTERVAL_SECS,
    RegionConfig, ScraperConfig,
};
pub use incident::{IncidentRecord, ServiceType};
pub use selectors::IncidentSelectors;
pub use snapshot::{HealthStatus, RegionSnapshot, Transition};
