// src/error.rs

//! Unified error handling for the monitor.
//!
//! Two layers live here:
//! - [`ScrapeError`]: what a single fetch + extract cycle can fail with.
//!   The coordinator turns these into state transitions; they never reach
//!   subscribers as errors.
//! - [`AppError`]: everything else (configuration, I/O, setup).

use std::fmt;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of one fetch + extract cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    /// Timeout, DNS/transport failure or a non-404 HTTP error status.
    #[error("Connection error for {url}: {message}")]
    Connection { url: String, message: String },

    /// HTTP 404; the region path is most likely invalid.
    #[error("No data for region '{region_path}': {message}")]
    NoData {
        region_path: String,
        message: String,
    },

    /// An incident entry was found but could not be interpreted.
    #[error("Parse error: {0}")]
    Parsing(String),
}

impl ScrapeError {
    /// Create a connection error.
    pub fn connection(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a no-data error.
    pub fn no_data(region_path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::NoData {
            region_path: region_path.into(),
            message: message.to_string(),
        }
    }

    /// Create a parsing error.
    pub fn parsing(message: impl Into<String>) -> Self {
        Self::Parsing(message.into())
    }

    /// Whether this outcome counts against the consecutive error counter.
    pub fn is_hard(&self) -> bool {
        !matches!(self, Self::NoData { .. })
    }

    /// Stable code reported to whoever is setting up a region.
    pub fn setup_code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "cannot_connect",
            Self::NoData { .. } => "invalid_region_path",
            Self::Parsing(_) => "parse_error",
        }
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration value rejected, with the field it belongs to
    #[error("Validation error for {field}: {code}")]
    Validation { field: String, code: String },

    /// First refresh of a region failed
    #[error("Setup of region '{region_path}' failed ({}): {source}", .source.setup_code())]
    Setup {
        region_path: String,
        #[source]
        source: ScrapeError,
    },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error for a config field.
    pub fn validation(field: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            code: code.into(),
        }
    }

    /// Create a setup error for a region.
    pub fn setup(region_path: impl Into<String>, source: ScrapeError) -> Self {
        Self::Setup {
            region_path: region_path.into(),
            source,
        }
    }
}
