// src/services/extractor.rs

//! Record extractor.
//!
//! Turns the markup of one region page into the latest [`IncidentRecord`].
//! Only the first entry of the incident list is read. Every field is
//! extracted on its own and degrades to `None`; the only structural failure
//! is an entry that carries none of the expected anchors.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result, ScrapeError};
use crate::models::{IncidentRecord, IncidentSelectors};
use crate::services::classifier::classify;
use crate::services::timestamp::TimestampNormalizer;

/// Compiled selectors plus the timestamp normalizer.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    entry: Selector,
    heading: Selector,
    priority: Selector,
    message: Selector,
    time: Selector,
    location: Selector,
    city: Selector,
    address: Selector,
    postal_code: Selector,
    icon: Selector,
    time_title_attr: String,
    latitude_attr: String,
    longitude_attr: String,
    normalizer: TimestampNormalizer,
}

impl RecordExtractor {
    /// Compile the selectors; an invalid selector is a configuration error.
    pub fn new(selectors: &IncidentSelectors, normalizer: TimestampNormalizer) -> Result<Self> {
        Ok(Self {
            entry: Self::parse_selector(&selectors.entry_selector)?,
            heading: Self::parse_selector(&selectors.heading_selector)?,
            priority: Self::parse_selector(&selectors.priority_selector)?,
            message: Self::parse_selector(&selectors.message_selector)?,
            time: Self::parse_selector(&selectors.time_selector)?,
            location: Self::parse_selector(&selectors.location_selector)?,
            city: Self::parse_selector(&selectors.city_selector)?,
            address: Self::parse_selector(&selectors.address_selector)?,
            postal_code: Self::parse_selector(&selectors.postal_code_selector)?,
            icon: Self::parse_selector(&selectors.icon_selector)?,
            time_title_attr: selectors.time_title_attr.clone(),
            latitude_attr: selectors.latitude_attr.clone(),
            longitude_attr: selectors.longitude_attr.clone(),
            normalizer,
        })
    }

    /// Extract the latest incident.
    ///
    /// `Ok(None)` means the page holds no incident entry, which is a valid
    /// state rather than an error.
    pub fn extract(&self, markup: &str) -> std::result::Result<Option<IncidentRecord>, ScrapeError> {
        let document = Html::parse_document(markup);

        let Some(entry) = document.select(&self.entry).next() else {
            log::warn!("No incident entry found in page");
            return Ok(None);
        };

        if first(&entry, &self.heading).is_none() && first(&entry, &self.message).is_none() {
            return Err(ScrapeError::parsing(
                "incident entry has neither a heading nor a message block",
            ));
        }

        Ok(Some(self.parse_entry(&entry)))
    }

    fn parse_entry(&self, entry: &ElementRef) -> IncidentRecord {
        let priority_code = text_of(first(entry, &self.priority));
        let message = text_of(first(entry, &self.message));

        let time_el = first(entry, &self.time);
        let raw_time_label = text_of(time_el);
        let absolute_time_label = attr_of(time_el, &self.time_title_attr);
        let time = self.normalizer.normalize(absolute_time_label.as_deref());

        let location = first(entry, &self.location);
        let city = text_of(location.and_then(|p| first(&p, &self.city)));
        let address = text_of(location.and_then(|p| first(&p, &self.address)));
        let postal_code = text_of(location.and_then(|p| first(&p, &self.postal_code)));

        let latitude = coordinate(entry, &self.latitude_attr);
        let longitude = coordinate(entry, &self.longitude_attr);

        let icon_classes: Vec<&str> = first(entry, &self.icon)
            .map(|icon| icon.value().classes().collect())
            .unwrap_or_default();
        let service_type = classify(&icon_classes, priority_code.as_deref(), message.as_deref());

        let record = IncidentRecord {
            priority_code,
            message,
            raw_time_label,
            absolute_time_label,
            time,
            city,
            address,
            postal_code,
            latitude,
            longitude,
            service_type,
        };
        log::debug!("Parsed incident: {}", record.summary());
        record
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

fn first<'a>(scope: &ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

fn text_of(element: Option<ElementRef>) -> Option<String> {
    let text: String = element?.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn attr_of(element: Option<ElementRef>, attr: &str) -> Option<String> {
    element?
        .value()
        .attr(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn coordinate(entry: &ElementRef, attr: &str) -> Option<f64> {
    entry
        .value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
