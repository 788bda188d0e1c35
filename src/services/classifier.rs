//! Service type inference.
//!
//! The icon classes are the primary signal. When no icon fragment matches,
//! the priority text and then the message text are scanned for the Dutch
//! service names.

use crate::models::ServiceType;

/// Icon class fragments, checked in order.
const ICON_FRAGMENTS: [(&str, ServiceType); 4] = [
    ("ambulance", ServiceType::Ambulance),
    ("fire-extinguisher", ServiceType::FireDepartment),
    ("helicopter", ServiceType::TraumaHeli),
    ("life-ring", ServiceType::WaterRescue),
];

/// Text tokens, checked in order.
const TEXT_TOKENS: [(&str, ServiceType); 3] = [
    ("Politie", ServiceType::Police),
    ("Ambulance", ServiceType::Ambulance),
    ("Brandweer", ServiceType::FireDepartment),
];

/// Infer the service type of an incident.
pub fn classify<S: AsRef<str>>(
    icon_classes: &[S],
    priority_text: Option<&str>,
    message_text: Option<&str>,
) -> ServiceType {
    classify_icon(icon_classes)
        .or_else(|| priority_text.and_then(classify_priority))
        .or_else(|| message_text.and_then(classify_message))
        .unwrap_or_default()
}

fn classify_icon<S: AsRef<str>>(icon_classes: &[S]) -> Option<ServiceType> {
    ICON_FRAGMENTS.iter().find_map(|(fragment, service)| {
        icon_classes
            .iter()
            .any(|class| class.as_ref().contains(fragment))
            .then_some(*service)
    })
}

fn classify_priority(text: &str) -> Option<ServiceType> {
    TEXT_TOKENS
        .iter()
        .find(|(token, _)| text.contains(token))
        .map(|(_, service)| *service)
}

fn classify_message(text: &str) -> Option<ServiceType> {
    let lower = text.to_lowercase();
    TEXT_TOKENS
        .iter()
        .find(|(token, _)| lower.contains(&token.to_lowercase()))
        .map(|(_, service)| *service)
}
