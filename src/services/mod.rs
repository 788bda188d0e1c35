//! Service layer for the monitor.
//!
//! This module contains the fetch → parse steps of a poll:
//! - Page fetching (`P2000Client`, behind the `PageSource` trait)
//! - Record extraction (`RecordExtractor`)
//! - Service classification (`classify`)
//! - Timestamp normalization (`TimestampNormalizer`)

mod classifier;
mod client;
mod extractor;
mod timestamp;

pub use classifier::classify;
pub use client::{P2000Client, PageSource};
pub use extractor::RecordExtractor;
pub use timestamp::{CalendarNames, TimestampNormalizer};
