// src/lib.rs

//! P2000 incident monitor library.
//!
//! Polls alarmfase1.nl region pages, extracts the latest dispatch and keeps a
//! stale-tolerant copy of it per region.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
