//! # Telemetry Module
//!
//! Per-vehicle telemetry built from decoded log payloads.
//!
//! This module handles:
//! - The record shape served to the viewer
//! - Extracting self-reports and peer reports from payloads
//! - Grouping records by vehicle and sorting each track by time

pub mod extractor;
pub mod record;
pub mod store;

pub use extractor::extract_records;
pub use record::{ReportSource, TelemetryRecord, VehicleId};
pub use store::{StoreBuilder, TelemetryStore};
