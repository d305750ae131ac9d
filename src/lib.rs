//! # Flightlog Viewer Library
//!
//! Turn UAV telemetry logs into per-vehicle tracks and serve them to a
//! browser viewer.
//!
//! The flight computer logs every request it sends to the competition server
//! (its own position and attitude) and every response it gets back (the
//! positions of the other vehicles in the air). This library parses those
//! logs, groups the reports by vehicle and answers lookup queries.

pub mod config;
pub mod error;
pub mod ingest;
pub mod logfile;
pub mod logging;
pub mod server;
pub mod service;
pub mod telemetry;
