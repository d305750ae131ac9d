//! # Record Extractor
//!
//! Pulls per-vehicle [`TelemetryRecord`]s out of decoded payloads.
//!
//! - `REQ`: the top-level mapping is one self-report.
//! - `RESP`: `konumBilgileri` holds a list of peer reports, one per vehicle.
//! - Anything else (status codes, unparsed text, other kinds): no records.

use serde_json::{Map, Value};
use tracing::debug;

use super::record::{
    keys, number_field, vehicle_id_field, Field, ReportSource, TelemetryRecord, VehicleId,
};
use crate::logfile::MessageKind;

/// Extract every `(vehicle, record)` pair carried by one payload
///
/// # Arguments
///
/// * `timestamp` - Envelope timestamp, copied into each record
/// * `kind` - Envelope kind
/// * `data` - Decoded payload value
///
/// # Returns
///
/// * `Vec<(VehicleId, TelemetryRecord)>` - possibly empty, in payload order
pub fn extract_records(
    timestamp: &str,
    kind: &MessageKind,
    data: &Value,
) -> Vec<(VehicleId, TelemetryRecord)> {
    let Some(map) = data.as_object() else {
        return Vec::new();
    };

    match kind {
        MessageKind::Request => self_report(timestamp, map).into_iter().collect(),
        MessageKind::Response => peer_reports(timestamp, map),
        MessageKind::Other(_) => Vec::new(),
    }
}

fn self_report(timestamp: &str, map: &Map<String, Value>) -> Option<(VehicleId, TelemetryRecord)> {
    let id = vehicle_id(timestamp, map)?;

    let mut record = positioned(timestamp, map, ReportSource::SelfReport);
    record.speed = number(timestamp, map, keys::SELF_SPEED);
    record.battery = number(timestamp, map, keys::BATTERY);

    Some((id, record))
}

fn peer_reports(timestamp: &str, map: &Map<String, Value>) -> Vec<(VehicleId, TelemetryRecord)> {
    let Some(Value::Array(reports)) = map.get(keys::PEER_LIST) else {
        return Vec::new();
    };

    reports
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|peer| {
            let id = vehicle_id(timestamp, peer)?;
            let mut record = positioned(timestamp, peer, ReportSource::PeerReport);
            record.speed = number(timestamp, peer, keys::PEER_SPEED);
            Some((id, record))
        })
        .collect()
}

/// Record with the position/attitude fields shared by both report kinds
fn positioned(timestamp: &str, map: &Map<String, Value>, source: ReportSource) -> TelemetryRecord {
    let mut record = TelemetryRecord::new(timestamp, source);
    record.lat = number(timestamp, map, keys::LATITUDE);
    record.lon = number(timestamp, map, keys::LONGITUDE);
    record.alt = number(timestamp, map, keys::ALTITUDE);
    record.heading = number(timestamp, map, keys::HEADING);
    record.roll = number(timestamp, map, keys::ROLL);
    record.pitch = number(timestamp, map, keys::PITCH);
    record
}

fn vehicle_id(timestamp: &str, map: &Map<String, Value>) -> Option<VehicleId> {
    match vehicle_id_field(map, keys::VEHICLE_ID) {
        Field::Present(id) => Some(id),
        Field::WrongType(value) => {
            debug!("Ignoring report at {} with non-integer {}: {}", timestamp, keys::VEHICLE_ID, value);
            None
        }
        Field::Absent => None,
    }
}

fn number(timestamp: &str, map: &Map<String, Value>, key: &str) -> Option<f64> {
    match number_field(map, key) {
        Field::Present(n) => Some(n),
        Field::WrongType(value) => {
            debug!("Non-numeric {} at {}: {}", key, timestamp, value);
            None
        }
        Field::Absent => None,
    }
}
