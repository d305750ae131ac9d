//! # Telemetry Record Types
//!
//! Per-vehicle observations and the payload keys they are read from.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Payload key names used by the competition server protocol.
///
/// Self-reports and peer reports spell the speed key differently
/// (`iha_hiz` vs `iha_hizi`). Both spellings are looked up separately; it is
/// unknown whether the difference is intended upstream.
pub mod keys {
    /// Vehicle (team) number
    pub const VEHICLE_ID: &str = "takim_numarasi";
    pub const LATITUDE: &str = "iha_enlem";
    pub const LONGITUDE: &str = "iha_boylam";
    pub const ALTITUDE: &str = "iha_irtifa";
    pub const HEADING: &str = "iha_yonelme";
    pub const ROLL: &str = "iha_yatis";
    pub const PITCH: &str = "iha_dikilme";
    /// Speed in a self-report (`REQ`)
    pub const SELF_SPEED: &str = "iha_hiz";
    /// Speed in a peer report inside a `RESP`
    pub const PEER_SPEED: &str = "iha_hizi";
    /// Battery, self-reports only
    pub const BATTERY: &str = "iha_batarya";
    /// List of peer reports inside a `RESP`
    pub const PEER_LIST: &str = "konumBilgileri";
}

/// Integer identifier of one vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleId(pub i64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VehicleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(VehicleId)
    }
}

impl Serialize for VehicleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

/// Who produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSource {
    /// The logging vehicle describing itself (`REQ`)
    SelfReport,
    /// Another vehicle, relayed by the server (`RESP`)
    PeerReport,
}

/// One vehicle's observation at one instant.
///
/// Numeric fields are `None` when the source did not report them; a reported
/// zero stays `Some(0.0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// `YYYY-MM-DD HH:MM:SS,mmm`, used as the sort key
    pub timestamp: String,

    /// Latitude in degrees
    pub lat: Option<f64>,

    /// Longitude in degrees
    pub lon: Option<f64>,

    /// Altitude in meters
    pub alt: Option<f64>,

    /// Heading in degrees
    pub heading: Option<f64>,

    /// Roll angle in degrees
    pub roll: Option<f64>,

    /// Pitch angle in degrees
    pub pitch: Option<f64>,

    /// Ground speed
    pub speed: Option<f64>,

    /// Battery level, never set for peer reports
    pub battery: Option<f64>,

    pub source: ReportSource,
}

impl TelemetryRecord {
    /// Empty record of the given source at `timestamp`
    pub fn new(timestamp: impl Into<String>, source: ReportSource) -> Self {
        Self {
            timestamp: timestamp.into(),
            lat: None,
            lon: None,
            alt: None,
            heading: None,
            roll: None,
            pitch: None,
            speed: None,
            battery: None,
            source,
        }
    }
}

// Absent fields serialize as null; `battery` only exists on self-reports.
impl Serialize for TelemetryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let self_report = self.source == ReportSource::SelfReport;
        let len = if self_report { 9 } else { 8 };

        let mut state = serializer.serialize_struct("TelemetryRecord", len)?;
        state.serialize_field("timestamp", &self.timestamp)?;
        state.serialize_field("lat", &self.lat)?;
        state.serialize_field("lon", &self.lon)?;
        state.serialize_field("alt", &self.alt)?;
        state.serialize_field("heading", &self.heading)?;
        state.serialize_field("roll", &self.roll)?;
        state.serialize_field("pitch", &self.pitch)?;
        state.serialize_field("speed", &self.speed)?;
        if self_report {
            state.serialize_field("battery", &self.battery)?;
        } else {
            state.skip_field("battery")?;
        }
        state.end()
    }
}

/// Result of looking up one named field in a payload mapping
#[derive(Debug, Clone, PartialEq)]
pub enum Field<'a, T> {
    /// Key present with a usable value
    Present(T),
    /// Key present but the value has the wrong type
    WrongType(&'a Value),
    /// Key missing or `null`
    Absent,
}

impl<'a, T> Field<'a, T> {
    /// The usable value, treating a wrong type like an absent key
    pub fn present(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            Field::WrongType(_) | Field::Absent => None,
        }
    }
}

/// Look up `key` as a number
pub fn number_field<'a>(map: &'a Map<String, Value>, key: &str) -> Field<'a, f64> {
    match map.get(key) {
        None | Some(Value::Null) => Field::Absent,
        Some(value) => match value.as_f64() {
            Some(n) => Field::Present(n),
            None => Field::WrongType(value),
        },
    }
}

/// Look up `key` as a vehicle identifier.
///
/// Integral floats (`5.0`) are accepted as the same vehicle as `5`.
pub fn vehicle_id_field<'a>(map: &'a Map<String, Value>, key: &str) -> Field<'a, VehicleId> {
    let value = match map.get(key) {
        None | Some(Value::Null) => return Field::Absent,
        Some(value) => value,
    };

    if let Some(n) = value.as_i64() {
        return Field::Present(VehicleId(n));
    }

    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Field::Present(VehicleId(f as i64))
        }
        _ => Field::WrongType(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_number_field_tri_state() {
        let m = map(json!({"a": 1.5, "b": 0, "c": "fast", "d": null}));

        assert_eq!(number_field(&m, "a"), Field::Present(1.5));
        assert_eq!(number_field(&m, "b"), Field::Present(0.0));
        assert_eq!(number_field(&m, "c"), Field::WrongType(&json!("fast")));
        assert_eq!(number_field(&m, "d"), Field::Absent);
        assert_eq!(number_field(&m, "missing"), Field::Absent);
    }

    #[test]
    fn test_vehicle_id_field() {
        let m = map(json!({"int": 7, "float": 7.0, "frac": 7.5, "text": "7", "flag": true}));

        assert_eq!(vehicle_id_field(&m, "int"), Field::Present(VehicleId(7)));
        assert_eq!(vehicle_id_field(&m, "float"), Field::Present(VehicleId(7)));
        assert!(matches!(vehicle_id_field(&m, "frac"), Field::WrongType(_)));
        assert!(matches!(vehicle_id_field(&m, "text"), Field::WrongType(_)));
        assert!(matches!(vehicle_id_field(&m, "flag"), Field::WrongType(_)));
        assert_eq!(vehicle_id_field(&m, "missing"), Field::Absent);
    }

    #[test]
    fn test_vehicle_id_from_str() {
        assert_eq!("42".parse::<VehicleId>().unwrap(), VehicleId(42));
        assert_eq!(" -3 ".parse::<VehicleId>().unwrap(), VehicleId(-3));
        assert!("abc".parse::<VehicleId>().is_err());
        assert!("".parse::<VehicleId>().is_err());
        assert!("4.5".parse::<VehicleId>().is_err());
    }

    #[test]
    fn test_self_report_serializes_battery() {
        let mut record = TelemetryRecord::new("2025-09-02 08:17:50,493", ReportSource::SelfReport);
        record.lat = Some(41.0);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "timestamp": "2025-09-02 08:17:50,493",
                "lat": 41.0,
                "lon": null,
                "alt": null,
                "heading": null,
                "roll": null,
                "pitch": null,
                "speed": null,
                "battery": null
            })
        );
    }

    #[test]
    fn test_peer_report_has_no_battery_key() {
        let mut record = TelemetryRecord::new("2025-09-02 08:17:50,493", ReportSource::PeerReport);
        record.battery = Some(50.0);

        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 8);
        assert!(!obj.contains_key("battery"));
    }

    #[test]
    fn test_field_order_matches_viewer_contract() {
        let record = TelemetryRecord::new("t", ReportSource::SelfReport);
        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["timestamp", "lat", "lon", "alt", "heading", "roll", "pitch", "speed", "battery"]
        );
    }
}
