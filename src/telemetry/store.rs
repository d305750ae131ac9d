//! # Aggregation Store
//!
//! Groups telemetry records by vehicle and orders each track by time.
//!
//! Building and querying are split into two types so that a store can only
//! be queried after it has been sorted:
//!
//! ```
//! use flightlog_viewer::telemetry::record::{ReportSource, TelemetryRecord, VehicleId};
//! use flightlog_viewer::telemetry::store::StoreBuilder;
//!
//! let mut builder = StoreBuilder::new();
//! builder.load([
//!     (VehicleId(7), TelemetryRecord::new("2025-09-02 08:17:50,100", ReportSource::PeerReport)),
//!     (VehicleId(3), TelemetryRecord::new("2025-09-02 08:17:50,050", ReportSource::SelfReport)),
//! ]);
//! let store = builder.finalize();
//!
//! assert_eq!(store.list_ids(), vec![VehicleId(3), VehicleId(7)]);
//! assert!(store.records(VehicleId(9)).is_none());
//! ```

use std::collections::BTreeMap;
use tracing::debug;

use super::record::{TelemetryRecord, VehicleId};

/// Mutable accumulator for one ingestion batch
#[derive(Debug, Default)]
pub struct StoreBuilder {
    tracks: BTreeMap<VehicleId, Vec<TelemetryRecord>>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records to their vehicles' tracks, keeping input order
    pub fn load<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = (VehicleId, TelemetryRecord)>,
    {
        for (id, record) in records {
            self.tracks.entry(id).or_default().push(record);
        }
    }

    /// Sort every track by timestamp and freeze the result.
    ///
    /// The sort is stable: records sharing a timestamp keep insertion order.
    /// Timestamps are fixed-width and zero-padded, so string order is time order.
    pub fn finalize(mut self) -> TelemetryStore {
        for track in self.tracks.values_mut() {
            track.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        }

        let store = TelemetryStore { tracks: self.tracks };
        debug!(
            "Store finalized: {} vehicles, {} records",
            store.vehicle_count(),
            store.record_count()
        );
        store
    }
}

/// Finalized, read-only index from vehicle to its chronological track
#[derive(Debug, Default)]
pub struct TelemetryStore {
    tracks: BTreeMap<VehicleId, Vec<TelemetryRecord>>,
}

impl TelemetryStore {
    /// All known vehicles, ascending
    pub fn list_ids(&self) -> Vec<VehicleId> {
        self.tracks.keys().copied().collect()
    }

    /// The sorted track of `id`, or `None` if the vehicle was never seen
    pub fn records(&self, id: VehicleId) -> Option<&[TelemetryRecord]> {
        self.tracks.get(&id).map(Vec::as_slice)
    }

    pub fn vehicle_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn record_count(&self) -> usize {
        self.tracks.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::record::ReportSource;

    fn record(ts: &str) -> TelemetryRecord {
        TelemetryRecord::new(ts, ReportSource::SelfReport)
    }

    fn timestamps(store: &TelemetryStore, id: i64) -> Vec<String> {
        store
            .records(VehicleId(id))
            .unwrap()
            .iter()
            .map(|r| r.timestamp.clone())
            .collect()
    }

    #[test]
    fn test_finalize_sorts_by_timestamp() {
        let mut builder = StoreBuilder::new();
        builder.load([
            (VehicleId(1), record("2025-09-02 08:17:50,100")),
            (VehicleId(1), record("2025-09-02 08:17:50,050")),
            (VehicleId(1), record("2025-09-02 08:17:50,075")),
        ]);
        let store = builder.finalize();

        assert_eq!(
            timestamps(&store, 1),
            vec![
                "2025-09-02 08:17:50,050",
                "2025-09-02 08:17:50,075",
                "2025-09-02 08:17:50,100"
            ]
        );
    }

    #[test]
    fn test_sort_is_stable_for_equal_timestamps() {
        let mut a = record("2025-09-02 08:17:50,100");
        a.lat = Some(1.0);
        let mut b = record("2025-09-02 08:17:50,100");
        b.lat = Some(2.0);

        let mut builder = StoreBuilder::new();
        builder.load([
            (VehicleId(1), record("2025-09-02 08:17:51,000")),
            (VehicleId(1), a),
            (VehicleId(1), b),
        ]);
        let store = builder.finalize();

        let lats: Vec<_> = store.records(VehicleId(1)).unwrap().iter().map(|r| r.lat).collect();
        assert_eq!(lats, vec![Some(1.0), Some(2.0), None]);
    }

    #[test]
    fn test_list_ids_sorted() {
        let mut builder = StoreBuilder::new();
        builder.load([
            (VehicleId(7), record("t")),
            (VehicleId(3), record("t")),
            (VehicleId(9), record("t")),
            (VehicleId(3), record("t")),
        ]);
        let store = builder.finalize();

        assert_eq!(store.list_ids(), vec![VehicleId(3), VehicleId(7), VehicleId(9)]);
        assert_eq!(store.vehicle_count(), 3);
        assert_eq!(store.record_count(), 4);
    }

    #[test]
    fn test_load_accumulates_across_calls() {
        let mut builder = StoreBuilder::new();
        builder.load([(VehicleId(1), record("2025-09-02 08:17:50,200"))]);
        builder.load([(VehicleId(1), record("2025-09-02 08:17:50,100"))]);
        let store = builder.finalize();

        assert_eq!(
            timestamps(&store, 1),
            vec!["2025-09-02 08:17:50,100", "2025-09-02 08:17:50,200"]
        );
    }

    #[test]
    fn test_unknown_id_is_none() {
        let store = StoreBuilder::new().finalize();
        assert!(store.records(VehicleId(42)).is_none());
        assert!(store.list_ids().is_empty());
        assert_eq!(store.record_count(), 0);
    }
}
