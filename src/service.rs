//! # Query Service
//!
//! Read-only queries over the current [`TelemetryStore`].
//!
//! The store itself is never mutated once built. A reload builds a complete
//! new store and publishes it by swapping a single `Arc`; queries grab the
//! current `Arc` and keep answering from it even if a swap happens mid-request.

use serde::ser::{Serialize, Serializer};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::info;

use crate::error::Result;
use crate::ingest::DataSource;
use crate::telemetry::{TelemetryRecord, TelemetryStore, VehicleId};

/// Query outcomes other than success
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The identifier is not an integer token
    #[error("Invalid ID format")]
    BadRequest(String),

    /// No vehicle with this identifier was observed
    #[error("Plane ID not found")]
    NotFound(VehicleId),
}

/// One vehicle's track, pinned to the store snapshot it came from
#[derive(Debug, Clone)]
pub struct Track {
    store: Arc<TelemetryStore>,
    id: VehicleId,
}

impl Track {
    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn records(&self) -> &[TelemetryRecord] {
        // Only constructed for ids present in `store`
        self.store.records(self.id).unwrap_or_default()
    }
}

impl Serialize for Track {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.records().serialize(serializer)
    }
}

/// Shared handle answering vehicle queries; cheap to clone
#[derive(Debug, Clone)]
pub struct QueryService {
    current: Arc<RwLock<Arc<TelemetryStore>>>,
}

impl QueryService {
    pub fn new(store: TelemetryStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
        }
    }

    /// The store currently being served
    pub fn snapshot(&self) -> Arc<TelemetryStore> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// All known vehicle identifiers, ascending
    pub fn list_ids(&self) -> Vec<VehicleId> {
        self.snapshot().list_ids()
    }

    /// The sorted track for the identifier in `raw_id`
    ///
    /// # Errors
    ///
    /// * `QueryError::BadRequest` - `raw_id` is not an integer
    /// * `QueryError::NotFound` - the vehicle was never observed
    pub fn records(&self, raw_id: &str) -> std::result::Result<Track, QueryError> {
        let id: VehicleId = raw_id
            .parse()
            .map_err(|_| QueryError::BadRequest(raw_id.to_string()))?;

        let store = self.snapshot();
        if store.records(id).is_none() {
            return Err(QueryError::NotFound(id));
        }
        Ok(Track { store, id })
    }

    /// Publish a new store; in-flight queries finish on the old one
    pub fn replace(&self, store: TelemetryStore) {
        let fresh = Arc::new(store);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = fresh;
    }

    /// Rebuild the store from `source` and publish it.
    ///
    /// On error the current store stays in place.
    pub fn reload_from(&self, source: &DataSource) -> Result<()> {
        let store = source.load()?;
        info!(
            "Reloaded {}: {} vehicles, {} records",
            source,
            store.vehicle_count(),
            store.record_count()
        );
        self.replace(store);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{write_artifact, ArtifactEntry};
    use crate::telemetry::{ReportSource, StoreBuilder};
    use serde_json::json;
    use tempfile::tempdir;

    fn store_with(ids: &[i64]) -> TelemetryStore {
        let mut builder = StoreBuilder::new();
        builder.load(ids.iter().map(|&id| {
            (
                VehicleId(id),
                TelemetryRecord::new("2025-09-02 08:17:50,493", ReportSource::SelfReport),
            )
        }));
        builder.finalize()
    }

    #[test]
    fn test_list_ids() {
        let service = QueryService::new(store_with(&[7, 3, 9]));
        assert_eq!(service.list_ids(), vec![VehicleId(3), VehicleId(7), VehicleId(9)]);
    }

    #[test]
    fn test_records_found() {
        let service = QueryService::new(store_with(&[5]));
        let track = service.records("5").unwrap();
        assert_eq!(track.id(), VehicleId(5));
        assert_eq!(track.records().len(), 1);

        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(value[0]["timestamp"], json!("2025-09-02 08:17:50,493"));
    }

    #[test]
    fn test_records_not_found() {
        let service = QueryService::new(store_with(&[5]));
        assert_eq!(service.records("6").unwrap_err(), QueryError::NotFound(VehicleId(6)));
    }

    #[test]
    fn test_records_bad_request() {
        let service = QueryService::new(store_with(&[5]));
        for raw in ["abc", "", "5.0", "5x"] {
            assert!(
                matches!(service.records(raw), Err(QueryError::BadRequest(_))),
                "{:?} should be a bad request",
                raw
            );
        }
    }

    #[test]
    fn test_replace_keeps_old_snapshot_alive() {
        let service = QueryService::new(store_with(&[1]));
        let old_track = service.records("1").unwrap();

        service.replace(store_with(&[2]));

        assert_eq!(service.list_ids(), vec![VehicleId(2)]);
        assert!(matches!(service.records("1"), Err(QueryError::NotFound(_))));
        assert_eq!(old_track.records().len(), 1);
    }

    #[test]
    fn test_clones_share_the_current_store() {
        let service = QueryService::new(store_with(&[1]));
        let handle = service.clone();
        service.replace(store_with(&[4]));
        assert_eq!(handle.list_ids(), vec![VehicleId(4)]);
    }

    #[test]
    fn test_reload_from_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cleaned_data.json");
        write_artifact(
            &path,
            &[ArtifactEntry {
                timestamp: "2025-09-02 08:17:50,493".to_string(),
                kind: "REQ".to_string(),
                data: json!({"takim_numarasi": 11}),
            }],
        )
        .unwrap();

        let service = QueryService::new(TelemetryStore::default());
        service.reload_from(&DataSource::Artifact(path)).unwrap();
        assert_eq!(service.list_ids(), vec![VehicleId(11)]);
    }

    #[test]
    fn test_failed_reload_keeps_current_store() {
        let dir = tempdir().unwrap();
        let service = QueryService::new(store_with(&[1]));

        let missing = DataSource::Artifact(dir.path().join("missing.json"));
        assert!(service.reload_from(&missing).is_err());
        assert_eq!(service.list_ids(), vec![VehicleId(1)]);
    }
}
