//! # Ingestion Pipeline
//!
//! Batch processing of a whole log file:
//!
//! ```text
//! log file ──► LineParser ──► decode_payload ──► ArtifactEntry ──► cleaned_data.json
//!                                                     │
//!                                                     ▼
//!                                   extract_records ──► StoreBuilder ──► TelemetryStore
//! ```
//!
//! A bad line or payload never aborts the batch; only a missing or unreadable
//! input file is fatal.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{FlightLogError, Result};
use crate::logfile::{decode_payload, DecodedPayload, LineParser, MessageKind};
use crate::telemetry::{extract_records, StoreBuilder, TelemetryStore};

/// Indentation of the pretty-printed artifact
const ARTIFACT_INDENT: &[u8] = b"    ";

/// One decoded envelope as stored in the intermediate artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub timestamp: String,

    /// Kind tag (`REQ` / `RESP`)
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    pub kind: String,

    #[serde(default)]
    pub data: Value,
}

/// `null` reads as an empty string, so such entries are skipped instead of failing the load
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Counters for one pass over a log file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Lines read
    pub lines: usize,
    /// Lines that matched the envelope shape
    pub envelopes: usize,
    /// Entries kept for the artifact
    pub entries: usize,
    /// Request payloads dropped because they failed to decode
    pub request_failures: usize,
    /// Response payloads kept as raw text
    pub unparsed_responses: usize,
    /// Envelopes of kinds that are not decoded
    pub ignored: usize,
}

/// Decode every line of `text` into artifact entries
pub fn organize_text(text: &str) -> Result<(Vec<ArtifactEntry>, IngestReport)> {
    let parser = LineParser::new()?;
    let mut report = IngestReport {
        lines: text.lines().count(),
        ..IngestReport::default()
    };
    let mut entries = Vec::new();

    for envelope in parser.parse_lines(text) {
        report.envelopes += 1;

        let payload = match decode_payload(&envelope.kind, &envelope.raw_payload) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                report.ignored += 1;
                continue;
            }
            Err(e) => {
                warn!("Error parsing {} at {}: {}", envelope.kind, envelope.timestamp, e);
                report.request_failures += 1;
                continue;
            }
        };

        if let DecodedPayload::Unparsed(_) = payload {
            debug!("Keeping unparsed {} payload at {}", envelope.kind, envelope.timestamp);
            report.unparsed_responses += 1;
        }

        entries.push(ArtifactEntry {
            timestamp: envelope.timestamp,
            kind: envelope.kind.to_string(),
            data: payload.into_value(),
        });
    }

    report.entries = entries.len();
    Ok((entries, report))
}

/// Read a log file, replacing invalid UTF-8 rather than failing
pub fn read_log<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| FlightLogError::from_open(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Turn a raw log file into the intermediate artifact
///
/// # Errors
///
/// Returns `InputMissing` if `input` does not exist, or an I/O / JSON error
/// if the artifact cannot be written.
pub fn organize<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<IngestReport> {
    let text = read_log(&input)?;
    let (entries, report) = organize_text(&text)?;
    write_artifact(&output, &entries)?;

    info!(
        "Successfully processed {} entries ({} lines, {} request failures). Output saved to {}",
        report.entries,
        report.lines,
        report.request_failures,
        output.as_ref().display()
    );
    Ok(report)
}

/// Write entries as a pretty-printed UTF-8 JSON array
pub fn write_artifact<P: AsRef<Path>>(path: P, entries: &[ArtifactEntry]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let formatter = PrettyFormatter::with_indent(ARTIFACT_INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
    entries.serialize(&mut ser)?;

    writer.flush()?;
    Ok(())
}

/// Read the intermediate artifact
pub fn read_artifact<P: AsRef<Path>>(path: P) -> Result<Vec<ArtifactEntry>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FlightLogError::from_open(path, e))?;
    let entries = serde_json::from_reader(BufReader::new(file))?;
    Ok(entries)
}

/// Build a finalized store from artifact entries.
///
/// Entries without a timestamp or with a null payload are skipped.
pub fn store_from_entries(entries: &[ArtifactEntry]) -> TelemetryStore {
    let mut builder = StoreBuilder::new();

    for entry in entries {
        if entry.timestamp.is_empty() || entry.data.is_null() {
            continue;
        }
        let kind = MessageKind::from_tag(&entry.kind);
        builder.load(extract_records(&entry.timestamp, &kind, &entry.data));
    }

    builder.finalize()
}

/// Load the artifact at `path` into a finalized store
pub fn load_store<P: AsRef<Path>>(path: P) -> Result<TelemetryStore> {
    let entries = read_artifact(&path)?;
    info!("Processing {} entries...", entries.len());

    let store = store_from_entries(&entries);
    info!("Data loaded. Found {} unique IDs.", store.vehicle_count());
    Ok(store)
}

/// Build a store straight from a raw log file, skipping the artifact
pub fn ingest_log<P: AsRef<Path>>(path: P) -> Result<TelemetryStore> {
    let text = read_log(&path)?;
    let (entries, report) = organize_text(&text)?;
    info!(
        "Parsed {} entries from {} lines ({} request failures)",
        report.entries, report.lines, report.request_failures
    );

    let store = store_from_entries(&entries);
    info!("Data loaded. Found {} unique IDs.", store.vehicle_count());
    Ok(store)
}

/// Where the served telemetry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Intermediate artifact written by `organize`
    Artifact(PathBuf),
    /// Raw log file, decoded in memory
    Log(PathBuf),
}

impl DataSource {
    /// Build a fresh finalized store from this source
    pub fn load(&self) -> Result<TelemetryStore> {
        match self {
            DataSource::Artifact(path) => load_store(path),
            DataSource::Log(path) => ingest_log(path),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Artifact(path) => write!(f, "artifact {}", path.display()),
            DataSource::Log(path) => write!(f, "log {}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::VehicleId;
    use serde_json::json;
    use tempfile::tempdir;

    const SAMPLE: &str = "\
2025-09-02 08:17:50,493 - INFO - REQ: {'takim_numarasi': 5, 'iha_enlem': 41.0, 'iha_boylam': 29.0}
2025-09-02 08:17:50,512 - INFO - RESP: {\"sunucusaati\": {\"saat\": 8}, \"konumBilgileri\": [{\"takim_numarasi\": 9, \"iha_enlem\": 40.0, \"iha_hizi\": 20}]}
2025-09-02 08:17:51,000 - INFO - RESP: 3
2025-09-02 08:17:51,100 - ERROR - RESP: oops
2025-09-02 08:17:51,200 - INFO - REQ: {'takim_numarasi': 5, 'iha_enlem':
2025-09-02 08:17:51,300 - INFO - LOGIN: {'kadi': 'takim5'}
not a log line
";

    #[test]
    fn test_organize_text_counts() {
        let (entries, report) = organize_text(SAMPLE).unwrap();

        assert_eq!(report.lines, 7);
        assert_eq!(report.envelopes, 6);
        assert_eq!(report.request_failures, 1);
        assert_eq!(report.unparsed_responses, 1);
        assert_eq!(report.ignored, 1);
        assert_eq!(report.entries, 4);

        let kinds: Vec<_> = entries.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["REQ", "RESP", "RESP", "RESP"]);
        assert_eq!(entries[2].data, json!(3));
        assert_eq!(entries[3].data, json!("oops"));
    }

    #[test]
    fn test_artifact_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cleaned_data.json");

        let entries = vec![ArtifactEntry {
            timestamp: "2025-09-02 08:17:50,493".to_string(),
            kind: "REQ".to_string(),
            data: json!({"takim_numarasi": 5, "durum": "çalışıyor"}),
        }];
        write_artifact(&path, &entries).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {\n        \"timestamp\""));
        assert!(text.contains("\"type\": \"REQ\""));
        assert!(text.contains("çalışıyor"));

        assert_eq!(read_artifact(&path).unwrap(), entries);
    }

    #[test]
    fn test_organize_roundtrip_into_store() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("flight.log");
        let output = dir.path().join("cleaned_data.json");
        fs::write(&input, SAMPLE).unwrap();

        let report = organize(&input, &output).unwrap();
        assert_eq!(report.entries, 4);

        let store = load_store(&output).unwrap();
        assert_eq!(store.list_ids(), vec![VehicleId(5), VehicleId(9)]);
        assert_eq!(store.records(VehicleId(9)).unwrap()[0].speed, Some(20.0));
    }

    #[test]
    fn test_ingest_log_matches_artifact_path() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("flight.log");
        fs::write(&input, SAMPLE).unwrap();

        let store = ingest_log(&input).unwrap();
        assert_eq!(store.vehicle_count(), 2);
        assert_eq!(store.record_count(), 2);
    }

    #[test]
    fn test_data_source_load() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("flight.log");
        let output = dir.path().join("cleaned_data.json");
        fs::write(&input, SAMPLE).unwrap();
        organize(&input, &output).unwrap();

        let from_log = DataSource::Log(input).load().unwrap();
        let from_artifact = DataSource::Artifact(output.clone()).load().unwrap();
        assert_eq!(from_log.list_ids(), from_artifact.list_ids());
        assert!(DataSource::Artifact(output).to_string().starts_with("artifact "));
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.log");

        let err = organize(&missing, dir.path().join("out.json")).unwrap_err();
        assert!(matches!(err, FlightLogError::InputMissing { .. }));

        let err = load_store(&missing).unwrap_err();
        assert!(matches!(err, FlightLogError::InputMissing { .. }));
    }

    #[test]
    fn test_malformed_artifact_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cleaned_data.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(load_store(&path), Err(FlightLogError::Json(_))));
    }

    #[test]
    fn test_store_skips_incomplete_entries() {
        let entries: Vec<ArtifactEntry> = serde_json::from_value(json!([
            {"type": "REQ", "data": {"takim_numarasi": 1}},
            {"timestamp": "2025-09-02 08:17:50,493", "type": "REQ"},
            {"timestamp": "2025-09-02 08:17:50,493", "type": "REQ", "data": {"takim_numarasi": 2}}
        ]))
        .unwrap();

        let store = store_from_entries(&entries);
        assert_eq!(store.list_ids(), vec![VehicleId(2)]);
    }

    #[test]
    fn test_null_timestamp_and_type_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cleaned_data.json");
        fs::write(
            &path,
            r#"[
    {"timestamp": null, "type": "REQ", "data": {"takim_numarasi": 1}},
    {"timestamp": "2025-09-02 08:17:50,400", "type": null, "data": {"takim_numarasi": 3}},
    {"timestamp": "2025-09-02 08:17:50,493", "type": "REQ", "data": {"takim_numarasi": 2}}
]"#,
        )
        .unwrap();

        let entries = read_artifact(&path).unwrap();
        assert_eq!(entries[0].timestamp, "");
        assert_eq!(entries[1].kind, "");

        let store = load_store(&path).unwrap();
        assert_eq!(store.list_ids(), vec![VehicleId(2)]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("flight.log");
        let mut bytes = b"\xff\xfe garbage\n".to_vec();
        bytes.extend_from_slice(b"2025-09-02 08:17:50,493 - INFO - REQ: {'takim_numarasi': 5}\n");
        fs::write(&input, bytes).unwrap();

        let store = ingest_log(&input).unwrap();
        assert_eq!(store.list_ids(), vec![VehicleId(5)]);
    }
}
