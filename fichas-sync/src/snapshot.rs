//! Snapshot artifact: the table of previously observed files.
//!
//! CSV with header
//! `unique_id,time_last_modified,code,has_closure_form,name,path`.
//! The snapshot is overwritten wholesale on every successful run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fichas_core::{FileRecord, ProjectCode, UniqueId};

use crate::error::SyncError;
use crate::store::RemoteStore;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRow {
    unique_id: String,
    time_last_modified: DateTime<Utc>,
    code: Option<String>,
    has_closure_form: bool,
    name: String,
    path: String,
}

impl From<&FileRecord> for SnapshotRow {
    fn from(r: &FileRecord) -> Self {
        Self {
            unique_id: r.unique_id.0.clone(),
            time_last_modified: r.last_modified,
            code: r.code.as_ref().map(|c| c.0.clone()),
            has_closure_form: r.has_closure_form,
            name: r.name.clone(),
            path: r.path.clone(),
        }
    }
}

impl From<SnapshotRow> for FileRecord {
    fn from(row: SnapshotRow) -> Self {
        Self {
            unique_id: UniqueId(row.unique_id),
            name: row.name,
            path: row.path,
            last_modified: row.time_last_modified,
            code: row
                .code
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .map(ProjectCode),
            has_closure_form: row.has_closure_form,
        }
    }
}

pub fn encode(records: &[FileRecord]) -> Result<Vec<u8>, SyncError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        for record in records {
            writer.serialize(SnapshotRow::from(record))?;
        }
        writer.flush().map_err(|source| SyncError::Encode {
            artifact: "snapshot",
            source,
        })?;
    }
    Ok(buf)
}

/// Parse a snapshot, collapsing duplicate ids (last row wins) so the
/// uniqueness invariant holds for everything downstream.
pub fn decode(bytes: &[u8]) -> Result<Vec<FileRecord>, SyncError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut records: Vec<FileRecord> = Vec::new();
    let mut index: HashMap<UniqueId, usize> = HashMap::new();
    for row in reader.deserialize::<SnapshotRow>() {
        let record = FileRecord::from(row?);
        match index.get(&record.unique_id) {
            Some(&i) => {
                tracing::warn!("duplicate unique id {} in snapshot; keeping the last row", record.unique_id);
                records[i] = record;
            }
            None => {
                index.insert(record.unique_id.clone(), records.len());
                records.push(record);
            }
        }
    }
    Ok(records)
}

/// Load the snapshot at `location`.
pub fn load<S: RemoteStore + ?Sized>(store: &S, location: &str) -> Result<Vec<FileRecord>, SyncError> {
    let bytes = store.read_file(location)?;
    decode(&bytes)
}

/// Overwrite the snapshot at `location`.
pub fn save<S: RemoteStore + ?Sized>(
    store: &S,
    location: &str,
    records: &[FileRecord],
) -> Result<(), SyncError> {
    let bytes = encode(records)?;
    store.write_file(location, &bytes)?;
    Ok(())
}
