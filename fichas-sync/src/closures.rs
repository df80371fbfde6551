//! Closure-records artifact: one row per project code.
//!
//! CSV with header `code,challenges,mitigation_actions,lessons_learned`.
//! Line breaks inside free text are written as the two characters `\n` so
//! every record stays on one physical line.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use fichas_core::{ClosureFields, ClosureRecord, ProjectCode};

use crate::error::SyncError;
use crate::store::RemoteStore;

#[derive(Debug, Serialize, Deserialize)]
struct ClosureRow {
    code: String,
    challenges: Option<String>,
    mitigation_actions: Option<String>,
    lessons_learned: Option<String>,
}

impl From<&ClosureRecord> for ClosureRow {
    fn from(r: &ClosureRecord) -> Self {
        let escape = |v: &Option<String>| v.as_deref().map(escape_line_breaks);
        Self {
            code: r.code.0.clone(),
            challenges: escape(&r.fields.challenges),
            mitigation_actions: escape(&r.fields.mitigation_actions),
            lessons_learned: escape(&r.fields.lessons_learned),
        }
    }
}

impl From<ClosureRow> for ClosureRecord {
    fn from(row: ClosureRow) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        ClosureRecord::new(
            ProjectCode(row.code),
            ClosureFields {
                challenges: present(row.challenges),
                mitigation_actions: present(row.mitigation_actions),
                lessons_learned: present(row.lessons_learned),
            },
        )
    }
}

/// Replace `\r\n` and `\n` with a literal backslash-n. Idempotent.
pub fn escape_line_breaks(value: &str) -> String {
    value.replace("\r\n", "\\n").replace('\n', "\\n")
}

/// Combine the persisted table with freshly extracted records.
///
/// Records are keyed by code; a later record replaces an earlier one in
/// place, so fresh extractions override stale rows and duplicate codes within
/// either input collapse to the last occurrence.
pub fn merge(
    previous: Vec<ClosureRecord>,
    fresh: impl IntoIterator<Item = ClosureRecord>,
) -> Vec<ClosureRecord> {
    let mut merged: Vec<ClosureRecord> = Vec::with_capacity(previous.len());
    let mut index: HashMap<ProjectCode, usize> = HashMap::new();
    for record in previous.into_iter().chain(fresh) {
        match index.get(&record.code) {
            Some(&i) => {
                tracing::debug!("closure record {} replaced", record.code);
                merged[i] = record;
            }
            None => {
                index.insert(record.code.clone(), merged.len());
                merged.push(record);
            }
        }
    }
    merged
}

pub fn encode(records: &[ClosureRecord]) -> Result<Vec<u8>, SyncError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        for record in records {
            writer.serialize(ClosureRow::from(record))?;
        }
        writer.flush().map_err(|source| SyncError::Encode {
            artifact: "closure records",
            source,
        })?;
    }
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<ClosureRecord>, SyncError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut records = Vec::new();
    for row in reader.deserialize::<ClosureRow>() {
        records.push(ClosureRecord::from(row?));
    }
    Ok(records)
}

pub fn load<S: RemoteStore + ?Sized>(store: &S, location: &str) -> Result<Vec<ClosureRecord>, SyncError> {
    let bytes = store.read_file(location)?;
    decode(&bytes)
}

pub fn save<S: RemoteStore + ?Sized>(
    store: &S,
    location: &str,
    records: &[ClosureRecord],
) -> Result<(), SyncError> {
    let bytes = encode(records)?;
    store.write_file(location, &bytes)?;
    Ok(())
}
