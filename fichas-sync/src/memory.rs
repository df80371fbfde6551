//! In-memory [`RemoteStore`], for dry runs against fixtures and for tests.
//!
//! Files can hold raw bytes, an already-decoded [`Workbook`], or be marked
//! unreadable to simulate a failed fetch.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use fichas_core::{FileRecord, UniqueId};
use fichas_extract::{decode, is_spreadsheet, Workbook};

use crate::error::StoreError;
use crate::store::{listing_roots, RemoteStore};

#[derive(Debug, Clone)]
enum Content {
    Bytes(Vec<u8>),
    Workbook(Workbook),
    Unreadable,
}

#[derive(Debug, Clone)]
struct Entry {
    unique_id: UniqueId,
    last_modified: DateTime<Utc>,
    content: Content,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_bytes(
        &self,
        path: &str,
        unique_id: impl Into<UniqueId>,
        last_modified: DateTime<Utc>,
        bytes: Vec<u8>,
    ) {
        self.insert(path, unique_id.into(), last_modified, Content::Bytes(bytes));
    }

    pub fn insert_workbook(
        &self,
        path: &str,
        unique_id: impl Into<UniqueId>,
        last_modified: DateTime<Utc>,
        workbook: Workbook,
    ) {
        self.insert(path, unique_id.into(), last_modified, Content::Workbook(workbook));
    }

    /// A listed file whose content cannot be fetched.
    pub fn insert_unreadable(
        &self,
        path: &str,
        unique_id: impl Into<UniqueId>,
        last_modified: DateTime<Utc>,
    ) {
        self.insert(path, unique_id.into(), last_modified, Content::Unreadable);
    }

    pub fn remove(&self, path: &str) -> bool {
        self.lock().remove(path).is_some()
    }

    /// Raw bytes stored at `path`, if it holds bytes.
    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        match self.lock().get(path).map(|e| &e.content) {
            Some(Content::Bytes(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    fn insert(&self, path: &str, unique_id: UniqueId, last_modified: DateTime<Utc>, content: Content) {
        self.lock().insert(
            path.to_string(),
            Entry {
                unique_id,
                last_modified,
                content,
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteStore for MemoryStore {
    fn list_files(&self, root: &str, targets: &[String]) -> Result<Vec<FileRecord>, StoreError> {
        let files = self.lock();
        let mut listed = Vec::new();
        for folder in listing_roots(root, targets)? {
            let prefix = format!("{folder}/");
            for (path, entry) in files.range(prefix.clone()..) {
                if !path.starts_with(&prefix) {
                    break;
                }
                let name = path.rsplit('/').next().unwrap_or(path);
                if !is_spreadsheet(name) {
                    continue;
                }
                listed.push(FileRecord::listed(
                    entry.unique_id.clone(),
                    name,
                    path.clone(),
                    entry.last_modified,
                ));
            }
        }
        Ok(listed)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        match self.lock().get(path).map(|e| &e.content) {
            Some(Content::Bytes(bytes)) => Ok(bytes.clone()),
            Some(Content::Workbook(_)) | Some(Content::Unreadable) => Err(StoreError::Io {
                path: path.into(),
                source: std::io::Error::other("content is not readable as bytes"),
            }),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        if path.trim().is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        let unique_id = UniqueId::from(path);
        self.insert(path, unique_id, Utc::now(), Content::Bytes(bytes.to_vec()));
        Ok(())
    }

    fn read_workbook(&self, path: &str) -> Result<Workbook, StoreError> {
        let content = self.lock().get(path).map(|e| e.content.clone());
        match content {
            Some(Content::Workbook(workbook)) => Ok(workbook),
            Some(Content::Bytes(bytes)) => decode(path, bytes).map_err(|source| {
                StoreError::Workbook {
                    path: path.to_string(),
                    source,
                }
            }),
            Some(Content::Unreadable) => Err(StoreError::Io {
                path: path.into(),
                source: std::io::Error::other("simulated fetch failure"),
            }),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }
}
