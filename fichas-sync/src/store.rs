//! Remote document-store capability and its directory-backed implementation.
//!
//! The pipeline only ever talks to a [`RemoteStore`]; it never assumes how
//! files are actually stored. [`LocalStore`] maps server-relative paths
//! (`/sites/Proyectos/Docs/a.xlsx`) onto a local directory, e.g. a synced
//! copy of the document library.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use fichas_core::{config::join_remote, FileRecord, UniqueId};
use fichas_extract::{decode, is_spreadsheet, Workbook};

use crate::error::{io_err, StoreError};

/// Capabilities the pipeline needs from a document store.
///
/// Implementations must be shareable across the fetch worker pool.
pub trait RemoteStore: Send + Sync {
    /// Recursively list spreadsheet files under `root`, or under each of
    /// `targets` (relative to `root`) when any are given.
    ///
    /// Listed records carry no code and no closure flag.
    fn list_files(&self, root: &str, targets: &[String]) -> Result<Vec<FileRecord>, StoreError>;

    /// Raw content of the file at `path`.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Create or overwrite the file at `path`.
    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Fetch and decode the workbook at `path`.
    fn read_workbook(&self, path: &str) -> Result<Workbook, StoreError> {
        let bytes = self.read_file(path)?;
        decode(path, bytes).map_err(|source| StoreError::Workbook {
            path: path.to_string(),
            source,
        })
    }
}

/// Expand `root` + `targets` into the folders to list.
pub fn listing_roots(root: &str, targets: &[String]) -> Result<Vec<String>, StoreError> {
    if root.trim().is_empty() {
        return Err(StoreError::InvalidPath(root.to_string()));
    }
    if targets.is_empty() {
        return Ok(vec![root.trim_end_matches('/').to_string()]);
    }
    Ok(targets.iter().map(|t| join_remote(root, t)).collect())
}

// ---------------------------------------------------------------------------
// LocalStore
// ---------------------------------------------------------------------------

/// Directory-backed store.
///
/// A file's unique id is the SHA-256 of its server-relative path, so it is
/// stable across runs for as long as the file is not moved.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a server-relative path onto the local directory.
    ///
    /// Rejects empty paths and any `..` component.
    fn resolve(&self, remote: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(remote.trim_start_matches('/'));
        if remote.trim().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(StoreError::InvalidPath(remote.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn list_folder(&self, folder: &str, out: &mut Vec<FileRecord>) -> Result<(), StoreError> {
        let dir = self.resolve(folder)?;
        if !dir.is_dir() {
            return Err(io_err(
                &dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "folder not found"),
            ));
        }

        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_spreadsheet(&name) {
                continue;
            }
            let relative = entry.path().strip_prefix(&dir).unwrap_or(entry.path());
            let remote = join_remote(folder, &to_remote_path(relative));
            let modified = entry
                .metadata()?
                .modified()
                .map_err(|e| io_err(entry.path(), e))?;

            out.push(FileRecord::listed(
                unique_id_for(&remote),
                name,
                remote,
                DateTime::<Utc>::from(modified),
            ));
        }
        Ok(())
    }
}

impl RemoteStore for LocalStore {
    fn list_files(&self, root: &str, targets: &[String]) -> Result<Vec<FileRecord>, StoreError> {
        let mut files = Vec::new();
        for folder in listing_roots(root, targets)? {
            tracing::debug!("listing {folder}");
            self.list_folder(&folder, &mut files)?;
        }
        Ok(files)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let local = self.resolve(path)?;
        match std::fs::read(&local) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(io_err(local, e)),
        }
    }

    /// Writes `<path>.fichas.tmp` and renames it over `path`, so readers never
    /// see a half-written artifact.
    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let local = self.resolve(path)?;
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let tmp = PathBuf::from(format!("{}.fichas.tmp", local.display()));
        std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &local) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(local, e));
        }
        tracing::info!("wrote: {path}");
        Ok(())
    }
}

/// Stable id for a server-relative path.
pub fn unique_id_for(remote: &str) -> UniqueId {
    let mut h = Sha256::new();
    h.update(remote.as_bytes());
    UniqueId(hex::encode(h.finalize()))
}

fn to_remote_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
