//! Error types for fichas-sync.

use std::path::PathBuf;

use thiserror::Error;

use fichas_core::ConfigError;
use fichas_extract::WorkbookError;

/// Failures at the remote-store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed during a listing.
    #[error("listing error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The remote path is empty or escapes the store root.
    #[error("invalid remote path `{0}`")]
    InvalidPath(String),

    /// No file at the remote path.
    #[error("remote file not found: {0}")]
    NotFound(String),

    /// The file was fetched but could not be decoded as a workbook.
    #[error("cannot read workbook {path}: {source}")]
    Workbook {
        path: String,
        #[source]
        source: WorkbookError,
    },
}

/// All errors that can abort a run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The current listing could not be obtained; reconciliation is impossible.
    #[error("failed to list remote files: {0}")]
    Listing(#[source] StoreError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing an in-memory CSV buffer failed.
    #[error("failed to encode {artifact}: {source}")]
    Encode {
        artifact: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
