//! # fichas-sync
//!
//! Reconciles the remote folder tree against the last snapshot, extracts
//! closure forms from new and modified workbooks, and persists the updated
//! snapshot and closure table.
//!
//! Call [`pipeline::run`] for a full run or [`pipeline::preview`] to see the
//! reconciliation without fetching or writing anything.

pub mod batch;
pub mod closures;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod reconcile;
pub mod snapshot;
pub mod store;

pub use batch::{process_batch, BatchOutcome, FetchFailure};
pub use error::{StoreError, SyncError};
pub use memory::MemoryStore;
pub use pipeline::{RunOptions, RunReport};
pub use reconcile::{reconcile, Reconciliation, SearchEntry};
pub use store::{LocalStore, RemoteStore};
