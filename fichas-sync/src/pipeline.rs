//! Run pipeline shared by `fichas run` and `fichas diff`.
//!
//! 1. List the remote tree (fatal on failure).
//! 2. Load the previous snapshot (empty on failure, logged).
//! 3. Reconcile.
//! 4. Extract from new and modified files.
//! 5. Load the persisted closure table (empty on failure, logged) and merge.
//! 6. Write the closure table, then the snapshot.
//!
//! Nothing is written before step 6, so a failed run leaves the previous
//! snapshot authoritative. The snapshot is written last for the same reason.

use serde::Serialize;

use fichas_core::{FichasConfig, FileRecord};
use fichas_extract::FormExtractor;

use crate::batch::{process_batch, FetchFailure};
use crate::error::SyncError;
use crate::reconcile::{reconcile, Reconciliation, SearchEntry};
use crate::store::RemoteStore;
use crate::{closures, snapshot};

/// Options for a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Do everything except writing the two artifacts.
    pub dry_run: bool,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub listed: usize,
    pub to_search: Vec<SearchEntry>,
    pub added: usize,
    pub modified: usize,
    pub persisted: usize,
    pub regressions: usize,
    pub closures_extracted: usize,
    pub closure_records: usize,
    pub extraction_misses: usize,
    pub failures: Vec<FetchFailure>,
    /// The previous snapshot could not be loaded and a cold start was used.
    pub cold_start: bool,
    pub written: bool,
}

/// List, load and reconcile without fetching any content.
pub fn preview<S: RemoteStore + ?Sized>(
    store: &S,
    config: &FichasConfig,
) -> Result<Reconciliation, SyncError> {
    let (reconciliation, _, _) = reconcile_remote(store, config)?;
    Ok(reconciliation)
}

/// Execute a full run.
pub fn run<S: RemoteStore + ?Sized>(
    store: &S,
    config: &FichasConfig,
    options: RunOptions,
) -> Result<RunReport, SyncError> {
    let (reconciliation, listed, cold_start) = reconcile_remote(store, config)?;
    let Reconciliation {
        to_search,
        to_add,
        to_modify,
        to_persist,
        regressions,
    } = reconciliation;
    let (added, modified) = (to_add.len(), to_modify.len());

    let extractor = FormExtractor::from_config(config);
    let mut pending = to_add;
    pending.extend(to_modify);
    let batch = process_batch(store, &extractor, pending, config.worker_count())?;
    tracing::info!(
        "extracted {} closure form(s); {} file(s) not recognised, {} fetch failure(s)",
        batch.closures.len(),
        batch.misses,
        batch.failures.len()
    );

    let records_location = config.records_location();
    let previous_closures = closures::load(store, &records_location).unwrap_or_else(|e| {
        tracing::error!("failed to load closure records from {records_location}: {e}");
        Vec::new()
    });
    let closures_extracted = batch.closures.len();
    let merged = closures::merge(previous_closures, batch.closures);

    let persisted = to_persist.len();
    let mut next_snapshot: Vec<FileRecord> = to_persist;
    next_snapshot.extend(batch.records);

    let written = if options.dry_run {
        tracing::info!(
            "[dry-run] would write {} closure record(s) and {} snapshot row(s)",
            merged.len(),
            next_snapshot.len()
        );
        false
    } else {
        tracing::info!("saving closure records to {records_location}");
        closures::save(store, &records_location, &merged)?;
        let snapshot_location = config.snapshot_location();
        tracing::info!("saving snapshot to {snapshot_location}");
        snapshot::save(store, &snapshot_location, &next_snapshot)?;
        true
    };

    Ok(RunReport {
        listed,
        to_search,
        added,
        modified,
        persisted,
        regressions: regressions.len(),
        closures_extracted,
        closure_records: merged.len(),
        extraction_misses: batch.misses,
        failures: batch.failures,
        cold_start,
        written,
    })
}

/// Steps 1–3. Returns the reconciliation, the listing size and whether the
/// previous snapshot had to be replaced by an empty one.
fn reconcile_remote<S: RemoteStore + ?Sized>(
    store: &S,
    config: &FichasConfig,
) -> Result<(Reconciliation, usize, bool), SyncError> {
    config.validate()?;

    let snapshot_location = config.snapshot_location();
    let records_location = config.records_location();

    tracing::info!("listing {} {:?}", config.root_path, config.target_folders);
    let mut current = store
        .list_files(&config.root_path, &config.target_folders)
        .map_err(SyncError::Listing)?;
    // The artifacts may live inside a scanned folder; they are not inputs.
    current.retain(|r| r.path != snapshot_location && r.path != records_location);

    let (previous, cold_start) = match snapshot::load(store, &snapshot_location) {
        Ok(previous) => (previous, false),
        Err(e) => {
            tracing::warn!("failed to load snapshot from {snapshot_location}: {e}; starting cold");
            (Vec::new(), true)
        }
    };

    let reconciliation = reconcile(&previous, &current);
    let search_codes = reconciliation.search_codes();
    tracing::info!("files to search for: {} {:?}", reconciliation.to_search.len(), search_codes);
    tracing::info!("new files to add: {}", reconciliation.to_add.len());
    tracing::info!("files to modify: {}", reconciliation.to_modify.len());
    tracing::info!("unchanged files: {}", reconciliation.to_persist.len());
    if reconciliation.looks_like_listing_failure() {
        tracing::warn!("no listed file matches the snapshot; check the store before trusting this run");
    }

    Ok((reconciliation, current.len(), cold_start))
}
