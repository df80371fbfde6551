//! Batch extraction over new and modified files.
//!
//! Fetch-and-decode runs on a bounded rayon pool, one task per file; the
//! indexed `collect` writes each result into its own slot, so no accumulator
//! is shared between workers. Extraction then runs sequentially over the
//! decoded workbooks.

use rayon::prelude::*;
use serde::Serialize;

use fichas_core::{ClosureRecord, FileRecord, UniqueId};
use fichas_extract::FormExtractor;

use crate::error::SyncError;
use crate::store::RemoteStore;

/// A file whose content could not be fetched or decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub unique_id: UniqueId,
    pub path: String,
    pub error: String,
}

/// Result of [`process_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Same length and order as the input.
    pub records: Vec<FileRecord>,
    /// One per file with a recognised closure sheet; order insignificant.
    pub closures: Vec<ClosureRecord>,
    pub failures: Vec<FetchFailure>,
    /// Files that were fetched but are not recognisable closure forms.
    pub misses: usize,
}

/// Fetch every record's workbook with `workers` threads and extract from it.
///
/// Records are updated in place: a found code replaces `code`, a found
/// closure sheet sets `has_closure_form`. Records whose fetch or extraction
/// fails are returned unchanged. A single failure never aborts the batch.
pub fn process_batch<S>(
    store: &S,
    extractor: &FormExtractor,
    mut records: Vec<FileRecord>,
    workers: usize,
) -> Result<BatchOutcome, SyncError>
where
    S: RemoteStore + ?Sized,
{
    if records.is_empty() {
        return Ok(BatchOutcome::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("fichas-fetch-{i}"))
        .build()?;
    let fetched: Vec<_> = pool.install(|| {
        records
            .par_iter()
            .map(|record| store.read_workbook(&record.path))
            .collect()
    });

    let mut closures = Vec::new();
    let mut failures = Vec::new();
    let mut misses = 0;

    for (record, workbook) in records.iter_mut().zip(fetched) {
        let workbook = match workbook {
            Ok(workbook) => workbook,
            Err(err) => {
                tracing::warn!("failed to fetch {}: {err}", record.path);
                failures.push(FetchFailure {
                    unique_id: record.unique_id.clone(),
                    path: record.path.clone(),
                    error: err.to_string(),
                });
                continue;
            }
        };

        let Some(extraction) = extractor.extract(&workbook) else {
            tracing::debug!("not a closure form: {}", record.path);
            misses += 1;
            continue;
        };
        if let Some(closure) = extraction.closure_record() {
            record.has_closure_form = true;
            closures.push(closure);
        }
        tracing::debug!("{} -> {}", record.path, extraction.code);
        record.code = Some(extraction.code);
    }

    Ok(BatchOutcome {
        records,
        closures,
        failures,
        misses,
    })
}
