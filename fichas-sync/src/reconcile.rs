//! Snapshot-vs-listing reconciliation.
//!
//! Full outer join on `unique_id`:
//!
//! | previous | current | timestamps            | partition    |
//! |----------|---------|-----------------------|--------------|
//! | yes      | no      | –                     | `to_search`  |
//! | no       | yes     | –                     | `to_add`     |
//! | yes      | yes     | previous < current    | `to_modify`  |
//! | yes      | yes     | previous == current   | `to_persist` |
//! | yes      | yes     | previous > current    | `to_modify` (regression, logged) |
//!
//! Pure function of its inputs; partitions follow listing order (snapshot
//! order for `to_search`).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use fichas_core::{FileRecord, ProjectCode, UniqueId};

/// A file remembered by the snapshot but missing from the current listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEntry {
    pub unique_id: UniqueId,
    pub code: Option<ProjectCode>,
    pub name: String,
    pub path: String,
}

/// The four disjoint partitions of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub to_search: Vec<SearchEntry>,
    pub to_add: Vec<FileRecord>,
    pub to_modify: Vec<FileRecord>,
    pub to_persist: Vec<FileRecord>,
    /// Ids whose remote timestamp went backwards; also present in `to_modify`.
    pub regressions: Vec<UniqueId>,
}

impl Reconciliation {
    /// Codes of vanished files that need manual follow-up.
    pub fn search_codes(&self) -> Vec<&ProjectCode> {
        self.to_search.iter().filter_map(|e| e.code.as_ref()).collect()
    }

    /// `true` when the listing was empty although the snapshot was not.
    /// That usually means the listing failed rather than a mass deletion.
    pub fn looks_like_listing_failure(&self) -> bool {
        !self.to_search.is_empty()
            && self.to_add.is_empty()
            && self.to_modify.is_empty()
            && self.to_persist.is_empty()
    }
}

/// Partition `current` against `previous` by unique id and timestamp.
///
/// Records in `to_add` start with no code and no closure form. Records in
/// `to_modify`/`to_persist` take name, path and timestamp from `current` and
/// carry `code`/`has_closure_form` forward from `previous`.
pub fn reconcile(previous: &[FileRecord], current: &[FileRecord]) -> Reconciliation {
    let mut prev_by_id: HashMap<&UniqueId, &FileRecord> = HashMap::with_capacity(previous.len());
    for record in previous {
        if prev_by_id.insert(&record.unique_id, record).is_some() {
            tracing::warn!(
                "duplicate unique id {} in snapshot; keeping the last row",
                record.unique_id
            );
        }
    }

    let mut result = Reconciliation::default();
    let mut seen: HashSet<&UniqueId> = HashSet::with_capacity(current.len());

    for cur in current {
        if !seen.insert(&cur.unique_id) {
            tracing::warn!("duplicate unique id {} in listing ({}); ignored", cur.unique_id, cur.path);
            continue;
        }
        let Some(prev) = prev_by_id.get(&cur.unique_id) else {
            let mut added = cur.clone();
            added.code = None;
            added.has_closure_form = false;
            result.to_add.push(added);
            continue;
        };

        let mut carried = cur.clone();
        carried.code = prev.code.clone();
        carried.has_closure_form = prev.has_closure_form;

        match prev.last_modified.cmp(&cur.last_modified) {
            Ordering::Less => result.to_modify.push(carried),
            Ordering::Equal => result.to_persist.push(carried),
            Ordering::Greater => {
                tracing::warn!(
                    "timestamp regressed for {} ({}): snapshot {} > listing {}; re-extracting",
                    cur.path,
                    cur.unique_id,
                    prev.last_modified.to_rfc3339(),
                    cur.last_modified.to_rfc3339()
                );
                result.regressions.push(cur.unique_id.clone());
                result.to_modify.push(carried);
            }
        }
    }

    let mut searched: HashSet<&UniqueId> = HashSet::new();
    for prev in previous {
        if seen.contains(&prev.unique_id) || !searched.insert(&prev.unique_id) {
            continue;
        }
        // Report the row the join kept for this id.
        let kept = prev_by_id.get(&prev.unique_id).copied().unwrap_or(prev);
        result.to_search.push(SearchEntry {
            unique_id: kept.unique_id.clone(),
            code: kept.code.clone(),
            name: kept.name.clone(),
            path: kept.path.clone(),
        });
    }

    if current.is_empty() && !previous.is_empty() {
        tracing::warn!(
            "remote listing is empty but the snapshot has {} file(s); all will be flagged for search",
            previous.len()
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn rec(id: &str, at: DateTime<Utc>) -> FileRecord {
        FileRecord::listed(id, format!("{id}.xlsx"), format!("/docs/{id}.xlsx"), at)
    }

    fn known(id: &str, at: DateTime<Utc>, code: &str) -> FileRecord {
        let mut r = rec(id, at);
        r.code = Some(ProjectCode::from(code));
        r.has_closure_form = true;
        r
    }

    #[test]
    fn duplicate_snapshot_ids_keep_last_row() {
        let previous = vec![known("a", t0(), "EDU1"), known("a", t0(), "EDU2")];
        let current = vec![rec("a", t0())];
        let r = reconcile(&previous, &current);
        assert_eq!(r.to_persist.len(), 1);
        assert_eq!(r.to_persist[0].code, Some(ProjectCode::from("EDU2")));
    }

    #[test]
    fn duplicate_snapshot_ids_search_once() {
        let previous = vec![known("a", t0(), "EDU1"), known("a", t0(), "EDU2")];
        let r = reconcile(&previous, &[]);
        assert_eq!(r.to_search.len(), 1);
        assert_eq!(r.to_search[0].code, Some(ProjectCode::from("EDU2")));
    }

    #[test]
    fn duplicate_listing_ids_are_ignored() {
        let current = vec![rec("a", t0()), rec("a", t0() + Duration::hours(1))];
        let r = reconcile(&[], &current);
        assert_eq!(r.to_add.len(), 1);
        assert_eq!(r.to_add[0].last_modified, t0());
    }

    #[test]
    fn listing_metadata_wins_for_carried_records() {
        let previous = vec![known("a", t0(), "EDU1")];
        let mut moved = rec("a", t0());
        moved.name = "renamed.xlsx".to_string();
        moved.path = "/docs/new/renamed.xlsx".to_string();
        let r = reconcile(&previous, &[moved]);
        assert_eq!(r.to_persist[0].name, "renamed.xlsx");
        assert_eq!(r.to_persist[0].path, "/docs/new/renamed.xlsx");
        assert_eq!(r.to_persist[0].code, Some(ProjectCode::from("EDU1")));
    }

    #[test]
    fn empty_listing_looks_like_a_failure() {
        let previous = vec![known("a", t0(), "EDU1")];
        assert!(reconcile(&previous, &[]).looks_like_listing_failure());
        assert!(!reconcile(&previous, &[rec("a", t0())]).looks_like_listing_failure());
        assert!(!reconcile(&[], &[]).looks_like_listing_failure());
    }
}
