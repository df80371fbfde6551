//! Directory-backed store: listing, timestamps and artifact writes.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use filetime::{set_file_mtime, FileTime};
use fichas_core::FichasConfig;
use fichas_sync::{pipeline, store::unique_id_for, LocalStore, RemoteStore, RunOptions, StoreError};
use tempfile::TempDir;

fn touch(root: &Path, remote: &str, content: &[u8]) {
    let local = root.join(remote.trim_start_matches('/'));
    fs::create_dir_all(local.parent().expect("parent")).expect("mkdir");
    fs::write(local, content).expect("write");
}

#[test]
fn lists_spreadsheets_recursively_in_sorted_order() {
    let tmp = TempDir::new().expect("tmp");
    touch(tmp.path(), "/lib/2. Gestión/b.xlsx", b"");
    touch(tmp.path(), "/lib/2. Gestión/sub/a.CSV", b"");
    touch(tmp.path(), "/lib/2. Gestión/readme.txt", b"");
    touch(tmp.path(), "/lib/3. Cerrados/c.xlsm", b"");
    touch(tmp.path(), "/lib/other/d.xlsx", b"");

    let store = LocalStore::new(tmp.path());
    let listed = store
        .list_files("/lib", &["2. Gestión".to_string(), "/3. Cerrados".to_string()])
        .expect("list");
    let paths: Vec<_> = listed.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/lib/2. Gestión/b.xlsx",
            "/lib/2. Gestión/sub/a.CSV",
            "/lib/3. Cerrados/c.xlsm",
        ]
    );
    assert_eq!(listed[1].name, "a.CSV");
    assert_eq!(listed[0].unique_id, unique_id_for("/lib/2. Gestión/b.xlsx"));
    assert!(listed.iter().all(|r| r.code.is_none() && !r.has_closure_form));

    let everything = store.list_files("/lib/", &[]).expect("list all");
    assert_eq!(everything.len(), 4);
}

#[test]
fn last_modified_follows_file_mtime() {
    let tmp = TempDir::new().expect("tmp");
    touch(tmp.path(), "/lib/a.xlsx", b"");
    let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    set_file_mtime(tmp.path().join("lib/a.xlsx"), FileTime::from_system_time(when)).expect("mtime");

    let listed = LocalStore::new(tmp.path()).list_files("/lib", &[]).expect("list");
    assert_eq!(listed[0].last_modified, DateTime::<Utc>::from(when));
}

#[test]
fn missing_target_folder_fails_the_listing() {
    let tmp = TempDir::new().expect("tmp");
    touch(tmp.path(), "/lib/2. Gestión/a.xlsx", b"");
    let err = LocalStore::new(tmp.path())
        .list_files("/lib", &["2. Gestión".to_string(), "9. Missing".to_string()])
        .expect_err("should fail");
    assert!(matches!(err, StoreError::Io { .. }), "got {err:?}");
}

#[test]
fn csv_inputs_run_end_to_end_on_disk() {
    let tmp = TempDir::new().expect("tmp");
    touch(tmp.path(), "/lib/2. Gestión/export.csv", b"Retos,x\n");

    let mut cfg = FichasConfig::example(tmp.path().to_path_buf());
    cfg.root_path = "/lib".to_string();
    cfg.target_folders = vec!["2. Gestión".to_string()];
    cfg.snapshot_path = "state/observados.csv".to_string();
    cfg.records_path = "state/fichas.csv".to_string();

    let store = LocalStore::new(&cfg.store_root);
    let report = pipeline::run(&store, &cfg, RunOptions::default()).expect("run");
    assert_eq!(report.added, 1);
    assert_eq!(report.extraction_misses, 1);

    let snapshot = fs::read_to_string(tmp.path().join("lib/state/observados.csv")).expect("snapshot");
    assert!(snapshot.contains("/lib/2. Gestión/export.csv"));
    assert!(!tmp.path().join("lib/state/observados.csv.fichas.tmp").exists());

    let report = pipeline::run(&store, &cfg, RunOptions::default()).expect("second run");
    assert_eq!((report.added, report.persisted), (0, 1));
}
