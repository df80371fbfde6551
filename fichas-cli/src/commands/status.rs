//! `fichas status`: what the persisted snapshot currently says.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use fichas_core::FileRecord;
use fichas_sync::{snapshot, RemoteStore, StoreError, SyncError};

use super::{load_config, open_store};

/// Arguments for `fichas status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let cfg = load_config(config_path)?;
        let store = open_store(&cfg);
        let location = cfg.snapshot_location();

        let records = match load_snapshot(&store, &location)? {
            Some(records) => records,
            None => {
                if self.json {
                    print_json(Vec::new())?;
                } else {
                    println!("No snapshot at {location}. Run `fichas run` first.");
                }
                return Ok(());
            }
        };

        if self.json {
            print_json(records)?;
            return Ok(());
        }
        print_table(&location, records);
        Ok(())
    }
}

/// `None` when no snapshot has been written yet.
fn load_snapshot<S: RemoteStore>(store: &S, location: &str) -> Result<Option<Vec<FileRecord>>> {
    match snapshot::load(store, location) {
        Ok(records) => Ok(Some(records)),
        Err(SyncError::Store(StoreError::NotFound(_))) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to load snapshot from {location}")),
    }
}

#[derive(Serialize)]
struct StatusJson {
    summary: SummaryJson,
    files: Vec<FileRecord>,
}

#[derive(Serialize)]
struct SummaryJson {
    files: usize,
    with_code: usize,
    with_closure_form: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "code")]
    code: String,
    #[tabled(rename = "closure form")]
    closure_form: String,
    #[tabled(rename = "last modified")]
    last_modified: String,
}

fn summarize(records: &[FileRecord]) -> SummaryJson {
    SummaryJson {
        files: records.len(),
        with_code: records.iter().filter(|r| r.code.is_some()).count(),
        with_closure_form: records.iter().filter(|r| r.has_closure_form).count(),
    }
}

fn print_json(records: Vec<FileRecord>) -> Result<()> {
    let payload = StatusJson {
        summary: summarize(&records),
        files: records,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(location: &str, records: Vec<FileRecord>) {
    let summary = summarize(&records);
    println!(
        "fichas v{} | {} files | {} with code | {} closure forms",
        env!("CARGO_PKG_VERSION"),
        summary.files,
        summary.with_code,
        summary.with_closure_form,
    );
    println!("{}", location.bright_black());

    if records.is_empty() {
        println!("Snapshot is empty.");
        return;
    }

    let rows: Vec<StatusTableRow> = records
        .into_iter()
        .map(|r| StatusTableRow {
            name: r.name,
            code: r.code.map_or_else(|| "-".to_string(), |c| c.0),
            closure_form: if r.has_closure_form {
                "■".green().bold().to_string()
            } else {
                "■".bright_black().to_string()
            },
            last_modified: format_timestamp(r.last_modified),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}
