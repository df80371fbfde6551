//! `fichas run`: reconcile, extract and persist.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use fichas_sync::{pipeline, RunOptions, RunReport};

use super::{load_config, open_store};

/// Arguments for `fichas run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Do everything except writing the snapshot and closure table.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let cfg = load_config(config_path)?;
        let store = open_store(&cfg);
        let options = RunOptions {
            dry_run: self.dry_run,
        };

        let report = pipeline::run(&store, &cfg, options).context("run failed")?;
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize run report")?
            );
            return Ok(());
        }
        print_report(&report, self.dry_run);
        Ok(())
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    println!(
        "{prefix}✓ {} file(s) listed: {} new, {} modified, {} unchanged, {} gone",
        report.listed,
        report.added,
        report.modified,
        report.persisted,
        report.to_search.len(),
    );
    println!(
        "  {} closure form(s) extracted, {} record(s) in the closure table",
        report.closures_extracted, report.closure_records
    );
    if report.extraction_misses > 0 {
        println!("  {} file(s) not recognised as a form", report.extraction_misses);
    }
    if report.cold_start {
        println!("  {}", "previous snapshot unavailable; started cold".yellow());
    }
    if report.regressions > 0 {
        println!(
            "  {}",
            format!("{} file(s) went back in time", report.regressions).yellow()
        );
    }

    for gone in &report.to_search {
        let code = gone.code.as_ref().map_or("-", |c| c.as_str());
        println!("  {}  {} ({})", "?".magenta(), gone.path, code);
    }
    for failure in &report.failures {
        println!("  {}  {}: {}", "✗".red(), failure.path, failure.error);
    }

    if dry_run {
        println!("{prefix}nothing written");
    } else if report.written {
        println!("  snapshot and closure table saved");
    }
}
