//! `fichas diff`: show the reconciliation without fetching or writing.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use fichas_core::FileRecord;
use fichas_sync::pipeline;

use super::{load_config, open_store};

/// Arguments for `fichas diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Also list unchanged files.
    #[arg(long)]
    pub all: bool,
}

impl DiffArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let cfg = load_config(config_path)?;
        let store = open_store(&cfg);
        let rec = pipeline::preview(&store, &cfg).context("diff failed")?;

        if rec.to_search.is_empty() && rec.to_add.is_empty() && rec.to_modify.is_empty() {
            println!("No differences ({} unchanged).", rec.to_persist.len());
            return Ok(());
        }

        for entry in &rec.to_search {
            let code = entry.code.as_ref().map_or("-", |c| c.as_str());
            println!("{} {} ({code})", "-".red(), entry.path);
        }
        print_records("+".green().to_string(), &rec.to_add);
        print_records("~".yellow().to_string(), &rec.to_modify);
        if self.all {
            print_records("·".bright_black().to_string(), &rec.to_persist);
        }

        println!(
            "{} gone, {} new, {} modified, {} unchanged",
            rec.to_search.len(),
            rec.to_add.len(),
            rec.to_modify.len(),
            rec.to_persist.len()
        );
        Ok(())
    }
}

fn print_records(marker: String, records: &[FileRecord]) {
    for r in records {
        println!("{marker} {}", r.path);
    }
}
