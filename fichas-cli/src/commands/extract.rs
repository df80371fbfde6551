//! `fichas extract <file>`: run the form extractor on a local workbook.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use fichas_extract::{decode, FormExtractor};

use super::load_config;

/// Arguments for `fichas extract`.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Workbook to inspect (.xlsx, .xlsm, .xls or .csv).
    pub file: PathBuf,
}

impl ExtractArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let cfg = load_config(config_path)?;
        let bytes = std::fs::read(&self.file)
            .with_context(|| format!("cannot read '{}'", self.file.display()))?;
        let name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let workbook = decode(&name, bytes)
            .with_context(|| format!("cannot decode '{}'", self.file.display()))?;

        eprintln!("sheets: {}", workbook.sheet_names().join(", "));
        match FormExtractor::from_config(&cfg).extract(&workbook) {
            Some(extraction) => println!(
                "{}",
                serde_json::to_string_pretty(&extraction)
                    .context("failed to serialize extraction")?
            ),
            None => println!("✗ '{}' is not a closure form", self.file.display()),
        }
        Ok(())
    }
}

