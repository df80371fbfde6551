//! `fichas init [--store-root <dir>] [--force]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use fichas_core::{config, FichasConfig};

use super::resolve_config_path;

/// Write a starter config.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Local directory backing the document library (defaults to the
    /// current directory).
    #[arg(long, value_name = "DIR")]
    pub store_root: Option<PathBuf>,

    /// Replace an existing config file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let path = resolve_config_path(config_path)?;
        let store_root = match self.store_root {
            Some(dir) => dir,
            None => std::env::current_dir().context("cannot resolve current directory")?,
        };
        let store_root = store_root
            .canonicalize()
            .with_context(|| format!("cannot resolve store root '{}'", store_root.display()))?;

        let cfg = FichasConfig::example(store_root);
        config::write(&path, &cfg, self.force)
            .with_context(|| format!("failed to write config to {}", path.display()))?;

        println!("✓ Wrote config to {}", path.display());
        println!("  Store root: {}", cfg.store_root.display());
        println!("  Edit root_path, target_folders and code_prefixes before running.");
        Ok(())
    }
}
