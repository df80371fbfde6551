pub mod diff;
pub mod extract;
pub mod init;
pub mod run;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use fichas_core::{config, FichasConfig};
use fichas_sync::LocalStore;

/// `--config` if given, otherwise `~/.fichas/config.yaml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => {
            let home = dirs::home_dir().context("could not determine home directory")?;
            Ok(config::config_path_at(&home))
        }
    }
}

/// Load and validate the config, pointing the user at `fichas init` on failure.
pub fn load_config(explicit: Option<&Path>) -> Result<FichasConfig> {
    let path = resolve_config_path(explicit)?;
    config::load(&path).with_context(|| {
        format!(
            "failed to load config from {}; run `fichas init` first",
            path.display()
        )
    })
}

pub fn open_store(config: &FichasConfig) -> LocalStore {
    LocalStore::new(&config.store_root)
}
