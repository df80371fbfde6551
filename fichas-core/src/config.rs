//! Explicit run configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.fichas/
//!   config.yaml   (written by `fichas init`, mode 0600)
//! ```
//!
//! # API pattern
//!
//! As with every home-relative helper in this workspace, functions come in
//! two forms: `fn_at(home: &Path, …)` for tests with `TempDir`, and `fn(…)`
//! which derives home from `dirs::home_dir()`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

/// Default minimum length a project code must exceed.
pub const DEFAULT_MIN_CODE_LENGTH: usize = 4;

/// Everything a run needs to know, threaded explicitly into the normalizer,
/// validator, extractor and pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FichasConfig {
    /// Server-relative root of the document library.
    #[serde(default)]
    pub root_path: String,
    /// Subfolders of `root_path` to scan; empty means the whole root.
    #[serde(default)]
    pub target_folders: Vec<String>,
    /// Snapshot artifact, relative to `root_path`.
    #[serde(default)]
    pub snapshot_path: String,
    /// Closure-records artifact, relative to `root_path`.
    #[serde(default)]
    pub records_path: String,
    #[serde(default)]
    pub code_prefixes: Vec<String>,
    #[serde(default = "default_min_code_length")]
    pub min_code_length: usize,
    /// Folding table, applied in the order it is written.
    #[serde(default = "default_character_replacements", with = "ordered_table")]
    pub character_replacements: Vec<(String, String)>,
    /// Worker-pool size for fetches; defaults to available parallelism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,
    /// Local directory backing the document store.
    #[serde(default)]
    pub store_root: PathBuf,
}

fn default_min_code_length() -> usize {
    DEFAULT_MIN_CODE_LENGTH
}

/// Spanish accent folding used when the config does not provide a table.
pub fn default_character_replacements() -> Vec<(String, String)> {
    [
        ("á", "a"),
        ("é", "e"),
        ("í", "i"),
        ("ó", "o"),
        ("ú", "u"),
        ("ü", "u"),
        ("ñ", "n"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

impl FichasConfig {
    /// A starter configuration, written by `fichas init`.
    pub fn example(store_root: PathBuf) -> Self {
        Self {
            root_path: "/sites/Proyectos/Documentos compartidos".to_string(),
            target_folders: vec![
                "2. Gestión de Proyecto".to_string(),
                "3. Proyectos cerrados".to_string(),
            ],
            snapshot_path: "6. Monitoreo/Fichas de Cierre/Archivos Observados.csv".to_string(),
            records_path: "6. Monitoreo/Fichas de Cierre/Banco de Fichas de Cierre.csv"
                .to_string(),
            code_prefixes: vec!["EDU".to_string(), "GEO".to_string(), "INF".to_string()],
            min_code_length: DEFAULT_MIN_CODE_LENGTH,
            character_replacements: default_character_replacements(),
            parallelism: None,
            store_root,
        }
    }

    /// Check required settings. Called by [`load`]; call it yourself when
    /// building a config in code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_path.trim().is_empty() {
            return Err(ConfigError::Missing("root_path"));
        }
        if self.snapshot_path.trim().is_empty() {
            return Err(ConfigError::Missing("snapshot_path"));
        }
        if self.records_path.trim().is_empty() {
            return Err(ConfigError::Missing("records_path"));
        }
        if self.snapshot_path.trim() == self.records_path.trim() {
            return Err(ConfigError::Invalid {
                field: "records_path",
                reason: "must differ from snapshot_path".to_string(),
            });
        }
        if self.code_prefixes.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::Missing("code_prefixes"));
        }
        if self.store_root.as_os_str().is_empty() {
            return Err(ConfigError::Missing("store_root"));
        }
        if self.parallelism == Some(0) {
            return Err(ConfigError::Invalid {
                field: "parallelism",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Full server-relative location of the snapshot artifact.
    pub fn snapshot_location(&self) -> String {
        join_remote(&self.root_path, &self.snapshot_path)
    }

    /// Full server-relative location of the closure-records artifact.
    pub fn records_location(&self) -> String {
        join_remote(&self.root_path, &self.records_path)
    }

    /// Number of concurrent fetch workers.
    pub fn worker_count(&self) -> usize {
        self.parallelism.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Join two server-relative path fragments with exactly one `/`.
pub fn join_remote(base: &str, child: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        child.trim_start_matches('/')
    )
}

/// A YAML mapping read into, and written from, a list of pairs so that
/// document order survives.
mod ordered_table {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        table: &[(String, String)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(table.len()))?;
        for (from, to) in table {
            map.serialize_entry(from, to)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, String)>, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of replacement strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut table = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, String>()? {
                    table.push(entry);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.fichas/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".fichas").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// Load / write
// ---------------------------------------------------------------------------

/// Load and validate the config at `path`.
pub fn load(path: &Path) -> Result<FichasConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config: FichasConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.validate()?;
    Ok(config)
}

/// Load `<home>/.fichas/config.yaml`.
pub fn load_at(home: &Path) -> Result<FichasConfig, ConfigError> {
    load(&config_path_at(home))
}

/// Atomically write `config` to `path` (`.tmp` sibling + rename).
///
/// Refuses to replace an existing file unless `force` is set.
pub fn write(path: &Path, config: &FichasConfig, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let yaml = format!("{CONFIG_HEADER}{}", serde_yaml::to_string(config)?);
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

const CONFIG_HEADER: &str = "\
# fichas configuration
#
# root_path       server-relative root of the document library
# target_folders  subfolders of root_path to scan (empty = whole root)
# snapshot_path   observed-files artifact, relative to root_path
# records_path    closure-records artifact, relative to root_path
# store_root      local directory that backs the document library
";

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
