//! Error types for fichas-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while locating, parsing or validating the configuration.
///
/// All of these are fatal: a run never touches the store without a valid
/// configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading or writing the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file does not exist.
    #[error("config not found at {path}; run `fichas init` first")]
    NotFound { path: PathBuf },

    /// A required setting is absent or empty.
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    /// A setting is present but unusable.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or pass --config")]
    HomeNotFound,

    /// Refused to overwrite an existing config file.
    #[error("config already exists at {path}; pass --force to overwrite")]
    AlreadyExists { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
