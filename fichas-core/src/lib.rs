//! Fichas core library: domain types, configuration, text normalization and
//! project-code validation.
//!
//! - [`types`]: file records, closure records and their newtypes
//! - [`config`]: [`FichasConfig`] load / validate / write-default
//! - [`normalize`]: [`TextNormalizer`] for sheet names and field labels
//! - [`code`]: [`CodeValidator`]
//! - [`error`]: [`ConfigError`]

pub mod code;
pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use code::CodeValidator;
pub use config::FichasConfig;
pub use error::ConfigError;
pub use normalize::TextNormalizer;
pub use types::{ClosureFields, ClosureRecord, FileRecord, ProjectCode, UniqueId};
