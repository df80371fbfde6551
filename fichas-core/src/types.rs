//! Domain types for closure-form ingestion.
//!
//! Remote paths are server-relative strings (`/sites/…/file.xlsx`), not
//! `PathBuf`: they name locations in the remote store, never on local disk.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque stable identifier of a remote file; primary key across snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqueId(pub String);

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for UniqueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UniqueId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A project code as read from a closure workbook, already trimmed.
///
/// Holding a `ProjectCode` does not imply it passed validation: fallback
/// codes are kept even when they fail the prefix/length rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectCode(pub String);

impl ProjectCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One spreadsheet file in the remote tree, as listed or as remembered by the
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub unique_id: UniqueId,
    pub name: String,
    /// Server-relative path inside the remote store.
    pub path: String,
    pub last_modified: DateTime<Utc>,
    pub code: Option<ProjectCode>,
    pub has_closure_form: bool,
}

impl FileRecord {
    /// A freshly listed file: nothing is known about its content yet.
    pub fn listed(
        unique_id: impl Into<UniqueId>,
        name: impl Into<String>,
        path: impl Into<String>,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            name: name.into(),
            path: path.into(),
            last_modified,
            code: None,
            has_closure_form: false,
        }
    }
}

/// Closure-notes fields found on a closure sheet.
///
/// A field that was not found stays `None`; it is never an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenges: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation_actions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lessons_learned: Option<String>,
}

impl ClosureFields {
    pub fn is_empty(&self) -> bool {
        self.challenges.is_none() && self.mitigation_actions.is_none() && self.lessons_learned.is_none()
    }
}

/// Extracted closure notes, keyed by the code found in the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureRecord {
    pub code: ProjectCode,
    #[serde(flatten)]
    pub fields: ClosureFields,
}

impl ClosureRecord {
    pub fn new(code: ProjectCode, fields: ClosureFields) -> Self {
        Self { code, fields }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
