//! Domain types for the Ripple registry.
//!
//! All filesystem locations use `PathBuf`; never `&str` or `String` for paths.
//! On-disk shapes are serializable via serde + serde_json.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Branch followed when neither the source string nor `--ref` names one.
pub const DEFAULT_REF: &str = "main";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a tracked project in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed full commit hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitId(pub String);

impl CommitId {
    /// Abbreviated form for display (first 10 bytes of a well-formed hash;
    /// anything shorter or non-sliceable is shown whole).
    pub fn short(&self) -> &str {
        self.0.get(..10).unwrap_or(&self.0)
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CommitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Source parsing
// ---------------------------------------------------------------------------

/// How a tracked source is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A clone-able URL (https, ssh, git protocol).
    RemoteUrl,
    /// A filesystem path to a sibling checkout; aliased, never cloned.
    LocalPath,
}

/// A raw source string split into its address and an optional embedded branch.
///
/// Accepts the `<address>/tree/<branch>` convention so a pasted web URL like
/// `https://host/org/repo/tree/main` tracks `main` without a separate flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub source: String,
    pub ref_name: Option<String>,
}

impl SourceSpec {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim_end_matches('/');
        if let Some(idx) = trimmed.rfind("/tree/") {
            let branch = &trimmed[idx + "/tree/".len()..];
            if !branch.is_empty() {
                return Self {
                    source: trimmed[..idx].to_owned(),
                    ref_name: Some(branch.to_owned()),
                };
            }
        }
        Self {
            source: trimmed.to_owned(),
            ref_name: None,
        }
    }
}

/// Classify a source address. Anything with a URL scheme or scp-style
/// `user@host:` prefix is remote; everything else is a filesystem path.
pub fn source_kind(source: &str) -> SourceKind {
    if source.contains("://") {
        return SourceKind::RemoteUrl;
    }
    if let Some(colon) = source.find(':') {
        let head = &source[..colon];
        if head.contains('@') && !head.contains('/') {
            return SourceKind::RemoteUrl;
        }
    }
    SourceKind::LocalPath
}

// ---------------------------------------------------------------------------
// Registry entries
// ---------------------------------------------------------------------------

/// One project's value in a registry file (shared or local override).
///
/// Every field is optional so the local override can carry a partial entry;
/// the merge in [`crate::registry`] fills gaps from the shared file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub ref_name: Option<String>,

    /// `null` until the first sync; serialized explicitly so the shared file
    /// shows the field to reviewers.
    #[serde(default)]
    pub sync_pointer: Option<CommitId>,

    /// Local-override-only in practice; bulk operations skip ignored projects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<bool>,
}

/// The merged, resolved view of one tracked project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    pub name: ProjectName,
    pub source: String,
    pub ref_name: String,
    pub sync_pointer: Option<CommitId>,
    pub ignore: bool,
}

impl ProjectDescriptor {
    /// `<root>/.ripple/refs/<name>` — the stable local address for this
    /// project's checkout or symlink alias. Derived, never persisted.
    pub fn alias_path(&self, root: &Path) -> PathBuf {
        crate::registry::refs_dir_at(root).join(&self.name.0)
    }

    pub fn source_kind(&self) -> SourceKind {
        source_kind(&self.source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
