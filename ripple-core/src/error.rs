//! Error types for ripple-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ProjectName;

/// All errors that can arise from registry and session-state operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error (write/save path).
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON parse error on load — includes the offending file path.
    #[error("failed to parse registry at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The project name is absent from both registry files.
    #[error("unknown project '{name}'; run `ripple setup {name} <source>` first")]
    UnknownProject { name: ProjectName },

    /// A merged entry has no `source` in either file.
    #[error("project '{name}' has no source in the shared or local registry")]
    MissingSource { name: ProjectName },
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
