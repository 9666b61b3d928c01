//! Error types for ripple-git.

use std::path::PathBuf;

use thiserror::Error;

use ripple_core::error::ConfigError;
use ripple_core::types::{CommitId, ProjectName};

/// Coarse classification used for exit-code mapping at the CLI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitErrorKind {
    /// Missing path, not a repository, clone/fetch failure.
    Checkout,
    /// A commit id that is not reachable in the current checkout.
    NotFound,
    /// A pointer or tip that contradicts the repository state.
    Consistency,
    /// Registry/session configuration problem (delegated to [`ConfigError`]).
    Config,
}

/// All errors that can arise from checkout, range, and advance operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// An error from the registry or session store.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The source path for a local project does not exist.
    #[error("source path for '{name}' does not exist: {path}")]
    MissingSourcePath { name: ProjectName, path: PathBuf },

    /// The source or alias path exists but holds no git repository.
    #[error("'{name}' is not a git repository: {path}")]
    NotARepository { name: ProjectName, path: PathBuf },

    /// The alias slot is occupied by something ripple did not create.
    #[error("alias path for '{name}' is obstructed by a non-symlink: {path}")]
    AliasObstructed { name: ProjectName, path: PathBuf },

    /// Clone or fetch failed (network, auth, bad URL).
    #[error("checkout failed for '{name}': {reason}")]
    Checkout { name: ProjectName, reason: String },

    /// The tracked ref could not be resolved to a commit.
    #[error("ref '{ref_name}' not found in checkout of '{name}'")]
    RefNotFound { name: ProjectName, ref_name: String },

    /// A commit id that is not reachable from the current tip.
    #[error("commit {commit} is not reachable from tip {tip} in '{name}'")]
    CommitNotFound {
        name: ProjectName,
        commit: CommitId,
        tip: CommitId,
    },

    /// The stored sync pointer is no longer reachable from the current tip
    /// (e.g. upstream history was rewritten). Never silently reset.
    #[error(
        "sync pointer {pointer} for '{name}' is not reachable from tip {tip}; \
         upstream history may have been rewritten — fix the registry entry by hand"
    )]
    UnreachablePointer {
        name: ProjectName,
        pointer: CommitId,
        tip: CommitId,
    },

    /// A supplied tip that the current local ref tip does not contain.
    #[error(
        "tip {tip} for '{name}' is not reachable from the current '{ref_name}' tip; \
         the checkout is stale or mismatched"
    )]
    StaleTip {
        name: ProjectName,
        tip: CommitId,
        ref_name: String,
    },

    /// An advance that would move the pointer backwards.
    #[error(
        "refusing to move sync pointer for '{name}' from {pointer} to non-descendant {tip}"
    )]
    NonMonotonic {
        name: ProjectName,
        pointer: CommitId,
        tip: CommitId,
    },

    /// No tip was captured for the project in the current session.
    #[error("no tip captured for '{name}'; run `ripple log {name}` before mark-synced")]
    NoCapturedTip { name: ProjectName },

    /// An unclassified libgit2 failure.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GitError {
    /// Classify for exit-code mapping. Unclassified git/IO failures count as
    /// checkout problems: they surface from the same fetch/open paths.
    pub fn kind(&self) -> GitErrorKind {
        match self {
            GitError::Config(_) => GitErrorKind::Config,
            GitError::MissingSourcePath { .. }
            | GitError::NotARepository { .. }
            | GitError::AliasObstructed { .. }
            | GitError::Checkout { .. }
            | GitError::RefNotFound { .. }
            | GitError::Git(_)
            | GitError::Io { .. } => GitErrorKind::Checkout,
            GitError::CommitNotFound { .. } => GitErrorKind::NotFound,
            GitError::UnreachablePointer { .. }
            | GitError::StaleTip { .. }
            | GitError::NonMonotonic { .. }
            | GitError::NoCapturedTip { .. } => GitErrorKind::Consistency,
        }
    }
}

/// Convenience constructor for [`GitError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GitError {
    GitError::Io {
        path: path.into(),
        source,
    }
}
