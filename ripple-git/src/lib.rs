//! # ripple-git
//!
//! Checkout resolution, commit-range queries, and checkpoint advancement
//! over `git2`. The rest of the system talks to version control only through
//! this crate's narrow surface, so the backing could change without touching
//! the registry or the CLI.

pub mod advance;
pub mod checkout;
pub mod error;
pub mod range;

pub use advance::{mark_synced_at, Advanced};
pub use checkout::{ensure_local_at, open_checkout};
pub use error::{GitError, GitErrorKind};
pub use range::{
    commit_diff, commits_since, current_tip, matches_filter, CommitPatch, CommitSummary,
    DEFAULT_DEPTH,
};
