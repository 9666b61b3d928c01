//! Ripple core library — domain types, registry persistence, session store.
//!
//! Public API surface:
//! - [`types`] — newtypes, source parsing, registry entry shapes
//! - [`error`] — [`ConfigError`]
//! - [`registry`] — two-file JSON registry with override merge
//! - [`session`] — captured review tips for race-safe pointer advancement

pub mod error;
pub mod registry;
pub mod session;
pub mod types;

pub use error::ConfigError;
pub use registry::MergedRegistry;
pub use types::{
    CommitId, ProjectDescriptor, ProjectEntry, ProjectName, SourceKind, SourceSpec, DEFAULT_REF,
};
