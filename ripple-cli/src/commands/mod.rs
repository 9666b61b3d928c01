pub mod diff;
pub mod list;
pub mod log;
pub mod mark_synced;
pub mod setup;
