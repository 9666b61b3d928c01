//! `ripple mark-synced <name>` — advance the reviewed checkpoint.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use ripple_core::types::{CommitId, ProjectName};
use ripple_git::mark_synced_at;

/// Arguments for `ripple mark-synced`.
#[derive(Args, Debug)]
pub struct MarkSyncedArgs {
    /// Tracked project name.
    pub name: String,

    /// Exact tip to advance to; defaults to the tip captured by the most
    /// recent unfiltered `ripple log` for this project.
    #[arg(long, value_name = "COMMIT")]
    pub tip: Option<String>,
}

impl MarkSyncedArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let name = ProjectName::from(self.name);
        let tip = self.tip.map(CommitId::from);

        let advanced = mark_synced_at(root, &name, tip.as_ref())?;

        let previous = advanced
            .previous
            .as_ref()
            .map(|p| p.short().to_owned())
            .unwrap_or_else(|| "never".to_owned());
        println!(
            "✓ '{}' synced to {} (was {previous})",
            advanced.name,
            advanced.pointer.short(),
        );
        Ok(())
    }
}
