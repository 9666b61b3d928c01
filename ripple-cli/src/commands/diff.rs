//! `ripple diff <name> <commit>` — the patch for one commit.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use ripple_core::registry;
use ripple_core::types::{CommitId, ProjectName};
use ripple_git::{commit_diff, current_tip, ensure_local_at, open_checkout};

/// Arguments for `ripple diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Tracked project name.
    pub name: String,

    /// Commit id (full hash) to show.
    pub commit: String,
}

impl DiffArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let name = ProjectName::from(self.name);
        let merged = registry::load_at(root).context("failed to load registry")?;
        for warning in &merged.warnings {
            eprintln!("warning: {warning}");
        }
        let desc = merged.get(&name)?.clone();

        ensure_local_at(root, &desc)
            .with_context(|| format!("cannot resolve checkout for '{name}'"))?;
        let repo = open_checkout(root, &desc)?;
        let tip = current_tip(&repo, &name, &desc.ref_name)?;

        let patch = commit_diff(&repo, &name, &tip, &CommitId::from(self.commit))?;
        println!("commit {}", patch.id);
        println!("    {}", patch.summary);
        println!();
        print!("{}", patch.patch);
        if !patch.patch.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
