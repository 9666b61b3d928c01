//! `ripple setup <name> <source>` — register or update a tracked project.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use ripple_core::registry;
use ripple_core::types::{ProjectDescriptor, ProjectEntry, ProjectName, SourceSpec, DEFAULT_REF};
use ripple_git::{current_tip, ensure_local_at, open_checkout};

/// Arguments for `ripple setup`.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Project name used as the registry key.
    pub name: String,

    /// Remote URL or local filesystem path; may embed a branch as
    /// `<source>/tree/<branch>`.
    pub source: String,

    /// Branch to follow (defaults to one embedded in the source, then "main").
    #[arg(long = "ref", value_name = "BRANCH")]
    pub ref_name: Option<String>,

    /// Seed the sync pointer at the current tip instead of leaving it unset.
    #[arg(long)]
    pub synced: bool,

    /// Write to the local override file instead of the shared registry.
    #[arg(long)]
    pub local: bool,

    /// Skip this project in bulk operations (recorded in the local override
    /// so the shared registry stays untouched).
    #[arg(long)]
    pub ignore: bool,
}

impl SetupArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let name = ProjectName::from(self.name);
        let spec = SourceSpec::parse(&self.source);
        let ref_name = self
            .ref_name
            .or(spec.ref_name)
            .unwrap_or_else(|| DEFAULT_REF.to_owned());

        let seeded = if self.synced {
            let desc = ProjectDescriptor {
                name: name.clone(),
                source: spec.source.clone(),
                ref_name: ref_name.clone(),
                sync_pointer: None,
                ignore: false,
            };
            ensure_local_at(root, &desc)
                .with_context(|| format!("cannot resolve checkout for '{name}'"))?;
            let repo = open_checkout(root, &desc)?;
            Some(current_tip(&repo, &name, &ref_name)?)
        } else {
            None
        };

        // Re-running setup must not reset a pointer that mark-synced owns.
        let target = if self.local {
            registry::local_path_at(root)
        } else {
            registry::shared_path_at(root)
        };
        let existing_pointer = registry::read_file(&target)?
            .get(&name.0)
            .and_then(|e| e.sync_pointer.clone());
        let sync_pointer = seeded.clone().or(existing_pointer);

        let entry = ProjectEntry {
            source: Some(spec.source.clone()),
            ref_name: Some(ref_name.clone()),
            sync_pointer,
            ignore: None,
        };
        registry::upsert_at(root, &name, entry, self.local)
            .with_context(|| format!("failed to save registry entry for '{name}'"))?;
        if self.ignore {
            registry::set_ignore_at(root, &name, true)
                .with_context(|| format!("failed to set ignore for '{name}'"))?;
        }

        match seeded {
            Some(tip) => println!(
                "✓ Tracking '{name}' ({}, ref '{ref_name}') — pointer seeded at {}",
                spec.source,
                tip.short()
            ),
            None => println!(
                "✓ Tracking '{name}' ({}, ref '{ref_name}') — never synced",
                spec.source
            ),
        }
        if self.ignore {
            println!("  Ignored in bulk operations (local override).");
        }
        Ok(())
    }
}
