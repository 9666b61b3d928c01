//! `ripple log <name>` — the pending commit range, with tip capture.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use ripple_core::types::ProjectName;
use ripple_core::{registry, session};
use ripple_git::{
    commits_since, current_tip, ensure_local_at, matches_filter, open_checkout, CommitSummary,
    DEFAULT_DEPTH,
};

/// Arguments for `ripple log`.
#[derive(Args, Debug)]
pub struct LogArgs {
    /// Tracked project name.
    pub name: String,

    /// Maximum commits shown for a never-synced project.
    #[arg(long, default_value_t = DEFAULT_DEPTH, value_name = "N")]
    pub depth: usize,

    /// Focused review: show only commits whose message or changed paths
    /// match this keyword. The tip is NOT captured in focus mode.
    #[arg(long, value_name = "KEYWORD")]
    pub filter: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct LogReportJson {
    project: String,
    r#ref: String,
    tip: String,
    sync_pointer: Option<String>,
    filtered: bool,
    commits: Vec<CommitSummary>,
}

impl LogArgs {
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

        let mut commits = commits_since(
            &repo,
            &name,
            desc.sync_pointer.as_ref(),
            &tip,
            self.depth,
        )?;

        let focused = self.filter.is_some();
        if let Some(keyword) = &self.filter {
            commits.retain(|c| matches_filter(c, keyword));
        } else {
            // Capture the exact tip this review saw; mark-synced advances to
            // it even if upstream moves on in the meantime.
            session::record_at(root, &name, &tip)?;
        }

        if self.json {
            let payload = LogReportJson {
                project: name.0.clone(),
                r#ref: desc.ref_name.clone(),
                tip: tip.0.clone(),
                sync_pointer: desc.sync_pointer.as_ref().map(|p| p.0.clone()),
                filtered: focused,
                commits,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize log JSON")?
            );
            return Ok(());
        }

        if commits.is_empty() && !focused {
            println!("✓ '{name}' is up to date (tip {})", tip.short());
            return Ok(());
        }

        match &self.filter {
            Some(keyword) => println!(
                "'{name}' — {} commit(s) matching '{keyword}' on '{}' (tip {})",
                commits.len(),
                desc.ref_name,
                tip.short(),
            ),
            None => println!(
                "'{name}' — {} pending commit(s) on '{}' (tip {})",
                commits.len(),
                desc.ref_name,
                tip.short(),
            ),
        }
        for commit in &commits {
            println!(
                "  {}  {}  {}",
                commit.short_id.yellow(),
                commit.timestamp.format("%Y-%m-%d"),
                commit.summary,
            );
        }
        if desc.sync_pointer.is_none() {
            println!("  (first sync: showing at most {} commits)", self.depth);
        }

        println!("tip: {tip}");
        if focused {
            println!(
                "Focused view — tip not captured. Run `ripple log {name}` unfiltered before mark-synced."
            );
        } else {
            println!("Run `ripple mark-synced {name}` once this range is reviewed.");
        }
        Ok(())
    }
}
