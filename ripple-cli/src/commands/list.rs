//! `ripple list` — pending-commit visibility across tracked projects.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ripple_core::registry;
use ripple_core::types::{CommitId, ProjectDescriptor};
use ripple_git::{commits_since, current_tip, ensure_local_at, open_checkout, GitError, DEFAULT_DEPTH};

/// Arguments for `ripple list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone)]
enum ProjectState {
    UpToDate { tip: CommitId },
    Pending { tip: CommitId, count: usize },
    NeverSynced { tip: CommitId, count: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone)]
struct ProjectRow {
    name: String,
    source: String,
    ref_name: String,
    pointer: Option<CommitId>,
    state: ProjectState,
}

#[derive(Serialize)]
struct ListReportJson {
    summary: ListSummaryJson,
    projects: Vec<ProjectRowJson>,
}

#[derive(Serialize)]
struct ListSummaryJson {
    tracked: usize,
    pending: usize,
    failed: usize,
}

#[derive(Serialize)]
struct ProjectRowJson {
    name: String,
    source: String,
    r#ref: String,
    sync_pointer: Option<String>,
    status: String,
    pending: Option<usize>,
    detail: String,
}

#[derive(Tabled)]
struct ListTableRow {
    #[tabled(rename = "project")]
    project: String,
    #[tabled(rename = "ref")]
    ref_name: String,
    #[tabled(rename = "pointer")]
    pointer: String,
    #[tabled(rename = "pending")]
    pending: String,
    #[tabled(rename = "status")]
    status: String,
}

impl ListArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let merged = registry::load_at(root).context("failed to load registry")?;
        for warning in &merged.warnings {
            eprintln!("warning: {warning}");
        }

        let rows: Vec<ProjectRow> = merged
            .tracked()
            .map(|desc| ProjectRow {
                name: desc.name.0.clone(),
                source: desc.source.clone(),
                ref_name: desc.ref_name.clone(),
                pointer: desc.sync_pointer.clone(),
                state: probe(root, desc),
            })
            .collect();

        if self.json {
            print_json(rows)?;
        } else {
            print_table(rows);
        }
        Ok(())
    }
}

/// Resolve one project's pending state. Failures become a row, not an abort:
/// one unreachable upstream must not hide the others.
fn probe(root: &Path, desc: &ProjectDescriptor) -> ProjectState {
    match probe_inner(root, desc) {
        Ok(state) => state,
        Err(err) => ProjectState::Failed {
            reason: err.to_string(),
        },
    }
}

fn probe_inner(root: &Path, desc: &ProjectDescriptor) -> Result<ProjectState, GitError> {
    ensure_local_at(root, desc)?;
    let repo = open_checkout(root, desc)?;
    let tip = current_tip(&repo, &desc.name, &desc.ref_name)?;
    let commits = commits_since(
        &repo,
        &desc.name,
        desc.sync_pointer.as_ref(),
        &tip,
        DEFAULT_DEPTH,
    )?;

    Ok(match (&desc.sync_pointer, commits.len()) {
        (Some(_), 0) => ProjectState::UpToDate { tip },
        (Some(_), count) => ProjectState::Pending { tip, count },
        (None, count) => ProjectState::NeverSynced { tip, count },
    })
}

fn print_json(rows: Vec<ProjectRow>) -> Result<()> {
    let pending = rows
        .iter()
        .filter(|r| {
            matches!(
                r.state,
                ProjectState::Pending { .. } | ProjectState::NeverSynced { .. }
            )
        })
        .count();
    let failed = rows
        .iter()
        .filter(|r| matches!(r.state, ProjectState::Failed { .. }))
        .count();

    let payload = ListReportJson {
        summary: ListSummaryJson {
            tracked: rows.len(),
            pending,
            failed,
        },
        projects: rows
            .into_iter()
            .map(|row| {
                let (status, pending, detail) = match &row.state {
                    ProjectState::UpToDate { tip } => {
                        ("up_to_date".to_owned(), Some(0), format!("tip {}", tip.short()))
                    }
                    ProjectState::Pending { tip, count } => (
                        "pending".to_owned(),
                        Some(*count),
                        format!("tip {}", tip.short()),
                    ),
                    ProjectState::NeverSynced { tip, count } => (
                        "never_synced".to_owned(),
                        Some(*count),
                        format!("tip {}", tip.short()),
                    ),
                    ProjectState::Failed { reason } => {
                        ("error".to_owned(), None, reason.clone())
                    }
                };
                ProjectRowJson {
                    name: row.name,
                    source: row.source,
                    r#ref: row.ref_name,
                    sync_pointer: row.pointer.map(|p| p.0),
                    status,
                    pending,
                    detail,
                }
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize list JSON")?
    );
    Ok(())
}

fn print_table(rows: Vec<ProjectRow>) {
    let pending_count = rows
        .iter()
        .filter(|r| {
            matches!(
                r.state,
                ProjectState::Pending { .. } | ProjectState::NeverSynced { .. }
            )
        })
        .count();
    println!(
        "Ripple v{} | {} tracked | {} with pending commits",
        env!("CARGO_PKG_VERSION"),
        rows.len(),
        pending_count,
    );

    if rows.is_empty() {
        println!("No projects tracked. Run `ripple setup <name> <source>` first.");
        return;
    }

    let table_rows: Vec<ListTableRow> = rows
        .into_iter()
        .map(|row| {
            let pointer = row
                .pointer
                .as_ref()
                .map(|p| p.short().to_owned())
                .unwrap_or_else(|| "never".to_owned());
            let (pending, status) = match &row.state {
                ProjectState::UpToDate { .. } => {
                    ("0".to_owned(), "up to date".green().to_string())
                }
                ProjectState::Pending { count, .. } => {
                    (count.to_string(), "pending".yellow().to_string())
                }
                ProjectState::NeverSynced { count, .. } => {
                    // The first-sync walk is depth-capped, so the count is a floor.
                    let shown = if *count >= DEFAULT_DEPTH {
                        format!("{count}+")
                    } else {
                        count.to_string()
                    };
                    (shown, "never synced".yellow().to_string())
                }
                ProjectState::Failed { reason } => {
                    ("-".to_owned(), format!("error: {reason}").red().to_string())
                }
            };
            ListTableRow {
                project: row.name,
                ref_name: row.ref_name,
                pointer,
                pending,
                status,
            }
        })
        .collect();

    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    if pending_count > 0 {
        println!("Run `ripple log <name>` to review pending commits.");
    }
}
