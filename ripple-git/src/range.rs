//! Range query engine — "what happened since the last sync".
//!
//! Read-only: nothing here mutates the registry or the checkout. The tip is
//! resolved once per review session via [`current_tip`] and threaded through
//! the other calls so a fetch racing the review cannot widen the range.

use chrono::{DateTime, Utc};
use git2::{DiffFormat, Oid, Repository, Sort};
use serde::Serialize;

use ripple_core::types::{CommitId, ProjectName};

use crate::error::GitError;

/// Cap on the range of a project that has never been synced; keeps the first
/// review from flooding with an entire repository's history.
pub const DEFAULT_DEPTH: usize = 50;

/// One commit in a pending range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub id: CommitId,
    pub short_id: String,
    pub summary: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub paths: Vec<String>,
}

/// The patch for exactly one commit.
#[derive(Debug, Clone, Serialize)]
pub struct CommitPatch {
    pub id: CommitId,
    pub summary: String,
    pub paths: Vec<String>,
    pub patch: String,
}

// ---------------------------------------------------------------------------
// Tip resolution
// ---------------------------------------------------------------------------

/// Resolve the commit at the head of `ref_name` in the checkout.
///
/// Tries the local branch, then the remote-tracking branch (bare clones keep
/// fetched heads under `refs/remotes/origin/`), then the raw name.
pub fn current_tip(
    repo: &Repository,
    name: &ProjectName,
    ref_name: &str,
) -> Result<CommitId, GitError> {
    let candidates = [
        format!("refs/heads/{ref_name}"),
        format!("refs/remotes/origin/{ref_name}"),
        ref_name.to_owned(),
    ];
    for candidate in &candidates {
        if let Some(oid) = resolve_commit(repo, candidate) {
            return Ok(CommitId::from(oid.to_string()));
        }
    }
    Err(GitError::RefNotFound {
        name: name.clone(),
        ref_name: ref_name.to_owned(),
    })
}

fn resolve_commit(repo: &Repository, spec: &str) -> Option<Oid> {
    repo.revparse_single(spec)
        .ok()
        .and_then(|obj| obj.peel_to_commit().ok())
        .map(|commit| commit.id())
}

// ---------------------------------------------------------------------------
// Range computation
// ---------------------------------------------------------------------------

/// Commits reachable from `tip` but not from `pointer`, newest first.
///
/// With no pointer the walk is capped at `depth` commits. `pointer == tip`
/// yields an empty range — the success terminal state, not an error. A set
/// pointer that is not reachable from `tip` is a data-integrity failure
/// ([`GitError::UnreachablePointer`]) and is never silently reset.
pub fn commits_since(
    repo: &Repository,
    name: &ProjectName,
    pointer: Option<&CommitId>,
    tip: &CommitId,
    depth: usize,
) -> Result<Vec<CommitSummary>, GitError> {
    let tip_oid = Oid::from_str(&tip.0)?;

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    revwalk.push(tip_oid)?;

    let bounded = match pointer {
        Some(ptr) => {
            if ptr == tip {
                return Ok(Vec::new());
            }
            let ptr_oid = parse_reachable(repo, name, ptr, tip, tip_oid)?;
            revwalk.hide(ptr_oid)?;
            None
        }
        None => Some(depth),
    };

    let mut commits = Vec::new();
    for oid in revwalk {
        if bounded.is_some_and(|limit| commits.len() >= limit) {
            break;
        }
        let commit = repo.find_commit(oid?)?;
        commits.push(summarize(repo, &commit)?);
    }
    Ok(commits)
}

fn parse_reachable(
    repo: &Repository,
    name: &ProjectName,
    pointer: &CommitId,
    tip: &CommitId,
    tip_oid: Oid,
) -> Result<Oid, GitError> {
    let unreachable = || GitError::UnreachablePointer {
        name: name.clone(),
        pointer: pointer.clone(),
        tip: tip.clone(),
    };
    let ptr_oid = Oid::from_str(&pointer.0).map_err(|_| unreachable())?;
    if repo.find_commit(ptr_oid).is_err() {
        return Err(unreachable());
    }
    if ptr_oid != tip_oid && !repo.graph_descendant_of(tip_oid, ptr_oid)? {
        return Err(unreachable());
    }
    Ok(ptr_oid)
}

/// Keyword predicate for focused review: matches the commit summary or any
/// changed path, case-insensitively. Presentational only — never feeds the
/// checkpoint advancement.
pub fn matches_filter(commit: &CommitSummary, keyword: &str) -> bool {
    let needle = keyword.to_lowercase();
    if commit.summary.to_lowercase().contains(&needle) {
        return true;
    }
    commit
        .paths
        .iter()
        .any(|p| p.to_lowercase().contains(&needle))
}

// ---------------------------------------------------------------------------
// Single-commit diff
// ---------------------------------------------------------------------------

/// The patch text and changed files for exactly one commit.
///
/// Fails with [`GitError::CommitNotFound`] when `commit_id` is not reachable
/// from `tip` — a stale checkout should fail loudly, not print an empty diff.
pub fn commit_diff(
    repo: &Repository,
    name: &ProjectName,
    tip: &CommitId,
    commit_id: &CommitId,
) -> Result<CommitPatch, GitError> {
    let not_found = || GitError::CommitNotFound {
        name: name.clone(),
        commit: commit_id.clone(),
        tip: tip.clone(),
    };
    let tip_oid = Oid::from_str(&tip.0)?;
    let oid = Oid::from_str(&commit_id.0).map_err(|_| not_found())?;
    let commit = repo.find_commit(oid).map_err(|_| not_found())?;
    if oid != tip_oid && !repo.graph_descendant_of(tip_oid, oid)? {
        return Err(not_found());
    }

    let tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

    let mut patch = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        match line.origin() {
            '+' | '-' | ' ' => patch.push(line.origin()),
            _ => {}
        }
        patch.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;

    let summary = summarize(repo, &commit)?;
    Ok(CommitPatch {
        id: summary.id,
        summary: summary.summary,
        paths: summary.paths,
        patch,
    })
}

// ---------------------------------------------------------------------------
// Commit metadata
// ---------------------------------------------------------------------------

fn summarize(repo: &Repository, commit: &git2::Commit) -> Result<CommitSummary, GitError> {
    let timestamp = DateTime::from_timestamp(commit.time().seconds(), 0)
        .unwrap_or(DateTime::UNIX_EPOCH);
    Ok(CommitSummary {
        id: CommitId::from(commit.id().to_string()),
        short_id: commit.id().to_string()[..10].to_owned(),
        summary: commit.summary().unwrap_or("").to_owned(),
        author: commit.author().name().unwrap_or("Unknown").to_owned(),
        timestamp,
        paths: changed_paths(repo, commit)?,
    })
}

fn changed_paths(repo: &Repository, commit: &git2::Commit) -> Result<Vec<String>, GitError> {
    let tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

    let mut paths = Vec::new();
    for delta in diff.deltas() {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().into_owned());
        if let Some(path) = path {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    Ok(paths)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
