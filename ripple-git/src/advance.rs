//! Checkpoint advancer — persist the reviewed boundary.
//!
//! The advance is bound to the exact tip captured when the range was queried
//! (explicit `--tip` or the session store), never to whatever HEAD is at
//! advance time. Commits that land upstream mid-review therefore stay
//! unreviewed. Check-then-act made safe by acting on the snapshot, not the
//! live state.

use std::path::Path;

use git2::Oid;

use ripple_core::types::{CommitId, ProjectName};
use ripple_core::{registry, session};

use crate::checkout;
use crate::error::GitError;
use crate::range;

/// Outcome of a successful pointer advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advanced {
    pub name: ProjectName,
    pub previous: Option<CommitId>,
    pub pointer: CommitId,
}

/// Advance the sync pointer for `name` to `tip`.
///
/// With `tip == None` the captured session tip is used; a missing capture is
/// [`GitError::NoCapturedTip`], which forces the `log`-then-`mark-synced`
/// ordering instead of a blind advance to live HEAD.
///
/// Consistency guards, in order:
/// - `tip` must be reachable-from-or-equal-to the current local ref tip
///   ([`GitError::StaleTip`] otherwise);
/// - the new pointer must be a descendant-or-equal of the stored pointer
///   ([`GitError::NonMonotonic`] otherwise);
/// - a stored pointer that no longer exists in the checkout is
///   [`GitError::UnreachablePointer`], never silently replaced.
///
/// Ignored projects still accept a manual advance: `ignore` only affects
/// bulk listing.
pub fn mark_synced_at(
    root: &Path,
    name: &ProjectName,
    tip: Option<&CommitId>,
) -> Result<Advanced, GitError> {
    let merged = registry::load_at(root)?;
    let desc = merged.get(name)?.clone();

    let tip = match tip {
        Some(tip) => tip.clone(),
        None => session::captured_at(root, name)?
            .ok_or_else(|| GitError::NoCapturedTip { name: name.clone() })?
            .tip,
    };

    checkout::ensure_local_at(root, &desc)?;
    let repo = checkout::open_checkout(root, &desc)?;
    let current = range::current_tip(&repo, name, &desc.ref_name)?;
    let current_oid = Oid::from_str(&current.0)?;

    let stale = || GitError::StaleTip {
        name: name.clone(),
        tip: tip.clone(),
        ref_name: desc.ref_name.clone(),
    };
    let tip_oid = Oid::from_str(&tip.0).map_err(|_| stale())?;
    if repo.find_commit(tip_oid).is_err() {
        return Err(stale());
    }
    if tip_oid != current_oid && !repo.graph_descendant_of(current_oid, tip_oid)? {
        return Err(stale());
    }

    if let Some(prev) = &desc.sync_pointer {
        let unreachable = || GitError::UnreachablePointer {
            name: name.clone(),
            pointer: prev.clone(),
            tip: current.clone(),
        };
        let prev_oid = Oid::from_str(&prev.0).map_err(|_| unreachable())?;
        if repo.find_commit(prev_oid).is_err() {
            return Err(unreachable());
        }
        if tip_oid != prev_oid && !repo.graph_descendant_of(tip_oid, prev_oid)? {
            return Err(GitError::NonMonotonic {
                name: name.clone(),
                pointer: prev.clone(),
                tip: tip.clone(),
            });
        }
    }

    registry::set_pointer_at(root, name, &tip)?;
    session::clear_at(root, name)?;
    tracing::info!("advanced '{name}' to {}", tip.short());

    Ok(Advanced {
        name: name.clone(),
        previous: desc.sync_pointer,
        pointer: tip,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
