//! Checkout resolver — a fetchable local copy for every tracked project.
//!
//! Each project gets a stable slot at `<root>/.ripple/refs/<name>`:
//!
//! - local-path sources become a symlink alias pointing at the sibling
//!   checkout (no copy, no network — the sibling is edited in place);
//! - remote URLs become a bare clone, refreshed by fetching only the tracked
//!   ref on reuse.
//!
//! `ensure_local_at` is idempotent: repeated calls on an unchanged source
//! converge without duplicating aliases or re-cloning. Failures are always
//! surfaced — a stale copy would make range queries silently wrong.

use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::Repository;

use ripple_core::registry::refs_dir_at;
use ripple_core::types::{ProjectDescriptor, SourceKind};

use crate::error::{io_err, GitError};

/// Guarantee a usable checkout for `desc` and return its path.
pub fn ensure_local_at(root: &Path, desc: &ProjectDescriptor) -> Result<PathBuf, GitError> {
    let refs_dir = refs_dir_at(root);
    std::fs::create_dir_all(&refs_dir).map_err(|e| io_err(&refs_dir, e))?;
    let alias = desc.alias_path(root);

    match desc.source_kind() {
        SourceKind::LocalPath => ensure_alias(desc, &alias),
        SourceKind::RemoteUrl => ensure_clone(desc, &alias),
    }
}

/// Open the repository behind a project's alias slot.
pub fn open_checkout(root: &Path, desc: &ProjectDescriptor) -> Result<Repository, GitError> {
    let alias = desc.alias_path(root);
    Repository::open(&alias).map_err(|_| GitError::NotARepository {
        name: desc.name.clone(),
        path: alias,
    })
}

// ---------------------------------------------------------------------------
// Local-path sources: symlink alias
// ---------------------------------------------------------------------------

fn ensure_alias(desc: &ProjectDescriptor, alias: &Path) -> Result<PathBuf, GitError> {
    let source = PathBuf::from(&desc.source);
    let target = source
        .canonicalize()
        .map_err(|_| GitError::MissingSourcePath {
            name: desc.name.clone(),
            path: source.clone(),
        })?;
    // The sibling must already be a repository; aliasing a plain directory
    // would only defer the failure to the first range query.
    Repository::open(&target).map_err(|_| GitError::NotARepository {
        name: desc.name.clone(),
        path: target.clone(),
    })?;

    match std::fs::symlink_metadata(alias) {
        Ok(meta) if meta.file_type().is_symlink() => {
            let existing = std::fs::read_link(alias).map_err(|e| io_err(alias, e))?;
            if existing == target {
                return Ok(alias.to_path_buf());
            }
            // Source moved: drop the old link and fall through to relink.
            std::fs::remove_file(alias).map_err(|e| io_err(alias, e))?;
        }
        Ok(_) => {
            return Err(GitError::AliasObstructed {
                name: desc.name.clone(),
                path: alias.to_path_buf(),
            });
        }
        Err(_) => {}
    }

    make_symlink(&target, alias)?;
    tracing::debug!("aliased '{}' -> {}", desc.name, target.display());
    Ok(alias.to_path_buf())
}

#[cfg(unix)]
fn make_symlink(target: &Path, alias: &Path) -> Result<(), GitError> {
    std::os::unix::fs::symlink(target, alias).map_err(|e| io_err(alias, e))
}

#[cfg(windows)]
fn make_symlink(target: &Path, alias: &Path) -> Result<(), GitError> {
    std::os::windows::fs::symlink_dir(target, alias).map_err(|e| io_err(alias, e))
}

// ---------------------------------------------------------------------------
// Remote sources: bare clone + single-ref fetch
// ---------------------------------------------------------------------------

fn ensure_clone(desc: &ProjectDescriptor, alias: &Path) -> Result<PathBuf, GitError> {
    if alias.exists() {
        let repo = Repository::open(alias).map_err(|_| GitError::NotARepository {
            name: desc.name.clone(),
            path: alias.to_path_buf(),
        })?;
        fetch_ref(&repo, desc)?;
        return Ok(alias.to_path_buf());
    }

    tracing::info!("cloning '{}' from {}", desc.name, desc.source);
    RepoBuilder::new()
        .bare(true)
        .clone(&desc.source, alias)
        .map_err(|e| GitError::Checkout {
            name: desc.name.clone(),
            reason: e.message().to_owned(),
        })?;
    Ok(alias.to_path_buf())
}

fn fetch_ref(repo: &Repository, desc: &ProjectDescriptor) -> Result<(), GitError> {
    let checkout_err = |reason: String| GitError::Checkout {
        name: desc.name.clone(),
        reason,
    };
    let mut remote = repo
        .find_remote("origin")
        .map_err(|e| checkout_err(format!("no 'origin' remote: {}", e.message())))?;
    let refspec = format!(
        "+refs/heads/{0}:refs/remotes/origin/{0}",
        desc.ref_name
    );
    remote
        .fetch(&[refspec.as_str()], None, None)
        .map_err(|e| checkout_err(e.message().to_owned()))?;

    // The clone left a local refs/heads/<ref> behind, and tip resolution
    // prefers it over the tracking ref. Move it to the fetched head so new
    // upstream commits become visible.
    let tracking = repo
        .find_reference(&format!("refs/remotes/origin/{}", desc.ref_name))
        .map_err(|e| checkout_err(e.message().to_owned()))?;
    if let Some(oid) = tracking.target() {
        repo.reference(
            &format!("refs/heads/{}", desc.ref_name),
            oid,
            true,
            "fetch: update local head",
        )
        .map_err(|e| checkout_err(e.message().to_owned()))?;
    }
    tracing::debug!("fetched '{}' ({})", desc.name, desc.ref_name);
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
