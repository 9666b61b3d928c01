//! Captured-tip session store.
//!
//! `ripple log` resolves a project's tip once and records it here; a later
//! `ripple mark-synced` without `--tip` consumes that exact value. Binding
//! the advance to the snapshot read at review time (instead of re-resolving
//! HEAD) is what keeps commits that land mid-review unreviewed.
//!
//! Persists a JSON map at `<root>/.ripple/session.json` with the same atomic
//! `.tmp` + rename flow as the registry. The file is a local cache; deleting
//! it only forces a fresh `log` before the next pointer advance.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::registry::state_dir_at;
use crate::types::{CommitId, ProjectName};

/// One recorded review snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedTip {
    pub tip: CommitId,
    pub captured_at: DateTime<Utc>,
}

/// On-disk shape: project name → captured tip.
pub type SessionFile = BTreeMap<String, CapturedTip>;

/// `<root>/.ripple/session.json` — pure, no I/O.
pub fn session_path_at(root: &Path) -> PathBuf {
    state_dir_at(root).join("session.json")
}

/// Load the session store. A missing file is an empty store.
pub fn load_at(root: &Path) -> Result<SessionFile, ConfigError> {
    let path = session_path_at(root);
    if !path.exists() {
        return Ok(SessionFile::new());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// Record the tip captured by an unfiltered `log` for `name`.
pub fn record_at(root: &Path, name: &ProjectName, tip: &CommitId) -> Result<(), ConfigError> {
    let mut file = load_at(root)?;
    file.insert(
        name.0.clone(),
        CapturedTip {
            tip: tip.clone(),
            captured_at: Utc::now(),
        },
    );
    save(root, &file)
}

/// The tip most recently captured for `name`, if any.
pub fn captured_at(root: &Path, name: &ProjectName) -> Result<Option<CapturedTip>, ConfigError> {
    Ok(load_at(root)?.get(&name.0).cloned())
}

/// Drop the captured tip for `name` (after a successful pointer advance).
pub fn clear_at(root: &Path, name: &ProjectName) -> Result<(), ConfigError> {
    let mut file = load_at(root)?;
    if file.remove(&name.0).is_some() {
        save(root, &file)?;
    }
    Ok(())
}

fn save(root: &Path, file: &SessionFile) -> Result<(), ConfigError> {
    let path = session_path_at(root);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid session path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(file)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_store_when_file_missing() {
        let root = TempDir::new().expect("tempdir");
        assert!(load_at(root.path()).expect("load").is_empty());
        assert_eq!(
            captured_at(root.path(), &ProjectName::from("demo")).expect("captured"),
            None
        );
    }

    #[test]
    fn record_then_capture_roundtrip() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        let tip = CommitId::from("0123456789abcdef0123456789abcdef01234567");

        let before = Utc::now();
        record_at(root.path(), &name, &tip).expect("record");
        let captured = captured_at(root.path(), &name)
            .expect("captured")
            .expect("present");
        assert_eq!(captured.tip, tip);
        assert!(captured.captured_at >= before);
    }

    #[test]
    fn record_overwrites_previous_tip() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        record_at(root.path(), &name, &CommitId::from("aaaa")).expect("first");
        record_at(root.path(), &name, &CommitId::from("bbbb")).expect("second");
        let captured = captured_at(root.path(), &name)
            .expect("captured")
            .expect("present");
        assert_eq!(captured.tip, CommitId::from("bbbb"));
    }

    #[test]
    fn clear_removes_only_named_project() {
        let root = TempDir::new().expect("tempdir");
        let demo = ProjectName::from("demo");
        let other = ProjectName::from("other");
        record_at(root.path(), &demo, &CommitId::from("aaaa")).expect("demo");
        record_at(root.path(), &other, &CommitId::from("bbbb")).expect("other");

        clear_at(root.path(), &demo).expect("clear");
        assert_eq!(captured_at(root.path(), &demo).expect("demo"), None);
        assert!(captured_at(root.path(), &other).expect("other").is_some());
    }

    #[test]
    fn clear_missing_entry_is_noop() {
        let root = TempDir::new().expect("tempdir");
        clear_at(root.path(), &ProjectName::from("ghost")).expect("clear");
        assert!(!session_path_at(root.path()).exists());
    }

    #[test]
    fn save_cleans_up_tmp() {
        let root = TempDir::new().expect("tempdir");
        record_at(root.path(), &ProjectName::from("demo"), &CommitId::from("aaaa"))
            .expect("record");
        let tmp = session_path_at(root.path()).with_extension("json.tmp");
        assert!(!tmp.exists());
    }
}
