//! Two-file JSON registry with local-override merge.
//!
//! # Storage layout
//!
//! ```text
//! <root>/.ripple/
//!   upstreams.json         (shared — version-controlled by the host project)
//!   upstreams.local.json   (local-only override, same schema, optional)
//!   session.json           (captured review tips — see [`crate::session`])
//!   refs/<name>            (per-project checkout or symlink alias)
//! ```
//!
//! Both registry files are JSON objects keyed by project name. The local
//! override wins field-by-field; a `source` defined differently in both files
//! is configuration drift and is surfaced as a warning on load.
//!
//! # API pattern
//!
//! Every function takes an explicit `root: &Path`; callers derive the root
//! from the current directory (or `--root`). Tests pass a `TempDir`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{io_err, ConfigError};
use crate::types::{CommitId, ProjectDescriptor, ProjectEntry, ProjectName, DEFAULT_REF};

/// On-disk shape of one registry file.
pub type RegistryFile = BTreeMap<String, ProjectEntry>;

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<root>/.ripple/` — pure, no I/O.
pub fn state_dir_at(root: &Path) -> PathBuf {
    root.join(".ripple")
}

/// `<root>/.ripple/upstreams.json` — pure, no I/O.
pub fn shared_path_at(root: &Path) -> PathBuf {
    state_dir_at(root).join("upstreams.json")
}

/// `<root>/.ripple/upstreams.local.json` — pure, no I/O.
pub fn local_path_at(root: &Path) -> PathBuf {
    state_dir_at(root).join("upstreams.local.json")
}

/// `<root>/.ripple/refs/` — pure, no I/O.
pub fn refs_dir_at(root: &Path) -> PathBuf {
    state_dir_at(root).join("refs")
}

// ---------------------------------------------------------------------------
// 2. File load/save
// ---------------------------------------------------------------------------

/// Read one registry file. A missing file is an empty registry, not an error.
pub fn read_file(path: &Path) -> Result<RegistryFile, ConfigError> {
    if !path.exists() {
        return Ok(RegistryFile::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Atomically save one registry file.
///
/// Write flow: serialize → `.json.tmp` sibling → `rename`. The `.tmp` lives
/// in the same directory as the target so the rename never crosses a
/// filesystem boundary; a crash mid-write leaves the previous file intact.
pub fn save_file(path: &Path, file: &RegistryFile) -> Result<(), ConfigError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid registry path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(file)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Merged view
// ---------------------------------------------------------------------------

/// The merged view of the shared and local registry files.
#[derive(Debug, Clone, Default)]
pub struct MergedRegistry {
    pub projects: BTreeMap<ProjectName, ProjectDescriptor>,
    /// Human-readable drift warnings (e.g. conflicting `source` values).
    pub warnings: Vec<String>,
}

impl MergedRegistry {
    /// Look up one project by name.
    pub fn get(&self, name: &ProjectName) -> Result<&ProjectDescriptor, ConfigError> {
        self.projects
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProject { name: name.clone() })
    }

    /// All non-ignored projects, in name order.
    pub fn tracked(&self) -> impl Iterator<Item = &ProjectDescriptor> {
        self.projects.values().filter(|d| !d.ignore)
    }
}

/// Load and merge both registry files.
///
/// Missing files are treated as empty. A present-but-malformed file fails
/// with [`ConfigError::Parse`]. The local override wins per field; `ignore`
/// is honored from the local file only.
pub fn load_at(root: &Path) -> Result<MergedRegistry, ConfigError> {
    let shared = read_file(&shared_path_at(root))?;
    let local = read_file(&local_path_at(root))?;

    let mut names: Vec<&String> = shared.keys().collect();
    for name in local.keys() {
        if !shared.contains_key(name) {
            names.push(name);
        }
    }

    let mut merged = MergedRegistry::default();
    for name in names {
        let shared_entry = shared.get(name);
        let local_entry = local.get(name);
        let project = ProjectName::from(name.clone());

        if let (Some(a), Some(b)) = (
            shared_entry.and_then(|e| e.source.as_ref()),
            local_entry.and_then(|e| e.source.as_ref()),
        ) {
            if a != b {
                merged.warnings.push(format!(
                    "project '{name}': source differs between shared ({a}) and local ({b}) registry; using local"
                ));
            }
        }

        let source = local_entry
            .and_then(|e| e.source.clone())
            .or_else(|| shared_entry.and_then(|e| e.source.clone()))
            .ok_or_else(|| ConfigError::MissingSource {
                name: project.clone(),
            })?;
        let ref_name = local_entry
            .and_then(|e| e.ref_name.clone())
            .or_else(|| shared_entry.and_then(|e| e.ref_name.clone()))
            .unwrap_or_else(|| DEFAULT_REF.to_owned());
        let sync_pointer = local_entry
            .and_then(|e| e.sync_pointer.clone())
            .or_else(|| shared_entry.and_then(|e| e.sync_pointer.clone()));
        let ignore = local_entry.and_then(|e| e.ignore).unwrap_or(false);

        merged.projects.insert(
            project.clone(),
            ProjectDescriptor {
                name: project,
                source,
                ref_name,
                sync_pointer,
                ignore,
            },
        );
    }
    Ok(merged)
}

// ---------------------------------------------------------------------------
// 4. Mutation
// ---------------------------------------------------------------------------

/// Add or replace one project entry in the shared or local file and save.
pub fn upsert_at(
    root: &Path,
    name: &ProjectName,
    entry: ProjectEntry,
    local_only: bool,
) -> Result<(), ConfigError> {
    let path = if local_only {
        local_path_at(root)
    } else {
        shared_path_at(root)
    };
    let mut file = read_file(&path)?;
    file.insert(name.0.clone(), entry);
    save_file(&path, &file)
}

/// Set or clear the `ignore` flag. Writes only the local override file,
/// preserving any other override fields for the project.
pub fn set_ignore_at(root: &Path, name: &ProjectName, ignore: bool) -> Result<(), ConfigError> {
    let path = local_path_at(root);
    let mut file = read_file(&path)?;
    let entry = file.entry(name.0.clone()).or_default();
    entry.ignore = if ignore { Some(true) } else { None };
    save_file(&path, &file)
}

/// Persist a new sync pointer for `name`.
///
/// The pointer lands in the file that defines the project's source — shared
/// first, so a team-shared project keeps its review state version-controlled.
pub fn set_pointer_at(root: &Path, name: &ProjectName, tip: &CommitId) -> Result<(), ConfigError> {
    let shared_path = shared_path_at(root);
    let mut shared = read_file(&shared_path)?;
    if let Some(entry) = shared.get_mut(&name.0) {
        entry.sync_pointer = Some(tip.clone());
        return save_file(&shared_path, &shared);
    }

    let local_path = local_path_at(root);
    let mut local = read_file(&local_path)?;
    if let Some(entry) = local.get_mut(&name.0) {
        entry.sync_pointer = Some(tip.clone());
        return save_file(&local_path, &local);
    }

    Err(ConfigError::UnknownProject { name: name.clone() })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(source: &str) -> ProjectEntry {
        ProjectEntry {
            source: Some(source.to_owned()),
            ref_name: Some("main".to_owned()),
            sync_pointer: None,
            ignore: None,
        }
    }

    #[test]
    fn load_empty_when_no_files() {
        let root = TempDir::new().expect("tempdir");
        let merged = load_at(root.path()).expect("load");
        assert!(merged.projects.is_empty());
        assert!(merged.warnings.is_empty());
    }

    #[test]
    fn upsert_then_load_roundtrip() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        upsert_at(root.path(), &name, entry("/code/demo"), false).expect("upsert");

        let merged = load_at(root.path()).expect("load");
        let desc = merged.get(&name).expect("get");
        assert_eq!(desc.source, "/code/demo");
        assert_eq!(desc.ref_name, "main");
        assert_eq!(desc.sync_pointer, None);
        assert!(!desc.ignore);
    }

    #[test]
    fn local_override_wins_per_field() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        let mut shared = entry("/code/demo");
        shared.sync_pointer = Some(CommitId::from("aaaa"));
        upsert_at(root.path(), &name, shared, false).expect("shared");

        // Partial local entry: only a ref override.
        let local = ProjectEntry {
            ref_name: Some("develop".to_owned()),
            ..Default::default()
        };
        upsert_at(root.path(), &name, local, true).expect("local");

        let merged = load_at(root.path()).expect("load");
        let desc = merged.get(&name).expect("get");
        assert_eq!(desc.source, "/code/demo", "source falls back to shared");
        assert_eq!(desc.ref_name, "develop", "ref comes from local");
        assert_eq!(desc.sync_pointer, Some(CommitId::from("aaaa")));
    }

    #[test]
    fn conflicting_source_surfaces_warning_and_uses_local() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        upsert_at(root.path(), &name, entry("/code/demo"), false).expect("shared");
        upsert_at(root.path(), &name, entry("/fork/demo"), true).expect("local");

        let merged = load_at(root.path()).expect("load");
        assert_eq!(merged.warnings.len(), 1);
        assert!(merged.warnings[0].contains("source differs"));
        assert_eq!(merged.get(&name).expect("get").source, "/fork/demo");
    }

    #[test]
    fn ignore_honored_from_local_file_only() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        let mut shared = entry("/code/demo");
        shared.ignore = Some(true); // present in shared — must not count
        upsert_at(root.path(), &name, shared, false).expect("shared");

        let merged = load_at(root.path()).expect("load");
        assert!(!merged.get(&name).expect("get").ignore);
        assert_eq!(merged.tracked().count(), 1);

        set_ignore_at(root.path(), &name, true).expect("set ignore");
        let merged = load_at(root.path()).expect("reload");
        assert!(merged.get(&name).expect("get").ignore);
        assert_eq!(merged.tracked().count(), 0);
        // Still addressable by name.
        assert!(merged.get(&name).is_ok());
    }

    #[test]
    fn set_ignore_preserves_other_override_fields() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        upsert_at(root.path(), &name, entry("/code/demo"), false).expect("shared");
        let local = ProjectEntry {
            ref_name: Some("develop".to_owned()),
            ..Default::default()
        };
        upsert_at(root.path(), &name, local, true).expect("local");

        set_ignore_at(root.path(), &name, true).expect("set ignore");
        let merged = load_at(root.path()).expect("load");
        let desc = merged.get(&name).expect("get");
        assert!(desc.ignore);
        assert_eq!(desc.ref_name, "develop");
    }

    #[test]
    fn set_pointer_updates_defining_file() {
        let root = TempDir::new().expect("tempdir");
        let shared_name = ProjectName::from("shared_proj");
        let local_name = ProjectName::from("local_proj");
        upsert_at(root.path(), &shared_name, entry("/a"), false).expect("shared");
        upsert_at(root.path(), &local_name, entry("/b"), true).expect("local");

        let tip = CommitId::from("cafe");
        set_pointer_at(root.path(), &shared_name, &tip).expect("set shared");
        set_pointer_at(root.path(), &local_name, &tip).expect("set local");

        let shared = read_file(&shared_path_at(root.path())).expect("read shared");
        assert_eq!(shared["shared_proj"].sync_pointer, Some(tip.clone()));
        assert!(!shared.contains_key("local_proj"));
        let local = read_file(&local_path_at(root.path())).expect("read local");
        assert_eq!(local["local_proj"].sync_pointer, Some(tip));
    }

    #[test]
    fn set_pointer_unknown_project_errors() {
        let root = TempDir::new().expect("tempdir");
        let err = set_pointer_at(
            root.path(),
            &ProjectName::from("ghost"),
            &CommitId::from("cafe"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProject { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let root = TempDir::new().expect("tempdir");
        let path = shared_path_at(root.path());
        std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
        std::fs::write(&path, "{not json").expect("write");

        let err = load_at(root.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn atomic_write_cleans_up_tmp() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        upsert_at(root.path(), &name, entry("/code/demo"), false).expect("upsert");
        let tmp = shared_path_at(root.path()).with_extension("json.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");
    }

    #[test]
    fn interrupted_write_leaves_previous_contents_intact() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        upsert_at(root.path(), &name, entry("/code/demo"), false).expect("upsert");

        // A crash mid-write leaves a half-serialized .tmp behind; the real
        // file must still load untouched.
        let tmp = shared_path_at(root.path()).with_extension("json.tmp");
        std::fs::write(&tmp, "{\"demo\": {\"sour").expect("plant tmp");

        let merged = load_at(root.path()).expect("load");
        assert_eq!(merged.get(&name).expect("get").source, "/code/demo");

        // The next successful save replaces the leftover tmp.
        let mut updated = entry("/code/demo");
        updated.sync_pointer = Some(CommitId::from("cafe"));
        upsert_at(root.path(), &name, updated, false).expect("resave");
        assert!(!tmp.exists(), "leftover .tmp must be consumed by the rename");
        let merged = load_at(root.path()).expect("reload");
        assert_eq!(
            merged.get(&name).expect("get").sync_pointer,
            Some(CommitId::from("cafe"))
        );
    }

    #[test]
    fn missing_source_everywhere_is_config_error() {
        let root = TempDir::new().expect("tempdir");
        let name = ProjectName::from("demo");
        // Local-only entry carrying just an ignore flag, no shared entry.
        set_ignore_at(root.path(), &name, true).expect("set ignore");
        let err = load_at(root.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSource { .. }));
    }
}
