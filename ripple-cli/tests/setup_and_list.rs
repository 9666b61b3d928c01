use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use git2::{Repository, Signature};
use predicates::str::contains;
use tempfile::TempDir;

use ripple_core::registry;

fn ripple_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ripple"));
    cmd.arg("--root").arg(root);
    cmd
}

fn init_repo(dir: &Path) -> Repository {
    let repo = Repository::init(dir).expect("init repo");
    repo.set_head("refs/heads/main").expect("set head");
    repo
}

fn commit_file(repo: &Repository, name: &str, content: &str, msg: &str) -> git2::Oid {
    let workdir = repo.workdir().expect("workdir");
    std::fs::write(workdir.join(name), content).expect("write file");
    let mut index = repo.index().expect("index");
    index.add_path(Path::new(name)).expect("add path");
    index.write().expect("index write");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let sig = Signature::now("Ripple Test", "test@ripple.invalid").expect("sig");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parents)
        .expect("commit")
}

#[test]
fn setup_writes_shared_registry_entry() {
    let root = TempDir::new().expect("root");
    let upstream = TempDir::new().expect("upstream");
    commit_file(&init_repo(upstream.path()), "a.txt", "one", "first");

    ripple_cmd(root.path())
        .args(["setup", "demo", upstream.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Tracking 'demo'"))
        .stdout(contains("never synced"));

    let shared = registry::read_file(&registry::shared_path_at(root.path())).expect("read");
    let entry = shared.get("demo").expect("entry");
    assert_eq!(entry.source.as_deref(), Some(upstream.path().to_str().unwrap()));
    assert_eq!(entry.ref_name.as_deref(), Some("main"));
    assert_eq!(entry.sync_pointer, None);
    assert!(!registry::local_path_at(root.path()).exists());
}

#[test]
fn setup_synced_seeds_pointer_to_current_tip() {
    let root = TempDir::new().expect("root");
    let upstream = TempDir::new().expect("upstream");
    let repo = init_repo(upstream.path());
    commit_file(&repo, "a.txt", "one", "first");
    let c2 = commit_file(&repo, "b.txt", "two", "second");

    ripple_cmd(root.path())
        .args(["setup", "demo", upstream.path().to_str().unwrap(), "--synced"])
        .assert()
        .success()
        .stdout(contains("pointer seeded"));

    let shared = registry::read_file(&registry::shared_path_at(root.path())).expect("read");
    let pointer = shared.get("demo").and_then(|e| e.sync_pointer.clone());
    assert_eq!(pointer.map(|p| p.0), Some(c2.to_string()));
}

#[test]
fn setup_rerun_preserves_existing_pointer() {
    let root = TempDir::new().expect("root");
    let upstream = TempDir::new().expect("upstream");
    let repo = init_repo(upstream.path());
    commit_file(&repo, "a.txt", "one", "first");

    let source = upstream.path().to_str().unwrap().to_owned();
    ripple_cmd(root.path())
        .args(["setup", "demo", &source, "--synced"])
        .assert()
        .success();
    // Update the descriptor without --synced: the pointer must survive.
    ripple_cmd(root.path())
        .args(["setup", "demo", &source])
        .assert()
        .success();

    let shared = registry::read_file(&registry::shared_path_at(root.path())).expect("read");
    assert!(
        shared.get("demo").and_then(|e| e.sync_pointer.clone()).is_some(),
        "re-running setup must not reset the sync pointer"
    );
}

#[test]
fn setup_ignore_lands_in_local_override_only() {
    let root = TempDir::new().expect("root");
    let upstream = TempDir::new().expect("upstream");
    commit_file(&init_repo(upstream.path()), "a.txt", "one", "first");

    ripple_cmd(root.path())
        .args(["setup", "demo", upstream.path().to_str().unwrap(), "--ignore"])
        .assert()
        .success();

    let shared = registry::read_file(&registry::shared_path_at(root.path())).expect("shared");
    assert!(shared.get("demo").expect("entry").ignore.is_none());
    let local = registry::read_file(&registry::local_path_at(root.path())).expect("local");
    assert_eq!(local.get("demo").and_then(|e| e.ignore), Some(true));

    // Skipped by bulk list, still addressable by name.
    let assert = ripple_cmd(root.path()).arg("list").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(!stdout.contains("demo"));
    ripple_cmd(root.path())
        .args(["log", "demo"])
        .assert()
        .success()
        .stdout(contains("demo"));
}

#[test]
fn list_reports_pending_then_up_to_date() {
    let root = TempDir::new().expect("root");
    let upstream = TempDir::new().expect("upstream");
    let repo = init_repo(upstream.path());
    let c1 = commit_file(&repo, "a.txt", "one", "first");
    commit_file(&repo, "b.txt", "two", "second");
    let c3 = commit_file(&repo, "c.txt", "three", "third");

    ripple_cmd(root.path())
        .args(["setup", "demo", upstream.path().to_str().unwrap()])
        .assert()
        .success();

    // Never synced: pending shows the capped first-sync count.
    ripple_cmd(root.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("never synced"));

    ripple_cmd(root.path())
        .args(["mark-synced", "demo", "--tip", &c1.to_string()])
        .assert()
        .success();
    ripple_cmd(root.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("pending"))
        .stdout(contains("2"));

    ripple_cmd(root.path())
        .args(["mark-synced", "demo", "--tip", &c3.to_string()])
        .assert()
        .success();
    ripple_cmd(root.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("up to date"));
}

#[test]
fn list_json_schema_is_stable() {
    let root = TempDir::new().expect("root");
    let upstream = TempDir::new().expect("upstream");
    commit_file(&init_repo(upstream.path()), "a.txt", "one", "first");

    ripple_cmd(root.path())
        .args(["setup", "demo", upstream.path().to_str().unwrap()])
        .assert()
        .success();

    let assert = ripple_cmd(root.path()).args(["list", "--json"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let payload: serde_json::Value = serde_json::from_str(&stdout).expect("parse list json");

    let top_keys: BTreeSet<String> = payload
        .as_object()
        .expect("root object")
        .keys()
        .cloned()
        .collect();
    let expected_top: BTreeSet<String> = ["summary", "projects"]
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(top_keys, expected_top, "list root schema changed");

    let rows = payload["projects"].as_array().expect("projects array");
    assert_eq!(rows.len(), 1);
    let row_keys: BTreeSet<String> = rows[0]
        .as_object()
        .expect("row object")
        .keys()
        .cloned()
        .collect();
    let expected_row: BTreeSet<String> = [
        "name",
        "source",
        "ref",
        "sync_pointer",
        "status",
        "pending",
        "detail",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    assert_eq!(row_keys, expected_row, "list row schema changed");
    assert_eq!(rows[0]["status"], "never_synced");
    assert_eq!(rows[0]["sync_pointer"], serde_json::Value::Null);
}

#[test]
fn list_survives_one_broken_project() {
    let root = TempDir::new().expect("root");
    let upstream = TempDir::new().expect("upstream");
    commit_file(&init_repo(upstream.path()), "a.txt", "one", "first");

    ripple_cmd(root.path())
        .args(["setup", "good", upstream.path().to_str().unwrap()])
        .assert()
        .success();
    ripple_cmd(root.path())
        .args(["setup", "broken", "/nonexistent/ripple/fixture"])
        .assert()
        .success();

    ripple_cmd(root.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("good"))
        .stdout(contains("error"));
}

#[test]
fn corrupt_registry_exits_with_config_code() {
    let root = TempDir::new().expect("root");
    let path = registry::shared_path_at(root.path());
    std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
    std::fs::write(&path, "{not json").expect("write");

    ripple_cmd(root.path()).arg("list").assert().failure().code(2);
}
