use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn tandem_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tandem"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG");
    cmd
}

/// Fresh HOME with `tandem init` already run against a temp remote.
fn initialized() -> (TempDir, TempDir) {
    let home = TempDir::new().expect("home");
    let remote = TempDir::new().expect("remote");
    tandem_cmd(home.path())
        .args(["init", "--remote"])
        .arg(remote.path())
        .assert()
        .success()
        .stdout(contains("Remote store"));
    (home, remote)
}

fn write_doc(dir: &Path, name: &str, json: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, json).expect("write doc");
    path
}

#[test]
fn commands_require_init() {
    let home = TempDir::new().expect("home");
    tandem_cmd(home.path())
        .args(["workspace", "list"])
        .assert()
        .failure()
        .stderr(contains("tandem init"));
}

#[test]
fn init_writes_config() {
    let (home, _remote) = initialized();
    let config = fs::read_to_string(home.path().join(".tandem/config.yaml")).expect("config");
    assert!(config.contains("remote_root"));
    assert!(config.contains("request_timeout_ms: 10000"));
}

#[test]
fn workspace_lifecycle() {
    let (home, remote) = initialized();

    tandem_cmd(home.path())
        .args(["workspace", "list"])
        .assert()
        .success()
        .stdout(contains("No workspaces."));

    tandem_cmd(home.path())
        .args(["workspace", "create", "wf-1", "Flow"])
        .assert()
        .success()
        .stdout(contains("Created workspace 'Flow'"));
    assert!(remote.path().join("workspaces/wf-1.json").exists());

    tandem_cmd(home.path())
        .args(["workspace", "list"])
        .assert()
        .success()
        .stdout(contains("wf-1").and(contains("Flow")));

    tandem_cmd(home.path())
        .args(["workspace", "rename", "wf-1", "Pipeline"])
        .assert()
        .success()
        .stdout(contains("Renamed 'wf-1' to 'Pipeline'"));

    tandem_cmd(home.path())
        .args(["workspace", "delete", "wf-1"])
        .assert()
        .success();
    assert!(!remote.path().join("workspaces/wf-1.json").exists());

    tandem_cmd(home.path())
        .args(["workspace", "delete", "wf-1"])
        .assert()
        .failure()
        .stderr(contains("declined"));
}

#[test]
fn rename_collision_is_reported() {
    let (home, _remote) = initialized();
    for (id, name) in [("wf-1", "Flow"), ("wf-2", "Other")] {
        tandem_cmd(home.path())
            .args(["workspace", "create", id, name])
            .assert()
            .success();
    }

    tandem_cmd(home.path())
        .args(["workspace", "rename", "wf-2", "Flow"])
        .assert()
        .failure()
        .stderr(contains("already exists"));
}

#[test]
fn show_unknown_workspace_falls_back_to_starter() {
    let (home, _remote) = initialized();
    tandem_cmd(home.path())
        .args(["workspace", "show", "empty"])
        .assert()
        .success()
        .stdout(contains("\"blocks\""))
        .stderr(contains("starter workflow"));
}

#[test]
fn edit_then_diff() {
    let (home, _remote) = initialized();
    let docs = TempDir::new().expect("docs");
    tandem_cmd(home.path())
        .args(["workspace", "create", "wf-1", "Flow"])
        .assert()
        .success();

    let edited = write_doc(
        docs.path(),
        "edited.json",
        r#"{"blocks":[{"id":"a","label":"Alpha"}],"edges":[]}"#,
    );
    tandem_cmd(home.path())
        .args(["workspace", "edit", "wf-1"])
        .arg(&edited)
        .assert()
        .success()
        .stdout(contains("Saved 'wf-1'"));

    tandem_cmd(home.path())
        .args(["workspace", "edit", "wf-1"])
        .arg(&edited)
        .assert()
        .success()
        .stdout(contains("No changes"));

    tandem_cmd(home.path())
        .args(["workspace", "show", "wf-1"])
        .assert()
        .success()
        .stdout(contains("\"label\": \"Alpha\""));

    let with_defaults = write_doc(
        docs.path(),
        "defaults.json",
        r#"{"blocks":[{"id":"a","label":"Alpha","content":""}],"edges":[],"viewport":{"x":0,"y":0,"zoom":1},"version":"1.0.0"}"#,
    );
    tandem_cmd(home.path())
        .args(["workspace", "diff", "wf-1"])
        .arg(&with_defaults)
        .assert()
        .success()
        .stdout(contains("No differences"));

    let grown = write_doc(
        docs.path(),
        "grown.json",
        r#"{"blocks":[{"id":"a","label":"Alpha"},{"id":"b","label":"Beta"}],"edges":[]}"#,
    );
    tandem_cmd(home.path())
        .args(["workspace", "diff", "wf-1"])
        .arg(&grown)
        .assert()
        .success()
        .stdout(contains("+++ local/wf-1").and(contains("Beta")));
}

#[test]
fn upload_then_show_manifest() {
    let (home, _remote) = initialized();
    let files = TempDir::new().expect("files");
    let a = files.path().join("notes.txt");
    let b = files.path().join("readme.md");
    fs::write(&a, "hello").expect("write a");
    fs::write(&b, "# title").expect("write b");

    let output = tandem_cmd(home.path())
        .args(["upload", "kb"])
        .arg(&a)
        .arg(&b)
        .output()
        .expect("run upload");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("notes.txt"));
    let version = stdout
        .lines()
        .find_map(|l| l.trim().strip_prefix("version: "))
        .expect("version line")
        .trim()
        .to_string();

    let output = tandem_cmd(home.path())
        .args(["manifest", "show", "kb", &version, "--json"])
        .output()
        .expect("run manifest show");
    assert!(output.status.success());
    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(manifest["status"], "completed");
    assert_eq!(manifest["chunks"].as_array().map(Vec::len), Some(2));
    assert_eq!(manifest["chunks"][0]["kind"], "text");
    assert_eq!(manifest["chunks"][1]["kind"], "markdown");
}

#[test]
fn manifest_show_unknown_version_fails() {
    let (home, _remote) = initialized();
    tandem_cmd(home.path())
        .args(["manifest", "show", "kb", "v0"])
        .assert()
        .failure()
        .stderr(contains("no manifest"));
}
