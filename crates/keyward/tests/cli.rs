// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the `keyward` binary.
//!
//! Each test gets its own temp directory holding the config file, the
//! database, and the snapshot directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn setup() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let config = format!(
        r#"
[vault]
kdf_memory_cost = 32768
kdf_iterations = 2
kdf_parallelism = 1

[storage]
database_path = "{db}"

[snapshot]
directory = "{snapshots}"

[log]
level = "warn"
"#,
        db = dir.path().join("keyward.db").display(),
        snapshots = dir.path().join("snapshots").display(),
    );
    std::fs::write(dir.path().join("keyward.toml"), config).unwrap();
    dir
}

fn keyward(dir: &Path, password: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_keyward"));
    cmd.arg("--config")
        .arg(dir.join("keyward.toml"))
        .current_dir(dir)
        .env("KEYWARD_MASTER_PASSWORD", password)
        .env_remove("KEYWARD_NEW_MASTER_PASSWORD")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().unwrap()
}

fn run_with_stdin(cmd: &mut Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn status_reports_uninitialized_vault() {
    let dir = setup();
    let out = run(keyward(dir.path(), "m1").args(["status", "--json"]));
    assert!(out.status.success(), "{}", stderr(&out));

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["initialized"], false);
    assert_eq!(json["snapshots"], 0);
}

#[test]
fn add_get_rotate_roundtrip() {
    let dir = setup();
    let dir = dir.path();

    let out = run(keyward(dir, "m1").arg("init"));
    assert!(out.status.success(), "{}", stderr(&out));

    let out = run_with_stdin(
        keyward(dir, "m1").args(["add", "--service", "github", "--username", "alice"]),
        "p@ss\n",
    );
    assert!(out.status.success(), "{}", stderr(&out));
    let id = stdout(&out);
    assert!(!id.is_empty());

    let out = run(keyward(dir, "m1").args(["get", &id]));
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("github"));
    assert!(!stdout(&out).contains("p@ss"));

    let out = run(keyward(dir, "m1")
        .env("KEYWARD_NEW_MASTER_PASSWORD", "m2")
        .arg("rotate"));
    assert!(out.status.success(), "{}", stderr(&out));

    let out = run(keyward(dir, "m1").args(["get", &id]));
    assert!(!out.status.success());
    assert!(stderr(&out).contains("authentication failed"));

    let out = run(keyward(dir, "m2").args(["get", &id, "--show"]));
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("password: p@ss"));

    let out = run(keyward(dir, "m2").args(["snapshot", "list"]));
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("pre-rotate"));
}

#[test]
fn attachments_export_to_a_file() {
    let dir = setup();
    let dir = dir.path();
    assert!(run(keyward(dir, "m1").arg("init")).status.success());

    let out = run_with_stdin(
        keyward(dir, "m1").args(["add", "--service", "server", "--username", "root"]),
        "hunter2\n",
    );
    let entry_id = stdout(&out);

    std::fs::write(dir.join("cert.pem"), b"CERTIFICATE").unwrap();
    let out = run(keyward(dir, "m1").args(["attach", &entry_id, "cert.pem"]));
    assert!(out.status.success(), "{}", stderr(&out));
    let attachment_id = stdout(&out);

    let target = dir.join("exported.pem");
    let out = run(keyward(dir, "m1")
        .args(["export-attachment", &attachment_id, "--out"])
        .arg(&target));
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(std::fs::read(&target).unwrap(), b"CERTIFICATE");
}

#[test]
fn init_twice_fails() {
    let dir = setup();
    assert!(run(keyward(dir.path(), "m1").arg("init")).status.success());

    let out = run(keyward(dir.path(), "m1").arg("init"));
    assert!(!out.status.success());
    assert!(stderr(&out).contains("already initialized"));
}

#[test]
fn invalid_config_is_reported_before_any_command_runs() {
    let dir = setup();
    std::fs::write(
        dir.path().join("keyward.toml"),
        "[vault]\nkdf_iteratons = 3\n",
    )
    .unwrap();

    let out = run(keyward(dir.path(), "m1").arg("status"));
    assert!(!out.status.success());
    assert!(!dir.path().join("keyward.db").exists());
}

#[test]
fn snapshot_restore_by_id() {
    let dir = setup();
    let dir = dir.path();
    assert!(run(keyward(dir, "m1").arg("init")).status.success());

    let out = run(keyward(dir, "m1").args(["snapshot", "create"]));
    assert!(out.status.success(), "{}", stderr(&out));
    let snapshot_id = stdout(&out);

    let out = run_with_stdin(
        keyward(dir, "m1").args(["add", "--service", "later", "--username", "x"]),
        "pw\n",
    );
    assert!(out.status.success(), "{}", stderr(&out));

    let out = run(keyward(dir, "m1").args(["snapshot", "restore", "no-such-snapshot"]));
    assert!(!out.status.success());
    assert!(stderr(&out).contains("no snapshot with id"));

    let out = run(keyward(dir, "m1").args(["snapshot", "restore", &snapshot_id]));
    assert!(out.status.success(), "{}", stderr(&out));

    let out = run(keyward(dir, "m1").args(["list", "--json"]));
    assert!(out.status.success(), "{}", stderr(&out));
    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(rows.as_array().map(Vec::len), Some(0));
}
