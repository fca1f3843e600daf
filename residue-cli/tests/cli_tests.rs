use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime};

use assert_cmd::prelude::*;
use filetime::{set_file_mtime, FileTime};
use predicates::str::contains;
use serde_json::Value;

use residue_core::{config, registry, types::RetentionThreshold, AgeBasis, TrackedPath};
use tempfile::TempDir;

const HOUR: Duration = Duration::from_secs(60 * 60);

fn residue_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("residue"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1");
    cmd
}

fn aged_file(dir: &Path, name: &str, age: Duration) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"generated").expect("write file");
    set_file_mtime(&path, FileTime::from_system_time(SystemTime::now() - age))
        .expect("backdate file");
    path
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run residue");
    assert!(output.status.success(), "command failed: {output:?}");
    serde_json::from_slice(&output.stdout).expect("valid JSON on stdout")
}

#[test]
fn add_records_paths_and_list_shows_them() {
    let home = TempDir::new().expect("home");
    let files = TempDir::new().expect("files");
    let doc = aged_file(files.path(), "summary.docx", HOUR);

    residue_cmd(home.path())
        .args(["add"])
        .arg(&doc)
        .assert()
        .success()
        .stdout(contains("Tracking"));

    let entries = registry::read_entries(&registry::registry_path_at(home.path())).expect("read");
    assert_eq!(entries, vec![TrackedPath::from(doc.as_path())]);

    residue_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("summary.docx"))
        .stdout(contains("present"))
        .stdout(contains("1 entries"));
}

#[test]
fn list_on_fresh_home_reports_nothing_tracked() {
    let home = TempDir::new().expect("home");
    residue_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(contains("No files tracked."));
}

#[test]
fn home_flag_overrides_environment() {
    let env_home = TempDir::new().expect("env home");
    let flag_home = TempDir::new().expect("flag home");

    residue_cmd(env_home.path())
        .arg("--home")
        .arg(flag_home.path())
        .args(["add", "/tmp/residue-flag-test.txt"])
        .assert()
        .success();

    assert!(registry::registry_path_at(flag_home.path()).exists());
    assert!(!registry::registry_path_at(env_home.path()).exists());
}

#[test]
fn flush_with_default_config_is_disabled() {
    let home = TempDir::new().expect("home");
    let files = TempDir::new().expect("files");
    let ancient = aged_file(files.path(), "ancient.xlsx", 1_000 * HOUR);

    residue_cmd(home.path()).arg("add").arg(&ancient).assert().success();
    residue_cmd(home.path())
        .arg("flush")
        .assert()
        .success()
        .stdout(contains("Retention is disabled"));

    assert!(ancient.exists());
}

#[test]
fn flush_without_registry_is_a_noop() {
    let home = TempDir::new().expect("home");
    residue_cmd(home.path())
        .args(["config", "set-retention", "1"])
        .assert()
        .success();
    residue_cmd(home.path())
        .arg("flush")
        .assert()
        .success()
        .stdout(contains("No files tracked yet."));
}

#[test]
fn flush_deletes_aged_files_and_reports_json() {
    let home = TempDir::new().expect("home");
    let files = TempDir::new().expect("files");
    let p1 = aged_file(files.path(), "p1.docx", 10 * HOUR);
    let p2 = aged_file(files.path(), "p2.docx", HOUR);

    residue_cmd(home.path())
        .args(["config", "set-retention", "5h"])
        .assert()
        .success()
        .stdout(contains("Retention set to 5h"));
    residue_cmd(home.path())
        .args(["config", "set-age-basis", "modified"])
        .assert()
        .success();
    residue_cmd(home.path())
        .arg("add")
        .arg(&p1)
        .arg(&p2)
        .assert()
        .success();

    let status = json_stdout(residue_cmd(home.path()).args(["flush", "--json"]));
    assert_eq!(status["status"], "completed");
    assert_eq!(status["scanned"], 2);
    assert_eq!(status["retained"], 1);
    assert_eq!(status["deleted"][0], p1.to_string_lossy().as_ref());

    assert!(!p1.exists());
    assert!(p2.exists());
    let entries = registry::read_entries(&registry::registry_path_at(home.path())).expect("read");
    assert_eq!(entries, vec![TrackedPath::from(p2.as_path())]);
}

#[test]
fn config_commands_persist_settings() {
    let home = TempDir::new().expect("home");

    residue_cmd(home.path())
        .args(["config", "set-retention", "72"])
        .assert()
        .success();
    residue_cmd(home.path())
        .args(["config", "set-backoff", "250"])
        .assert()
        .success();
    residue_cmd(home.path())
        .args(["config", "set-age-basis", "modified"])
        .assert()
        .success();

    let cfg = config::load_at(home.path()).expect("load");
    assert_eq!(cfg.retention_hours, RetentionThreshold::Hours(72));
    assert_eq!(cfg.backoff_ms, 250);
    assert_eq!(cfg.age_basis, AgeBasis::Modified);

    residue_cmd(home.path())
        .args(["config", "set-retention", "-1"])
        .assert()
        .success();
    assert!(config::load_at(home.path())
        .expect("load")
        .retention_hours
        .is_disabled());

    residue_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("retention_hours: disabled"))
        .stdout(contains("backoff_ms:      250"));
}

#[test]
fn invalid_retention_is_rejected() {
    let home = TempDir::new().expect("home");
    residue_cmd(home.path())
        .args(["config", "set-retention", "soon"])
        .assert()
        .failure()
        .stderr(contains("invalid retention"));
    assert!(!config::config_path_at(home.path()).exists());
}

#[test]
fn status_json_reports_registry_and_config() {
    let home = TempDir::new().expect("home");
    residue_cmd(home.path())
        .args(["add", "/tmp/residue-a.txt", "/tmp/residue-b.txt", "/tmp/residue-a.txt"])
        .assert()
        .success();

    let status = json_stdout(residue_cmd(home.path()).args(["status", "--json"]));
    assert_eq!(status["registry_exists"], true);
    assert_eq!(status["entries"], 3);
    assert_eq!(status["unique_entries"], 2);
    assert_eq!(status["config"]["retention_hours"], "disabled");
    assert_eq!(status["config"]["age_basis"], "created");
}

#[test]
fn malformed_config_fails_with_context() {
    let home = TempDir::new().expect("home");
    let path = config::config_path_at(home.path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, "retention_hours: [unclosed\n").expect("write");

    residue_cmd(home.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(contains("failed to load tracker config"));
}
