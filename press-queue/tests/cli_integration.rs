//! Integration tests for press-queue

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

struct TestEnv {
    temp_dir: TempDir,
    config_path: String,
    db_path: String,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let db_path = temp_dir.path().join("storage.db");
        Self {
            config_path: config_path.to_string_lossy().to_string(),
            db_path: db_path.to_string_lossy().to_string(),
            temp_dir,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("press-queue").unwrap();
        cmd.current_dir(self.temp_dir.path())
            .env("AUTOPRESS_CONFIG", &self.config_path)
            .env("AUTOPRESS_DB_PATH", &self.db_path)
            .env_remove("WP_BASE_URL")
            .env_remove("WP_USERNAME")
            .env_remove("WP_APP_PASSWORD");
        cmd
    }
}

#[test]
fn test_add_then_list() {
    let env = TestEnv::new();

    env.cmd()
        .args(["add", "How AI Changes Painting", "--category", "AI & Culture"])
        .assert()
        .success()
        .stdout("1\n");

    env.cmd()
        .args(["list", "--status", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("How AI Changes Painting"))
        .stdout(predicate::str::contains("AI & Culture"))
        .stdout(predicate::str::contains("pending"));
}

#[test]
fn test_add_duplicate_and_empty_seed_rejected() {
    let env = TestEnv::new();
    env.cmd().args(["add", "Same seed"]).assert().success();

    env.cmd()
        .args(["add", "Same seed"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("already exists"));

    env.cmd().args(["add", "   "]).assert().code(3);
}

#[test]
fn test_list_json() {
    let env = TestEnv::new();
    env.cmd().args(["add", "Json seed"]).assert().success();

    let output = env
        .cmd()
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plans: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plans[0]["seed"], "Json seed");
    assert_eq!(plans[0]["status"], "pending");
}

#[test]
fn test_invalid_format_and_status() {
    let env = TestEnv::new();
    env.cmd()
        .args(["list", "--format", "yaml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid format"));
    env.cmd()
        .args(["list", "--status", "archived"])
        .assert()
        .code(3);
}

#[test]
fn test_csv_import_twice_adds_nothing_second_time() {
    let env = TestEnv::new();
    let csv_path = env.temp_dir.path().join("plan.csv");
    fs::write(
        &csv_path,
        "Culture,Art, Music, and Machines\nPractice,Prompting for Spreadsheets\n",
    )
    .unwrap();
    let csv_arg = csv_path.to_string_lossy().to_string();

    env.cmd()
        .args(["import", &csv_arg, "--csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added:              2"));

    env.cmd()
        .args(["import", &csv_arg, "--csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added:              0"))
        .stdout(predicate::str::contains("Skipped duplicates: 2"));
}

#[test]
fn test_stats_json() {
    let env = TestEnv::new();
    env.cmd()
        .args(["add", "One", "--category", "News"])
        .assert()
        .success();
    env.cmd().args(["add", "Two"]).assert().success();

    let output = env
        .cmd()
        .args(["stats", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["pending"], 2);
    assert_eq!(stats["published"], 0);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["posts"], 0);
    assert!(stats["last_publish"].is_null());
    assert_eq!(stats["categories"]["News"], 1);
    assert_eq!(stats["categories"]["uncategorized"], 1);
}

#[test]
fn test_import_missing_file() {
    let env = TestEnv::new();
    env.cmd()
        .args(["import", "does-not-exist.txt"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn test_show_post_without_cms_config() {
    let env = TestEnv::new();
    env.cmd()
        .args(["show-post", "42"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("CMS is not configured"));
}
