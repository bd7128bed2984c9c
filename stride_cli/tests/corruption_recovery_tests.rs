//! Corruption recovery tests for stride_cli.
//!
//! These tests verify the system can handle:
//! - Corrupted history snapshots
//! - Corrupted program files
//! - Stale aggregate caches

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("stride"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

const MONDAY: &str = "2025-01-06";

#[test]
fn test_corrupted_history_starts_empty() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("workout_history.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted history");

    cli()
        .arg("stats")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--today")
        .arg(MONDAY)
        .assert()
        .success()
        .stdout(predicate::str::contains("All time:        0"));
}

#[test]
fn test_corrupted_history_is_replaced_on_next_write() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("workout_history.json"), "not even json").unwrap();

    cli()
        .arg("done")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--today")
        .arg(MONDAY)
        .assert()
        .success();

    // The snapshot is valid again
    let history = fs::read_to_string(data_dir.join("workout_history.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&history).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[test]
fn test_corrupted_program_falls_back_to_default() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("program.json"), "{ broken }").unwrap();

    // Monday of the default program is a push day
    cli()
        .arg("today")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--today")
        .arg(MONDAY)
        .assert()
        .success()
        .stdout(predicate::str::contains("Push Day"));
}

#[test]
fn test_stale_stats_cache_is_ignored() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .arg("done")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--today")
        .arg(MONDAY)
        .assert()
        .success();

    // Poison the caches; they must be recomputed from history on load
    fs::write(data_dir.join("workout_stats.json"), r#"{"total_completed":99}"#).unwrap();
    fs::write(data_dir.join("workout_streak.json"), "42").unwrap();

    cli()
        .arg("stats")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--today")
        .arg(MONDAY)
        .assert()
        .success()
        .stdout(predicate::str::contains("Streak:          1"))
        .stdout(predicate::str::contains("All time:        1"));
}
