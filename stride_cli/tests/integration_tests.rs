//! Integration tests for the stride binary.
//!
//! These tests verify end-to-end behavior including:
//! - Schedule display and resolution
//! - Complete/skip/reflect/reset flows
//! - Plan import with fallback
//! - Persistence across invocations

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("stride"))
}

/// A Monday; the default program anchors to the Monday of "today"'s week
const MONDAY: &str = "2025-01-06";
const TUESDAY: &str = "2025-01-07";
const THURSDAY: &str = "2025-01-09";

fn run(data_dir: &Path, today: &str, args: &[&str]) -> assert_cmd::assert::Assert {
    cli()
        .args(args)
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--today")
        .arg(today)
        .assert()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Training schedule and session ledger",
        ));
}

#[test]
fn test_today_shows_schedule_and_phase() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["today"])
        .success()
        .stdout(predicate::str::contains("Push Day"))
        .stdout(predicate::str::contains("Week 1"))
        .stdout(predicate::str::contains("Streak: 0"));
}

#[test]
fn test_default_command_is_today() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &[])
        .success()
        .stdout(predicate::str::contains("TODAY"));
}

#[test]
fn test_first_run_saves_program() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["today"]).success();

    assert!(temp_dir.path().join("program.json").exists());
}

#[test]
fn test_done_logs_session_and_persists() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["done"])
        .success()
        .stdout(predicate::str::contains("Workout logged"))
        .stdout(predicate::str::contains("Streak: 1"));

    // History snapshot written
    let history = fs::read_to_string(temp_dir.path().join("workout_history.json"))
        .expect("Failed to read history");
    assert!(history.contains("push_day"));
    assert!(history.contains("completed"));

    // Visible on the next invocation
    run(temp_dir.path(), MONDAY, &["stats"])
        .success()
        .stdout(predicate::str::contains("Streak:          1"))
        .stdout(predicate::str::contains("Completion rate: 100%"));
}

#[test]
fn test_done_with_progress_flags() {
    let temp_dir = setup_test_dir();

    run(
        temp_dir.path(),
        MONDAY,
        &["done", "--progress", "pushup=ttff"],
    )
    .success();

    let history = fs::read_to_string(temp_dir.path().join("workout_history.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&history).unwrap();
    let progress = &records[0]["exercise_progress"]["pushup"];
    assert_eq!(progress[0], true);
    assert_eq!(progress[3], false);
}

#[test]
fn test_done_on_rest_day_fails() {
    let temp_dir = setup_test_dir();

    // Thursday of week 1 is a rest day
    run(temp_dir.path(), THURSDAY, &["done"]).failure();
}

#[test]
fn test_double_done_fails() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["done"]).success();
    run(temp_dir.path(), MONDAY, &["done"]).failure();
}

#[test]
fn test_skip_records_reason() {
    let temp_dir = setup_test_dir();

    run(
        temp_dir.path(),
        MONDAY,
        &["skip", "--reason", "fatigue", "--notes", "long day"],
    )
    .success()
    .stdout(predicate::str::contains("Workout skipped"))
    .stdout(predicate::str::contains("Streak: 0"));

    let history = fs::read_to_string(temp_dir.path().join("workout_history.json")).unwrap();
    assert!(history.contains("fatigue"));
    assert!(history.contains("long day"));

    run(temp_dir.path(), MONDAY, &["stats"])
        .success()
        .stdout(predicate::str::contains("Completion rate: 0%"));
}

#[test]
fn test_reflect_attaches_and_overwrites() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["done"]).success();
    run(
        temp_dir.path(),
        MONDAY,
        &["reflect", "--effort", "7", "--tag", "strong", "--notes", "tired"],
    )
    .success()
    .stdout(predicate::str::contains("Reflection saved"));

    // A second reflect replaces the first
    run(
        temp_dir.path(),
        MONDAY,
        &["reflect", "--notes", "actually fine"],
    )
    .success();

    let history = fs::read_to_string(temp_dir.path().join("workout_history.json")).unwrap();
    let records: serde_json::Value = serde_json::from_str(&history).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
    let reflection = &records[0]["reflection"];
    assert_eq!(reflection["notes"], "actually fine");
    assert_eq!(reflection["effort"], serde_json::Value::Null);
}

#[test]
fn test_reflect_without_session_fails() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["reflect", "--notes", "hm"]).failure();
}

#[test]
fn test_reflect_rejects_too_many_tags() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["done"]).success();
    run(
        temp_dir.path(),
        MONDAY,
        &[
            "reflect", "--tag", "a", "--tag", "b", "--tag", "c", "--tag", "d",
        ],
    )
    .failure();
}

#[test]
fn test_reset_clears_today() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["done"]).success();
    run(temp_dir.path(), MONDAY, &["reset"])
        .success()
        .stdout(predicate::str::contains("Removed 1 session"));

    run(temp_dir.path(), MONDAY, &["stats"])
        .success()
        .stdout(predicate::str::contains("Streak:          0"))
        .stdout(predicate::str::contains("All time:        0"));

    // Can log again after reset
    run(temp_dir.path(), MONDAY, &["done"]).success();
}

#[test]
fn test_streak_across_days_with_grace() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["done"]).success();
    run(temp_dir.path(), TUESDAY, &["done"])
        .success()
        .stdout(predicate::str::contains("Streak: 2"));

    // Wednesday morning, nothing logged yet: grace keeps the streak
    run(temp_dir.path(), "2025-01-08", &["stats"])
        .success()
        .stdout(predicate::str::contains("Streak:          2"));
}

#[test]
fn test_show_cycle_repeat() {
    let temp_dir = setup_test_dir();

    // 2025-02-03 is exactly 28 days (one full cycle) after the anchor
    run(temp_dir.path(), MONDAY, &["show", "2025-02-03"])
        .success()
        .stdout(predicate::str::contains("Push Day"));

    run(temp_dir.path(), MONDAY, &["show", "2024-12-30"])
        .success()
        .stdout(predicate::str::contains("NotStarted"));
}

#[test]
fn test_extra_workout_allows_second_session() {
    let temp_dir = setup_test_dir();

    run(temp_dir.path(), MONDAY, &["done"]).success();
    // Extras are transient, so register and complete in one day works
    // only through the store; across invocations the extra is gone and a
    // second done fails.
    run(temp_dir.path(), MONDAY, &["extra", "mobility_flow"])
        .success()
        .stdout(predicate::str::contains("mobility_flow"));
    run(temp_dir.path(), MONDAY, &["done"]).failure();
}

#[test]
fn test_import_valid_plan() {
    let temp_dir = setup_test_dir();
    let plan_path = temp_dir.path().join("plan.json");
    fs::write(
        &plan_path,
        r#"{
            "programName": "Hypertrophy Block",
            "weeks": 4,
            "schedule": [
                {
                    "day": "Monday",
                    "focus": "Upper Push",
                    "exercises": [{"name": "Bench Press", "sets": 4, "reps": 8}]
                }
            ],
            "progressionNotes": "Add weight weekly."
        }"#,
    )
    .unwrap();

    run(
        temp_dir.path(),
        MONDAY,
        &["import", plan_path.to_str().unwrap()],
    )
    .success()
    .stdout(predicate::str::contains("Imported plan 'Hypertrophy Block'"));

    // The new program drives the schedule
    run(temp_dir.path(), MONDAY, &["today"])
        .success()
        .stdout(predicate::str::contains("Upper Push"));
}

#[test]
fn test_import_malformed_plan_falls_back() {
    let temp_dir = setup_test_dir();
    let plan_path = temp_dir.path().join("plan.json");
    fs::write(&plan_path, "{ not a plan }").unwrap();

    run(
        temp_dir.path(),
        MONDAY,
        &["import", plan_path.to_str().unwrap()],
    )
    .success()
    .stdout(predicate::str::contains("Plan rejected"))
    .stdout(predicate::str::contains("Foundation Block"));

    // The default program still drives the schedule
    run(temp_dir.path(), MONDAY, &["today"])
        .success()
        .stdout(predicate::str::contains("Push Day"));
}

#[test]
fn test_export_creates_csv() {
    let temp_dir = setup_test_dir();
    let csv_path = temp_dir.path().join("history.csv");

    run(temp_dir.path(), MONDAY, &["done"]).success();
    run(
        temp_dir.path(),
        MONDAY,
        &["export", csv_path.to_str().unwrap()],
    )
    .success()
    .stdout(predicate::str::contains("Exported 1 session"));

    let contents = fs::read_to_string(&csv_path).unwrap();
    assert!(contents.starts_with("id,"));
    assert!(contents.contains("push_day"));
    assert!(contents.contains("completed"));
}

#[test]
fn test_export_empty_ledger() {
    let temp_dir = setup_test_dir();
    let csv_path = temp_dir.path().join("history.csv");

    run(
        temp_dir.path(),
        MONDAY,
        &["export", csv_path.to_str().unwrap()],
    )
    .success()
    .stdout(predicate::str::contains("No sessions to export"));

    assert!(!csv_path.exists());
}
