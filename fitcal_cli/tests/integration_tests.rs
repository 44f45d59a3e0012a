//! Integration tests for the fitcal binary.
//!
//! These tests verify end-to-end behavior including:
//! - Library browsing and scheduling
//! - Session logging and badge awards
//! - Routines, stats and CSV export
//! - Sign in and sign out

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI pointed at a data directory and config file inside `dir`
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fitcal"));
    cmd.arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

fn read_collection(dir: &Path, name: &str) -> Vec<Value> {
    let path = dir.join("data/store").join(format!("{}.json", name));
    let content = fs::read_to_string(&path).expect("Failed to read collection");
    serde_json::from_str(&content).expect("Collection is not a JSON array")
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("fitcal"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout calendar and session tracker"));
}

#[test]
fn test_workouts_seeds_library() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .arg("workouts")
        .assert()
        .success()
        .stdout(predicate::str::contains("Leg Day"))
        .stdout(predicate::str::contains("Morning Flow"));

    assert_eq!(read_collection(temp_dir.path(), "workouts").len(), 6);

    // Second run does not seed again
    cli(temp_dir.path()).arg("workouts").assert().success();
    assert_eq!(read_collection(temp_dir.path(), "workouts").len(), 6);
}

#[test]
fn test_workouts_filters() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["workouts", "--type", "yoga"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Morning Flow"))
        .stdout(predicate::str::contains("Leg Day").not());

    cli(temp_dir.path())
        .args(["workouts", "--search", "swimming"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts match"));

    cli(temp_dir.path())
        .args(["workouts", "--difficulty", "impossible"])
        .assert()
        .failure();
}

#[test]
fn test_schedule_weekly_with_end_date() {
    let temp_dir = setup_test_dir();

    // 2024-03-01 is a Friday; Mondays and Wednesdays through the 14th
    cli(temp_dir.path())
        .args([
            "schedule",
            "--workout",
            "leg day",
            "--date",
            "2024-03-01",
            "--time",
            "18:00",
            "--repeat",
            "weekly",
            "--days",
            "mon,wed",
            "--until",
            "2024-03-14",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scheduled Leg Day 4 time(s) (weekly)"));

    let records = read_collection(temp_dir.path(), "scheduled_workouts");
    let dates: Vec<&str> = records
        .iter()
        .map(|r| r["scheduled_date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-03-04", "2024-03-06", "2024-03-11", "2024-03-13"]);
    assert!(records.iter().all(|r| r["scheduled_time"] == "18:00"));
    assert!(records.iter().all(|r| r["status"] == "scheduled"));
    assert!(records.iter().all(|r| r["user_email"] == "athlete@localhost"));
}

#[test]
fn test_schedule_weekly_defaults_to_start_weekday() {
    let temp_dir = setup_test_dir();

    // No --days: repeats on Fridays, the weekday of 2024-03-01
    cli(temp_dir.path())
        .args([
            "schedule",
            "--workout",
            "Leg Day",
            "--date",
            "2024-03-01",
            "--repeat",
            "weekly",
            "--until",
            "2024-03-15",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scheduled Leg Day 3 time(s) (weekly)"));

    let records = read_collection(temp_dir.path(), "scheduled_workouts");
    let dates: Vec<&str> = records
        .iter()
        .map(|r| r["scheduled_date"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2024-03-01", "2024-03-08", "2024-03-15"]);
}

#[test]
fn test_schedule_daily_without_end_date_uses_horizon() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args([
            "schedule",
            "--workout",
            "Core Blast",
            "--date",
            "2024-01-01",
            "--repeat",
            "daily",
        ])
        .assert()
        .success();

    let records = read_collection(temp_dir.path(), "scheduled_workouts");
    assert_eq!(records.len(), 91);
    assert_eq!(records[0]["scheduled_time"], "09:00");
    assert_eq!(records[90]["scheduled_date"], "2024-03-31");
}

#[test]
fn test_schedule_dry_run_stores_nothing() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args([
            "schedule",
            "--workout",
            "HIIT Express",
            "--date",
            "2024-01-31",
            "--repeat",
            "monthly",
            "--until",
            "2024-04-30",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("would be scheduled 4 time(s)"))
        .stdout(predicate::str::contains("2024-03-01"))
        .stdout(predicate::str::contains("Dry run"));

    assert!(!temp_dir
        .path()
        .join("data/store/scheduled_workouts.json")
        .exists());
}

#[test]
fn test_schedule_end_before_start_stores_nothing() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args([
            "schedule",
            "--workout",
            "Leg Day",
            "--date",
            "2024-03-10",
            "--repeat",
            "daily",
            "--until",
            "2024-03-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing scheduled"));
}

#[test]
fn test_schedule_unknown_workout_fails() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["schedule", "--workout", "Swimming", "--date", "2024-03-01"])
        .assert()
        .failure();
}

#[test]
fn test_calendar_and_mark() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["schedule", "--workout", "Leg Day", "--date", "2024-03-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scheduled Leg Day 1 time(s) (none)"));

    cli(temp_dir.path())
        .args(["calendar", "--date", "2024-03-05"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Leg Day"))
        .stdout(predicate::str::contains("[scheduled]"));

    let id = read_collection(temp_dir.path(), "scheduled_workouts")[0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    cli(temp_dir.path())
        .args(["mark", &id, "skipped"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marked skipped"));

    let records = read_collection(temp_dir.path(), "scheduled_workouts");
    assert_eq!(records[0]["status"], "skipped");
    assert_eq!(records[0]["version"], 2);

    cli(temp_dir.path())
        .args(["mark", "no-such-id", "completed"])
        .assert()
        .failure();
}

#[test]
fn test_session_logged_and_first_badge_awarded() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args([
            "session",
            "--workout",
            "Core Blast",
            "--auto-complete",
            "--simulate-seconds",
            "600",
            "--notes",
            "felt good",
            "--rating",
            "4",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session logged"))
        .stdout(predicate::str::contains("Duration:  10 min"))
        .stdout(predicate::str::contains("first_workout"));

    let sessions = read_collection(temp_dir.path(), "workout_sessions");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["workout_name"], "Core Blast");
    assert_eq!(sessions[0]["duration_minutes"], 10);
    assert_eq!(sessions[0]["calories_burned"], 0);
    assert_eq!(sessions[0]["notes"], "felt good");
    assert_eq!(sessions[0]["rating"], 4);
    assert_eq!(sessions[0]["exercises_completed"].as_array().unwrap().len(), 4);

    let profiles = read_collection(temp_dir.path(), "user_profiles");
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["total_workouts"], 1);
    assert_eq!(profiles[0]["badges_earned"], serde_json::json!(["first_workout"]));

    // The second session awards nothing new
    cli(temp_dir.path())
        .args(["session", "--workout", "Core Blast", "--auto-complete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Badge earned").not());

    cli(temp_dir.path())
        .arg("profile")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total workouts: 2"));
}

#[test]
fn test_session_rejects_out_of_range_rating() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args([
            "session",
            "--workout",
            "Core Blast",
            "--auto-complete",
            "--rating",
            "9",
        ])
        .assert()
        .failure();

    assert!(!temp_dir
        .path()
        .join("data/store/workout_sessions.json")
        .exists());

    Command::new(assert_cmd::cargo::cargo_bin!("fitcal"))
        .args(["session", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rating from 0 (unrated) to 5"));
}

#[test]
fn test_plan_create_list_session_delete() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args([
            "plan",
            "create",
            "--name",
            "Lunch Burner",
            "--type",
            "hiit",
            "--exercise",
            "Burpees:3:10::30",
            "--exercise",
            "Plank:::60",
        ])
        .assert()
        .success()
        // 3 * (20 + 30) = 150s -> 3 min, plus 1 min of plank
        .stdout(predicate::str::contains("2 exercises, ~4 min"));

    cli(temp_dir.path())
        .args(["plan", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lunch Burner [hiit]"));

    cli(temp_dir.path())
        .args([
            "session",
            "--workout",
            "lunch burner",
            "--source",
            "custom-plan",
            "--auto-complete",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session logged"));

    let id = read_collection(temp_dir.path(), "workout_plans")[0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    cli(temp_dir.path())
        .args(["plan", "delete", &id])
        .assert()
        .success();

    cli(temp_dir.path())
        .args(["plan", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No routines yet"));
}

#[test]
fn test_plan_exercises_search() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["plan", "exercises", "--search", "plank"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Side Plank"))
        .stdout(predicate::str::contains("core"))
        .stdout(predicate::str::contains("Squats").not());

    cli(temp_dir.path())
        .args(["plan", "exercises", "--search", "plank", "--category", "cardio"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No exercises match"));

    cli(temp_dir.path())
        .args(["plan", "exercises", "--category", "yoga"])
        .assert()
        .failure();
}

#[test]
fn test_plan_without_exercise_name_fails() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["plan", "create", "--name", "Broken", "--exercise", ":3:10"])
        .assert()
        .failure();
}

#[test]
fn test_stats_and_export() {
    let temp_dir = setup_test_dir();
    let out_dir = temp_dir.path().join("export");

    cli(temp_dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total sessions:     0"));

    cli(temp_dir.path())
        .args([
            "session",
            "--workout",
            "Leg Day",
            "--auto-complete",
            "--simulate-seconds",
            "1800",
        ])
        .assert()
        .success();
    cli(temp_dir.path())
        .args(["schedule", "--workout", "Leg Day", "--date", "2024-03-05"])
        .assert()
        .success();

    cli(temp_dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total sessions:     1"))
        .stdout(predicate::str::contains("This week:          1"))
        .stdout(predicate::str::contains("Average duration:   30 min"));

    cli(temp_dir.path())
        .arg("export")
        .arg("--out")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 sessions"))
        .stdout(predicate::str::contains("Exported 1 scheduled workouts"));

    let sessions_csv = fs::read_to_string(out_dir.join("sessions.csv")).unwrap();
    assert!(sessions_csv.starts_with("id,workout_id,workout_name"));
    assert!(sessions_csv.contains("Leg Day"));

    let schedule_csv = fs::read_to_string(out_dir.join("schedule.csv")).unwrap();
    assert!(schedule_csv.contains("2024-03-05,09:00,scheduled"));
}

#[test]
fn test_login_logout_whoami() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Athlete <athlete@localhost>"));

    cli(temp_dir.path())
        .args(["login", "--email", "sam@example.com", "--name", "Sam"])
        .assert()
        .success();

    cli(temp_dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sam <sam@example.com>"));

    cli(temp_dir.path()).arg("logout").assert().success();

    cli(temp_dir.path())
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unauthenticated"));

    // Signed-out users cannot log sessions
    cli(temp_dir.path())
        .args(["session", "--workout", "Leg Day", "--auto-complete"])
        .assert()
        .failure();

    let config = fs::read_to_string(temp_dir.path().join("config.toml")).unwrap();
    assert!(config.contains("signed_in = false"));
}

#[test]
fn test_sessions_are_scoped_to_user() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["session", "--workout", "Leg Day", "--auto-complete"])
        .assert()
        .success();

    cli(temp_dir.path())
        .args(["login", "--email", "other@example.com", "--name", "Other"])
        .assert()
        .success();

    cli(temp_dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total sessions:     0"));

    cli(temp_dir.path())
        .arg("profile")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total workouts: 0"));
}
