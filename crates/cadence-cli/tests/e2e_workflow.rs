//! End-to-end CLI workflow tests.
//!
//! Each test runs the `cad` binary as a subprocess in an isolated temp
//! directory and checks the `--json` contract.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

/// Build a Command targeting the cad binary, rooted in `dir`.
fn cad_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cad"));
    cmd.current_dir(dir);
    cmd.env("CADENCE_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn init_project(dir: &Path) {
    cad_cmd(dir).args(["init"]).assert().success();
}

/// Run a command with `--json`, assert success and parse stdout.
fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = cad_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

/// Run a command with `--json`, assert failure and return the error object.
fn run_json_err(dir: &Path, args: &[&str]) -> Value {
    let output = cad_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("command should not crash");
    assert!(!output.status.success(), "{args:?} unexpectedly succeeded");
    let json: Value =
        serde_json::from_slice(&output.stderr).expect("errors should be JSON on stderr");
    json["error"].clone()
}

fn add_task(dir: &Path, args: &[&str]) -> String {
    let mut full = vec!["add"];
    full.extend_from_slice(args);
    let json = run_json(dir, &full);
    json["data"]["id"]
        .as_str()
        .expect("add output should carry the task id")
        .to_string()
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[test]
fn commands_require_init() {
    let dir = TempDir::new().unwrap();
    let err = run_json_err(dir.path(), &["list"]);
    assert_eq!(err["error_code"], "E1001");
}

#[test]
fn init_twice_needs_force() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    cad_cmd(dir.path()).args(["init"]).assert().failure();
    cad_cmd(dir.path())
        .args(["init", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓"));
    assert!(dir.path().join(".cadence/config.toml").exists());
}

// ---------------------------------------------------------------------------
// Task pipeline
// ---------------------------------------------------------------------------

#[test]
fn capture_prioritize_schedule_and_complete() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = add_task(dir.path(), &["Write report", "-p", "high", "-t", "work"]);

    let json = run_json(dir.path(), &["prioritize", &id, "do"]);
    assert_eq!(json["data"]["stage"], "prioritized");
    assert_eq!(json["data"]["quadrant"], "do");

    let json = run_json(dir.path(), &["schedule", &id, "today", "--at", "09:30"]);
    assert_eq!(json["data"]["stage"], "scheduled");

    let json = run_json(dir.path(), &["start", &id]);
    assert_eq!(json["data"]["stage"], "in_progress");

    let json = run_json(dir.path(), &["done", &id, "--minutes", "30"]);
    assert_eq!(json["data"]["stage"], "done");
    assert_eq!(json["data"]["completed"], true);
    let rewards = json["rewards"].as_array().expect("rewards array");
    assert!(
        rewards
            .iter()
            .any(|r| r["event"] == "xp" && r["amount"].as_u64().unwrap_or(0) > 0),
        "completion should award XP: {rewards:?}"
    );

    let stats = run_json(dir.path(), &["stats"]);
    assert_eq!(stats["total_tasks_completed"], 1);
    assert_eq!(stats["completed_today"], 1);
    assert!(stats["total_xp"].as_u64().unwrap_or(0) > 0);
}

#[test]
fn illegal_move_reports_transition_error() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = add_task(dir.path(), &["Skip ahead"]);

    let err = run_json_err(dir.path(), &["move", &id, "in_progress"]);
    assert_eq!(err["error_code"], "E2002");

    let show = run_json(dir.path(), &["show", &id]);
    assert_eq!(show["stage"], "inbox");
}

#[test]
fn unknown_task_reports_not_found() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let err = run_json_err(dir.path(), &["done", "t-nope"]);
    assert_eq!(err["error_code"], "E2001");

    cad_cmd(dir.path())
        .args(["show", "t-nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E2001]"));
}

#[test]
fn unknown_stage_name_reports_enum_error() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = add_task(dir.path(), &["Somewhere"]);

    let err = run_json_err(dir.path(), &["move", &id, "flying"]);
    assert_eq!(err["error_code"], "E2006");
    assert_eq!(err["message"], "invalid stage: 'flying'");
    assert!(err["suggestion"].is_string());
}

#[test]
fn broken_project_config_reports_parse_error() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    std::fs::write(dir.path().join(".cadence/config.toml"), "[mit\n").unwrap();

    let err = run_json_err(dir.path(), &["list"]);
    assert_eq!(err["error_code"], "E1002");
    assert!(
        err["message"]
            .as_str()
            .is_some_and(|m| m.contains("config.toml"))
    );
}

#[test]
fn done_then_undone_restores_inbox() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = add_task(dir.path(), &["Flip flop"]);
    run_json(dir.path(), &["done", &id]);

    let json = run_json(dir.path(), &["undone", &id]);
    assert_eq!(json["data"]["stage"], "inbox");
    assert_eq!(json["data"]["completed"], false);
}

#[test]
fn completing_recurring_task_spawns_next_occurrence() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = add_task(dir.path(), &["Water plants", "--due", "today", "--repeat", "daily"]);
    run_json(dir.path(), &["done", &id]);

    let open = run_json(dir.path(), &["list"]);
    assert_eq!(open["count"], 1);
    let next = &open["tasks"][0];
    assert_eq!(next["title"], "Water plants");
    assert_ne!(next["id"], id.as_str());
    assert_eq!(next["stage"], "inbox");
}

#[test]
fn someday_round_trip() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = add_task(dir.path(), &["Learn the cello"]);

    let json = run_json(dir.path(), &["someday", &id]);
    assert_eq!(json["data"]["stage"], "someday");
    let listed = run_json(dir.path(), &["list", "--stage", "someday"]);
    assert_eq!(listed["count"], 1);

    let json = run_json(dir.path(), &["activate", &id]);
    assert_eq!(json["data"]["stage"], "inbox");
}

#[test]
fn subtasks_toggle_and_search() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = add_task(dir.path(), &["Pack for trip", "-s", "passport", "-s", "charger"]);

    let show = run_json(dir.path(), &["show", &id]);
    let subtasks = show["subtasks"].as_array().expect("subtasks");
    assert_eq!(subtasks.len(), 2);
    let first = subtasks[0]["id"].as_str().unwrap().to_string();

    let json = run_json(dir.path(), &["subtask", "toggle", &id, &first]);
    assert_eq!(json["data"]["subtasks"][0]["completed"], true);

    let found = run_json(dir.path(), &["list", "-s", "PACK"]);
    assert_eq!(found["count"], 1);
}

// ---------------------------------------------------------------------------
// MITs
// ---------------------------------------------------------------------------

#[test]
fn mit_cap_is_enforced() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let ids: Vec<String> = (0..4)
        .map(|i| add_task(dir.path(), &[&format!("Task {i}")]))
        .collect();

    for id in &ids[..3] {
        run_json(dir.path(), &["mit", "set", id]);
    }
    let err = run_json_err(dir.path(), &["mit", "set", &ids[3]]);
    assert_eq!(err["error_code"], "E2008");

    let mits = run_json(dir.path(), &["list", "--mits"]);
    assert_eq!(mits["count"], 3);

    run_json(dir.path(), &["mit", "unset", &ids[0]]);
    run_json(dir.path(), &["mit", "set", &ids[3]]);
}

// ---------------------------------------------------------------------------
// Goals and milestones
// ---------------------------------------------------------------------------

#[test]
fn milestone_progress_follows_linked_tasks() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());

    let goal = run_json(
        dir.path(),
        &["goal", "add", "Run a marathon", "--area", "health", "--impact", "5"],
    );
    let goal_id = goal["data"]["id"].as_str().unwrap().to_string();

    let milestone = run_json(dir.path(), &["milestone", "add", &goal_id, "Run 10k"]);
    let milestone_id = milestone["data"]["id"].as_str().unwrap().to_string();

    let first = add_task(dir.path(), &["Tempo run", "--milestone", &milestone_id]);
    add_task(dir.path(), &["Long run", "--milestone", &milestone_id]);

    let show = run_json(dir.path(), &["show", &first]);
    assert_eq!(show["goalId"], goal_id.as_str());
    assert_eq!(show["goal_title"], "Run a marathon");

    run_json(dir.path(), &["done", &first]);

    let detail = run_json(dir.path(), &["goal", "show", &goal_id]);
    assert_eq!(detail["milestones"][0]["progress"], 50);
    assert_eq!(detail["milestones"][0]["tasks"], 2);
    assert_eq!(detail["milestones"][0]["tasks_done"], 1);
    assert_eq!(detail["progress"], 50);
}

#[test]
fn deleting_goal_unlinks_tasks() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let goal = run_json(dir.path(), &["goal", "add", "Ship side project"]);
    let goal_id = goal["data"]["id"].as_str().unwrap().to_string();
    let task = add_task(dir.path(), &["Draft landing page", "--goal", &goal_id]);

    let json = run_json(dir.path(), &["goal", "delete", &goal_id]);
    assert_eq!(json["data"]["unlinked"], 1);

    let show = run_json(dir.path(), &["show", &task]);
    assert!(show["goalId"].is_null());

    let err = run_json_err(dir.path(), &["goal", "show", &goal_id]);
    assert_eq!(err["error_code"], "E2004");
}

#[test]
fn paused_goals_filter_by_status() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let goal = run_json(dir.path(), &["goal", "add", "Save for house", "--area", "finance"]);
    let goal_id = goal["data"]["id"].as_str().unwrap().to_string();
    run_json(dir.path(), &["goal", "add", "Read 20 books", "--area", "growth"]);

    run_json(dir.path(), &["goal", "pause", &goal_id]);
    let paused = run_json(dir.path(), &["goal", "list", "--status", "paused"]);
    assert_eq!(paused.as_array().map(Vec::len), Some(1));
    assert_eq!(paused[0]["title"], "Save for house");
}

#[test]
fn goal_and_milestone_edits_persist() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let goal = run_json(dir.path(), &["goal", "add", "Learn Spanish", "--area", "growth"]);
    let goal_id = goal["data"]["id"].as_str().unwrap().to_string();

    let json = run_json(dir.path(), &["goal", "edit", &goal_id, "--why", "travel", "--effort", "5"]);
    assert_eq!(json["data"]["why"], "travel");
    assert_eq!(json["data"]["priority"]["effort"], 5);
    assert_eq!(json["data"]["priority"]["impact"], 3);

    let milestone = run_json(dir.path(), &["milestone", "add", &goal_id, "A2 exam"]);
    let milestone_id = milestone["data"]["id"].as_str().unwrap().to_string();
    let json = run_json(
        dir.path(),
        &["milestone", "edit", &milestone_id, "--target", "100", "--current", "40"],
    );
    assert_eq!(json["data"]["currentValue"], 40.0);

    let detail = run_json(dir.path(), &["goal", "show", &goal_id]);
    assert_eq!(detail["why"], "travel");
    assert_eq!(detail["milestones"][0]["targetValue"], 100.0);
}

// ---------------------------------------------------------------------------
// Gamification
// ---------------------------------------------------------------------------

#[test]
fn focus_time_accumulates() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    run_json(dir.path(), &["focus", "25"]);
    let json = run_json(dir.path(), &["focus", "20"]);
    assert_eq!(json["data"]["focus_seconds_today"], 45 * 60);

    cad_cmd(dir.path()).args(["focus", "0"]).assert().failure();
}

#[test]
fn weekly_challenges_are_generated_and_persisted() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let first = run_json(dir.path(), &["challenges"]);
    let second = run_json(dir.path(), &["challenges"]);
    assert!(!first.as_array().map_or(true, Vec::is_empty));
    assert_eq!(first, second);
}

#[test]
fn first_completion_unlocks_an_achievement() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = add_task(dir.path(), &["Anything"]);
    let json = run_json(dir.path(), &["done", &id]);
    let rewards = json["rewards"].as_array().expect("rewards");
    assert!(
        rewards.iter().any(|r| r["event"] == "achievement_unlocked"),
        "expected an unlock: {rewards:?}"
    );

    let achievements = run_json(dir.path(), &["achievements"]);
    let unlocked = achievements
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["unlocked"] == true)
        .count();
    assert!(unlocked >= 1);
}

#[test]
fn stats_reset_zeroes_progress() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    let id = add_task(dir.path(), &["Anything"]);
    run_json(dir.path(), &["done", &id]);

    run_json(dir.path(), &["stats", "--reset"]);
    let stats = run_json(dir.path(), &["stats"]);
    assert_eq!(stats["total_xp"], 0);
    assert_eq!(stats["total_tasks_completed"], 0);
    assert_eq!(stats["level"]["level"], 1);
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

#[test]
fn export_then_import_into_fresh_project() {
    let src = TempDir::new().unwrap();
    init_project(src.path());
    add_task(src.path(), &["Keep me"]);
    let done = add_task(src.path(), &["Finished"]);
    run_json(src.path(), &["done", &done]);

    let backup = src.path().join("backup.json");
    cad_cmd(src.path())
        .args(["export", "-o", backup.to_str().unwrap()])
        .assert()
        .success();
    let document: Value =
        serde_json::from_str(&std::fs::read_to_string(&backup).unwrap()).unwrap();
    assert_eq!(document["tasks"].as_array().map(Vec::len), Some(2));
    assert!(document["version"].is_string());

    let dst = TempDir::new().unwrap();
    init_project(dst.path());
    let json = run_json(dst.path(), &["import", backup.to_str().unwrap()]);
    assert_eq!(json["data"]["imported"], 2);

    let all = run_json(dst.path(), &["list", "--all"]);
    assert_eq!(all["count"], 2);
    let stats = run_json(dst.path(), &["stats"]);
    assert_eq!(stats["total_tasks_completed"], 1);
}

#[test]
fn malformed_import_changes_nothing() {
    let dir = TempDir::new().unwrap();
    init_project(dir.path());
    add_task(dir.path(), &["Survivor"]);

    let output = cad_cmd(dir.path())
        .args(["import", "-", "--json"])
        .write_stdin("{ not json")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["error_code"], "E3001");

    let listed = run_json(dir.path(), &["list"]);
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["tasks"][0]["title"], "Survivor");
}

#[test]
fn completions_generate_for_bash() {
    let dir = TempDir::new().unwrap();
    cad_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cad"));
}
