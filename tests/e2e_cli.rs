//! End-to-end CLI tests driving the `cvt` binary against a temp
//! workspace.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cvt(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cvt").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn write_zones(dir: &Path) {
    let zones = serde_json::json!([{
        "id": "ward-12",
        "name": "Market Ward",
        "zone_label": "W12",
        "officer": {
            "name": "M. Officer",
            "email": "w12@ward.test",
            "phone": "+915550100"
        },
        "polygon": [
            { "lat": 12.90, "lon": 77.50 },
            { "lat": 12.90, "lon": 77.70 },
            { "lat": 13.10, "lon": 77.70 },
            { "lat": 13.10, "lon": 77.50 }
        ]
    }]);
    fs::write(dir.join("zones.json"), zones.to_string()).unwrap();
}

fn ingest_json(dir: &Path, description: &str, lat: f64, lon: f64) -> Value {
    let output = cvt(dir)
        .args([
            "--json",
            "ingest",
            "--category",
            "pothole",
            "--lat",
            &lat.to_string(),
            "--lon",
            &lon.to_string(),
            description,
        ])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "ingest failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn init_is_idempotent_only_with_force() {
    let dir = TempDir::new().unwrap();
    cvt(dir.path()).arg("init").assert().success();
    cvt(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Already initialized"));
    cvt(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn commands_without_workspace_fail_with_hint() {
    let dir = TempDir::new().unwrap();
    cvt(dir.path())
        .args(["list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn ingest_routes_and_merges_duplicates() {
    let dir = TempDir::new().unwrap();
    cvt(dir.path()).arg("init").assert().success();
    write_zones(dir.path());
    cvt(dir.path())
        .args(["zone", "import", "zones.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 zone"));

    let first = ingest_json(dir.path(), "deep pothole", 12.9716, 77.5946);
    assert_eq!(first["merged"], Value::Bool(false));
    assert_eq!(first["zone_id"], "ward-12");
    let root_id = first["issue_id"].as_str().unwrap().to_string();

    // ~20m away, same category: merged.
    let second = ingest_json(dir.path(), "same hole again", 12.9718, 77.5946);
    assert_eq!(second["merged"], Value::Bool(true));
    assert_eq!(second["parent_id"].as_str().unwrap(), root_id);

    let show = cvt(dir.path())
        .args(["--json", "show", &root_id])
        .output()
        .unwrap();
    let snapshot: Value = serde_json::from_slice(&show.stdout).unwrap();
    assert_eq!(snapshot["state"], "submitted");
    assert_eq!(snapshot["supporter_count"], 2);
}

#[test]
fn transition_enforces_the_state_graph() {
    let dir = TempDir::new().unwrap();
    cvt(dir.path()).arg("init").assert().success();
    let outcome = ingest_json(dir.path(), "flickering light", 12.9716, 77.5946);
    let id = outcome["issue_id"].as_str().unwrap().to_string();

    // Skipping straight to resolved is rejected.
    cvt(dir.path())
        .args(["transition", &id, "resolved"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid transition"));

    cvt(dir.path())
        .args(["transition", &id, "verified"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verified"));

    // IN_PROGRESS without an officer location fails the guard.
    cvt(dir.path())
        .args(["transition", &id, "assigned"])
        .assert()
        .success();
    cvt(dir.path())
        .args(["transition", &id, "in_progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Geofence"));

    // On site, it succeeds.
    cvt(dir.path())
        .args([
            "transition",
            &id,
            "in_progress",
            "--officer-lat",
            "12.9716",
            "--officer-lon",
            "77.5946",
        ])
        .assert()
        .success();
}

#[test]
fn sweep_reports_an_empty_pass() {
    let dir = TempDir::new().unwrap();
    cvt(dir.path()).arg("init").assert().success();
    cvt(dir.path())
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("Escalation: scanned 0"))
        .stdout(predicate::str::contains("Promotion:  scanned 0"));
}

#[test]
fn unknown_category_fails_validation() {
    let dir = TempDir::new().unwrap();
    cvt(dir.path()).arg("init").assert().success();
    cvt(dir.path())
        .args(["ingest", "--category", "volcano", "lava on the road"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid category"));
}
