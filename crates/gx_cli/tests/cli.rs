use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn greendex() -> Command {
    Command::cargo_bin("greendex").unwrap()
}

fn read_json(p: &Path) -> Value {
    serde_json::from_slice(&fs::read(p).unwrap()).unwrap()
}

const PROJECT: &str = r#"{
  "project": {"id": "exchange-2026", "name": "Youth Exchange", "location": "Porto"},
  "activities": [{"activityType": "bus", "distanceKm": "40"}, {"activityType": "unicycle", "distanceKm": 3}],
  "participants": [
    {"id": "p1", "name": "Lea", "country": "DE", "answers": {"flightKm": 1500, "days": 7, "food": "every day"}},
    {"id": "p2", "name": "Tom", "country": "FR", "answers": {"trainKm": "900", "days": 7, "food": "never"}},
    {"id": "p3", "name": "Ines", "country": "PT"}
  ]
}"#;

#[test]
fn participant_run_writes_emissions_and_run_record() {
    let dir = tempfile::tempdir().unwrap();
    let answers = dir.path().join("answers.json");
    fs::write(&answers, r#"{"carKm": 300, "carType": "electric", "carPassengers": 3, "days": 5}"#).unwrap();
    let out = dir.path().join("out");

    greendex()
        .args(["--answers", answers.to_str().unwrap(), "--out", out.to_str().unwrap(), "--quiet"])
        .assert()
        .success();

    let report = read_json(&out.join("emissions.json"));
    let run = read_json(&out.join("run_record.json"));
    assert!(report["id"].as_str().unwrap().starts_with("GXR:"));
    assert_eq!(run["outputs"]["result_id"], report["id"]);
    assert_eq!(run["outputs"]["artifact"], "emissions.json");
    assert_eq!(run["model"]["source"], "builtin");
    assert!(report["emissions"]["totalCO2"].as_f64().unwrap() > 0.0);
}

#[test]
fn project_run_sorts_and_ranks() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("project.json");
    fs::write(&bundle, PROJECT).unwrap();
    let out = dir.path().join("out");

    greendex()
        .args(["--project", bundle.to_str().unwrap(), "--out", out.to_str().unwrap()])
        .args(["--sort-by", "name", "--quiet"])
        .assert()
        .success();

    let report = read_json(&out.join("project_report.json"));
    let names: Vec<&str> = report["participants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Ines", "Lea", "Tom"]);
    assert_eq!(report["leaderboard"][0]["participantId"], "p2");
    assert_eq!(report["leaderboard"][2]["rank"], Value::Null);
    assert_eq!(report["stats"]["totalParticipants"], 3);
}

#[test]
fn validate_only_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("project.json");
    fs::write(&bundle, PROJECT).unwrap();
    let out = dir.path().join("out");

    greendex()
        .args(["--project", bundle.to_str().unwrap(), "--out", out.to_str().unwrap(), "--validate-only"])
        .assert()
        .success()
        .stderr(predicate::str::contains("inputs OK"));
    assert!(!out.exists());
}

#[test]
fn url_inputs_exit_with_validation_code() {
    greendex()
        .args(["--answers", "https://example.org/answers.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no scheme"));
}

#[test]
fn duplicate_participant_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("project.json");
    fs::write(
        &bundle,
        r#"{"project": {"id": "x", "name": "X"},
            "participants": [{"id": "p1", "name": "A"}, {"id": "p1", "name": "B"}]}"#,
    )
    .unwrap();

    greendex()
        .args(["--project", bundle.to_str().unwrap(), "--validate-only"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("duplicate participant id"));
}

#[test]
fn manifest_expectation_mismatch_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("answers.json"), r#"{"busKm": 100}"#).unwrap();
    let manifest = dir.path().join("manifest.json");
    fs::write(
        &manifest,
        r#"{"answers_path": "answers.json", "expect": {"model_version": "greendex-v0"}}"#,
    )
    .unwrap();

    greendex()
        .args(["--manifest", manifest.to_str().unwrap(), "--out", dir.path().join("o").to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("model_version"));
}

#[test]
fn oversized_input_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    let answers = dir.path().join("answers.json");
    let pad = " ".repeat(9 * 1024 * 1024);
    fs::write(&answers, format!("{{{pad}}}")).unwrap();

    greendex()
        .args(["--answers", answers.to_str().unwrap(), "--validate-only"])
        .assert()
        .code(4);
}
