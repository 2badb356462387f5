use std::fs;
use std::path::{Path, PathBuf};

use predicates::prelude::*;
use tempfile::tempdir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../core/tests/fixtures/sample")
}

fn fake_binary(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, vec![0xccu8; 4096]).expect("write binary");
    path
}

#[test]
fn analyze_writes_metrics_document() {
    let dir = tempdir().expect("tempdir");
    let binary = fake_binary(dir.path(), "test_easy_normal");
    let out = dir.path().join("results");

    assert_cmd::cargo::cargo_bin_cmd!("re-bench")
        .arg("analyze")
        .arg(&binary)
        .arg("--fixtures")
        .arg(fixtures())
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode: normal"))
        .stdout(predicate::str::contains("RE difficulty:"));

    let doc = out.join("test_easy_normal_normal_metrics.json");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&doc).expect("read metrics")).expect("parse");
    assert_eq!(json["static_analysis"]["num_instructions"], 17);
    assert_eq!(json["obfuscation_mode"], "normal");
}

#[test]
fn analyze_json_honours_explicit_mode() {
    let dir = tempdir().expect("tempdir");
    let binary = fake_binary(dir.path(), "crackme");

    let output = assert_cmd::cargo::cargo_bin_cmd!("re-bench")
        .arg("analyze")
        .arg(&binary)
        .args(["--mode", "maximum_security", "--json"])
        .arg("--fixtures")
        .arg(fixtures())
        .arg("--output-dir")
        .arg(dir.path())
        .output()
        .expect("run re-bench");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["binary_name"], "crackme");
    assert_eq!(json["obfuscation_mode"], "maximum_security");
    let score = json["re_difficulty_score"].as_f64().expect("score");
    assert!((20.0..=100.0).contains(&score));
}

#[test]
fn analyze_fails_for_missing_binary() {
    let dir = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("re-bench")
        .arg("analyze")
        .arg(dir.path().join("nope"))
        .arg("--fixtures")
        .arg(fixtures())
        .arg("-o")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Binary not found"));

    assert!(fs::read_dir(dir.path()).expect("read dir").next().is_none());
}

#[test]
fn analyze_with_db_feeds_stats() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("results.db");

    for name in ["test_easy_baseline", "test_easy_normal"] {
        let binary = fake_binary(dir.path(), name);
        assert_cmd::cargo::cargo_bin_cmd!("re-bench")
            .arg("analyze")
            .arg(&binary)
            .arg("--fixtures")
            .arg(fixtures())
            .arg("-o")
            .arg(dir.path().join("out"))
            .arg("--db")
            .arg(&db)
            .assert()
            .success();
    }

    let output = assert_cmd::cargo::cargo_bin_cmd!("re-bench")
        .args(["stats", "--json", "--db"])
        .arg(&db)
        .output()
        .expect("run stats");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["total_runs"], 2);
    assert_eq!(report["summary"]["re_difficulty_score"]["baseline"]["count"], 1);
    // Same listings for both modes, so no change against the baseline.
    assert_eq!(report["improvement_over_baseline"]["test_easy"]["normal"], 0.0);

    assert_cmd::cargo::cargo_bin_cmd!("re-bench")
        .args(["stats", "--mode", "normal", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Results: 1 run(s)"))
        .stdout(predicate::str::contains("normal: mean"));
}

#[test]
fn stats_requires_an_existing_database() {
    let dir = tempdir().expect("tempdir");
    assert_cmd::cargo::cargo_bin_cmd!("re-bench")
        .arg("stats")
        .arg("--db")
        .arg(dir.path().join("missing.db"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Results database not found"));
}

#[test]
fn infer_mode_prints_the_label() {
    assert_cmd::cargo::cargo_bin_cmd!("re-bench")
        .args(["infer-mode", "test_medium_size_conservative"])
        .assert()
        .success()
        .stdout("size_conservative\n");

    assert_cmd::cargo::cargo_bin_cmd!("re-bench")
        .args(["infer-mode", "hello"])
        .assert()
        .success()
        .stdout("unknown\n");
}

#[test]
fn tools_reports_every_known_tool() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("re-bench").args(["tools", "--json"]).output().expect("run");
    assert!(output.status.success());
    let statuses: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let statuses = statuses.as_array().expect("array");
    assert_eq!(statuses.len(), 8);
    assert!(statuses.iter().any(|s| s["name"] == "objdump" && s["essential"] == true));
    assert!(statuses.iter().any(|s| s["name"] == "gdb" && s["essential"] == false));
}
