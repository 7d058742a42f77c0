//! Tests for the gc binary

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gc() -> Command {
    Command::cargo_bin("gc").expect("gc binary should build")
}

#[test]
fn test_curate_writes_csvw() {
    let temp = TempDir::new().unwrap();
    let raw_dir = temp.path().join("raw");
    let out_dir = temp.path().join("csvw");
    std::fs::create_dir_all(&raw_dir).unwrap();
    common::write_raw_dir(&raw_dir);

    gc().current_dir(temp.path())
        .args(["curate", "--raw-dir"])
        .arg(&raw_dir)
        .arg("--output-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 7 files"))
        .stderr(predicate::str::contains("features.csv: invalid Metafeature_ID for ID f2: 99"));

    let hierarchy = std::fs::read_to_string(out_dir.join("concept-hierarchy.csv")).unwrap();
    assert_eq!(hierarchy, "Child_ID,Parent_ID\n2,1\n9,1\n10,1\n");

    let features = std::fs::read_to_string(out_dir.join("features.csv")).unwrap();
    assert!(features.contains("f1,Past tense"));
    assert!(!features.contains("f2"));

    assert!(out_dir.join(grammaticon::METADATA_FILE).is_file());
}

#[test]
fn test_check_fails_on_diagnostics() {
    let temp = TempDir::new().unwrap();
    common::write_raw_dir(temp.path());

    gc().current_dir(temp.path())
        .args(["check", "--raw-dir", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 records would be dropped"));
}

#[test]
fn test_header_mismatch_exits_with_error() {
    let temp = TempDir::new().unwrap();
    common::write_raw_dir(temp.path());
    std::fs::write(temp.path().join("Metafeatures.csv"), "id,name\n1,Tense\n").unwrap();

    gc().current_dir(temp.path())
        .args(["curate", "--raw-dir", ".", "--output-dir", "out"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing: [feature_area]"));

    assert!(!temp.path().join("out").exists());
}

#[test]
fn test_config_file_sets_directories() {
    let temp = TempDir::new().unwrap();
    let raw_dir = temp.path().join("export");
    std::fs::create_dir_all(&raw_dir).unwrap();
    common::write_raw_dir(&raw_dir);
    std::fs::write(temp.path().join("gc.yml"), "raw_dir: export\noutput_dir: published\n").unwrap();

    gc().current_dir(temp.path())
        .args(["--config", "gc.yml", "curate"])
        .assert()
        .success();

    assert!(temp.path().join("published").join("concepts.csv").is_file());
}

#[test]
fn test_schema_json() {
    let output = gc().args(["schema", "--format", "json"]).output().unwrap();
    assert!(output.status.success());

    let registry: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(registry["tables"].as_array().unwrap().len(), 5);
    assert_eq!(registry["hierarchy"]["name"], "concept-hierarchy.csv");
}
