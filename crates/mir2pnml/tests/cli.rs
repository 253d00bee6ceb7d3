//! End-to-end tests driving the compiled `mir2pnml` binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const SAMPLE_MIR: &str = r#"
fn main() -> () {
    let _1: std::sync::Mutex<i32>;
    let _2: std::sync::MutexGuard<'_, i32>;
    bb0: {
        _2 = std::sync::Mutex::<i32>::lock(move _1) -> [return: bb1, unwind: bb2];
    }
    bb1: {
        drop(_2) -> [return: bb2, unwind: bb2];
    }
    bb2: {
        return;
    }
}
"#;

#[test]
fn translates_a_simple_mir_dump_to_pnml() {
    let dir = tempdir().unwrap();
    let mir_path = dir.path().join("input.mir");
    let out_path = dir.path().join("out.pnml");
    fs::write(&mir_path, SAMPLE_MIR).unwrap();

    Command::cargo_bin("mir2pnml")
        .unwrap()
        .arg("--mir")
        .arg(&mir_path)
        .arg("--out")
        .arg(&out_path)
        .assert()
        .success();

    let pnml = fs::read_to_string(&out_path).unwrap();
    assert!(pnml.contains("p_mutex__1_free"));
}

#[test]
fn missing_input_file_exits_nonzero_with_message() {
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("out.pnml");

    Command::cargo_bin("mir2pnml")
        .unwrap()
        .arg("--mir")
        .arg(dir.path().join("does-not-exist.mir"))
        .arg("--out")
        .arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn empty_mir_input_exits_nonzero() {
    let dir = tempdir().unwrap();
    let mir_path = dir.path().join("empty.mir");
    let out_path = dir.path().join("out.pnml");
    fs::write(&mir_path, "// no functions here\n").unwrap();

    Command::cargo_bin("mir2pnml")
        .unwrap()
        .arg("--mir")
        .arg(&mir_path)
        .arg("--out")
        .arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no functions found"));
}

#[test]
fn unknown_entry_fn_exits_nonzero() {
    let dir = tempdir().unwrap();
    let mir_path = dir.path().join("input.mir");
    let out_path = dir.path().join("out.pnml");
    fs::write(&mir_path, SAMPLE_MIR).unwrap();

    Command::cargo_bin("mir2pnml")
        .unwrap()
        .arg("--mir")
        .arg(&mir_path)
        .arg("--out")
        .arg(&out_path)
        .arg("--entry-fn")
        .arg("does_not_exist")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does_not_exist"));
}

#[test]
fn dump_json_writes_a_second_file_alongside_pnml() {
    let dir = tempdir().unwrap();
    let mir_path = dir.path().join("input.mir");
    let out_path = dir.path().join("out.pnml");
    let json_path = dir.path().join("out.json");
    fs::write(&mir_path, SAMPLE_MIR).unwrap();

    Command::cargo_bin("mir2pnml")
        .unwrap()
        .arg("--mir")
        .arg(&mir_path)
        .arg("--out")
        .arg(&out_path)
        .arg("--dump-json")
        .arg(&json_path)
        .assert()
        .success();

    let json = fs::read_to_string(&json_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(parsed.get("places").is_some());
    assert!(parsed.get("warnings").is_some());
}
