//! `build_hash_v1` must be byte-identical across repeated runs of the same
//! input, and must change when any hashed input changes.

use std::fs;

use deck_sufficiency_pipeline::pipeline::driver::{run_pipeline, RunRequest};

fn manifest_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("manifest_v1.json"), "[]").unwrap();
    dir
}

fn request(profile_id: &str, bracket_id: &str) -> RunRequest<'static> {
    RunRequest {
        primitive_index: None,
        deck_card_keys: None,
        profile_id: profile_id.to_string(),
        bracket_id: bracket_id.to_string(),
        format_id: "commander".to_string(),
        stress_override_model_id: None,
        db_snapshot_id: "test".to_string(),
    }
}

#[test]
fn repeated_runs_of_the_same_input_produce_the_same_hash() {
    let dir = manifest_dir();
    let manifest_path = dir.path().join("manifest_v1.json");
    let req = request("focused", "B2");

    let first = run_pipeline(dir.path(), &manifest_path, &req).unwrap();
    let second = run_pipeline(dir.path(), &manifest_path, &req).unwrap();

    assert_eq!(first.build_hash_v1, second.build_hash_v1);
}

#[test]
fn pretty_printing_does_not_change_the_hash() {
    let dir = manifest_dir();
    let manifest_path = dir.path().join("manifest_v1.json");
    let req = request("focused", "B2");

    let result = run_pipeline(dir.path(), &manifest_path, &req).unwrap();
    let compact = serde_json::to_string(&result).unwrap();
    let pretty = serde_json::to_string_pretty(&result).unwrap();

    let compact_hash: serde_json::Value = serde_json::from_str(&compact).unwrap();
    let pretty_hash: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(compact_hash["build_hash_v1"], pretty_hash["build_hash_v1"]);
}

#[test]
fn different_profile_id_changes_the_hash() {
    let dir = manifest_dir();
    let manifest_path = dir.path().join("manifest_v1.json");

    let focused = run_pipeline(dir.path(), &manifest_path, &request("focused", "B2")).unwrap();
    let competitive = run_pipeline(dir.path(), &manifest_path, &request("competitive", "B2")).unwrap();

    assert_ne!(focused.build_hash_v1, competitive.build_hash_v1);
}

#[test]
fn different_bracket_id_changes_the_hash() {
    let dir = manifest_dir();
    let manifest_path = dir.path().join("manifest_v1.json");

    let b2 = run_pipeline(dir.path(), &manifest_path, &request("focused", "B2")).unwrap();
    let b4 = run_pipeline(dir.path(), &manifest_path, &request("focused", "B4")).unwrap();

    assert_ne!(b2.build_hash_v1, b4.build_hash_v1);
}
