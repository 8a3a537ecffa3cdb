//! End-to-end: a run with no curated packs and no primitive index should
//! SKIP every layer that depends on them and still produce a complete,
//! well-formed `BuildResult` rather than erroring out.

use std::fs;

use deck_sufficiency_pipeline::model::layer::VerdictStatus;
use deck_sufficiency_pipeline::pipeline::driver::{run_pipeline, RunRequest};

fn empty_manifest_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("manifest_v1.json"), "[]").unwrap();
    dir
}

fn request(profile_id: &str) -> RunRequest<'static> {
    RunRequest {
        primitive_index: None,
        deck_card_keys: None,
        profile_id: profile_id.to_string(),
        bracket_id: "B2".to_string(),
        format_id: "commander".to_string(),
        stress_override_model_id: None,
        db_snapshot_id: "test".to_string(),
    }
}

#[test]
fn all_layers_report_unavailable_upstream_and_overall_status_is_skip() {
    let dir = empty_manifest_dir();
    let manifest_path = dir.path().join("manifest_v1.json");
    let req = request("focused");

    let result = run_pipeline(dir.path(), &manifest_path, &req).expect("pipeline must not error on missing packs");

    assert_eq!(result.status, VerdictStatus::Skip);
    assert_eq!(result.profile_id, "focused");
    assert_eq!(result.bracket_id, "B2");
    assert!(result.graph_hash_v2.is_none());

    let requirement_detection = &result.result.layers["requirement_detection"];
    assert_eq!(requirement_detection["status"], "SKIP");
    assert_eq!(requirement_detection["reason_code"], "PRIMITIVE_INDEX_UNAVAILABLE");

    let summary = &result.result.layers["sufficiency_summary"];
    assert_eq!(summary["status"], "SKIP");

    assert_eq!(
        result.result.available_panels_v1.get("requirement_detection"),
        Some(&false)
    );
    assert_eq!(result.result.available_panels_v1.len(), 13);
}

#[test]
fn combo_pack_skips_independently_on_missing_decklist() {
    let dir = empty_manifest_dir();
    let manifest_path = dir.path().join("manifest_v1.json");
    let req = request("focused");

    let result = run_pipeline(dir.path(), &manifest_path, &req).unwrap();
    let combo = &result.result.layers["combo_pack"];
    assert_eq!(combo["status"], "SKIP");
    assert_eq!(combo["reason_code"], "DECK_CARD_KEYS_UNAVAILABLE");
}

#[test]
fn build_hash_v1_is_a_well_formed_sha256_digest() {
    let dir = empty_manifest_dir();
    let manifest_path = dir.path().join("manifest_v1.json");
    let req = request("focused");

    let result = run_pipeline(dir.path(), &manifest_path, &req).unwrap();
    assert_eq!(result.build_hash_v1.len(), 64);
    assert!(result.build_hash_v1.bytes().all(|b| b.is_ascii_hexdigit()));
}
