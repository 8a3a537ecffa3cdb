//! Fixed repo-relative paths for the curated manifest and data packs.

/// Default relative path to the curated pack manifest.
pub const DEFAULT_MANIFEST_PATH: &str = "manifest_v1.json";

/// Fixed pack identifiers, in the order they are documented in spec §6.
/// These are the canonical `pack_id` values the manifest and loaders key on.
pub const PACK_DEPENDENCY_SIGNATURES: &str = "dependency_signatures_v1";
pub const PACK_MULLIGAN_ASSUMPTIONS: &str = "mulligan_assumptions_v1";
pub const PACK_BUCKET_SUBSTITUTIONS: &str = "bucket_substitutions_v1";
pub const PACK_WEIGHT_RULES: &str = "weight_rules_v1";
pub const PACK_STRESS_MODELS: &str = "stress_models_v1";
pub const PACK_PROFILE_THRESHOLDS: &str = "profile_thresholds_v1";
pub const PACK_COMMANDER_SPELLBOOK_VARIANTS: &str = "commander_spellbook_variants_v1";
pub const PACK_TWO_CARD_COMBOS_V2: &str = "two_card_combos_v2";
pub const PACK_TWO_CARD_COMBOS_V1: &str = "two_card_combos_v1";
pub const PACK_CALIBRATION_SNAPSHOT: &str = "calibration_snapshot_v1";

/// Default on-disk file names, relative to the configured packs directory,
/// used when a manifest entry does not override the path.
#[must_use]
pub const fn default_pack_filename(pack_id: &str) -> &str {
    match pack_id.as_bytes() {
        _ if matches_str(pack_id, PACK_DEPENDENCY_SIGNATURES) => "dependency_signatures_v1.json",
        _ if matches_str(pack_id, PACK_MULLIGAN_ASSUMPTIONS) => "mulligan_assumptions_v1.json",
        _ if matches_str(pack_id, PACK_BUCKET_SUBSTITUTIONS) => "bucket_substitutions_v1.json",
        _ if matches_str(pack_id, PACK_WEIGHT_RULES) => "weight_rules_v1.json",
        _ if matches_str(pack_id, PACK_STRESS_MODELS) => "stress_models_v1.json",
        _ if matches_str(pack_id, PACK_PROFILE_THRESHOLDS) => "profile_thresholds_v1.json",
        _ if matches_str(pack_id, PACK_COMMANDER_SPELLBOOK_VARIANTS) => {
            "commander_spellbook_variants_v1.json"
        }
        _ if matches_str(pack_id, PACK_TWO_CARD_COMBOS_V2) => "two_card_combos_v2.json",
        _ if matches_str(pack_id, PACK_TWO_CARD_COMBOS_V1) => "two_card_combos_v1.json",
        _ if matches_str(pack_id, PACK_CALIBRATION_SNAPSHOT) => "calibration_snapshot_v1.json",
        _ => "",
    }
}

const fn matches_str(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}
