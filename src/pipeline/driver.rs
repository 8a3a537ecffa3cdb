//! `run_pipeline`: load every curated data pack and execute the thirteen
//! layers in dependency order, assembling the final content-hashed
//! `BuildResult`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde_json::Value;

use crate::core::errors::Result;
use crate::core::hashing::sha256_of_canonical_json;
use crate::core::paths;
use crate::core::DECK_SIZE;
use crate::model::build_result::{BuildResult, BuildResultBody};
use crate::model::layer::{LayerEnvelope, VerdictStatus};
use crate::model::primitive_index::PrimitiveIndex;
use crate::model::LAYER_NAMES;
use crate::packs::manifest::PackManifest;
use crate::packs::{
    bucket_substitutions, combo_variants, dependency_signatures, load_pack_json, mulligan_assumptions,
    profile_thresholds, stress_models, weight_rules, PackLoadOutcome,
};
use crate::pipeline::{
    coherence, combo_pack, commander_reliability, mulligan_model, probability_checkpoint, probability_math_core,
    requirement_detection, resilience_math, stress_model_definition, stress_transform, substitution_engine,
    sufficiency_summary, weight_multiplier,
};

/// Compiled engine version pin stamped into every `BuildResult`.
pub const ENGINE_VERSION: &str = "deck_sufficiency_pipeline_v1";
/// Compiled ruleset version pin stamped into every `BuildResult`.
pub const RULESET_VERSION: &str = "ruleset_v1";

/// Everything a pipeline run needs beyond the curated data packs: the
/// compiled primitive index and the host's profile/bracket/format/override
/// selection. None of these fields may be read by a pure layer function
/// directly — they only pick *which* pack entries and index the layers
/// consume, never the numeric outcome.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub primitive_index: Option<&'a PrimitiveIndex>,
    pub deck_card_keys: Option<&'a BTreeSet<String>>,
    pub profile_id: String,
    pub bracket_id: String,
    pub format_id: String,
    pub stress_override_model_id: Option<String>,
    pub db_snapshot_id: String,
}

/// Run the full thirteen-layer pipeline once and return its `BuildResult`.
///
/// # Errors
/// Only for host-level failures that prevent producing any `BuildResult` at
/// all: a malformed or unreadable curated manifest, or an IO error reading a
/// pack file the manifest says should exist. A pack that is simply missing,
/// hash-mismatched, or the wrong version is never an error here — every
/// layer receives a typed `PackLoadOutcome` and translates absence into its
/// own documented SKIP/WARN reason code, and the pipeline always completes.
pub fn run_pipeline(packs_dir: &Path, manifest_path: &Path, request: &RunRequest) -> Result<BuildResult> {
    let manifest = PackManifest::load(manifest_path)?;

    let signatures: PackLoadOutcome<dependency_signatures::DependencySignaturesPack> = load_pack_json(
        packs_dir,
        &manifest,
        paths::PACK_DEPENDENCY_SIGNATURES,
        dependency_signatures::EXPECTED_VERSION,
    )?;
    let mulligan_pack: PackLoadOutcome<mulligan_assumptions::MulliganAssumptionsPack> = load_pack_json(
        packs_dir,
        &manifest,
        paths::PACK_MULLIGAN_ASSUMPTIONS,
        mulligan_assumptions::EXPECTED_VERSION,
    )?;
    let bucket_pack: PackLoadOutcome<bucket_substitutions::BucketSubstitutionsPack> = load_pack_json(
        packs_dir,
        &manifest,
        paths::PACK_BUCKET_SUBSTITUTIONS,
        bucket_substitutions::EXPECTED_VERSION,
    )?;
    let weight_pack: PackLoadOutcome<weight_rules::WeightRulesPack> = load_pack_json(
        packs_dir,
        &manifest,
        paths::PACK_WEIGHT_RULES,
        weight_rules::EXPECTED_VERSION,
    )?;
    let stress_pack: PackLoadOutcome<stress_models::StressModelsPack> = load_pack_json(
        packs_dir,
        &manifest,
        paths::PACK_STRESS_MODELS,
        stress_models::EXPECTED_VERSION,
    )?;
    let thresholds_pack: PackLoadOutcome<profile_thresholds::ProfileThresholdsPack> = load_pack_json(
        packs_dir,
        &manifest,
        paths::PACK_PROFILE_THRESHOLDS,
        profile_thresholds::EXPECTED_VERSION,
    )?;
    let calibration_pack: PackLoadOutcome<profile_thresholds::CalibrationSnapshotPack> = load_pack_json(
        packs_dir,
        &manifest,
        paths::PACK_CALIBRATION_SNAPSHOT,
        profile_thresholds::CALIBRATION_EXPECTED_VERSION,
    )?;
    let spellbook_pack: PackLoadOutcome<combo_variants::CommanderSpellbookVariantsPack> = load_pack_json(
        packs_dir,
        &manifest,
        paths::PACK_COMMANDER_SPELLBOOK_VARIANTS,
        combo_variants::SPELLBOOK_EXPECTED_VERSION,
    )?;

    // Primary combos pack is v2; a missing v2 falls back to the legacy v1
    // shape (spec §4.13) rather than surfacing as unavailable.
    let combos_v2: PackLoadOutcome<combo_variants::TwoCardCombosPack> = load_pack_json(
        packs_dir,
        &manifest,
        paths::PACK_TWO_CARD_COMBOS_V2,
        combo_variants::TWO_CARD_COMBOS_V2_EXPECTED_VERSION,
    )?;
    let combos_pack = match combos_v2 {
        PackLoadOutcome::Missing => load_pack_json(
            packs_dir,
            &manifest,
            paths::PACK_TWO_CARD_COMBOS_V1,
            combo_variants::TWO_CARD_COMBOS_V1_EXPECTED_VERSION,
        )?,
        other => other,
    };

    // Layer 1: RequirementDetection.
    let requirement_detection_env = requirement_detection::run(request.primitive_index, &signatures);
    let engine_requirements_available = requirement_detection_env.is_ready();
    let engine_requirements: Option<&BTreeMap<String, bool>> =
        engine_requirements_available.then_some(&requirement_detection_env.body.engine_requirements);
    let commander_dependent = requirement_detection_env.body.commander_dependent;

    // Layer 2: Coherence.
    let coherence_env = coherence::run(request.primitive_index);

    // Layer 3: MulliganModel.
    let mulligan_env = mulligan_model::run(&request.format_id, &mulligan_pack);

    // Layer 4: SubstitutionEngine.
    let substitution_env = substitution_engine::run(
        request.primitive_index,
        engine_requirements,
        engine_requirements_available,
        &bucket_pack,
    );

    // Layer 6: ProbabilityMathCore, validated against the raw (unweighted)
    // per-bucket K produced by SubstitutionEngine.
    let k_int_triples: Vec<(&str, f64, u32)> = substitution_env
        .body
        .buckets
        .iter()
        .map(|b| (b.bucket_id.as_str(), b.effective_k, b.k_int))
        .collect();
    let math_core_env = probability_math_core::validate_k_int_policy(&k_int_triples, DECK_SIZE);

    // Layer 5: WeightMultiplier.
    let substitution_bucket_ids: BTreeSet<String> =
        substitution_env.body.buckets.iter().map(|b| b.bucket_id.clone()).collect();
    let weight_env = weight_multiplier::run(
        &request.format_id,
        &substitution_bucket_ids,
        engine_requirements,
        engine_requirements_available,
        &weight_pack,
    );

    // Layer 7: ProbabilityCheckpoint, folding the weight multiplier into the
    // substitution engine's raw effective_K before the hypergeometric pass.
    let checkpoint_env = probability_checkpoint::run(&mulligan_env, &substitution_env, &weight_env);

    // Layer 8: StressModelDefinition.
    let stress_model_env = stress_model_definition::run(
        &request.format_id,
        &request.profile_id,
        &request.bracket_id,
        request.stress_override_model_id.as_deref(),
        &stress_pack,
    );

    // Layer 9: StressTransform.
    let stress_transform_env = stress_transform::run(&checkpoint_env, &stress_model_env);

    // Layer 10: ResilienceMath.
    let resilience_env = resilience_math::run(&checkpoint_env, &stress_transform_env, commander_dependent);

    // Layer 11: CommanderReliability. It reads post-stress checkpoints in
    // the generic per-bucket shape shared with the pre-stress baseline, so
    // the richer StressTransform body (which additionally carries
    // operator_impacts) is narrowed to that shape here; checkpoints
    // themselves are fixed turn indices and carry over unchanged from the
    // baseline.
    let stress_checkpoint_env = as_checkpoint_envelope(&stress_transform_env, &checkpoint_env.body.n_by_checkpoint);
    let reliability_env = commander_reliability::run(
        &checkpoint_env,
        &stress_checkpoint_env,
        request.primitive_index,
        commander_dependent,
    );

    // Layer 12: SufficiencySummary.
    let calibration_version: Option<&str> = match &calibration_pack {
        PackLoadOutcome::Loaded(pack) => Some(pack.version.as_str()),
        _ => None,
    };
    let summary_env = sufficiency_summary::run(
        &requirement_detection_env,
        &coherence_env,
        &resilience_env,
        &reliability_env,
        commander_dependent,
        &request.profile_id,
        &thresholds_pack,
        calibration_version,
    );

    // Layer 13 (auxiliary): ComboPack.
    let combo_env = combo_pack::run(request.deck_card_keys, &combos_pack, &spellbook_pack);

    let mut layers: BTreeMap<String, Value> = BTreeMap::new();
    layers.insert("requirement_detection".to_string(), serde_json::to_value(&requirement_detection_env)?);
    layers.insert("coherence".to_string(), serde_json::to_value(&coherence_env)?);
    layers.insert("mulligan_model".to_string(), serde_json::to_value(&mulligan_env)?);
    layers.insert("substitution_engine".to_string(), serde_json::to_value(&substitution_env)?);
    layers.insert("weight_multiplier".to_string(), serde_json::to_value(&weight_env)?);
    layers.insert("probability_math_core".to_string(), serde_json::to_value(&math_core_env)?);
    layers.insert("probability_checkpoint".to_string(), serde_json::to_value(&checkpoint_env)?);
    layers.insert("stress_model_definition".to_string(), serde_json::to_value(&stress_model_env)?);
    layers.insert("stress_transform".to_string(), serde_json::to_value(&stress_transform_env)?);
    layers.insert("resilience_math".to_string(), serde_json::to_value(&resilience_env)?);
    layers.insert("commander_reliability".to_string(), serde_json::to_value(&reliability_env)?);
    layers.insert("sufficiency_summary".to_string(), serde_json::to_value(&summary_env)?);
    layers.insert("combo_pack".to_string(), serde_json::to_value(&combo_env)?);
    debug_assert_eq!(layers.len(), LAYER_NAMES.len());

    let available_panels_v1 = BuildResult::available_panels(&layers);
    let unknowns = BuildResult::collect_unknowns(&layers);

    let mut pipeline_versions: BTreeMap<String, String> = BTreeMap::new();
    for name in LAYER_NAMES {
        if let Some(version) = layers.get(name).and_then(|payload| payload.get("version")).and_then(Value::as_str) {
            pipeline_versions.insert(format!("{name}_version"), version.to_string());
        }
    }

    let status = if summary_env.is_ready() {
        summary_env.body.aggregate_status
    } else {
        VerdictStatus::Skip
    };

    let result = BuildResultBody {
        available_panels_v1,
        pipeline_versions,
        layers,
    };

    let hash_input = serde_json::json!({
        "engine_version": ENGINE_VERSION,
        "ruleset_version": RULESET_VERSION,
        "profile_id": request.profile_id,
        "bracket_id": request.bracket_id,
        "result": &result,
    });
    let build_hash_v1 = sha256_of_canonical_json(&hash_input)?;

    Ok(BuildResult {
        engine_version: ENGINE_VERSION.to_string(),
        ruleset_version: RULESET_VERSION.to_string(),
        db_snapshot_id: request.db_snapshot_id.clone(),
        profile_id: request.profile_id.clone(),
        bracket_id: request.bracket_id.clone(),
        status,
        build_hash_v1,
        graph_hash_v2: None,
        unknowns,
        result,
    })
}

/// Narrow a `StressTransform` envelope down to the generic per-bucket
/// checkpoint shape `CommanderReliability` consumes, dropping
/// `operator_impacts` (not needed there) and carrying `n_by_checkpoint`
/// over from the pre-stress baseline (checkpoints are fixed turn indices,
/// never mutated by stress operators).
fn as_checkpoint_envelope(
    stress: &LayerEnvelope<stress_transform::Body>,
    n_by_checkpoint: &BTreeMap<u32, u32>,
) -> LayerEnvelope<probability_checkpoint::Body> {
    let buckets = stress
        .body
        .buckets
        .iter()
        .map(|b| probability_checkpoint::BucketCheckpoints {
            bucket_id: b.bucket_id.clone(),
            effective_k: b.effective_k,
            k_int: b.k_int,
            p_ge_1_by_checkpoint: b.p_ge_1_by_checkpoint.clone(),
        })
        .collect();
    LayerEnvelope::new(
        stress.version.clone(),
        stress.status,
        stress.reason_code.clone(),
        stress.codes.clone(),
        probability_checkpoint::Body {
            n_by_checkpoint: n_by_checkpoint.clone(),
            buckets,
        },
    )
}
