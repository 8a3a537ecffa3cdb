//! Layer 9 — `StressTransform`: apply the selected operator sequence in
//! canonical order, mutating `effective_K` (K-stage) or probabilities
//! directly (probability-stage).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::rounding::{clamp01, clamp_k, k_int, round6};
use crate::core::{CHECKPOINTS, DECK_SIZE};
use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::model::operator::Operator;
use crate::pipeline::probability_checkpoint;
use crate::pipeline::probability_math_core::hypergeom_p_ge_1;
use crate::pipeline::stress_model_definition;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "stress_transform_v1";

/// One bucket's post-stress state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketResult {
    pub bucket_id: String,
    pub effective_k: f64,
    pub k_int: u32,
    pub p_ge_1_by_checkpoint: BTreeMap<u32, f64>,
}

/// One operator's before/after effect on one bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorImpact {
    pub op: String,
    pub bucket_id: String,
    pub effective_k_before: f64,
    pub effective_k_after: f64,
    pub probabilities_before: BTreeMap<u32, f64>,
    pub probabilities_after: BTreeMap<u32, f64>,
}

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub buckets: Vec<BucketResult>,
    pub operator_impacts: Vec<OperatorImpact>,
}

fn skip(reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Skip,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            buckets: vec![],
            operator_impacts: vec![],
        },
    )
}

fn recompute_probabilities(k_int_value: u32, n_by_checkpoint: &BTreeMap<u32, u32>) -> BTreeMap<u32, f64> {
    CHECKPOINTS
        .into_iter()
        .map(|checkpoint| {
            let n_int = n_by_checkpoint.get(&checkpoint).copied().unwrap_or(0);
            (checkpoint, hypergeom_p_ge_1(DECK_SIZE, k_int_value, n_int).unwrap_or(0.0))
        })
        .collect()
}

fn apply_k_stage(operator: &Operator, k: f64) -> f64 {
    let raw = match *operator {
        Operator::TargetedRemoval { count } => k - f64::from(count),
        Operator::BoardWipe {
            surviving_engine_fraction,
            ..
        } => k * surviving_engine_fraction,
        Operator::GraveyardHateWindow { graveyard_penalty, .. } => k * graveyard_penalty,
        Operator::StaxTax { .. } => k,
    };
    round6(clamp_k(raw, DECK_SIZE))
}

/// Run `StressTransform`.
#[must_use]
pub fn run(
    checkpoint: &LayerEnvelope<probability_checkpoint::Body>,
    stress_model: &LayerEnvelope<stress_model_definition::Body>,
) -> LayerEnvelope<Body> {
    if !checkpoint.is_ready() {
        return skip("UPSTREAM_PROBABILITY_CHECKPOINT_UNAVAILABLE");
    }
    if !stress_model.is_ready() {
        return skip("UPSTREAM_STRESS_MODEL_DEFINITION_UNAVAILABLE");
    }

    let n_by_checkpoint = &checkpoint.body.n_by_checkpoint;
    let mut buckets: BTreeMap<String, BucketResult> = checkpoint
        .body
        .buckets
        .iter()
        .map(|b| {
            (
                b.bucket_id.clone(),
                BucketResult {
                    bucket_id: b.bucket_id.clone(),
                    effective_k: b.effective_k,
                    k_int: b.k_int,
                    p_ge_1_by_checkpoint: b.p_ge_1_by_checkpoint.clone(),
                },
            )
        })
        .collect();

    let mut operator_impacts = Vec::new();
    let bucket_ids: Vec<String> = buckets.keys().cloned().collect();

    for operator in &stress_model.body.operators {
        for bucket_id in &bucket_ids {
            let bucket = buckets.get_mut(bucket_id).expect("bucket present");
            let probabilities_before = bucket.p_ge_1_by_checkpoint.clone();
            let effective_k_before = bucket.effective_k;

            if operator.is_k_stage() {
                let effective_k_after = apply_k_stage(operator, bucket.effective_k);
                let k_int_after = k_int(effective_k_after, DECK_SIZE);
                let probabilities_after = recompute_probabilities(k_int_after, n_by_checkpoint);
                bucket.effective_k = effective_k_after;
                bucket.k_int = k_int_after;
                bucket.p_ge_1_by_checkpoint = probabilities_after.clone();
                operator_impacts.push(OperatorImpact {
                    op: operator.op_name().to_string(),
                    bucket_id: bucket_id.clone(),
                    effective_k_before,
                    effective_k_after,
                    probabilities_before,
                    probabilities_after,
                });
            } else if let Operator::StaxTax { inflation_factor, .. } = operator {
                let probabilities_after: BTreeMap<u32, f64> = bucket
                    .p_ge_1_by_checkpoint
                    .iter()
                    .map(|(checkpoint, p)| (*checkpoint, round6(clamp01(p * inflation_factor))))
                    .collect();
                bucket.p_ge_1_by_checkpoint = probabilities_after.clone();
                operator_impacts.push(OperatorImpact {
                    op: operator.op_name().to_string(),
                    bucket_id: bucket_id.clone(),
                    effective_k_before,
                    effective_k_after: effective_k_before,
                    probabilities_before,
                    probabilities_after,
                });
            }
        }
    }

    let mut result_buckets: Vec<BucketResult> = buckets.into_values().collect();
    result_buckets.sort_by(|a, b| a.bucket_id.cmp(&b.bucket_id));

    LayerEnvelope::new(
        VERSION,
        LayerStatus::Ok,
        None,
        vec![],
        Body {
            buckets: result_buckets,
            operator_impacts,
        },
    )
}
