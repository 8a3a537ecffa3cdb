//! Layer 7 — `ProbabilityCheckpoint`: per-bucket `P(≥1)` at each checkpoint
//! under the default mulligan policy, using the weight-adjusted `effective_K`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::rounding::{clamp_k, k_int, round6};
use crate::core::{CHECKPOINTS, DECK_SIZE};
use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::pipeline::mulligan_model;
use crate::pipeline::probability_math_core::hypergeom_p_ge_1;
use crate::pipeline::substitution_engine;
use crate::pipeline::weight_multiplier;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "probability_checkpoint_v1";

/// One bucket's weight-adjusted K and per-checkpoint probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketCheckpoints {
    pub bucket_id: String,
    pub effective_k: f64,
    pub k_int: u32,
    pub p_ge_1_by_checkpoint: BTreeMap<u32, f64>,
}

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub n_by_checkpoint: BTreeMap<u32, u32>,
    pub buckets: Vec<BucketCheckpoints>,
}

fn skip(reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Skip,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            n_by_checkpoint: BTreeMap::new(),
            buckets: vec![],
        },
    )
}

/// Run `ProbabilityCheckpoint`.
#[must_use]
pub fn run(
    mulligan: &LayerEnvelope<mulligan_model::Body>,
    substitution: &LayerEnvelope<substitution_engine::Body>,
    weights: &LayerEnvelope<weight_multiplier::Body>,
) -> LayerEnvelope<Body> {
    if !mulligan.is_ready() {
        return skip("UPSTREAM_MULLIGAN_MODEL_UNAVAILABLE");
    }
    if !substitution.is_ready() {
        return skip("UPSTREAM_SUBSTITUTION_ENGINE_UNAVAILABLE");
    }

    let Some(default_policy) = mulligan
        .body
        .policies
        .iter()
        .find(|p| p.policy_id == mulligan.body.default_policy)
    else {
        return skip("UPSTREAM_MULLIGAN_MODEL_UNAVAILABLE");
    };

    let mut codes = Vec::new();
    let mut n_by_checkpoint = BTreeMap::new();
    let mut floored_any = false;
    for checkpoint in CHECKPOINTS {
        let raw = default_policy.effective_n_by_checkpoint.get(&checkpoint).copied().unwrap_or(0.0);
        let n_int = k_int(raw, DECK_SIZE);
        if (f64::from(n_int) - clamp_k(raw, DECK_SIZE)).abs() > f64::EPSILON {
            floored_any = true;
        }
        n_by_checkpoint.insert(checkpoint, n_int);
    }
    if floored_any {
        codes.push("PROBABILITY_CHECKPOINT_EFFECTIVE_N_FLOORED".to_string());
    }

    let mut buckets = Vec::with_capacity(substitution.body.buckets.len());
    for bucket in &substitution.body.buckets {
        let multiplier = weights
            .body
            .multipliers
            .get(&bucket.bucket_id)
            .copied()
            .unwrap_or(1.0);
        let weighted_effective_k = round6(clamp_k(bucket.effective_k * multiplier, DECK_SIZE));
        let weighted_k_int = k_int(weighted_effective_k, DECK_SIZE);

        let mut p_ge_1_by_checkpoint = BTreeMap::new();
        for checkpoint in CHECKPOINTS {
            let n_int = n_by_checkpoint[&checkpoint];
            let p = hypergeom_p_ge_1(DECK_SIZE, weighted_k_int, n_int).unwrap_or(0.0);
            p_ge_1_by_checkpoint.insert(checkpoint, p);
        }

        buckets.push(BucketCheckpoints {
            bucket_id: bucket.bucket_id.clone(),
            effective_k: weighted_effective_k,
            k_int: weighted_k_int,
            p_ge_1_by_checkpoint,
        });
    }
    buckets.sort_by(|a, b| a.bucket_id.cmp(&b.bucket_id));

    let status = if codes.is_empty() { LayerStatus::Ok } else { LayerStatus::Warn };
    LayerEnvelope::new(
        VERSION,
        status,
        None,
        codes,
        Body {
            n_by_checkpoint,
            buckets,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::model::layer::{LayerEnvelope, LayerStatus};
    use crate::pipeline::{mulligan_model, substitution_engine, weight_multiplier};
    use std::collections::BTreeMap;

    fn mulligan_env() -> LayerEnvelope<mulligan_model::Body> {
        let mut checkpoints = BTreeMap::new();
        for c in [7, 9, 10, 12] {
            checkpoints.insert(c, 7.0);
        }
        LayerEnvelope::new(
            "v",
            LayerStatus::Ok,
            None,
            vec![],
            mulligan_model::Body {
                format_id: "commander".to_string(),
                default_policy: "NORMAL".to_string(),
                policies: vec![mulligan_model::PolicyRow {
                    policy_id: "NORMAL".to_string(),
                    effective_n_by_checkpoint: checkpoints,
                }],
            },
        )
    }

    fn substitution_env(effective_k: f64) -> LayerEnvelope<substitution_engine::Body> {
        LayerEnvelope::new(
            "v",
            LayerStatus::Ok,
            None,
            vec![],
            substitution_engine::Body {
                buckets: vec![substitution_engine::BucketResult {
                    bucket_id: "RAMP".to_string(),
                    k_primary: effective_k as u32,
                    effective_k,
                    k_int: effective_k as u32,
                    substitution_terms: vec![],
                }],
            },
        )
    }

    fn weights_env() -> LayerEnvelope<weight_multiplier::Body> {
        let mut multipliers = BTreeMap::new();
        multipliers.insert("RAMP".to_string(), 1.0);
        LayerEnvelope::new(
            "v",
            LayerStatus::Ok,
            None,
            vec![],
            weight_multiplier::Body {
                multipliers,
                applied_rules: vec![],
            },
        )
    }

    #[test]
    fn s2_scenario_matches_reference_value() {
        let envelope = run(&mulligan_env(), &substitution_env(30.0), &weights_env());
        let ramp = &envelope.body.buckets[0];
        assert!((ramp.p_ge_1_by_checkpoint[&7] - 0.929_537).abs() < 1e-9);
    }

    #[test]
    fn unready_mulligan_skips() {
        let mut mulligan = mulligan_env();
        mulligan.status = LayerStatus::Skip;
        let envelope = run(&mulligan, &substitution_env(30.0), &weights_env());
        assert_eq!(
            envelope.reason_code.as_deref(),
            Some("UPSTREAM_MULLIGAN_MODEL_UNAVAILABLE")
        );
    }
}
