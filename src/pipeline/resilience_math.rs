//! Layer 10 — `ResilienceMath`: compare baseline vs stress probabilities to
//! derive removal continuity, wipe rebuild, graveyard fragility, and
//! commander fragility.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::rounding::{clamp01, round6};
use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::model::CommanderDependent;
use crate::pipeline::{probability_checkpoint, stress_transform};

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "resilience_math_v1";

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub engine_continuity_after_removal: f64,
    pub rebuild_after_wipe: f64,
    pub graveyard_fragility_delta: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commander_fragility_delta: Option<f64>,
}

fn skip(reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Skip,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            engine_continuity_after_removal: 0.0,
            rebuild_after_wipe: 0.0,
            graveyard_fragility_delta: 0.0,
            commander_fragility_delta: None,
        },
    )
}

fn error(reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Error,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            engine_continuity_after_removal: 0.0,
            rebuild_after_wipe: 0.0,
            graveyard_fragility_delta: 0.0,
            commander_fragility_delta: None,
        },
    )
}

/// Safe ratio policy (spec §4.10): `num<=0 & den<=0 => 1.0`;
/// `num>0 & den<=0 => 0.0`; else `num/den`, clamped to `[0,1]`.
fn safe_ratio(num: f64, den: f64) -> f64 {
    let ratio = if den <= 0.0 {
        if num <= 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        num / den
    };
    round6(clamp01(ratio))
}

fn engine_continuity_after_removal(
    op_name: &str,
    impacts: &[&stress_transform::OperatorImpact],
    baseline_by_bucket: &BTreeMap<String, f64>,
    stress_by_bucket: &BTreeMap<String, f64>,
) -> f64 {
    let targeted: Vec<&stress_transform::OperatorImpact> =
        impacts.iter().filter(|i| i.op == op_name).copied().collect();
    if targeted.is_empty() {
        let ratios: Vec<f64> = baseline_by_bucket
            .iter()
            .map(|(bucket_id, baseline_k)| {
                let stress_k = stress_by_bucket.get(bucket_id).copied().unwrap_or(0.0);
                safe_ratio(stress_k, *baseline_k)
            })
            .collect();
        return mean(&ratios);
    }

    let mut first_before: BTreeMap<&str, f64> = BTreeMap::new();
    let mut last_after: BTreeMap<&str, f64> = BTreeMap::new();
    for impact in &targeted {
        first_before.entry(impact.bucket_id.as_str()).or_insert(impact.effective_k_before);
        last_after.insert(impact.bucket_id.as_str(), impact.effective_k_after);
    }
    let ratios: Vec<f64> = first_before
        .iter()
        .map(|(bucket_id, before)| {
            let after = last_after.get(bucket_id).copied().unwrap_or(*before);
            safe_ratio(after, *before)
        })
        .collect();
    mean(&ratios)
}

fn rebuild_after_wipe(impacts: &[&stress_transform::OperatorImpact]) -> f64 {
    let wipes: Vec<&stress_transform::OperatorImpact> =
        impacts.iter().filter(|i| i.op == "BOARD_WIPE").copied().collect();
    if wipes.is_empty() {
        return 1.0;
    }
    let mut first_before: BTreeMap<&str, f64> = BTreeMap::new();
    let mut last_after: BTreeMap<&str, f64> = BTreeMap::new();
    for impact in &wipes {
        first_before.entry(impact.bucket_id.as_str()).or_insert(impact.effective_k_before);
        last_after.insert(impact.bucket_id.as_str(), impact.effective_k_after);
    }
    let ratios: Vec<f64> = first_before
        .iter()
        .map(|(bucket_id, before)| {
            let after = last_after.get(bucket_id).copied().unwrap_or(*before);
            safe_ratio(after, *before)
        })
        .collect();
    mean(&ratios)
}

fn graveyard_fragility_delta(impacts: &[&stress_transform::OperatorImpact]) -> f64 {
    let hate: Vec<&stress_transform::OperatorImpact> = impacts
        .iter()
        .filter(|i| i.op == "GRAVEYARD_HATE_WINDOW")
        .copied()
        .collect();
    if hate.is_empty() {
        return 0.0;
    }
    let mut first_before: BTreeMap<(&str, u32), f64> = BTreeMap::new();
    let mut last_after: BTreeMap<(&str, u32), f64> = BTreeMap::new();
    for impact in &hate {
        for (checkpoint, p) in &impact.probabilities_before {
            first_before
                .entry((impact.bucket_id.as_str(), *checkpoint))
                .or_insert(*p);
        }
        for (checkpoint, p) in &impact.probabilities_after {
            last_after.insert((impact.bucket_id.as_str(), *checkpoint), *p);
        }
    }
    let deltas: Vec<f64> = first_before
        .iter()
        .map(|(key, before)| {
            let after = last_after.get(key).copied().unwrap_or(*before);
            (before - after).max(0.0)
        })
        .collect();
    mean(&deltas)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round6(clamp01(values.iter().sum::<f64>() / values.len() as f64))
}

/// Run `ResilienceMath`.
#[must_use]
pub fn run(
    baseline: &LayerEnvelope<probability_checkpoint::Body>,
    stress: &LayerEnvelope<stress_transform::Body>,
    commander_dependent: CommanderDependent,
) -> LayerEnvelope<Body> {
    if !baseline.is_ready() {
        return skip("UPSTREAM_PROBABILITY_CHECKPOINT_UNAVAILABLE");
    }
    if !stress.is_ready() {
        return skip("UPSTREAM_STRESS_TRANSFORM_UNAVAILABLE");
    }

    let baseline_by_bucket: BTreeMap<String, f64> = baseline
        .body
        .buckets
        .iter()
        .map(|b| (b.bucket_id.clone(), b.effective_k))
        .collect();
    let stress_by_bucket: BTreeMap<String, f64> =
        stress.body.buckets.iter().map(|b| (b.bucket_id.clone(), b.effective_k)).collect();

    if baseline_by_bucket.keys().collect::<Vec<_>>() != stress_by_bucket.keys().collect::<Vec<_>>() {
        return error("RESILIENCE_BUCKET_ALIGNMENT_INVALID");
    }

    let impacts: Vec<&stress_transform::OperatorImpact> = stress.body.operator_impacts.iter().collect();

    let engine_continuity_after_removal =
        engine_continuity_after_removal("TARGETED_REMOVAL", &impacts, &baseline_by_bucket, &stress_by_bucket);
    let rebuild_after_wipe = rebuild_after_wipe(&impacts);
    let graveyard_fragility_delta = graveyard_fragility_delta(&impacts);

    let mut codes = Vec::new();
    let commander_fragility_delta = if commander_dependent == CommanderDependent::Low {
        Some(0.0)
    } else {
        codes.push("RESILIENCE_COMMANDER_FRAGILITY_UNAVAILABLE".to_string());
        None
    };

    let status = if codes.is_empty() { LayerStatus::Ok } else { LayerStatus::Warn };
    LayerEnvelope::new(
        VERSION,
        status,
        None,
        codes,
        Body {
            engine_continuity_after_removal,
            rebuild_after_wipe,
            graveyard_fragility_delta,
            commander_fragility_delta,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::model::layer::{LayerEnvelope, LayerStatus};
    use crate::model::CommanderDependent;
    use crate::pipeline::{probability_checkpoint, stress_transform};
    use std::collections::BTreeMap;

    fn baseline_env(effective_k: f64) -> LayerEnvelope<probability_checkpoint::Body> {
        LayerEnvelope::new(
            "v",
            LayerStatus::Ok,
            None,
            vec![],
            probability_checkpoint::Body {
                n_by_checkpoint: BTreeMap::new(),
                buckets: vec![probability_checkpoint::BucketCheckpoints {
                    bucket_id: "RAMP".to_string(),
                    effective_k,
                    k_int: effective_k as u32,
                    p_ge_1_by_checkpoint: BTreeMap::new(),
                }],
            },
        )
    }

    fn stress_env(effective_k: f64, impacts: Vec<stress_transform::OperatorImpact>) -> LayerEnvelope<stress_transform::Body> {
        LayerEnvelope::new(
            "v",
            LayerStatus::Ok,
            None,
            vec![],
            stress_transform::Body {
                buckets: vec![stress_transform::BucketResult {
                    bucket_id: "RAMP".to_string(),
                    effective_k,
                    k_int: effective_k as u32,
                    p_ge_1_by_checkpoint: BTreeMap::new(),
                }],
                operator_impacts: impacts,
            },
        )
    }

    #[test]
    fn s2_identity_removal_gives_continuity_one() {
        let impacts = vec![stress_transform::OperatorImpact {
            op: "TARGETED_REMOVAL".to_string(),
            bucket_id: "RAMP".to_string(),
            effective_k_before: 30.0,
            effective_k_after: 30.0,
            probabilities_before: BTreeMap::new(),
            probabilities_after: BTreeMap::new(),
        }];
        let envelope = run(&baseline_env(30.0), &stress_env(30.0, impacts), CommanderDependent::Low);
        assert_eq!(envelope.body.engine_continuity_after_removal, 1.0);
        assert_eq!(envelope.body.commander_fragility_delta, Some(0.0));
    }

    #[test]
    fn no_wipe_impacts_fallback_to_one() {
        let envelope = run(&baseline_env(20.0), &stress_env(20.0, vec![]), CommanderDependent::Low);
        assert_eq!(envelope.body.rebuild_after_wipe, 1.0);
    }

    #[test]
    fn mismatched_bucket_sets_error() {
        let mut stress = stress_env(20.0, vec![]);
        stress.body.buckets[0].bucket_id = "REMOVAL".to_string();
        let envelope = run(&baseline_env(20.0), &stress, CommanderDependent::Low);
        assert_eq!(envelope.status, LayerStatus::Error);
        assert_eq!(
            envelope.reason_code.as_deref(),
            Some("RESILIENCE_BUCKET_ALIGNMENT_INVALID")
        );
    }

    #[test]
    fn non_low_commander_dependent_is_unavailable() {
        let envelope = run(&baseline_env(20.0), &stress_env(20.0, vec![]), CommanderDependent::Medium);
        assert_eq!(envelope.body.commander_fragility_delta, None);
        assert!(envelope.codes.contains(&"RESILIENCE_COMMANDER_FRAGILITY_UNAVAILABLE".to_string()));
    }
}
