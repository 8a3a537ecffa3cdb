//! Layer 11 — `CommanderReliability`: cast-reliability proxies from the
//! RAMP bucket and a protection-coverage proxy from protection primitives.

use serde::{Deserialize, Serialize};

use crate::core::rounding::{clamp01, round6};
use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::model::primitive_index::PrimitiveIndex;
use crate::model::CommanderDependent;
use crate::pipeline::probability_checkpoint;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "commander_reliability_v1";

const RAMP_BUCKET: &str = "RAMP";
const PROTECTION_PRIMITIVES: [&str; 2] = ["HEXPROOF_PROTECTION", "INDESTRUCTIBLE_PROTECTION"];

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub cast_reliability_t3: f64,
    pub cast_reliability_t4: f64,
    pub cast_reliability_t6: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection_coverage_proxy: Option<f64>,
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
            cast_reliability_t3: 0.0,
            cast_reliability_t4: 0.0,
            cast_reliability_t6: 0.0,
            protection_coverage_proxy: None,
            commander_fragility_delta: None,
        },
    )
}

fn ramp_p_ge_1(checkpoints: &probability_checkpoint::Body, checkpoint: u32) -> Option<f64> {
    checkpoints
        .buckets
        .iter()
        .find(|b| b.bucket_id == RAMP_BUCKET)
        .and_then(|b| b.p_ge_1_by_checkpoint.get(&checkpoint).copied())
}

fn protection_coverage(index: &PrimitiveIndex) -> Option<f64> {
    let slots = index.non_commander_playable_slots();
    if slots.is_empty() {
        return None;
    }
    let covered = slots
        .iter()
        .filter(|slot| {
            let primitives = index.primitives_for_slot(slot);
            PROTECTION_PRIMITIVES.iter().any(|p| primitives.contains(*p))
        })
        .count();
    Some(round6(clamp01(covered as f64 / slots.len() as f64)))
}

/// Run `CommanderReliability`.
#[must_use]
pub fn run(
    baseline: &LayerEnvelope<probability_checkpoint::Body>,
    stress: &LayerEnvelope<probability_checkpoint::Body>,
    primitive_index: Option<&PrimitiveIndex>,
    commander_dependent: CommanderDependent,
) -> LayerEnvelope<Body> {
    if !baseline.is_ready() {
        return skip("UPSTREAM_PROBABILITY_CHECKPOINT_UNAVAILABLE");
    }

    let mut codes = Vec::new();

    let cast_reliability_t3 = ramp_p_ge_1(&baseline.body, 9).unwrap_or(0.0);
    let cast_reliability_t4 = ramp_p_ge_1(&baseline.body, 10).unwrap_or(0.0);
    let cast_reliability_t6 = ramp_p_ge_1(&baseline.body, 12).unwrap_or(0.0);

    let protection_coverage_proxy = match primitive_index {
        Some(index) => match protection_coverage(index) {
            Some(value) => Some(value),
            None => {
                codes.push("COMMANDER_PROTECTION_COVERAGE_UNAVAILABLE".to_string());
                None
            }
        },
        None => {
            codes.push("COMMANDER_PROTECTION_COVERAGE_UNAVAILABLE".to_string());
            None
        }
    };

    let commander_fragility_delta = if commander_dependent == CommanderDependent::Low {
        Some(0.0)
    } else if !stress.is_ready() {
        codes.push("RESILIENCE_COMMANDER_FRAGILITY_UNAVAILABLE".to_string());
        None
    } else {
        let stress_t3 = ramp_p_ge_1(&stress.body, 9);
        let stress_t4 = ramp_p_ge_1(&stress.body, 10);
        let stress_t6 = ramp_p_ge_1(&stress.body, 12);
        match (stress_t3, stress_t4, stress_t6) {
            (Some(t3), Some(t4), Some(t6)) => {
                let baseline_mean = (cast_reliability_t3 + cast_reliability_t4 + cast_reliability_t6) / 3.0;
                let stress_mean = (t3 + t4 + t6) / 3.0;
                Some(round6((baseline_mean - stress_mean).max(0.0)))
            }
            _ => {
                codes.push("RESILIENCE_COMMANDER_FRAGILITY_UNAVAILABLE".to_string());
                None
            }
        }
    };

    codes.sort();
    codes.dedup();
    let status = if codes.is_empty() { LayerStatus::Ok } else { LayerStatus::Warn };

    LayerEnvelope::new(
        VERSION,
        status,
        None,
        codes,
        Body {
            cast_reliability_t3,
            cast_reliability_t4,
            cast_reliability_t6,
            protection_coverage_proxy,
            commander_fragility_delta,
        },
    )
}
