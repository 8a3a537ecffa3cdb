//! Layer 3 — `MulliganModel`: per-policy effective draw size at each
//! checkpoint, for a configured format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::rounding::{clamp_k, round6};
use crate::core::DECK_SIZE;
use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::packs::mulligan_assumptions::{MulliganAssumptionsPack, POLICY_IDS};
use crate::packs::PackLoadOutcome;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "mulligan_model_v1";

/// One policy's rounded, clamped checkpoint table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRow {
    pub policy_id: String,
    pub effective_n_by_checkpoint: BTreeMap<u32, f64>,
}

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub format_id: String,
    pub default_policy: String,
    pub policies: Vec<PolicyRow>,
}

fn skip(format_id: &str, reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Skip,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            format_id: format_id.to_string(),
            default_policy: String::new(),
            policies: vec![],
        },
    )
}

/// Run `MulliganModel` for `format_id`.
#[must_use]
pub fn run(format_id: &str, pack: &PackLoadOutcome<MulliganAssumptionsPack>) -> LayerEnvelope<Body> {
    let PackLoadOutcome::Loaded(pack) = pack else {
        return skip(format_id, "MULLIGAN_ASSUMPTIONS_UNAVAILABLE");
    };
    let Some(defaults) = pack.format_defaults.get(format_id) else {
        return skip(format_id, "FORMAT_ASSUMPTIONS_UNAVAILABLE");
    };
    for (policy_id, checkpoints) in defaults.policies.ordered() {
        if !checkpoints.has_complete_checkpoints() {
            return skip(format_id, "FORMAT_ASSUMPTIONS_UNAVAILABLE");
        }
        let _ = policy_id;
    }

    let policies: Vec<PolicyRow> = defaults
        .policies
        .ordered()
        .into_iter()
        .map(|(policy_id, checkpoints)| {
            let mut effective_n_by_checkpoint = BTreeMap::new();
            for checkpoint in crate::core::CHECKPOINTS {
                let raw = checkpoints.effective_n_by_checkpoint.get(&checkpoint).copied().unwrap_or(0.0);
                effective_n_by_checkpoint.insert(checkpoint, round6(clamp_k(raw, DECK_SIZE)));
            }
            PolicyRow {
                policy_id: policy_id.to_string(),
                effective_n_by_checkpoint,
            }
        })
        .collect();

    debug_assert_eq!(policies.len(), POLICY_IDS.len());

    LayerEnvelope::new(
        VERSION,
        LayerStatus::Ok,
        None,
        vec![],
        Body {
            format_id: format_id.to_string(),
            default_policy: defaults.default_policy.clone(),
            policies,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::model::layer::LayerStatus;
    use crate::packs::mulligan_assumptions::{FormatDefaults, MulliganAssumptionsPack, PolicyCheckpoints, PolicySet};
    use crate::packs::PackLoadOutcome;
    use std::collections::BTreeMap;

    fn checkpoints(n: f64) -> PolicyCheckpoints {
        let mut map = BTreeMap::new();
        for c in [7, 9, 10, 12] {
            map.insert(c, n);
        }
        PolicyCheckpoints {
            effective_n_by_checkpoint: map,
        }
    }

    fn pack() -> MulliganAssumptionsPack {
        let mut format_defaults = BTreeMap::new();
        format_defaults.insert(
            "commander".to_string(),
            FormatDefaults {
                default_policy: "NORMAL".to_string(),
                policies: PolicySet {
                    friendly: checkpoints(8.0),
                    normal: checkpoints(7.0),
                    draw10_shuffle3: checkpoints(10.0),
                },
            },
        );
        MulliganAssumptionsPack {
            version: "mulligan_assumptions_v1".to_string(),
            format_defaults,
        }
    }

    #[test]
    fn missing_pack_skips() {
        let outcome = PackLoadOutcome::Missing;
        let envelope = run("commander", &outcome);
        assert_eq!(envelope.reason_code.as_deref(), Some("MULLIGAN_ASSUMPTIONS_UNAVAILABLE"));
    }

    #[test]
    fn missing_format_skips() {
        let outcome = PackLoadOutcome::Loaded(pack());
        let envelope = run("standard", &outcome);
        assert_eq!(envelope.reason_code.as_deref(), Some("FORMAT_ASSUMPTIONS_UNAVAILABLE"));
    }

    #[test]
    fn policies_ordered_ascending_by_id() {
        let outcome = PackLoadOutcome::Loaded(pack());
        let envelope = run("commander", &outcome);
        assert_eq!(envelope.status, LayerStatus::Ok);
        let ids: Vec<&str> = envelope.body.policies.iter().map(|p| p.policy_id.as_str()).collect();
        assert_eq!(ids, vec!["DRAW10_SHUFFLE3", "FRIENDLY", "NORMAL"]);
    }
}
