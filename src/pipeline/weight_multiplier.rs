//! Layer 5 — `WeightMultiplier`: per-bucket stacked multipliers from
//! conditional weight rules.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::rounding::round6;
use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::packs::weight_rules::WeightRulesPack;
use crate::packs::PackLoadOutcome;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "weight_multiplier_v1";

/// One rule that was active and stacked into its bucket's multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedRule {
    pub target_bucket: String,
    pub rule_id: String,
    pub multiplier: f64,
}

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub multipliers: BTreeMap<String, f64>,
    pub applied_rules: Vec<AppliedRule>,
}

fn skip(reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Skip,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            multipliers: BTreeMap::new(),
            applied_rules: vec![],
        },
    )
}

/// Run `WeightMultiplier`. `substitution_bucket_ids` and `format_id` come
/// from `SubstitutionEngine` and the host's format selection respectively.
#[must_use]
pub fn run(
    format_id: &str,
    substitution_bucket_ids: &BTreeSet<String>,
    engine_requirements: Option<&BTreeMap<String, bool>>,
    engine_requirements_available: bool,
    pack: &PackLoadOutcome<WeightRulesPack>,
) -> LayerEnvelope<Body> {
    let PackLoadOutcome::Loaded(pack) = pack else {
        return skip("WEIGHT_RULES_UNAVAILABLE");
    };
    let Some(format_rules) = pack.format_defaults.get(format_id) else {
        return skip("WEIGHT_RULES_UNAVAILABLE");
    };

    let mut codes = Vec::new();
    if !engine_requirements_available {
        codes.push("ENGINE_REQUIREMENTS_UNAVAILABLE".to_string());
    }

    let mut candidate_buckets: BTreeSet<String> = substitution_bucket_ids.clone();
    for rule in &format_rules.rules {
        candidate_buckets.insert(rule.target_bucket.clone());
    }

    let mut multipliers: BTreeMap<String, f64> = candidate_buckets.iter().map(|b| (b.clone(), 1.0)).collect();
    let mut applied_rules = Vec::new();

    for rule in format_rules.rules_sorted() {
        let active = engine_requirements
            .and_then(|reqs| reqs.get(&rule.requirement_flag))
            .copied()
            == Some(true);
        if active {
            if let Some(current) = multipliers.get_mut(&rule.target_bucket) {
                *current *= rule.multiplier;
            }
            applied_rules.push(AppliedRule {
                target_bucket: rule.target_bucket.clone(),
                rule_id: rule.rule_id.clone(),
                multiplier: rule.multiplier,
            });
        }
    }
    for value in multipliers.values_mut() {
        *value = round6(*value);
    }

    codes.sort();
    codes.dedup();
    let status = if codes.is_empty() { LayerStatus::Ok } else { LayerStatus::Warn };

    LayerEnvelope::new(
        VERSION,
        status,
        None,
        codes,
        Body {
            multipliers,
            applied_rules,
        },
    )
}
