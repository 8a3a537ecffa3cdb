//! Layer 4 — `SubstitutionEngine`: per-bucket `effective_K` from primary
//! plus requirement-gated substitution primitives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::rounding::{k_int, round6};
use crate::core::DECK_SIZE;
use crate::model::bucket::BucketDefinition;
use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::model::primitive_index::PrimitiveIndex;
use crate::packs::bucket_substitutions::BucketSubstitutionsPack;
use crate::packs::PackLoadOutcome;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "substitution_engine_v1";

/// One aggregated substitution term contributing to a bucket's `effective_K`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstitutionTerm {
    pub primitive: String,
    pub weight: f64,
    pub k_substitute: u32,
    pub contribution: f64,
}

/// One bucket's computed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketResult {
    pub bucket_id: String,
    pub k_primary: u32,
    pub effective_k: f64,
    pub k_int: u32,
    pub substitution_terms: Vec<SubstitutionTerm>,
}

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub buckets: Vec<BucketResult>,
}

fn skip(reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Skip,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body { buckets: vec![] },
    )
}

fn compute_bucket(
    bucket: &BucketDefinition,
    index: &PrimitiveIndex,
    engine_requirements: Option<&BTreeMap<String, bool>>,
    codes: &mut Vec<String>,
) -> BucketResult {
    let primary: std::collections::BTreeSet<String> = bucket.primary_primitives.iter().cloned().collect();
    let k_primary = index.slots_containing_any(&primary);

    let mut aggregated: BTreeMap<String, f64> = BTreeMap::new();
    for row in &bucket.base_substitutions {
        *aggregated.entry(row.primitive.clone()).or_insert(0.0) += row.weight;
    }
    for group in &bucket.conditional_substitutions {
        let active = match engine_requirements {
            None => false,
            Some(requirements) => match requirements.get(&group.requirement_flag) {
                Some(true) => true,
                Some(false) => false,
                None => {
                    codes.push("SUBSTITUTION_REQUIREMENT_FLAG_UNAVAILABLE".to_string());
                    false
                }
            },
        };
        if active {
            for row in &group.substitutions {
                *aggregated.entry(row.primitive.clone()).or_insert(0.0) += row.weight;
            }
        }
    }

    let mut terms: Vec<SubstitutionTerm> = aggregated
        .into_iter()
        .map(|(primitive, weight)| {
            let singleton: std::collections::BTreeSet<String> = [primitive.clone()].into_iter().collect();
            let k_substitute = index.slots_containing_any(&singleton);
            SubstitutionTerm {
                primitive,
                weight,
                k_substitute,
                contribution: weight * f64::from(k_substitute),
            }
        })
        .collect();
    terms.sort_by(|a, b| a.primitive.cmp(&b.primitive));

    let total_contribution: f64 = terms.iter().map(|t| t.contribution).sum();
    let effective_k = round6(crate::core::rounding::clamp_k(
        f64::from(k_primary) + total_contribution,
        DECK_SIZE,
    ));
    let bucket_k_int = k_int(effective_k, DECK_SIZE);

    BucketResult {
        bucket_id: bucket.bucket_id.clone(),
        k_primary,
        effective_k,
        k_int: bucket_k_int,
        substitution_terms: terms,
    }
}

/// Run `SubstitutionEngine`.
#[must_use]
pub fn run(
    primitive_index: Option<&PrimitiveIndex>,
    engine_requirements: Option<&BTreeMap<String, bool>>,
    engine_requirements_available: bool,
    pack: &PackLoadOutcome<BucketSubstitutionsPack>,
) -> LayerEnvelope<Body> {
    let Some(index) = primitive_index else {
        return skip("PRIMITIVE_INDEX_UNAVAILABLE");
    };
    let PackLoadOutcome::Loaded(pack) = pack else {
        return skip("BUCKET_SUBSTITUTIONS_UNAVAILABLE");
    };

    let mut codes = Vec::new();
    if !engine_requirements_available {
        codes.push("ENGINE_REQUIREMENTS_UNAVAILABLE".to_string());
    }

    let mut buckets: Vec<BucketResult> = pack
        .buckets_sorted()
        .into_iter()
        .map(|bucket| compute_bucket(bucket, index, engine_requirements, &mut codes))
        .collect();
    buckets.sort_by(|a, b| a.bucket_id.cmp(&b.bucket_id));

    codes.sort();
    codes.dedup();
    let status = if codes.is_empty() { LayerStatus::Ok } else { LayerStatus::Warn };

    LayerEnvelope::new(VERSION, status, None, codes, Body { buckets })
}
