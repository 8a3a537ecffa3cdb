//! Bucket schema (`bucket_substitutions_v1`) and per-bucket computed state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One weighted substitution candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionRow {
    pub primitive: String,
    pub weight: f64,
}

/// A requirement-gated group of substitutions (the single allowed
/// conditional-substitution depth, per spec §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalSubstitutionGroup {
    pub requirement_flag: String,
    pub substitutions: Vec<SubstitutionRow>,
}

/// Static per-bucket substitution schema, as loaded from
/// `bucket_substitutions_v1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketDefinition {
    pub bucket_id: String,
    pub primary_primitives: Vec<String>,
    pub base_substitutions: Vec<SubstitutionRow>,
    pub conditional_substitutions: Vec<ConditionalSubstitutionGroup>,
}

/// Per-bucket computed triple, created at `SubstitutionEngine` and mutated
/// through `StressTransform`: `(effective_K, K_int, p_ge_1_by_checkpoint)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketState {
    pub bucket_id: String,
    pub effective_k: f64,
    pub k_int: u32,
    /// Checkpoint (7/9/10/12) -> `p_ge_1`. Always has exactly the frozen
    /// checkpoint key set once populated by `ProbabilityCheckpoint`.
    pub p_ge_1_by_checkpoint: BTreeMap<u32, f64>,
}

impl BucketState {
    /// A freshly substitution-computed bucket with no probabilities yet.
    #[must_use]
    pub fn new(bucket_id: impl Into<String>, effective_k: f64, k_int: u32) -> Self {
        Self {
            bucket_id: bucket_id.into(),
            effective_k,
            k_int,
            p_ge_1_by_checkpoint: BTreeMap::new(),
        }
    }
}
