//! `bucket_substitutions_v1`: per-bucket primary/substitution schemas.

use serde::{Deserialize, Serialize};

use super::VersionedPack;
use crate::model::bucket::BucketDefinition;

/// Expected `version` field value for this pack.
pub const EXPECTED_VERSION: &str = "bucket_substitutions_v1";

/// The full pack: an unordered list of bucket definitions. Consumers must
/// sort by `bucket_id` ascending before use (spec §4.4's ordering rule).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketSubstitutionsPack {
    pub version: String,
    pub buckets: Vec<BucketDefinition>,
}

impl VersionedPack for BucketSubstitutionsPack {
    fn version(&self) -> &str {
        &self.version
    }
}

impl BucketSubstitutionsPack {
    /// Buckets sorted ascending by `bucket_id`, the mandated iteration order
    /// for `SubstitutionEngine` and every downstream layer keyed by bucket.
    #[must_use]
    pub fn buckets_sorted(&self) -> Vec<&BucketDefinition> {
        let mut buckets: Vec<&BucketDefinition> = self.buckets.iter().collect();
        buckets.sort_by(|a, b| a.bucket_id.cmp(&b.bucket_id));
        buckets
    }

    /// Every substitution weight across every bucket must be in `[0.0, 1.0]`.
    #[must_use]
    pub fn has_valid_weights(&self) -> bool {
        self.buckets.iter().all(|bucket| {
            let base_ok = bucket.base_substitutions.iter().all(|row| (0.0..=1.0).contains(&row.weight));
            let conditional_ok = bucket.conditional_substitutions.iter().all(|group| {
                group.substitutions.iter().all(|row| (0.0..=1.0).contains(&row.weight))
            });
            base_ok && conditional_ok
        })
    }
}
