//! `mulligan_assumptions_v1`: per-format mulligan-policy checkpoint tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::VersionedPack;
use crate::core::CHECKPOINTS;

/// Expected `version` field value for this pack.
pub const EXPECTED_VERSION: &str = "mulligan_assumptions_v1";

/// The three mulligan policies a format must define, in their canonical
/// ascending ordering (`DRAW10_SHUFFLE3` < `FRIENDLY` < `NORMAL`).
pub const POLICY_IDS: [&str; 3] = ["DRAW10_SHUFFLE3", "FRIENDLY", "NORMAL"];

/// One policy's checkpoint table: `effective_n` keyed by exactly
/// `{7, 9, 10, 12}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyCheckpoints {
    pub effective_n_by_checkpoint: BTreeMap<u32, f64>,
}

impl PolicyCheckpoints {
    /// Whether this policy's checkpoint key set is exactly `{7,9,10,12}`.
    #[must_use]
    pub fn has_complete_checkpoints(&self) -> bool {
        let keys: std::collections::BTreeSet<u32> = self.effective_n_by_checkpoint.keys().copied().collect();
        let expected: std::collections::BTreeSet<u32> = CHECKPOINTS.into_iter().collect();
        keys == expected
    }
}

/// The three required policies for one format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySet {
    #[serde(rename = "FRIENDLY")]
    pub friendly: PolicyCheckpoints,
    #[serde(rename = "NORMAL")]
    pub normal: PolicyCheckpoints,
    #[serde(rename = "DRAW10_SHUFFLE3")]
    pub draw10_shuffle3: PolicyCheckpoints,
}

impl PolicySet {
    /// Policies paired with their canonical policy id, sorted ascending by
    /// id: `DRAW10_SHUFFLE3, FRIENDLY, NORMAL`.
    #[must_use]
    pub fn ordered(&self) -> [(&'static str, &PolicyCheckpoints); 3] {
        [
            ("DRAW10_SHUFFLE3", &self.draw10_shuffle3),
            ("FRIENDLY", &self.friendly),
            ("NORMAL", &self.normal),
        ]
    }

    #[must_use]
    pub fn by_id(&self, policy_id: &str) -> Option<&PolicyCheckpoints> {
        match policy_id {
            "FRIENDLY" => Some(&self.friendly),
            "NORMAL" => Some(&self.normal),
            "DRAW10_SHUFFLE3" => Some(&self.draw10_shuffle3),
            _ => None,
        }
    }
}

/// One format's mulligan defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatDefaults {
    pub default_policy: String,
    pub policies: PolicySet,
}

/// The full pack: format identifier -> mulligan defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MulliganAssumptionsPack {
    pub version: String,
    pub format_defaults: BTreeMap<String, FormatDefaults>,
}

impl VersionedPack for MulliganAssumptionsPack {
    fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::{PolicyCheckpoints, PolicySet};
    use std::collections::BTreeMap;

    fn complete_checkpoints() -> PolicyCheckpoints {
        let mut map = BTreeMap::new();
        for c in [7, 9, 10, 12] {
            map.insert(c, 10.0);
        }
        PolicyCheckpoints {
            effective_n_by_checkpoint: map,
        }
    }

    #[test]
    fn complete_checkpoint_set_is_recognized() {
        assert!(complete_checkpoints().has_complete_checkpoints());
    }

    #[test]
    fn incomplete_checkpoint_set_is_rejected() {
        let mut partial = complete_checkpoints();
        partial.effective_n_by_checkpoint.remove(&12);
        assert!(!partial.has_complete_checkpoints());
    }

    #[test]
    fn policy_set_orders_ascending_by_id() {
        let set = PolicySet::default();
        let ids: Vec<&str> = set.ordered().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec!["DRAW10_SHUFFLE3", "FRIENDLY", "NORMAL"]);
    }
}
