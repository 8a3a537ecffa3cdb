//! `profile_thresholds_v1`: per-profile domain thresholds consumed by
//! `SufficiencySummary`, plus the `calibration_snapshot_v1` version check it
//! depends on (spec §4.12, §9 open question on calibration snapshot).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::VersionedPack;

/// Expected `version` field value for this pack.
pub const EXPECTED_VERSION: &str = "profile_thresholds_v1";

/// Expected `version` field value for the calibration snapshot pack.
pub const CALIBRATION_EXPECTED_VERSION: &str = "calibration_snapshot_v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredEffectsThresholds {
    pub max_missing: u32,
    pub max_unknowns: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineProbThresholds {
    pub min_cast_reliability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressProbThresholds {
    pub min_continuity: f64,
    pub min_rebuild: f64,
    pub max_graveyard_fragility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceThresholds {
    pub max_dead_slot_ratio: f64,
    pub min_overlap_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceThresholds {
    pub max_commander_fragility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommanderThresholds {
    pub min_protection_coverage: f64,
    pub max_commander_fragility: f64,
}

/// The six fixed domains, in the order `SufficiencySummary` must emit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainThresholds {
    pub required_effects: RequiredEffectsThresholds,
    pub baseline_prob: BaselineProbThresholds,
    pub stress_prob: StressProbThresholds,
    pub coherence: CoherenceThresholds,
    pub resilience: ResilienceThresholds,
    pub commander: CommanderThresholds,
}

/// Fixed domain key order, reused by `SufficiencySummary`'s output.
pub const DOMAIN_ORDER: [&str; 6] = [
    "required_effects",
    "baseline_prob",
    "stress_prob",
    "coherence",
    "resilience",
    "commander",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileThresholds {
    pub domains: DomainThresholds,
}

/// The full pack: profile id -> domain thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileThresholdsPack {
    pub version: String,
    pub profiles: BTreeMap<String, ProfileThresholds>,
}

impl VersionedPack for ProfileThresholdsPack {
    fn version(&self) -> &str {
        &self.version
    }
}

/// The calibration snapshot pack: a single pinned version string that
/// `SufficiencySummary` must be able to resolve before it will evaluate any
/// domain (spec §9's calibration-snapshot open question).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSnapshotPack {
    pub version: String,
}

impl VersionedPack for CalibrationSnapshotPack {
    fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::DOMAIN_ORDER;

    #[test]
    fn domain_order_is_fixed_and_complete() {
        assert_eq!(DOMAIN_ORDER.len(), 6);
        assert_eq!(DOMAIN_ORDER[0], "required_effects");
        assert_eq!(DOMAIN_ORDER[5], "commander");
    }
}
