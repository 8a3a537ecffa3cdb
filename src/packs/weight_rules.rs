//! `weight_rules_v1`: per-format conditional bucket-weight multipliers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::VersionedPack;

/// Expected `version` field value for this pack.
pub const EXPECTED_VERSION: &str = "weight_rules_v1";

/// One conditional multiplier rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRule {
    pub rule_id: String,
    pub target_bucket: String,
    pub requirement_flag: String,
    pub multiplier: f64,
}

/// One format's rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatWeightRules {
    pub rules: Vec<WeightRule>,
}

impl FormatWeightRules {
    /// Whether `rule_id` is unique within this format's rule set.
    #[must_use]
    pub fn has_unique_rule_ids(&self) -> bool {
        let mut seen = std::collections::BTreeSet::new();
        self.rules.iter().all(|rule| seen.insert(rule.rule_id.as_str()))
    }

    /// Whether every rule's multiplier is non-negative.
    #[must_use]
    pub fn has_valid_multipliers(&self) -> bool {
        self.rules.iter().all(|rule| rule.multiplier >= 0.0)
    }

    /// Rules sorted by `target_bucket` ascending, then `rule_id` ascending
    /// (spec §4.5's evaluation/output order).
    #[must_use]
    pub fn rules_sorted(&self) -> Vec<&WeightRule> {
        let mut rules: Vec<&WeightRule> = self.rules.iter().collect();
        rules.sort_by(|a, b| (a.target_bucket.as_str(), a.rule_id.as_str()).cmp(&(b.target_bucket.as_str(), b.rule_id.as_str())));
        rules
    }
}

/// The full pack: format identifier -> rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightRulesPack {
    pub version: String,
    pub format_defaults: BTreeMap<String, FormatWeightRules>,
}

impl VersionedPack for WeightRulesPack {
    fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::{FormatWeightRules, WeightRule};

    fn rule(rule_id: &str, target_bucket: &str) -> WeightRule {
        WeightRule {
            rule_id: rule_id.to_string(),
            target_bucket: target_bucket.to_string(),
            requirement_flag: "SOME_FLAG".to_string(),
            multiplier: 1.1,
        }
    }

    #[test]
    fn detects_duplicate_rule_ids() {
        let rules = FormatWeightRules {
            rules: vec![rule("R1", "RAMP"), rule("R1", "REMOVAL")],
        };
        assert!(!rules.has_unique_rule_ids());
    }

    #[test]
    fn rejects_negative_multiplier() {
        let mut rules = FormatWeightRules {
            rules: vec![rule("R1", "RAMP")],
        };
        rules.rules[0].multiplier = -0.1;
        assert!(!rules.has_valid_multipliers());
    }

    #[test]
    fn rules_sorted_by_bucket_then_rule_id() {
        let rules = FormatWeightRules {
            rules: vec![rule("R2", "RAMP"), rule("R1", "RAMP"), rule("R1", "CARD_ADVANTAGE")],
        };
        let ids: Vec<(&str, &str)> = rules
            .rules_sorted()
            .iter()
            .map(|r| (r.target_bucket.as_str(), r.rule_id.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![("CARD_ADVANTAGE", "R1"), ("RAMP", "R1"), ("RAMP", "R2")]
        );
    }
}
