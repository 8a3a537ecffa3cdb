//! `stress_models_v1`: per-format stress-model selection rules and operator
//! sequences.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::VersionedPack;
use crate::model::operator::Operator;

/// Expected `version` field value for this pack.
pub const EXPECTED_VERSION: &str = "stress_models_v1";

/// One `(profile_id, bracket_id) -> model_id` selection triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileBracketTriple {
    pub profile_id: String,
    pub bracket_id: String,
    pub model_id: String,
}

/// Model-selection precedence inputs for one format (spec §4.8).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub default_model_id: String,
    #[serde(default)]
    pub by_profile_id: BTreeMap<String, String>,
    #[serde(default)]
    pub by_bracket_id: BTreeMap<String, String>,
    #[serde(default)]
    pub by_profile_bracket: Vec<ProfileBracketTriple>,
}

impl Selection {
    /// Resolve the model id to use, given an optional request override, a
    /// profile id, and a bracket id, per the fixed precedence order:
    /// override -> exact (profile, bracket) -> profile -> bracket -> default.
    ///
    /// Returns `(model_id, override_was_unknown)`. When the override is
    /// present but not a key of `models`, resolution falls through to the
    /// remaining precedence and the caller must emit
    /// `STRESS_MODEL_OVERRIDE_UNKNOWN`.
    #[must_use]
    pub fn resolve(
        &self,
        models: &BTreeMap<String, StressModel>,
        request_override_model_id: Option<&str>,
        profile_id: &str,
        bracket_id: &str,
    ) -> (String, bool) {
        if let Some(override_id) = request_override_model_id {
            if models.contains_key(override_id) {
                return (override_id.to_string(), false);
            }
        }
        let override_unknown = request_override_model_id.is_some();

        if let Some(triple) = self
            .by_profile_bracket
            .iter()
            .find(|t| t.profile_id == profile_id && t.bracket_id == bracket_id)
        {
            return (triple.model_id.clone(), override_unknown);
        }
        if let Some(model_id) = self.by_profile_id.get(profile_id) {
            return (model_id.clone(), override_unknown);
        }
        if let Some(model_id) = self.by_bracket_id.get(bracket_id) {
            return (model_id.clone(), override_unknown);
        }
        (self.default_model_id.clone(), override_unknown)
    }
}

/// One stress model: an ordered (pre-canonicalization) list of operators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StressModel {
    pub operators: Vec<Operator>,
}

/// One format's stress-model selection and model set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatStressModels {
    pub selection: Selection,
    pub models: BTreeMap<String, StressModel>,
}

/// The full pack: format identifier -> stress-model configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StressModelsPack {
    pub version: String,
    pub format_defaults: BTreeMap<String, FormatStressModels>,
}

impl VersionedPack for StressModelsPack {
    fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::{ProfileBracketTriple, Selection, StressModel};
    use std::collections::BTreeMap;

    fn models() -> BTreeMap<String, StressModel> {
        let mut map = BTreeMap::new();
        map.insert("default".to_string(), StressModel::default());
        map.insert("aggro".to_string(), StressModel::default());
        map
    }

    #[test]
    fn override_wins_when_known() {
        let selection = Selection {
            default_model_id: "default".to_string(),
            ..Default::default()
        };
        let (model_id, unknown) = selection.resolve(&models(), Some("aggro"), "focused", "B2");
        assert_eq!(model_id, "aggro");
        assert!(!unknown);
    }

    #[test]
    fn unknown_override_falls_through_to_default() {
        let selection = Selection {
            default_model_id: "default".to_string(),
            ..Default::default()
        };
        let (model_id, unknown) = selection.resolve(&models(), Some("does_not_exist"), "focused", "B2");
        assert_eq!(model_id, "default");
        assert!(unknown);
    }

    #[test]
    fn profile_bracket_triple_wins_over_profile_and_bracket() {
        let selection = Selection {
            default_model_id: "default".to_string(),
            by_profile_id: [("focused".to_string(), "aggro".to_string())].into_iter().collect(),
            by_profile_bracket: vec![ProfileBracketTriple {
                profile_id: "focused".to_string(),
                bracket_id: "B2".to_string(),
                model_id: "default".to_string(),
            }],
            ..Default::default()
        };
        let (model_id, unknown) = selection.resolve(&models(), None, "focused", "B2");
        assert_eq!(model_id, "default");
        assert!(!unknown);
    }
}
