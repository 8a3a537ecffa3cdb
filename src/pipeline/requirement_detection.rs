//! Layer 1 — `RequirementDetection`: derive boolean engine requirements and
//! the `commander_dependent` class from the primitive index.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::model::primitive_index::PrimitiveIndex;
use crate::model::CommanderDependent;
use crate::packs::dependency_signatures::DependencySignaturesPack;
use crate::packs::PackLoadOutcome;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "requirement_detection_v1";

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub engine_requirements: BTreeMap<String, bool>,
    pub commander_dependent: CommanderDependent,
}

fn all_primitives(index: &PrimitiveIndex) -> BTreeSet<String> {
    index.primitive_index_by_slot.values().flatten().cloned().collect()
}

/// Derive `commander_dependent` from the resolved requirement flags and the
/// presence of a commander slot. The two explicit tier flags
/// (`COMMANDER_DEPENDENT_HIGH`/`COMMANDER_DEPENDENT_MEDIUM`) take precedence
/// in that order; a commander slot with neither set is `LOW`; no commander
/// slot at all is `UNKNOWN`.
fn classify_commander_dependent(
    requirements: &BTreeMap<String, bool>,
    has_commander_slot: bool,
) -> CommanderDependent {
    if !has_commander_slot {
        return CommanderDependent::Unknown;
    }
    if requirements.get("COMMANDER_DEPENDENT_HIGH").copied().unwrap_or(false) {
        CommanderDependent::High
    } else if requirements.get("COMMANDER_DEPENDENT_MEDIUM").copied().unwrap_or(false) {
        CommanderDependent::Medium
    } else {
        CommanderDependent::Low
    }
}

/// Run `RequirementDetection`.
#[must_use]
pub fn run(
    primitive_index: Option<&PrimitiveIndex>,
    signatures: &PackLoadOutcome<DependencySignaturesPack>,
) -> LayerEnvelope<Body> {
    let Some(index) = primitive_index else {
        return LayerEnvelope::new(
            VERSION,
            LayerStatus::Skip,
            Some("PRIMITIVE_INDEX_UNAVAILABLE".to_string()),
            vec!["PRIMITIVE_INDEX_UNAVAILABLE".to_string()],
            Body {
                engine_requirements: BTreeMap::new(),
                commander_dependent: CommanderDependent::Unknown,
            },
        );
    };

    let mut codes = Vec::new();
    if index.commander_slot_id.is_none() {
        codes.push("COMMANDER_SLOT_ID_MISSING".to_string());
    }

    let present_primitives = all_primitives(index);
    let mut engine_requirements = BTreeMap::new();

    match signatures {
        PackLoadOutcome::Loaded(pack) => {
            for (flag, pattern) in &pack.requirement_flags {
                if !pattern.is_realized() {
                    codes.push(format!("REQUIREMENT_FLAG_UNIMPLEMENTED__{flag}"));
                    continue;
                }
                for primitive in pattern.referenced_primitives() {
                    if !present_primitives.contains(primitive) {
                        codes.push("UNKNOWN_PRIMITIVE_ID_IN_SIGNATURES".to_string());
                        break;
                    }
                }
                engine_requirements.insert(flag.clone(), pattern.evaluate(&present_primitives));
            }
        }
        _ => {
            codes.push("DEPENDENCY_SIGNATURES_UNAVAILABLE".to_string());
        }
    }

    let commander_dependent = classify_commander_dependent(&engine_requirements, index.commander_slot_id.is_some());

    let status = if codes.is_empty() { LayerStatus::Ok } else { LayerStatus::Warn };
    LayerEnvelope::new(
        VERSION,
        status,
        None,
        codes,
        Body {
            engine_requirements,
            commander_dependent,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{classify_commander_dependent, run};
    use crate::model::CommanderDependent;
    use crate::packs::dependency_signatures::DependencySignaturesPack;
    use crate::packs::PackLoadOutcome;
    use std::collections::BTreeMap;

    #[test]
    fn missing_primitive_index_skips() {
        let outcome = PackLoadOutcome::Missing;
        let envelope = run(None, &outcome);
        assert_eq!(envelope.reason_code.as_deref(), Some("PRIMITIVE_INDEX_UNAVAILABLE"));
    }

    #[test]
    fn classify_commander_dependent_without_commander_slot_is_unknown() {
        assert_eq!(
            classify_commander_dependent(&BTreeMap::new(), false),
            CommanderDependent::Unknown
        );
    }

    #[test]
    fn classify_commander_dependent_defaults_to_low() {
        assert_eq!(classify_commander_dependent(&BTreeMap::new(), true), CommanderDependent::Low);
    }

    #[test]
    fn missing_signatures_pack_warns_but_still_produces_requirements() {
        let index = crate::model::primitive_index::PrimitiveIndex::default();
        let outcome: PackLoadOutcome<DependencySignaturesPack> = PackLoadOutcome::Missing;
        let envelope = run(Some(&index), &outcome);
        assert!(envelope.codes.contains(&"DEPENDENCY_SIGNATURES_UNAVAILABLE".to_string()));
    }
}
