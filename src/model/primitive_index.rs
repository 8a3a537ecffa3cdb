//! `PrimitiveIndex`: the read-only per-card primitive tagging produced by
//! the upstream taxonomy compiler (out of scope here; consumed only).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Mapping from `slot_id` to its set of primitive ids, plus the playable
/// slot set and optional commander slot. This is the sole upstream input to
/// `RequirementDetection` and `Coherence`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveIndex {
    pub primitive_index_by_slot: BTreeMap<String, BTreeSet<String>>,
    pub deck_slot_ids_playable: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commander_slot_id: Option<String>,
}

impl PrimitiveIndex {
    /// Normalized (deduplicated, non-empty-filtered) view of the playable
    /// slot set intersected with slots that have an entry in the primitive
    /// map, per spec §4.2's normalization rule.
    #[must_use]
    pub fn normalized_playable_slots(&self) -> BTreeSet<String> {
        self.deck_slot_ids_playable
            .iter()
            .filter(|slot| !slot.is_empty())
            .cloned()
            .collect()
    }

    /// Primitive set for a playable slot, empty when absent (a dead slot).
    #[must_use]
    pub fn primitives_for_slot(&self, slot_id: &str) -> BTreeSet<String> {
        self.primitive_index_by_slot
            .get(slot_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Inverse mapping, primitive -> sorted set of playable slots containing
    /// it. Computed on demand (not stored) so it is always consistent with
    /// `primitive_index_by_slot` and the playable-slot filter.
    #[must_use]
    pub fn primitive_to_slots(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut inverse: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let playable = self.normalized_playable_slots();
        for slot_id in &playable {
            for primitive in self.primitives_for_slot(slot_id) {
                inverse.entry(primitive).or_default().insert(slot_id.clone());
            }
        }
        inverse
    }

    /// Count of playable slots containing at least one of `primitives`.
    #[must_use]
    pub fn slots_containing_any(&self, primitives: &BTreeSet<String>) -> u32 {
        let playable = self.normalized_playable_slots();
        playable
            .iter()
            .filter(|slot| {
                let slot_primitives = self.primitives_for_slot(slot);
                primitives.iter().any(|p| slot_primitives.contains(p))
            })
            .count() as u32
    }

    /// Count of playable, non-commander slots.
    #[must_use]
    pub fn non_commander_playable_slots(&self) -> BTreeSet<String> {
        let playable = self.normalized_playable_slots();
        match &self.commander_slot_id {
            Some(commander) => playable.into_iter().filter(|s| s != commander).collect(),
            None => playable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PrimitiveIndex;
    use std::collections::BTreeSet;

    fn index() -> PrimitiveIndex {
        let mut idx = PrimitiveIndex::default();
        idx.primitive_index_by_slot
            .insert("s1".into(), BTreeSet::from(["RAMP".to_string()]));
        idx.primitive_index_by_slot
            .insert("s2".into(), BTreeSet::from(["RAMP".to_string(), "REMOVAL".to_string()]));
        idx.deck_slot_ids_playable = BTreeSet::from(["s1".to_string(), "s2".to_string(), "s3".to_string()]);
        idx
    }

    #[test]
    fn primitive_to_slots_is_inverse_of_slot_map() {
        let idx = index();
        let inverse = idx.primitive_to_slots();
        assert_eq!(
            inverse.get("RAMP").cloned().unwrap_or_default(),
            BTreeSet::from(["s1".to_string(), "s2".to_string()])
        );
    }

    #[test]
    fn dead_slot_has_no_primitives() {
        let idx = index();
        assert!(idx.primitives_for_slot("s3").is_empty());
    }

    #[test]
    fn slots_containing_any_counts_correctly() {
        let idx = index();
        let want = BTreeSet::from(["REMOVAL".to_string()]);
        assert_eq!(idx.slots_containing_any(&want), 1);
    }

    #[test]
    fn non_commander_playable_slots_excludes_commander() {
        let mut idx = index();
        idx.commander_slot_id = Some("s1".to_string());
        let non_commander = idx.non_commander_playable_slots();
        assert!(!non_commander.contains("s1"));
        assert!(non_commander.contains("s2"));
    }
}
