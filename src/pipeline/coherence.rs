//! Layer 2 — `Coherence`: dead-slot detection, primitive concentration, and
//! pairwise Jaccard overlap over the playable deck.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::rounding::{clamp01, round6};
use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::model::primitive_index::PrimitiveIndex;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "coherence_v1";

/// One entry of the top-8-by-share primitive table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimitiveShare {
    pub primitive: String,
    pub share: f64,
}

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub dead_slot_count: u32,
    pub dead_slot_ratio: f64,
    pub primitive_concentration_index: f64,
    pub overlap_score: f64,
    pub top_primitives: Vec<PrimitiveShare>,
}

fn jaccard(a: &std::collections::BTreeSet<String>, b: &std::collections::BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Run `Coherence`.
#[must_use]
pub fn run(primitive_index: Option<&PrimitiveIndex>) -> LayerEnvelope<Body> {
    let Some(index) = primitive_index else {
        return LayerEnvelope::new(
            VERSION,
            LayerStatus::Skip,
            Some("PRIMITIVE_INDEX_UNAVAILABLE".to_string()),
            vec!["PRIMITIVE_INDEX_UNAVAILABLE".to_string()],
            Body {
                dead_slot_count: 0,
                dead_slot_ratio: 0.0,
                primitive_concentration_index: 0.0,
                overlap_score: 0.0,
                top_primitives: vec![],
            },
        );
    };

    let playable = index.normalized_playable_slots();
    let live_slots: Vec<&String> = playable
        .iter()
        .filter(|slot| !index.primitives_for_slot(slot).is_empty())
        .collect();
    let dead_slot_count = (playable.len() - live_slots.len()) as u32;
    let dead_slot_ratio = if playable.is_empty() {
        0.0
    } else {
        round6(f64::from(dead_slot_count) / playable.len() as f64)
    };

    let mut coverage: BTreeMap<String, u32> = BTreeMap::new();
    for slot in &live_slots {
        for primitive in index.primitives_for_slot(slot) {
            *coverage.entry(primitive).or_insert(0) += 1;
        }
    }
    let d_count = live_slots.len();
    let primitive_concentration_index = if d_count == 0 {
        0.0
    } else {
        let max_coverage = coverage.values().copied().max().unwrap_or(0);
        round6(f64::from(max_coverage) / d_count as f64)
    };

    let overlap_score = if live_slots.len() < 2 {
        0.0
    } else {
        let mut total = 0.0;
        let mut pairs = 0u64;
        for i in 0..live_slots.len() {
            for j in (i + 1)..live_slots.len() {
                let a = index.primitives_for_slot(live_slots[i]);
                let b = index.primitives_for_slot(live_slots[j]);
                total += jaccard(&a, &b);
                pairs += 1;
            }
        }
        round6(clamp01(total / pairs as f64))
    };

    let mut top_primitives: Vec<PrimitiveShare> = coverage
        .into_iter()
        .map(|(primitive, count)| PrimitiveShare {
            primitive,
            share: round6(if d_count == 0 { 0.0 } else { f64::from(count) / d_count as f64 }),
        })
        .collect();
    top_primitives.sort_by(|a, b| {
        b.share
            .partial_cmp(&a.share)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.primitive.cmp(&b.primitive))
    });
    top_primitives.truncate(8);

    let codes = if dead_slot_count > 0 {
        vec!["DEAD_SLOTS_PRESENT".to_string()]
    } else {
        vec![]
    };
    let status = if dead_slot_count > 0 { LayerStatus::Warn } else { LayerStatus::Ok };

    LayerEnvelope::new(
        VERSION,
        status,
        None,
        codes,
        Body {
            dead_slot_count,
            dead_slot_ratio,
            primitive_concentration_index,
            overlap_score,
            top_primitives,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::model::layer::LayerStatus;
    use crate::model::primitive_index::PrimitiveIndex;
    use std::collections::{BTreeMap, BTreeSet};

    fn all_basic_land_index(count: usize) -> PrimitiveIndex {
        let mut index = PrimitiveIndex::default();
        for i in 0..count {
            let slot = format!("s{i}");
            index
                .primitive_index_by_slot
                .insert(slot.clone(), BTreeSet::from(["BASIC_LAND".to_string()]));
            index.deck_slot_ids_playable.insert(slot);
        }
        index
    }

    #[test]
    fn s1_all_basic_land_gives_full_concentration_and_overlap() {
        let index = all_basic_land_index(99);
        let envelope = run(Some(&index));
        assert_eq!(envelope.status, LayerStatus::Ok);
        assert_eq!(envelope.body.primitive_concentration_index, 1.0);
        assert_eq!(envelope.body.overlap_score, 1.0);
        assert_eq!(envelope.body.dead_slot_count, 0);
    }

    #[test]
    fn dead_slot_present_warns() {
        let mut index = all_basic_land_index(5);
        index.deck_slot_ids_playable.insert("dead".to_string());
        let envelope = run(Some(&index));
        assert_eq!(envelope.status, LayerStatus::Warn);
        assert!(envelope.codes.contains(&"DEAD_SLOTS_PRESENT".to_string()));
        assert_eq!(envelope.body.dead_slot_count, 1);
    }

    #[test]
    fn fewer_than_two_live_slots_has_zero_overlap() {
        let mut index = PrimitiveIndex::default();
        index
            .primitive_index_by_slot
            .insert("s0".to_string(), BTreeSet::from(["RAMP".to_string()]));
        index.deck_slot_ids_playable.insert("s0".to_string());
        let envelope = run(Some(&index));
        assert_eq!(envelope.body.overlap_score, 0.0);
    }

    #[test]
    fn empty_live_set_has_zero_concentration() {
        let mut index = PrimitiveIndex::default();
        index.deck_slot_ids_playable.insert("dead".to_string());
        let envelope = run(Some(&index));
        assert_eq!(envelope.body.primitive_concentration_index, 0.0);
    }

    #[test]
    fn top_primitives_capped_at_eight_sorted_by_share_then_id() {
        let mut index = PrimitiveIndex::default();
        let mut coverage_counts: BTreeMap<&str, u32> = BTreeMap::new();
        for i in 0..10u32 {
            let slot = format!("s{i}");
            let primitive = format!("P{i}");
            index
                .primitive_index_by_slot
                .insert(slot.clone(), BTreeSet::from([primitive.clone()]));
            index.deck_slot_ids_playable.insert(slot);
            coverage_counts.insert("unused", i);
        }
        let envelope = run(Some(&index));
        assert_eq!(envelope.body.top_primitives.len(), 8);
    }
}
