//! Layer 13 (auxiliary) — `ComboPack`: deterministic local-only lookup of
//! two-card combo pairs present in a given deck.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::packs::combo_variants::{ComboEntry, CommanderSpellbookVariantsPack, TwoCardCombosPack};
use crate::packs::PackLoadOutcome;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "combo_pack_v1";

/// Hard cap on the number of matches reported (spec §4.13).
pub const MAX_MATCHES: usize = 25;

/// One matched combo pair present in the deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboMatch {
    pub a: String,
    pub b: String,
    pub variant_ids: Vec<String>,
}

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub two_card_combos_version: String,
    pub matches: Vec<ComboMatch>,
    pub truncated: bool,
}

fn skip(reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Skip,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            two_card_combos_version: String::new(),
            matches: vec![],
            truncated: false,
        },
    )
}

/// Deterministic two-card-combo detector: returns every combo entry whose
/// card keys are both present in `deck_card_keys`, sorted lexicographically
/// by `(a, b)` and capped at `max_matches`.
#[must_use]
pub fn detect_two_card_combos(
    combos: &[ComboEntry],
    deck_card_keys: &BTreeSet<String>,
    max_matches: usize,
) -> (Vec<ComboMatch>, bool) {
    let mut matches: Vec<ComboMatch> = combos
        .iter()
        .filter(|c| deck_card_keys.contains(&c.a) && deck_card_keys.contains(&c.b))
        .map(|c| ComboMatch {
            a: c.a.clone(),
            b: c.b.clone(),
            variant_ids: c.variant_ids.clone(),
        })
        .collect();
    matches.sort_by(|x, y| x.a.cmp(&y.a).then_with(|| x.b.cmp(&y.b)));
    let truncated = matches.len() > max_matches;
    matches.truncate(max_matches);
    (matches, truncated)
}

/// Run `ComboPack`. `two_card_combos` resolves v2-with-v1-fallback upstream
/// (spec §4.13); `spellbook_variants` is currently loaded only to confirm
/// the variant-id registry is available (`COMBO_SPELLBOOK_VARIANTS_UNAVAILABLE`
/// is advisory, not fatal — variant ids are still reported from the combos
/// pack even when the registry can't be cross-checked).
#[must_use]
pub fn run(
    deck_card_keys: Option<&BTreeSet<String>>,
    two_card_combos: &PackLoadOutcome<TwoCardCombosPack>,
    spellbook_variants: &PackLoadOutcome<CommanderSpellbookVariantsPack>,
) -> LayerEnvelope<Body> {
    let Some(deck_card_keys) = deck_card_keys else {
        return skip("DECK_CARD_KEYS_UNAVAILABLE");
    };
    let PackLoadOutcome::Loaded(combos_pack) = two_card_combos else {
        return skip("TWO_CARD_COMBOS_UNAVAILABLE");
    };

    let mut codes = Vec::new();
    if !spellbook_variants.is_loaded() {
        codes.push("COMBO_SPELLBOOK_VARIANTS_UNAVAILABLE".to_string());
    }
    if combos_pack.version == crate::packs::combo_variants::TWO_CARD_COMBOS_V1_EXPECTED_VERSION {
        codes.push("TWO_CARD_COMBOS_V2_FALLBACK_TO_V1".to_string());
    }

    let (matches, truncated) = detect_two_card_combos(&combos_pack.combos, deck_card_keys, MAX_MATCHES);
    if truncated {
        codes.push("COMBO_MATCHES_TRUNCATED".to_string());
    }

    let status = if codes.is_empty() { LayerStatus::Ok } else { LayerStatus::Warn };
    LayerEnvelope::new(
        VERSION,
        status,
        None,
        codes,
        Body {
            two_card_combos_version: combos_pack.version.clone(),
            matches,
            truncated,
        },
    )
}
