//! `commander_spellbook_variants_v1` and `two_card_combos_v2` (with legacy
//! fallback to `two_card_combos_v1`) — the local-only combo lookup table
//! consumed by `ComboPack`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::VersionedPack;

/// Expected `version` field value for the spellbook-variants pack.
pub const SPELLBOOK_EXPECTED_VERSION: &str = "commander_spellbook_variants_v1";
/// Expected `version` field value for the primary two-card-combos pack.
pub const TWO_CARD_COMBOS_V2_EXPECTED_VERSION: &str = "two_card_combos_v2";
/// Expected `version` field value for the legacy fallback pack.
pub const TWO_CARD_COMBOS_V1_EXPECTED_VERSION: &str = "two_card_combos_v1";

/// Registry of known combo-variant ids. Variant metadata beyond identity is
/// not specified upstream; `ComboPack` only needs to know which ids exist so
/// it can report them alongside a matched card pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommanderSpellbookVariantsPack {
    pub version: String,
    pub variant_ids: BTreeSet<String>,
}

impl VersionedPack for CommanderSpellbookVariantsPack {
    fn version(&self) -> &str {
        &self.version
    }
}

/// One two-card-combo entry: an unordered card-key pair plus the variant ids
/// it realizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboEntry {
    pub a: String,
    pub b: String,
    pub variant_ids: Vec<String>,
}

/// The full two-card-combos pack (either the v2 primary or the v1 legacy
/// fallback — identical shape, distinguished only by `version`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TwoCardCombosPack {
    pub version: String,
    pub combos: Vec<ComboEntry>,
}

impl VersionedPack for TwoCardCombosPack {
    fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::{ComboEntry, TwoCardCombosPack};

    #[test]
    fn pack_round_trips_through_json() {
        let pack = TwoCardCombosPack {
            version: "two_card_combos_v2".to_string(),
            combos: vec![ComboEntry {
                a: "card-a".to_string(),
                b: "card-b".to_string(),
                variant_ids: vec!["variant-1".to_string()],
            }],
        };
        let text = serde_json::to_string(&pack).unwrap();
        let parsed: TwoCardCombosPack = serde_json::from_str(&text).unwrap();
        assert_eq!(pack, parsed);
    }
}
