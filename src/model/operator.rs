//! `Operator`: the closed, tagged sum of stress-model transformations
//! (spec §3/§4.8/§4.9/§9 "tagged variants over inheritance"). Adding a
//! variant is a breaking, pipeline-version-bumping change; consumers match
//! exhaustively.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A single stress-model operator, parsed from `stress_models_v1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Operator {
    #[serde(rename = "TARGETED_REMOVAL")]
    TargetedRemoval { count: u32 },
    #[serde(rename = "BOARD_WIPE")]
    BoardWipe {
        by_turn: u32,
        surviving_engine_fraction: f64,
    },
    #[serde(rename = "GRAVEYARD_HATE_WINDOW")]
    GraveyardHateWindow { turns: u32, graveyard_penalty: f64 },
    #[serde(rename = "STAX_TAX")]
    StaxTax { by_turn: u32, inflation_factor: f64 },
}

impl Operator {
    /// The `op` discriminant string, exactly as it appears on the wire.
    #[must_use]
    pub const fn op_name(&self) -> &'static str {
        match self {
            Self::TargetedRemoval { .. } => "TARGETED_REMOVAL",
            Self::BoardWipe { .. } => "BOARD_WIPE",
            Self::GraveyardHateWindow { .. } => "GRAVEYARD_HATE_WINDOW",
            Self::StaxTax { .. } => "STAX_TAX",
        }
    }

    /// Whether this operator mutates `effective_K` (and therefore forces a
    /// probability recompute), vs mutating checkpoint probabilities
    /// directly (spec §4.9).
    #[must_use]
    pub const fn is_k_stage(&self) -> bool {
        matches!(
            self,
            Self::TargetedRemoval { .. } | Self::BoardWipe { .. } | Self::GraveyardHateWindow { .. }
        )
    }

    /// Sortable parameter tuple, padded to a common shape, used as the
    /// secondary key in canonical operator ordering (`op` ascending, then
    /// parameter tuple ascending — spec §4.8/§4.9).
    fn sort_key(&self) -> (u32, u64) {
        match *self {
            Self::BoardWipe {
                by_turn,
                surviving_engine_fraction,
            } => (by_turn, surviving_engine_fraction.to_bits()),
            Self::GraveyardHateWindow {
                turns,
                graveyard_penalty,
            } => (turns, graveyard_penalty.to_bits()),
            Self::StaxTax {
                by_turn,
                inflation_factor,
            } => (by_turn, inflation_factor.to_bits()),
            Self::TargetedRemoval { count } => (count, 0),
        }
    }
}

impl Eq for Operator {}

impl PartialOrd for Operator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Operator {
    fn cmp(&self, other: &Self) -> Ordering {
        self.op_name()
            .cmp(other.op_name())
            .then_with(|| self.sort_key().cmp(&other.sort_key()))
    }
}

/// Sort a list of operators into the canonical deterministic application
/// order: `op` ascending, then parameter tuple ascending.
pub fn canonical_order(operators: &mut [Operator]) {
    operators.sort();
}

#[cfg(test)]
mod tests {
    use super::{Operator, canonical_order};

    #[test]
    fn canonical_order_sorts_by_op_name_then_params() {
        let mut ops = vec![
            Operator::TargetedRemoval { count: 2 },
            Operator::StaxTax {
                by_turn: 5,
                inflation_factor: 1.1,
            },
            Operator::BoardWipe {
                by_turn: 4,
                surviving_engine_fraction: 0.5,
            },
            Operator::GraveyardHateWindow {
                turns: 2,
                graveyard_penalty: 0.8,
            },
            Operator::TargetedRemoval { count: 1 },
        ];
        canonical_order(&mut ops);
        let names: Vec<&str> = ops.iter().map(Operator::op_name).collect();
        assert_eq!(
            names,
            vec![
                "BOARD_WIPE",
                "GRAVEYARD_HATE_WINDOW",
                "STAX_TAX",
                "TARGETED_REMOVAL",
                "TARGETED_REMOVAL",
            ]
        );
        // Within TARGETED_REMOVAL, count=1 precedes count=2.
        match &ops[3] {
            Operator::TargetedRemoval { count } => assert_eq!(*count, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn k_stage_vs_probability_stage_classification() {
        assert!(Operator::TargetedRemoval { count: 1 }.is_k_stage());
        assert!(
            Operator::BoardWipe {
                by_turn: 4,
                surviving_engine_fraction: 0.5
            }
            .is_k_stage()
        );
        assert!(
            Operator::GraveyardHateWindow {
                turns: 1,
                graveyard_penalty: 0.9
            }
            .is_k_stage()
        );
        assert!(
            !Operator::StaxTax {
                by_turn: 4,
                inflation_factor: 1.2
            }
            .is_k_stage()
        );
    }

    #[test]
    fn serde_tag_matches_wire_names() {
        let op = Operator::TargetedRemoval { count: 3 };
        let value = serde_json::to_value(op).unwrap();
        assert_eq!(value["op"], "TARGETED_REMOVAL");
        assert_eq!(value["count"], 3);
    }
}
