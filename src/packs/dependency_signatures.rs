//! `dependency_signatures_v1`: requirement-flag evaluation rules.
//!
//! The upstream schema for this pack is not fully specified; this loader
//! preserves the documented contract (a mapping from requirement flag name
//! to a pattern over primitive presence/absence) without inventing
//! primitive ids of its own — every primitive referenced in a pattern is
//! only ever compared against ids already present in the compiled
//! `PrimitiveIndex`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::VersionedPack;

/// Expected `version` field value for this pack.
pub const EXPECTED_VERSION: &str = "dependency_signatures_v1";

/// A pattern over primitive presence/absence gating one requirement flag.
/// `any_of`/`all_of`/`none_of` are each optional; an entry with none of the
/// three set is treated as not-yet-realized (spec §4.1's "unimplemented"
/// evaluator case).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignaturePattern {
    pub any_of: Vec<String>,
    pub all_of: Vec<String>,
    pub none_of: Vec<String>,
}

impl SignaturePattern {
    /// Whether this pattern has at least one realized condition.
    #[must_use]
    pub fn is_realized(&self) -> bool {
        !self.any_of.is_empty() || !self.all_of.is_empty() || !self.none_of.is_empty()
    }

    /// Evaluate this pattern against the set of primitives present anywhere
    /// in the compiled deck.
    #[must_use]
    pub fn evaluate(&self, present_primitives: &std::collections::BTreeSet<String>) -> bool {
        let any_ok = self.any_of.is_empty() || self.any_of.iter().any(|p| present_primitives.contains(p));
        let all_ok = self.all_of.iter().all(|p| present_primitives.contains(p));
        let none_ok = self.none_of.iter().all(|p| !present_primitives.contains(p));
        any_ok && all_ok && none_ok
    }

    /// Every primitive id this pattern references, for upstream-vocabulary
    /// cross-checks.
    #[must_use]
    pub fn referenced_primitives(&self) -> Vec<&str> {
        self.any_of
            .iter()
            .chain(self.all_of.iter())
            .chain(self.none_of.iter())
            .map(String::as_str)
            .collect()
    }
}

/// The full pack: requirement flag name -> pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencySignaturesPack {
    pub version: String,
    pub requirement_flags: BTreeMap<String, SignaturePattern>,
}

impl VersionedPack for DependencySignaturesPack {
    fn version(&self) -> &str {
        &self.version
    }
}
