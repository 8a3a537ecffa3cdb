//! Shared domain types consumed and produced across pipeline layers.

pub mod bucket;
pub mod build_result;
pub mod layer;
pub mod operator;
pub mod primitive_index;

/// Closed set of commander-dependency classes (glossary: `commander_dependent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommanderDependent {
    Low,
    Medium,
    High,
    Unknown,
}

/// Canonical layer names, in dependency/declaration order. Driven the same
/// order `pipeline::driver` executes layers in and the key set of
/// `result.pipeline_versions`.
pub const LAYER_NAMES: [&str; 13] = [
    "requirement_detection",
    "coherence",
    "mulligan_model",
    "substitution_engine",
    "weight_multiplier",
    "probability_math_core",
    "probability_checkpoint",
    "stress_model_definition",
    "stress_transform",
    "resilience_math",
    "commander_reliability",
    "sufficiency_summary",
    "combo_pack",
];
