#![forbid(unsafe_code)]

//! `deck_sufficiency_pipeline` — a deterministic, content-hashed sufficiency
//! pipeline for 99-card singleton decks.
//!
//! Thirteen layers run bottom-up (`pipeline::driver::run_pipeline`) from
//! requirement detection through hypergeometric probability, stress
//! modeling, resilience, and a final PASS/WARN/FAIL verdict. Every layer
//! consumes curated, hash-verified data packs (`packs`) and emits one
//! `LayerEnvelope` (`model::layer`); the assembled `BuildResult`
//! (`model::build_result`) is canonical-JSON-hashable and byte-deterministic
//! for a given input.

pub mod core;
pub mod logger;
pub mod model;
pub mod packs;
pub mod pipeline;

pub mod prelude;
