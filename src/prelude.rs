//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use deck_sufficiency_pipeline::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{DspError, Result};
pub use crate::core::{CHECKPOINTS, DECK_SIZE};

// Model
pub use crate::model::build_result::BuildResult;
pub use crate::model::layer::{LayerEnvelope, LayerStatus, VerdictStatus};
pub use crate::model::primitive_index::PrimitiveIndex;
pub use crate::model::{CommanderDependent, LAYER_NAMES};

// Packs
pub use crate::packs::manifest::PackManifest;
pub use crate::packs::PackLoadOutcome;

// Pipeline
pub use crate::pipeline::driver::{run_pipeline, RunRequest};
