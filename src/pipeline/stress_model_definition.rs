//! Layer 8 — `StressModelDefinition`: select and canonically order an
//! operator sequence via profile/bracket/override precedence.

use serde::{Deserialize, Serialize};

use crate::model::layer::{LayerEnvelope, LayerStatus};
use crate::model::operator::{canonical_order, Operator};
use crate::packs::stress_models::StressModelsPack;
use crate::packs::PackLoadOutcome;

/// Compiled version pin for this layer's payload shape.
pub const VERSION: &str = "stress_model_definition_v1";

/// This layer's body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub format_id: String,
    pub selected_model_id: String,
    pub operators: Vec<Operator>,
}

fn skip(format_id: &str, reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Skip,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            format_id: format_id.to_string(),
            selected_model_id: String::new(),
            operators: vec![],
        },
    )
}

fn error(format_id: &str, reason: &str) -> LayerEnvelope<Body> {
    LayerEnvelope::new(
        VERSION,
        LayerStatus::Error,
        Some(reason.to_string()),
        vec![reason.to_string()],
        Body {
            format_id: format_id.to_string(),
            selected_model_id: String::new(),
            operators: vec![],
        },
    )
}

/// Run `StressModelDefinition`.
#[must_use]
pub fn run(
    format_id: &str,
    profile_id: &str,
    bracket_id: &str,
    request_override_model_id: Option<&str>,
    pack: &PackLoadOutcome<StressModelsPack>,
) -> LayerEnvelope<Body> {
    let PackLoadOutcome::Loaded(pack) = pack else {
        return skip(format_id, "STRESS_MODELS_UNAVAILABLE");
    };
    let Some(defaults) = pack.format_defaults.get(format_id) else {
        return skip(format_id, "FORMAT_STRESS_MODELS_UNAVAILABLE");
    };

    let (selected_model_id, override_unknown) =
        defaults
            .selection
            .resolve(&defaults.models, request_override_model_id, profile_id, bracket_id);

    let Some(model) = defaults.models.get(&selected_model_id) else {
        return error(format_id, "STRESS_MODEL_ID_NOT_FOUND");
    };

    let mut operators = model.operators.clone();
    canonical_order(&mut operators);

    let codes = if override_unknown {
        vec!["STRESS_MODEL_OVERRIDE_UNKNOWN".to_string()]
    } else {
        vec![]
    };
    let status = if override_unknown { LayerStatus::Warn } else { LayerStatus::Ok };

    LayerEnvelope::new(
        VERSION,
        status,
        None,
        codes,
        Body {
            format_id: format_id.to_string(),
            selected_model_id,
            operators,
        },
    )
}
