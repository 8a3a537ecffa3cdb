//! `BuildResult`: the single top-level artifact a pipeline run produces.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::layer::VerdictStatus;

/// Per-layer readiness flag map keyed by layer name (spec §3's
/// `available_panels_v1`).
pub type AvailablePanels = BTreeMap<String, bool>;

/// Per-layer compiled version pin map, keyed as `"<layer_name>_version"`.
pub type PipelineVersions = BTreeMap<String, String>;

/// The full, content-hashable pipeline output. `result` holds each layer's
/// serialized payload keyed by layer name; using a `BTreeMap<String, Value>`
/// rather than a struct keeps key ordering canonical for free and lets
/// `driver` assemble heterogeneous layer bodies without a shared supertype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResult {
    pub engine_version: String,
    pub ruleset_version: String,
    pub db_snapshot_id: String,
    pub profile_id: String,
    pub bracket_id: String,
    pub status: VerdictStatus,
    pub build_hash_v1: String,
    /// Always `None`: graph-based combo detection is out of scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_hash_v2: Option<String>,
    pub unknowns: Vec<String>,
    pub result: BuildResultBody,
}

/// The `result` object: panel readiness, version pins, and the 13 layer
/// payloads, each stored pre-serialized as `serde_json::Value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResultBody {
    pub available_panels_v1: AvailablePanels,
    pub pipeline_versions: PipelineVersions,
    #[serde(flatten)]
    pub layers: BTreeMap<String, serde_json::Value>,
}

impl BuildResult {
    /// Collect every `codes` entry across all layer payloads whose prefix is
    /// `UNKNOWN`, sorted and deduplicated (spec §3's `unknowns[]`).
    #[must_use]
    pub fn collect_unknowns(layers: &BTreeMap<String, serde_json::Value>) -> Vec<String> {
        let mut unknowns: BTreeSet<String> = BTreeSet::new();
        for payload in layers.values() {
            let Some(codes) = payload.get("codes").and_then(serde_json::Value::as_array) else {
                continue;
            };
            for code in codes {
                if let Some(code) = code.as_str() {
                    if code.starts_with("UNKNOWN") {
                        unknowns.insert(code.to_string());
                    }
                }
            }
        }
        unknowns.into_iter().collect()
    }

    /// Readiness flag map derived from each layer's `status` field
    /// (`{OK, WARN}` => true, per spec §4.12's readiness gate).
    #[must_use]
    pub fn available_panels(layers: &BTreeMap<String, serde_json::Value>) -> AvailablePanels {
        layers
            .iter()
            .map(|(name, payload)| {
                let ready = matches!(
                    payload.get("status").and_then(serde_json::Value::as_str),
                    Some("OK" | "WARN")
                );
                (name.clone(), ready)
            })
            .collect()
    }
}
