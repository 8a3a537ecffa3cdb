//! `LayerPayload` envelope: the `{version, status, reason_code?, codes, …body}`
//! shape every layer emits exactly one of (spec §3).

use serde::{Deserialize, Serialize};

/// Closed per-layer verdict vocabulary (spec §3/§7). Distinct from
/// [`VerdictStatus`], which is used only by `SufficiencySummary`'s six
/// domain verdicts and its aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayerStatus {
    Ok,
    Warn,
    Skip,
    Error,
}

/// Closed verdict vocabulary used by `SufficiencySummary`'s domains and its
/// aggregate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    Pass,
    Warn,
    Fail,
    Skip,
}

/// Generic layer output envelope. `B` carries the layer-specific body
/// fields, flattened alongside `version`/`status`/`reason_code`/`codes` so
/// the serialized shape matches spec §3's `LayerPayload` exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerEnvelope<B> {
    pub version: String,
    pub status: LayerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    pub codes: Vec<String>,
    #[serde(flatten)]
    pub body: B,
}

impl<B> LayerEnvelope<B> {
    /// Build an envelope, normalizing `codes` to the closed-set contract:
    /// sorted ascending, deduplicated.
    pub fn new(
        version: impl Into<String>,
        status: LayerStatus,
        reason_code: Option<String>,
        mut codes: Vec<String>,
        body: B,
    ) -> Self {
        codes.sort();
        codes.dedup();
        Self {
            version: version.into(),
            status,
            reason_code,
            codes,
            body,
        }
    }

    /// Whether this layer's output is usable by downstream layers
    /// (`{OK, WARN}` per spec §4.12's readiness gate).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.status, LayerStatus::Ok | LayerStatus::Warn)
    }
}
