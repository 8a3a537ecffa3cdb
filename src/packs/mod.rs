//! Data-pack loading: the curated manifest plus the eight typed pack
//! loaders layers consume read-only.

pub mod bucket_substitutions;
pub mod combo_variants;
pub mod dependency_signatures;
pub mod manifest;
pub mod mulligan_assumptions;
pub mod profile_thresholds;
pub mod stress_models;
pub mod weight_rules;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::core::errors::{DspError, Result};
use crate::core::hashing::sha256_hex;
use manifest::PackManifest;

/// Non-fatal outcome of attempting to load one data pack. Only manifest-
/// level integrity violations (malformed manifest structure, duplicate
/// entries) are host errors; everything else a layer can see and translate
/// into its own documented SKIP reason code.
#[derive(Debug, Clone, PartialEq)]
pub enum PackLoadOutcome<T> {
    Loaded(T),
    Missing,
    VersionMismatch { expected: String, found: String },
    HashMismatch { expected: String, actual: String },
    Invalid { details: String },
}

impl<T> PackLoadOutcome<T> {
    #[must_use]
    pub fn loaded(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Implemented by every pack body type so the generic loader can check the
/// mandatory `version` field without per-pack boilerplate.
pub trait VersionedPack {
    fn version(&self) -> &str;
}

/// Resolve `pack_id` through `manifest`, read it from `packs_dir`, verify its
/// pinned SHA-256, parse it as JSON, and check its `version` field.
///
/// # Errors
/// Only for genuine IO failure reading a file the manifest says should
/// exist (permission errors, not-found is folded into `Missing`).
pub fn load_pack_json<T>(
    packs_dir: &Path,
    manifest: &PackManifest,
    pack_id: &str,
    expected_version: &str,
) -> Result<PackLoadOutcome<T>>
where
    T: DeserializeOwned + VersionedPack,
{
    let Some(entry) = manifest.resolve_pack_entry(pack_id, None) else {
        return Ok(PackLoadOutcome::Missing);
    };
    let full_path = packs_dir.join(&entry.path);
    let bytes = match fs::read(&full_path) {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(PackLoadOutcome::Missing),
        Err(source) => return Err(DspError::io(full_path, source)),
    };
    let actual_sha = sha256_hex(&bytes);
    if actual_sha != entry.sha256 {
        return Ok(PackLoadOutcome::HashMismatch {
            expected: entry.sha256.clone(),
            actual: actual_sha,
        });
    }
    let text = String::from_utf8_lossy(&bytes);
    match serde_json::from_str::<T>(&text) {
        Ok(pack) if pack.version() == expected_version => Ok(PackLoadOutcome::Loaded(pack)),
        Ok(pack) => Ok(PackLoadOutcome::VersionMismatch {
            expected: expected_version.to_string(),
            found: pack.version().to_string(),
        }),
        Err(source) => Ok(PackLoadOutcome::Invalid {
            details: source.to_string(),
        }),
    }
}
