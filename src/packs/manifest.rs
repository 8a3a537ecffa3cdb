//! The curated pack manifest: `manifest_v1.json`, an ordered list of
//! `{pack_id, pack_version, path, sha256, load_order, created_by}` entries
//! that pin exactly which on-disk file backs each data pack.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DspError, Result};
use crate::core::hashing::{is_valid_sha256_hex, sha256_hex};

/// One curated-manifest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub pack_id: String,
    pub pack_version: String,
    pub path: String,
    pub sha256: String,
    pub load_order: u32,
    pub created_by: String,
}

impl ManifestEntry {
    fn sort_key(&self) -> (u32, &str, &str, &str, &str, &str) {
        (
            self.load_order,
            self.pack_id.as_str(),
            self.pack_version.as_str(),
            self.path.as_str(),
            self.sha256.as_str(),
            self.created_by.as_str(),
        )
    }
}

/// The parsed, validated curated manifest.
#[derive(Debug, Clone, Default)]
pub struct PackManifest {
    entries: Vec<ManifestEntry>,
}

impl PackManifest {
    /// Load and validate a manifest file at `manifest_path`.
    ///
    /// # Errors
    /// `DspError::Io` if the file cannot be read, `DspError::Serialization`
    /// if it is not valid JSON, `DspError::ManifestMalformed` for an unsafe
    /// path or invalid sha256 string, `DspError::ManifestDuplicateEntry` for
    /// a repeated `(pack_id, pack_version)` pair.
    pub fn load(manifest_path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(manifest_path)
            .map_err(|source| DspError::io(manifest_path.to_path_buf(), source))?;
        let entries: Vec<ManifestEntry> = serde_json::from_str(&raw)?;
        Self::from_entries(entries)
    }

    /// Build a manifest from already-parsed entries, applying the same
    /// validation `load` does. Exposed for tests and embedders that source
    /// the manifest from somewhere other than a file.
    ///
    /// # Errors
    /// See [`PackManifest::load`].
    pub fn from_entries(entries: Vec<ManifestEntry>) -> Result<Self> {
        let mut seen = std::collections::BTreeSet::new();
        for entry in &entries {
            validate_relative_path(&entry.path)?;
            if !is_valid_sha256_hex(&entry.sha256) {
                return Err(DspError::ManifestMalformed {
                    details: format!("entry {}@{} has invalid sha256", entry.pack_id, entry.pack_version),
                });
            }
            let key = (entry.pack_id.clone(), entry.pack_version.clone());
            if !seen.insert(key) {
                return Err(DspError::ManifestDuplicateEntry {
                    pack_id: entry.pack_id.clone(),
                    pack_version: entry.pack_version.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Resolve the candidate entry for `pack_id`, optionally pinned to an
    /// exact `pack_version`. Returns the lexicographically-last candidate
    /// under `(load_order, pack_id, pack_version, path, sha256, created_by)`.
    #[must_use]
    pub fn resolve_pack_entry(&self, pack_id: &str, pack_version: Option<&str>) -> Option<&ManifestEntry> {
        self.entries
            .iter()
            .filter(|e| e.pack_id == pack_id)
            .filter(|e| pack_version.is_none_or(|v| e.pack_version == v))
            .max_by(|a, b| a.sort_key().cmp(&b.sort_key()))
    }

    /// Verify the on-disk SHA-256 of every entry against `packs_dir`,
    /// returning the first mismatch as an error.
    ///
    /// # Errors
    /// `DspError::PackHashMismatch` on the first digest mismatch found, or
    /// an IO error if a referenced file cannot be read.
    pub fn verify_all(&self, packs_dir: &Path) -> Result<()> {
        for entry in &self.entries {
            let full_path = packs_dir.join(&entry.path);
            let bytes = fs::read(&full_path).map_err(|source| DspError::io(full_path.clone(), source))?;
            let actual = sha256_hex(&bytes);
            if actual != entry.sha256 {
                return Err(DspError::PackHashMismatch {
                    pack_id: entry.pack_id.clone(),
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Resolve `pack_id` to its absolute on-disk path under `packs_dir`,
    /// verifying the SHA-256 of that single file.
    ///
    /// # Errors
    /// `DspError::PackHashMismatch` on digest mismatch, `DspError::Io` if
    /// unreadable. Returns `Ok(None)` when no manifest entry resolves.
    pub fn resolve_and_verify(&self, packs_dir: &Path, pack_id: &str) -> Result<Option<PathBuf>> {
        let Some(entry) = self.resolve_pack_entry(pack_id, None) else {
            return Ok(None);
        };
        let full_path = packs_dir.join(&entry.path);
        let bytes = match fs::read(&full_path) {
            Ok(bytes) => bytes,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DspError::io(full_path, source)),
        };
        let actual = sha256_hex(&bytes);
        if actual != entry.sha256 {
            return Err(DspError::PackHashMismatch {
                pack_id: entry.pack_id.clone(),
                expected: entry.sha256.clone(),
                actual,
            });
        }
        Ok(Some(full_path))
    }

    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }
}

fn validate_relative_path(path: &str) -> Result<()> {
    let as_path = Path::new(path);
    if as_path.is_absolute() || path.split('/').any(|segment| segment == "..") {
        return Err(DspError::ManifestUnsafePath {
            path: path.to_string(),
        });
    }
    Ok(())
}
