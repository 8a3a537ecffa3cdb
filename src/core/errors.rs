//! DSP-prefixed host error taxonomy with structured error codes.
//!
//! These are *host* failures — they prevent producing any `BuildResult` at
//! all (manifest corruption, unreadable pack file, hash mismatch, CLI
//! argument errors). They are distinct from the per-layer SKIP/WARN/ERROR
//! vocabulary carried inside a successfully-produced payload (see
//! `model::layer::Status`): once pack loading completes, the pipeline always
//! returns a full `BuildResult`, even when individual packs are missing.

#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, DspError>;

/// Top-level host error type for the deck sufficiency pipeline.
#[derive(Debug, Error)]
pub enum DspError {
    #[error("[DSP-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[DSP-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[DSP-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[DSP-2001] curated manifest malformed: {details}")]
    ManifestMalformed { details: String },

    #[error("[DSP-2002] curated manifest path unsafe: {path}")]
    ManifestUnsafePath { path: String },

    #[error("[DSP-2003] curated manifest has duplicate entry for {pack_id}@{pack_version}")]
    ManifestDuplicateEntry {
        pack_id: String,
        pack_version: String,
    },

    #[error("[DSP-2004] pack {pack_id} sha256 mismatch: expected {expected}, found {actual}")]
    PackHashMismatch {
        pack_id: String,
        expected: String,
        actual: String,
    },

    #[error("[DSP-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[DSP-3001] permission denied for {path}")]
    PermissionDenied { path: PathBuf },

    #[error("[DSP-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[DSP-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl DspError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "DSP-1001",
            Self::MissingConfig { .. } => "DSP-1002",
            Self::ConfigParse { .. } => "DSP-1003",
            Self::ManifestMalformed { .. } => "DSP-2001",
            Self::ManifestUnsafePath { .. } => "DSP-2002",
            Self::ManifestDuplicateEntry { .. } => "DSP-2003",
            Self::PackHashMismatch { .. } => "DSP-2004",
            Self::Serialization { .. } => "DSP-2101",
            Self::PermissionDenied { .. } => "DSP-3001",
            Self::Io { .. } => "DSP-3002",
            Self::Runtime { .. } => "DSP-3900",
        }
    }

    /// Whether retrying might resolve the failure (transient IO, never a
    /// structural/data problem).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Runtime { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for DspError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for DspError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<DspError> {
        vec![
            DspError::InvalidConfig {
                details: String::new(),
            },
            DspError::MissingConfig {
                path: PathBuf::new(),
            },
            DspError::ConfigParse {
                context: "",
                details: String::new(),
            },
            DspError::ManifestMalformed {
                details: String::new(),
            },
            DspError::ManifestUnsafePath {
                path: String::new(),
            },
            DspError::ManifestDuplicateEntry {
                pack_id: String::new(),
                pack_version: String::new(),
            },
            DspError::PackHashMismatch {
                pack_id: String::new(),
                expected: String::new(),
                actual: String::new(),
            },
            DspError::Serialization {
                context: "",
                details: String::new(),
            },
            DspError::PermissionDenied {
                path: PathBuf::new(),
            },
            DspError::Io {
                path: PathBuf::new(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "test"),
            },
            DspError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let codes: Vec<&str> = all_variants().iter().map(DspError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_dsp_prefix() {
        for err in all_variants() {
            assert!(
                err.code().starts_with("DSP-"),
                "code {} must start with DSP-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = DspError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DSP-1001"));
        assert!(msg.contains("bad value"));
    }

    #[test]
    fn retryable_errors_are_correct() {
        assert!(
            DspError::Io {
                path: PathBuf::new(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "test"),
            }
            .is_retryable()
        );
        assert!(
            DspError::Runtime {
                details: String::new()
            }
            .is_retryable()
        );
        assert!(
            !DspError::InvalidConfig {
                details: String::new()
            }
            .is_retryable()
        );
        assert!(
            !DspError::PackHashMismatch {
                pack_id: String::new(),
                expected: String::new(),
                actual: String::new(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn io_convenience_constructor() {
        let err = DspError::io(
            "/tmp/test.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "DSP-3002");
        assert!(err.to_string().contains("/tmp/test.txt"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: DspError = json_err.into();
        assert_eq!(err.code(), "DSP-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: DspError = toml_err.into();
        assert_eq!(err.code(), "DSP-1003");
    }
}
