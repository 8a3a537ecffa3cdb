//! Configuration system: TOML file + env var overrides + smart defaults.
//!
//! Every field here is a *runtime-recognized option* in the sense of spec
//! §9: profile id, bracket id, format identifier, optional stress-model
//! override, optional commander slot id, plus the purely ambient knobs
//! (pack locations, log destination) that select *which* data to run the
//! pipeline against. None of these fields may alter numeric pipeline output
//! — only the data-pack content and primitive index do that.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{DspError, Result};

/// Full configuration model for the `deckcheck` CLI and embedding hosts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub packs: PacksConfig,
    pub logging: LoggingConfig,
}

/// Profile/bracket/format selection and optional overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub profile_id: String,
    pub bracket_id: String,
    pub format_id: String,
    pub stress_override_model_id: Option<String>,
    pub commander_slot_id: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            profile_id: "focused".to_string(),
            bracket_id: "B2".to_string(),
            format_id: "commander".to_string(),
            stress_override_model_id: None,
            commander_slot_id: None,
        }
    }
}

/// Data-pack and curated-manifest locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PacksConfig {
    pub packs_dir: PathBuf,
    pub manifest_path: PathBuf,
}

impl Default for PacksConfig {
    fn default() -> Self {
        Self {
            packs_dir: PathBuf::from("packs"),
            manifest_path: PathBuf::from(crate::core::paths::DEFAULT_MANIFEST_PATH),
        }
    }
}

/// JSONL run-log destination and verbosity. Never affects pipeline payload
/// output — see `logger::jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub path: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            path: None,
            quiet: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Default configuration path: `~/.config/deckcheck/config.toml`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home = env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
        home.join(".config").join("deckcheck").join("config.toml")
    }

    /// Load config from an explicit path, `DSP_CONFIG`, or the default path,
    /// then apply env-var overrides.
    ///
    /// Missing config file is not an error when resolved from the default
    /// path or `DSP_CONFIG`-absent case; defaults are used. An explicitly
    /// requested path (CLI `--config` or `DSP_CONFIG`) that does not exist
    /// is a hard error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_config = if path.is_none() {
            env::var_os("DSP_CONFIG").map(PathBuf::from)
        } else {
            None
        };
        let is_explicit = path.is_some() || env_config.is_some();
        let effective_path = path.map_or_else(
            || env_config.clone().unwrap_or_else(Self::default_path),
            Path::to_path_buf,
        );

        let mut cfg = if effective_path.exists() {
            let raw = fs::read_to_string(&effective_path)
                .map_err(|source| DspError::io(effective_path.clone(), source))?;
            toml::from_str(&raw)?
        } else if is_explicit {
            return Err(DspError::MissingConfig {
                path: effective_path,
            });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| env::var(name).ok());
        Ok(())
    }

    /// Apply overrides from an arbitrary environment accessor. Split out
    /// from `apply_env_overrides` so tests can exercise override precedence
    /// without mutating real process environment (`std::env::set_var` is
    /// `unsafe` as of the 2024 edition, and this crate forbids `unsafe`).
    fn apply_overrides_from(&mut self, getter: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| getter(name).filter(|raw| !raw.trim().is_empty());
        if let Some(v) = get("DSP_PROFILE_ID") {
            self.pipeline.profile_id = v;
        }
        if let Some(v) = get("DSP_BRACKET_ID") {
            self.pipeline.bracket_id = v;
        }
        if let Some(v) = get("DSP_FORMAT_ID") {
            self.pipeline.format_id = v;
        }
        if let Some(v) = get("DSP_STRESS_OVERRIDE_MODEL_ID") {
            self.pipeline.stress_override_model_id = Some(v);
        }
        if let Some(v) = get("DSP_COMMANDER_SLOT_ID") {
            self.pipeline.commander_slot_id = Some(v);
        }
        if let Some(v) = get("DSP_PACKS_DIR") {
            self.packs.packs_dir = PathBuf::from(v);
        }
        if let Some(v) = get("DSP_MANIFEST_PATH") {
            self.packs.manifest_path = PathBuf::from(v);
        }
        if let Some(v) = get("DSP_LOG_PATH") {
            self.logging.path = Some(PathBuf::from(v));
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.profile_id.trim().is_empty() {
            return Err(DspError::InvalidConfig {
                details: "pipeline.profile_id must not be empty".to_string(),
            });
        }
        if self.pipeline.bracket_id.trim().is_empty() {
            return Err(DspError::InvalidConfig {
                details: "pipeline.bracket_id must not be empty".to_string(),
            });
        }
        if self.pipeline.format_id.trim().is_empty() {
            return Err(DspError::InvalidConfig {
                details: "pipeline.format_id must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = Config::load(Some(Path::new("/definitely/does/not/exist.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn default_config_has_expected_runtime_options() {
        let cfg = Config::default();
        assert_eq!(cfg.pipeline.profile_id, "focused");
        assert_eq!(cfg.pipeline.bracket_id, "B2");
        assert_eq!(cfg.pipeline.format_id, "commander");
        assert!(cfg.pipeline.stress_override_model_id.is_none());
    }

    #[test]
    fn env_override_wins_over_file_default() {
        let mut cfg = Config::default();
        let mut env: HashMap<&str, &str> = HashMap::new();
        env.insert("DSP_PROFILE_ID", "competitive");
        env.insert("DSP_COMMANDER_SLOT_ID", "slot-7");
        cfg.apply_overrides_from(|name| env.get(name).map(|v| (*v).to_string()));
        assert_eq!(cfg.pipeline.profile_id, "competitive");
        assert_eq!(
            cfg.pipeline.commander_slot_id.as_deref(),
            Some("slot-7")
        );
        assert_eq!(cfg.pipeline.bracket_id, "B2", "unset keys keep defaults");
    }

    #[test]
    fn blank_env_override_is_ignored() {
        let mut cfg = Config::default();
        let mut env: HashMap<&str, &str> = HashMap::new();
        env.insert("DSP_PROFILE_ID", "   ");
        cfg.apply_overrides_from(|name| env.get(name).map(|v| (*v).to_string()));
        assert_eq!(cfg.pipeline.profile_id, "focused");
    }

    #[test]
    fn toml_round_trips_through_serde() {
        let cfg = Config::default();
        let text = toml::to_string(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn validate_rejects_empty_profile_id() {
        let mut cfg = Config::default();
        cfg.pipeline.profile_id = String::new();
        assert!(cfg.validate().is_err());
    }
}
