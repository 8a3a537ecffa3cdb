//! Top-level CLI definition and dispatch.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use serde_json::json;
use thiserror::Error;

use deck_sufficiency_pipeline::core::config::Config;
use deck_sufficiency_pipeline::core::errors::DspError;
use deck_sufficiency_pipeline::core::hashing::canonical_json;
use deck_sufficiency_pipeline::core::paths;
use deck_sufficiency_pipeline::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use deck_sufficiency_pipeline::model::primitive_index::PrimitiveIndex;
use deck_sufficiency_pipeline::packs::combo_variants::{
    TwoCardCombosPack, TWO_CARD_COMBOS_V1_EXPECTED_VERSION, TWO_CARD_COMBOS_V2_EXPECTED_VERSION,
};
use deck_sufficiency_pipeline::packs::manifest::PackManifest;
use deck_sufficiency_pipeline::packs::{load_pack_json, PackLoadOutcome};
use deck_sufficiency_pipeline::pipeline::combo_pack::{detect_two_card_combos, MAX_MATCHES};
use deck_sufficiency_pipeline::pipeline::driver::{run_pipeline, RunRequest};

/// Deterministic sufficiency pipeline for 99-card singleton decks.
#[derive(Debug, Parser)]
#[command(
    name = "deckcheck",
    author,
    version,
    about = "Deck sufficiency pipeline: requirement detection through hypergeometric probability, stress modeling, and a PASS/WARN/FAIL verdict.",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Increase run-log verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (run-log errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the pipeline once and print the resulting `BuildResult`.
    Run(RunArgs),
    /// Validate the curated manifest and every referenced pack's SHA-256.
    VerifyManifest(VerifyManifestArgs),
    /// Run `ComboPack` standalone against a decklist's card keys.
    ComboLookup(ComboLookupArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Scoring profile id (overrides config).
    #[arg(long, value_name = "ID")]
    profile: Option<String>,
    /// Power bracket id (overrides config).
    #[arg(long, value_name = "ID")]
    bracket: Option<String>,
    /// Format id (overrides config).
    #[arg(long, value_name = "ID")]
    format: Option<String>,
    /// Path to a compiled `PrimitiveIndex` JSON file for the deck under test.
    #[arg(long, value_name = "PATH")]
    primitive_index: Option<PathBuf>,
    /// Force a specific stress model id (overrides profile/bracket selection).
    #[arg(long, value_name = "ID")]
    stress_override: Option<String>,
    /// Slot id of the commander card, when the deck has one.
    #[arg(long, value_name = "ID")]
    commander_slot: Option<String>,
    /// Path to a JSON array of card keys present in the deck, for `ComboPack`.
    #[arg(long, value_name = "PATH")]
    decklist: Option<PathBuf>,
    /// Curated manifest path (overrides config).
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,
    /// Data-pack directory (overrides config).
    #[arg(long, value_name = "PATH")]
    packs_dir: Option<PathBuf>,
    /// Host identity for the card database snapshot backing the primitive index.
    #[arg(long, value_name = "ID", default_value = "local")]
    db_snapshot_id: String,
    /// Pretty-print the output (does not change `build_hash_v1`).
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Args)]
struct VerifyManifestArgs {
    /// Curated manifest path (overrides config).
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,
    /// Data-pack directory (overrides config).
    #[arg(long, value_name = "PATH")]
    packs_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ComboLookupArgs {
    /// Path to a JSON array of card keys present in the deck.
    #[arg(value_name = "PATH")]
    decklist: PathBuf,
    /// Maximum number of matches to report.
    #[arg(long, default_value_t = MAX_MATCHES, value_name = "N")]
    max_matches: usize,
    /// Curated manifest path (overrides config).
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,
    /// Data-pack directory (overrides config).
    #[arg(long, value_name = "PATH")]
    packs_dir: Option<PathBuf>,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input (bad path, malformed file, bad argument combination).
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure (IO, config, pack loading).
    #[error("{0}")]
    Runtime(String),
    /// Manifest or pack verification failed.
    #[error("{0}")]
    Verification(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Verification(_) => 3,
            Self::Json(_) => 4,
        }
    }
}

fn from_dsp(e: DspError) -> CliError {
    CliError::Runtime(e.to_string())
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Run(args) => run_run(cli, args),
        Command::VerifyManifest(args) => run_verify_manifest(cli, args),
        Command::ComboLookup(args) => run_combo_lookup(cli, args),
    }
}

fn log_config(config: &Config) -> JsonlConfig {
    let mut log_cfg = JsonlConfig::default();
    if let Some(path) = &config.logging.path {
        log_cfg.path = path.clone();
    }
    log_cfg
}

fn severity_gate(cli: &Cli, config: &Config, severity: Severity) -> bool {
    let quiet = cli.quiet || config.logging.quiet;
    let verbose = cli.verbose || config.logging.verbose;
    match severity {
        Severity::Critical => true,
        Severity::Warning => !quiet,
        Severity::Info => verbose && !quiet,
    }
}

fn log_if(logger: &mut JsonlWriter, cli: &Cli, config: &Config, entry: LogEntry) {
    if severity_gate(cli, config, entry.severity) {
        logger.write_entry(&entry);
    }
}

fn load_primitive_index(path: &PathBuf) -> Result<PrimitiveIndex, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| CliError::User(format!("failed to read primitive index {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| CliError::User(format!("failed to parse primitive index {}: {e}", path.display())))
}

fn load_deck_card_keys(path: &PathBuf) -> Result<BTreeSet<String>, CliError> {
    let raw =
        fs::read_to_string(path).map_err(|e| CliError::User(format!("failed to read decklist {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| CliError::User(format!("failed to parse decklist {}: {e}", path.display())))
}

fn run_run(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref()).map_err(from_dsp)?;
    if let Some(v) = &args.profile {
        config.pipeline.profile_id = v.clone();
    }
    if let Some(v) = &args.bracket {
        config.pipeline.bracket_id = v.clone();
    }
    if let Some(v) = &args.format {
        config.pipeline.format_id = v.clone();
    }
    if let Some(v) = &args.stress_override {
        config.pipeline.stress_override_model_id = Some(v.clone());
    }
    if let Some(v) = &args.commander_slot {
        config.pipeline.commander_slot_id = Some(v.clone());
    }
    if let Some(v) = &args.manifest {
        config.packs.manifest_path = v.clone();
    }
    if let Some(v) = &args.packs_dir {
        config.packs.packs_dir = v.clone();
    }

    let mut logger = JsonlWriter::open(log_config(&config));

    let mut start_entry = LogEntry::new(EventType::RunStart, Severity::Info);
    start_entry.profile_id = Some(config.pipeline.profile_id.clone());
    start_entry.bracket_id = Some(config.pipeline.bracket_id.clone());
    log_if(&mut logger, cli, &config, start_entry);

    let primitive_index = args.primitive_index.as_ref().map(load_primitive_index).transpose()?;
    let deck_card_keys = args.decklist.as_ref().map(load_deck_card_keys).transpose()?;

    let request = RunRequest {
        primitive_index: primitive_index.as_ref(),
        deck_card_keys: deck_card_keys.as_ref(),
        profile_id: config.pipeline.profile_id.clone(),
        bracket_id: config.pipeline.bracket_id.clone(),
        format_id: config.pipeline.format_id.clone(),
        stress_override_model_id: config.pipeline.stress_override_model_id.clone(),
        db_snapshot_id: args.db_snapshot_id.clone(),
    };

    let started = Instant::now();
    let outcome = run_pipeline(&config.packs.packs_dir, &config.packs.manifest_path, &request);

    match &outcome {
        Ok(result) => {
            for (layer, ready) in &result.result.available_panels_v1 {
                let mut entry = LogEntry::new(EventType::LayerStatus, Severity::Info);
                entry.layer = Some(layer.clone());
                entry.status = Some(if *ready { "OK".to_string() } else { "SKIP".to_string() });
                log_if(&mut logger, cli, &config, entry);
            }
            let mut end_entry = LogEntry::new(EventType::RunEnd, Severity::Info);
            end_entry.profile_id = Some(config.pipeline.profile_id.clone());
            end_entry.bracket_id = Some(config.pipeline.bracket_id.clone());
            end_entry.build_hash_v1 = Some(result.build_hash_v1.clone());
            end_entry.status = Some(format!("{:?}", result.status).to_uppercase());
            end_entry.duration_ms = Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
            log_if(&mut logger, cli, &config, end_entry);
        }
        Err(e) => {
            let mut entry = LogEntry::new(EventType::Error, Severity::Critical);
            entry.error_code = Some(e.code().to_string());
            entry.error_message = Some(e.to_string());
            log_if(&mut logger, cli, &config, entry);
        }
    }
    logger.flush();

    let result = outcome.map_err(from_dsp)?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        canonical_json(&result).map_err(from_dsp)?
    };
    writeln!(io::stdout(), "{rendered}")?;
    Ok(())
}

fn run_verify_manifest(cli: &Cli, args: &VerifyManifestArgs) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref()).map_err(from_dsp)?;
    if let Some(v) = &args.manifest {
        config.packs.manifest_path = v.clone();
    }
    if let Some(v) = &args.packs_dir {
        config.packs.packs_dir = v.clone();
    }

    let manifest = PackManifest::load(&config.packs.manifest_path).map_err(from_dsp)?;
    match manifest.verify_all(&config.packs.packs_dir) {
        Ok(()) => {
            let payload = json!({
                "manifest_path": config.packs.manifest_path.to_string_lossy(),
                "packs_dir": config.packs.packs_dir.to_string_lossy(),
                "entries_verified": manifest.entries().len(),
                "ok": true,
            });
            writeln!(io::stdout(), "{}", serde_json::to_string_pretty(&payload)?)?;
            Ok(())
        }
        Err(e) => {
            let payload = json!({
                "manifest_path": config.packs.manifest_path.to_string_lossy(),
                "packs_dir": config.packs.packs_dir.to_string_lossy(),
                "ok": false,
                "error_code": e.code(),
                "error": e.to_string(),
            });
            writeln!(io::stderr(), "{}", serde_json::to_string_pretty(&payload)?)?;
            Err(CliError::Verification(e.to_string()))
        }
    }
}

fn run_combo_lookup(cli: &Cli, args: &ComboLookupArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref()).map_err(from_dsp)?;
    let packs_dir = args.packs_dir.clone().unwrap_or(config.packs.packs_dir);
    let manifest_path = args.manifest.clone().unwrap_or(config.packs.manifest_path);

    let manifest = PackManifest::load(&manifest_path).map_err(from_dsp)?;
    let deck_card_keys = load_deck_card_keys(&args.decklist)?;

    let combos_v2: PackLoadOutcome<TwoCardCombosPack> = load_pack_json(
        &packs_dir,
        &manifest,
        paths::PACK_TWO_CARD_COMBOS_V2,
        TWO_CARD_COMBOS_V2_EXPECTED_VERSION,
    )
    .map_err(from_dsp)?;
    let combos_outcome = match combos_v2 {
        PackLoadOutcome::Missing => load_pack_json(
            &packs_dir,
            &manifest,
            paths::PACK_TWO_CARD_COMBOS_V1,
            TWO_CARD_COMBOS_V1_EXPECTED_VERSION,
        )
        .map_err(from_dsp)?,
        other => other,
    };

    let PackLoadOutcome::Loaded(combos_pack) = combos_outcome else {
        return Err(CliError::Runtime(
            "two_card_combos pack unavailable in configured packs directory".to_string(),
        ));
    };

    let (matches, truncated) = detect_two_card_combos(&combos_pack.combos, &deck_card_keys, args.max_matches);
    let payload = json!({
        "two_card_combos_version": combos_pack.version,
        "matches": matches,
        "truncated": truncated,
    });
    writeln!(io::stdout(), "{}", serde_json::to_string_pretty(&payload)?)?;
    Ok(())
}
