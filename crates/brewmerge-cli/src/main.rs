mod logging;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use brewmerge_core::storage;
use brewmerge_core::{AppConfig, BeerRecord, CoreError, ExitCode, ScoringMode};
use brewmerge_match::{MatchConfig, MatchError, MergeEngine, NameChange, NameCleaner, explain};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "brewmerge",
    about = "Merge beer listings scraped from several shops into one catalogue",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting BREWMERGE_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// More logging on stderr (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of ~/.config/brewmerge/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge per-source JSON files into one deduplicated list.
    Merge {
        /// Source files, e.g. beers_masoif.json beers_vtub.json.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(short, long, default_value = "merged_beers.json")]
        output: PathBuf,
        #[arg(long)]
        producer_threshold: Option<f64>,
        #[arg(long)]
        name_threshold: Option<f64>,
        #[arg(long, value_enum)]
        scoring: Option<ScoringArg>,
        /// Compare records on a single thread.
        #[arg(long)]
        sequential: bool,
        /// Write compact JSON.
        #[arg(long)]
        compact: bool,
    },

    /// Remove producer prefixes and volume suffixes from beer names.
    Clean {
        input: PathBuf,
        /// Defaults to overwriting the input file.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only show what would change.
        #[arg(long)]
        dry_run: bool,
        /// The input is a merged list rather than a source file.
        #[arg(long)]
        merged: bool,
    },

    /// Explain whether two listings would be merged.
    Compare {
        name_a: String,
        producer_a: String,
        name_b: String,
        producer_b: String,
        #[arg(long)]
        url_a: Option<String>,
        #[arg(long)]
        url_b: Option<String>,
    },

    /// Configuration file management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file location.
    Path,
    /// Write the default configuration to the config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScoringArg {
    Containment,
    Hybrid,
}

impl From<ScoringArg> for ScoringMode {
    fn from(arg: ScoringArg) -> Self {
        match arg {
            ScoringArg::Containment => ScoringMode::Containment,
            ScoringArg::Hybrid => ScoringMode::Hybrid,
        }
    }
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let json_output = cli.json || std::env::var("BREWMERGE_JSON").as_deref() == Ok("1");

    if let Err(err) = run(cli, json_output) {
        let code = exit_code_for(&err);
        if json_output {
            let body = serde_json::json!({
                "status": "error",
                "error": error_kind(code),
                "message": format!("{err:#}"),
            });
            println!("{body:#}");
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(code as i32);
    }
}

fn run(cli: Cli, json_output: bool) -> Result<()> {
    let start = Instant::now();
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)?;

    match cli.command {
        // ── Merge ──────────────────────────────────────────────────────────
        Commands::Merge {
            inputs,
            output,
            producer_threshold,
            name_threshold,
            scoring,
            sequential,
            compact,
        } => {
            if let Some(value) = producer_threshold {
                config.matching.producer_threshold = value;
            }
            if let Some(value) = name_threshold {
                config.matching.name_threshold = value;
            }
            if let Some(mode) = scoring {
                config.matching.scoring = mode.into();
            }
            if sequential {
                config.matching.parallel = false;
            }
            let match_config = MatchConfig::from_settings(&config.matching)?;

            let batches = storage::load_sources(&inputs, &config.output.source_prefix)?;
            let outcome = MergeEngine::new(&match_config).merge(&batches);
            let pretty = config.output.pretty && !compact;
            storage::save_merged(&output, &outcome.records, pretty)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "output": output, "report": outcome.report },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Merged {} sources into {}", batches.len(), output.display());
                for line in outcome.report.summary_lines() {
                    println!("  {line}");
                }
            }
        }

        // ── Clean ──────────────────────────────────────────────────────────
        Commands::Clean {
            input,
            output,
            dry_run,
            merged,
        } => {
            let cleaner = NameCleaner::from_settings(&config.cleaning, &config.matching)?;
            let target = output.unwrap_or_else(|| input.clone());
            let pretty = config.output.pretty;

            let (total, changes) = if merged {
                let records = storage::load_merged(&input)?;
                let outcome = cleaner.clean_merged(&records);
                if !dry_run {
                    storage::save_merged(&target, &outcome.records, pretty)?;
                }
                (records.len(), outcome.changes)
            } else {
                let loaded = storage::load_records(&input)?;
                if loaded.skipped > 0 && !dry_run && target == input {
                    anyhow::bail!(
                        "{}: {} unreadable entries would be dropped; write to another file with --output",
                        input.display(),
                        loaded.skipped
                    );
                }
                let records = loaded.records;
                let outcome = cleaner.clean_records(&records);
                if !dry_run {
                    storage::save_records(&target, &outcome.records, pretty)?;
                }
                (records.len(), outcome.changes)
            };
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "total": total,
                        "cleaned": changes.len(),
                        "dry_run": dry_run,
                        "output": if dry_run { None } else { Some(&target) },
                        "changes": changes,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                print_changes(&changes);
                println!("{} of {total} names cleaned", changes.len());
                if dry_run {
                    println!("Dry run: nothing written.");
                } else if !changes.is_empty() || target != input {
                    println!("Written to {}", target.display());
                }
            }
        }

        // ── Compare ────────────────────────────────────────────────────────
        Commands::Compare {
            name_a,
            producer_a,
            name_b,
            producer_b,
            url_a,
            url_b,
        } => {
            let match_config = MatchConfig::from_settings(&config.matching)?;
            let mut a = BeerRecord::new("a", name_a, producer_a);
            a.url = url_a;
            let mut b = BeerRecord::new("b", name_b, producer_b);
            b.url = url_b;

            let decision = explain(&a, &b, &match_config);
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": decision,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                let outcome = if decision.is_match() { "MERGE" } else { "KEEP APART" };
                println!("{outcome}: {}", decision.verdict.describe());
                if let Some(scores) = decision.scores {
                    println!(
                        "  producer  {:.3}  (threshold {:.2})",
                        scores.producer,
                        match_config.producer_threshold()
                    );
                    println!(
                        "  name      {:.3}  (threshold {:.2})",
                        scores.name,
                        match_config.name_threshold()
                    );
                }
                println!(
                    "  package   {:?} / {:?}",
                    decision.left_package, decision.right_package
                );
                if !decision.differing_markers.is_empty() {
                    println!("  markers   {}", decision.differing_markers.join(", "));
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::Show => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":config,"meta":{"duration_ms":dur}}))?;
                    } else {
                        print!("{}", toml::to_string_pretty(&config)?);
                    }
                }
                ConfigAction::Path => {
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "path": config_path, "exists": config_path.exists() },
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else {
                        println!("{}", config_path.display());
                    }
                }
                ConfigAction::Init { force } => {
                    init_config(&config_path, force)?;
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":config_path},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("Wrote default config to {}", config_path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn print_changes(changes: &[NameChange]) {
    for change in changes {
        let producer = if change.producer.is_empty() {
            "Unknown"
        } else {
            change.producer.as_str()
        };
        println!("{}. {producer} [{}]", change.index + 1, change.source_id);
        println!("   before: {}", change.original);
        println!("   after:  {}", change.cleaned);
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(CoreError::ConfigError(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }
    AppConfig::default().save_to(path)?;
    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(err) = err.downcast_ref::<MatchError>() {
        return match err {
            MatchError::Core(core) => core_exit_code(core),
            _ => ExitCode::InvalidConfig,
        };
    }
    if let Some(core) = err.downcast_ref::<CoreError>() {
        return core_exit_code(core);
    }
    ExitCode::GeneralError
}

fn core_exit_code(err: &CoreError) -> ExitCode {
    match err {
        CoreError::SourceNotFound(_) => ExitCode::NotFound,
        CoreError::InvalidSource(_) => ExitCode::InvalidArgs,
        CoreError::ConfigError(_) | CoreError::TomlParse(_) => ExitCode::InvalidConfig,
        _ => ExitCode::GeneralError,
    }
}

fn error_kind(code: ExitCode) -> &'static str {
    match code {
        ExitCode::Success => "ok",
        ExitCode::GeneralError => "error",
        ExitCode::NotFound => "not_found",
        ExitCode::InvalidArgs => "invalid_input",
        ExitCode::InvalidConfig => "invalid_config",
    }
}
