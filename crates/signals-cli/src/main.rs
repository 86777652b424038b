//! `signals` – command line front end for the relational signals stack.
//!
//! Subcommands:
//!
//! | Command | Does |
//! |---|---|
//! | `demo` | play the reference scenario through console channels |
//! | `repl` | feed raw signal updates by hand |
//! | `schema` | print the `RelationalEvent` JSON Schema |
//! | `check-config PATH` | load and validate a thresholds document |
//! | `init` | write `~/.signals/config.toml` with defaults |
//!
//! Ctrl-C during `demo` stops it between phases.

mod config;
mod console;
mod demo;
mod repl;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use signals_kernel::{ConfigError, Thresholds};
use signals_runtime::telemetry;
use signals_types::RelationalEvent;

#[derive(Parser, Debug)]
#[command(name = "signals", version, about = "Relational signals: decision core, bus and channels")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the reference scenario.
    Demo {
        /// Thresholds document (.json or .toml); overrides the config file.
        #[arg(long)]
        thresholds: Option<PathBuf>,
        /// Fixed pause between phases, in milliseconds.
        #[arg(long)]
        pace_ms: Option<u64>,
    },
    /// Interactive shell.
    Repl {
        #[arg(long)]
        thresholds: Option<PathBuf>,
    },
    /// Print the JSON Schema of the canonical event.
    Schema,
    /// Load and validate a thresholds document.
    CheckConfig { path: PathBuf },
    /// Write the default config file.
    Init {
        /// Replace an existing config file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = telemetry::init_tracing("signals");

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    match cli.command {
        Command::Demo {
            thresholds,
            pace_ms,
        } => {
            let Some(bands) = resolve_thresholds(thresholds.as_deref(), &cfg) else {
                return ExitCode::FAILURE;
            };
            print_banner();
            let pace = pace_ms.or(cfg.pace_ms).map(Duration::from_millis);
            demo::run(bands, pace, install_ctrlc());
        }
        Command::Repl { thresholds } => {
            let Some(bands) = resolve_thresholds(thresholds.as_deref(), &cfg) else {
                return ExitCode::FAILURE;
            };
            print_banner();
            repl::run(bands, cfg.context_id);
        }
        Command::Schema => {
            let schema = schemars::schema_for!(RelationalEvent);
            match serde_json::to_string_pretty(&schema) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    println!("{}: {}", "Schema error".red(), e);
                    return ExitCode::FAILURE;
                }
            }
        }
        Command::CheckConfig { path } => match Thresholds::load(&path) {
            Ok(t) => {
                println!("{} {}", "✓".green().bold(), path.display().to_string().bold());
                println!(
                    "  surprise  {} / {} / {}",
                    t.surprise.curious, t.surprise.tense, t.surprise.destabilized
                );
                println!("  drag_cost {} / {}", t.drag_cost.light, t.drag_cost.moderate);
                println!("  grounding min_delta = {}", t.grounding.min_delta);
            }
            Err(e) => {
                report_config_error(&path, &e);
                return ExitCode::FAILURE;
            }
        },
        Command::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                println!(
                    "  {} already exists (use {} to overwrite)",
                    path.display().to_string().bold(),
                    "--force".bold()
                );
                return ExitCode::SUCCESS;
            }
            match config::save(&config::Config::default()) {
                Ok(path) => println!(
                    "  {} Config saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bold()
                ),
                Err(e) => {
                    println!("{}: {}", "Error saving config".red(), e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }
    ExitCode::SUCCESS
}

/// CLI flag, then config file, then the built-in bands.
fn resolve_thresholds(flag: Option<&Path>, cfg: &config::Config) -> Option<Thresholds> {
    let Some(path) = flag.or(cfg.thresholds_path.as_deref()) else {
        info!("using built-in thresholds");
        return Some(Thresholds::default());
    };
    match Thresholds::load(path) {
        Ok(t) => {
            info!(path = %path.display(), "thresholds loaded");
            Some(t)
        }
        Err(e) => {
            report_config_error(path, &e);
            None
        }
    }
}

fn report_config_error(path: &Path, e: &ConfigError) {
    println!("{} {}", "✗".red().bold(), path.display().to_string().bold());
    println!("  {}", e.to_string().red());
}

fn install_ctrlc() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping after this phase …".yellow().bold());
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the demo will run to completion");
    }
    shutdown
}

fn print_banner() {
    println!();
    println!("{}", r#"   _____ _                   __     "#.bold().cyan());
    println!("{}", r#"  / ___/(_)___ _____  ____ _/ /____ "#.bold().cyan());
    println!("{}", r#"  \__ \/ / __ `/ __ \/ __ `/ / ___/ "#.bold().cyan());
    println!("{}", r#" ___/ / / /_/ / / / / /_/ / (__  )  "#.bold().cyan());
    println!("{}", r#"/____/_/\__, /_/ /_/\__,_/_/____/   "#.bold().cyan());
    println!("{}", r#"       /____/                       "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Signals".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  One truth, many expressions");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_flags_parse() {
        let cli = Cli::parse_from(["signals", "demo", "--pace-ms", "50", "--thresholds", "bands.json"]);
        match cli.command {
            Command::Demo {
                thresholds,
                pace_ms,
            } => {
                assert_eq!(thresholds, Some(PathBuf::from("bands.json")));
                assert_eq!(pace_ms, Some(50));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn check_config_takes_a_path() {
        let cli = Cli::parse_from(["signals", "check-config", "thresholds.toml"]);
        assert!(matches!(cli.command, Command::CheckConfig { path } if path == Path::new("thresholds.toml")));
    }

    #[test]
    fn flag_wins_over_config_file() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let good = dir.path().join("bands.toml");
        std::fs::write(&good, include_str!("../../signals-kernel/thresholds.toml")).unwrap();
        let cfg = config::Config {
            thresholds_path: Some(dir.path().join("missing.toml")),
            ..config::Config::default()
        };

        assert_eq!(resolve_thresholds(Some(&good), &cfg), Some(Thresholds::default()));
        assert_eq!(resolve_thresholds(None, &cfg), None);
        assert_eq!(
            resolve_thresholds(None, &config::Config::default()),
            Some(Thresholds::default())
        );
    }
}
