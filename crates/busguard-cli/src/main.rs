//! # busguard CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use busguard_cli::check::{run_check, CheckArgs};
use busguard_cli::decode::{run_decode, DecodeArgs};
use busguard_cli::lint::{run_lint, LintArgs};

/// busguard — schema validation for bus records, events, and RPCs.
///
/// Lints plugin schema configuration, decodes compact wire values, and
/// checks single values against the configured schemas.
#[derive(Parser, Debug)]
#[command(name = "busguard", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report defects in a schema configuration file.
    Lint(LintArgs),

    /// Validate one wire value as a record, event, or rpc.
    Check(CheckArgs),

    /// Decode a compact wire value and print it.
    Decode(DecodeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("busguard CLI starting");

    let result = match cli.command {
        Commands::Lint(args) => run_lint(&args),
        Commands::Check(args) => run_check(&args),
        Commands::Decode(args) => run_decode(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
