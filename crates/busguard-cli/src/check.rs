//! # Check Subcommand
//!
//! Runs the decode → match → validate pipeline on a single wire value, as
//! the plugin would for a frame carrying it.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use busguard_core::MessageKind;
use busguard_schema::{PluginOptions, ValidationEngine};

/// Arguments for the `busguard check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema configuration file (YAML, or JSON by `.json` extension).
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,

    /// Message kind: record, event, or rpc.
    #[arg(long)]
    pub kind: MessageKind,

    /// Record name, event name, or RPC name.
    #[arg(long = "id", value_name = "IDENTIFIER")]
    pub identifier: String,

    /// Record key (records only).
    #[arg(long, default_value = "")]
    pub key: String,

    /// Compact wire value, e.g. `N42`, `Shello`, `O{"a":1}`.
    #[arg(value_name = "RAW_VALUE", allow_hyphen_values = true)]
    pub raw_value: String,
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 when the value passes (or no pattern applies),
/// 1 when it is rejected.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let mut stdout = std::io::stdout().lock();
    check_to(args, &mut stdout)
}

fn check_to(args: &CheckArgs, out: &mut impl Write) -> Result<u8> {
    let options = PluginOptions::from_path(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let engine = ValidationEngine::new(options);

    let Some(entry) = engine.resolve(args.kind, &args.identifier) else {
        writeln!(out, "SKIPPED (no pattern)")?;
        return Ok(0);
    };
    tracing::info!(kind = %args.kind, pattern = %entry.pattern, "resolved schema");

    match engine.validate(args.kind, &args.identifier, &args.key, &args.raw_value) {
        Ok(()) => {
            writeln!(out, "OK")?;
            Ok(0)
        }
        Err(e) => {
            writeln!(out, "INVALID: {e}")?;
            Ok(1)
        }
    }
}
