//! # Lint Subcommand
//!
//! Loads a schema configuration file and lists every defect the plugin
//! would otherwise only report per message.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use busguard_schema::{lint, PluginOptions};

/// Arguments for the `busguard lint` subcommand.
#[derive(Args, Debug)]
pub struct LintArgs {
    /// Schema configuration file (YAML, or JSON by `.json` extension).
    #[arg(long, value_name = "FILE")]
    pub config: PathBuf,
}

/// Execute the lint subcommand.
///
/// Returns exit code: 0 when the configuration is clean, 1 otherwise.
pub fn run_lint(args: &LintArgs) -> Result<u8> {
    let mut stdout = std::io::stdout().lock();
    lint_to(args, &mut stdout)
}

fn lint_to(args: &LintArgs, out: &mut impl Write) -> Result<u8> {
    let options = PluginOptions::from_path(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    let kinds = options.configured_kinds();
    tracing::info!(?kinds, "loaded schema configuration");

    let issues = lint(&options);
    if issues.is_empty() {
        writeln!(out, "OK: {} is clean", args.config.display())?;
        return Ok(0);
    }

    for issue in &issues {
        writeln!(out, "  ISSUE: {issue}")?;
    }
    writeln!(out, "\n{} issue(s) found.", issues.len())?;
    Ok(1)
}
