//! # Decode Subcommand

use std::io::Write;

use anyhow::Result;
use clap::Args;

use busguard_core::{decode, DecodedValue};

/// Arguments for the `busguard decode` subcommand.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Compact wire value, e.g. `N42`, `Shello`, `O{"a":1}`.
    #[arg(value_name = "RAW_VALUE", allow_hyphen_values = true)]
    pub raw_value: String,

    /// Print the decoded value as pretty JSON where it has a JSON form.
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the decode subcommand. Always exits 0.
pub fn run_decode(args: &DecodeArgs) -> Result<u8> {
    let mut stdout = std::io::stdout().lock();
    decode_to(args, &mut stdout)?;
    Ok(0)
}

fn decode_to(args: &DecodeArgs, out: &mut impl Write) -> Result<()> {
    let value = decode(&args.raw_value);
    let rendered = match (&value, args.pretty) {
        (DecodedValue::Json(json), true) => serde_json::to_string_pretty(json)?,
        _ => value.to_string(),
    };
    writeln!(out, "{}: {rendered}", value.type_name())?;
    Ok(())
}
