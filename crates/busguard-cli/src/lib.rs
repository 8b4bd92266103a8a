//! # busguard-cli — Operator Command-Line Interface
//!
//! ## Subcommands
//!
//! - `lint` — report configuration defects before the plugin sees traffic
//! - `check` — run the full pipeline on one value
//! - `decode` — show how a wire value decodes
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic.
//! - Handlers delegate to `busguard-core` and `busguard-schema`.
//! - Handlers return an exit code: 0 success, 1 rejected/defective input.
//!   Operational failures are errors, which `main` maps to 2.

pub mod check;
pub mod decode;
pub mod lint;
