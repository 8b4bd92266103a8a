//! # busguard-core — Foundational Types for busguard
//!
//! This crate defines the leaf types of the message-validation pipeline that
//! sits in front of the bus: the compact wire value codec, the bus message
//! model, the per-kind positional router, and the validation error taxonomy.
//! Every other crate in the workspace depends on `busguard-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One sum type for decoded values.** [`DecodedValue`] has one variant
//!    per wire shape. Downstream validation matches on the variant instead of
//!    inspecting dynamic types.
//!
//! 2. **The codec is the wire contract.** [`decode`] is shared by records,
//!    events, and RPCs. It is never specialised per message kind.
//!
//! 3. **Shape mismatch is not an error.** [`router::extract`] returns `None`
//!    for frames that are not relevant to a kind; only schema failures and
//!    configuration defects become [`ValidationError`]s.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `busguard-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod codec;
pub mod error;
pub mod message;
pub mod router;

// Re-export primary types for ergonomic imports.
pub use codec::{decode, encode, DecodedValue};
pub use error::{UnknownKindError, ValidationError};
pub use message::{Message, MessageKind};
pub use router::{extract, Extracted};
