//! # busguard-schema — Pattern Resolution & Schema Validation
//!
//! Decides whether a bus message's value is acceptable.
//!
//! ## Pipeline (`engine`)
//!
//! [`ValidationEngine::validate`] decodes the raw wire value, resolves the
//! schema bound to the first pattern that matches the message identifier,
//! and validates the decoded value with the `jsonschema` crate. Records are
//! narrowed further by key through the descriptor's `properties` and
//! `additionalProperties`.
//!
//! ## Patterns (`pattern`)
//!
//! Minimatch-style globs compiled once per `(kind, pattern)` and cached for
//! the lifetime of the engine. First match wins, in configuration order.
//!
//! ## Configuration (`config`, `lint`)
//!
//! [`PluginOptions`] loads ordered pattern tables from YAML or JSON.
//! [`lint`] reports configuration defects before any traffic is seen.
//!
//! ## Crate Policy
//!
//! - Depends only on `busguard-core` internally.
//! - Validation never performs I/O; external `$ref`s are refused.
//! - Rejections are values, never panics.

pub mod config;
pub mod engine;
pub mod lint;
pub mod pattern;

pub use config::{ConfigError, PatternEntry, PatternTable, PluginOptions, SchemaDraft};
pub use engine::{property_path, ValidationEngine};
pub use lint::{lint, ConfigIssue};
pub use pattern::{expand_braces, MatcherCache, PatternError, PatternMatcher};
