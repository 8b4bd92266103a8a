//! # Plugin Configuration
//!
//! The plugin is configured with up to three independent pattern tables,
//! one per message kind:
//!
//! ```yaml
//! draft: draft7          # optional, defaults to draft4
//! record:
//!   "user/*":
//!     properties:
//!       age: { type: number }
//!     additionalProperties: false
//! event:
//!   "chat/*": { type: string, maxLength: 280 }
//! rpc:
//!   "math/**": { type: object, required: [a, b] }
//! ```
//!
//! A missing (or `null`) table disables validation for that kind. Pattern
//! tables keep their configuration order, which decides which pattern wins
//! when several match.

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use busguard_core::MessageKind;

/// Error loading plugin configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config '{path}': {source}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid YAML or does not have the expected shape.
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration is not valid JSON or does not have the expected shape.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON Schema draft used to compile every configured descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SchemaDraft {
    /// Draft 4.
    #[default]
    #[serde(rename = "draft4")]
    Draft4,
    /// Draft 6.
    #[serde(rename = "draft6")]
    Draft6,
    /// Draft 7.
    #[serde(rename = "draft7")]
    Draft7,
    /// Draft 2019-09.
    #[serde(rename = "draft2019-09")]
    Draft201909,
    /// Draft 2020-12.
    #[serde(rename = "draft2020-12")]
    Draft202012,
}

impl From<SchemaDraft> for jsonschema::Draft {
    fn from(draft: SchemaDraft) -> Self {
        match draft {
            SchemaDraft::Draft4 => jsonschema::Draft::Draft4,
            SchemaDraft::Draft6 => jsonschema::Draft::Draft6,
            SchemaDraft::Draft7 => jsonschema::Draft::Draft7,
            SchemaDraft::Draft201909 => jsonschema::Draft::Draft201909,
            SchemaDraft::Draft202012 => jsonschema::Draft::Draft202012,
        }
    }
}

/// One configured `pattern → schema descriptor` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternEntry {
    /// Glob pattern matched against message identifiers.
    pub pattern: String,
    /// Schema descriptor bound to the pattern.
    pub schema: Value,
}

/// Ordered pattern table for one message kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternTable {
    entries: Vec<PatternEntry>,
}

impl PatternTable {
    /// Build a table from `(pattern, schema)` pairs, keeping their order.
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, Value)>,
        P: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(pattern, schema)| PatternEntry {
                    pattern: pattern.into(),
                    schema,
                })
                .collect(),
        }
    }

    /// Append a binding after all existing ones.
    pub fn push(&mut self, pattern: impl Into<String>, schema: Value) {
        self.entries.push(PatternEntry {
            pattern: pattern.into(),
            schema,
        });
    }

    /// Iterate bindings in configuration order.
    pub fn iter(&self) -> std::slice::Iter<'_, PatternEntry> {
        self.entries.iter()
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no bindings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a PatternTable {
    type Item = &'a PatternEntry;
    type IntoIter = std::slice::Iter<'a, PatternEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de> Deserialize<'de> for PatternTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(PatternTableVisitor)
    }
}

/// Reads a mapping entry by entry so that document order survives
/// regardless of the map type serde would otherwise pick.
struct PatternTableVisitor;

impl<'de> Visitor<'de> for PatternTableVisitor {
    type Value = PatternTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping from glob pattern to schema descriptor")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut table = PatternTable::default();
        while let Some((pattern, schema)) = map.next_entry::<String, Value>()? {
            table.push(pattern, schema);
        }
        Ok(table)
    }
}

/// Top-level plugin options.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PluginOptions {
    /// Record descriptors (`properties` / `additionalProperties` wrappers).
    #[serde(default)]
    pub record: Option<PatternTable>,
    /// Event payload schemas.
    #[serde(default)]
    pub event: Option<PatternTable>,
    /// RPC argument schemas.
    #[serde(default)]
    pub rpc: Option<PatternTable>,
    /// Schema draft for all descriptors.
    #[serde(default)]
    pub draft: SchemaDraft,
}

impl PluginOptions {
    /// Parse options from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Parse options from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load options from a file. `.json` files are read as JSON, anything
    /// else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    /// The pattern table for `kind`, if that kind is configured.
    pub fn table(&self, kind: MessageKind) -> Option<&PatternTable> {
        match kind {
            MessageKind::Record => self.record.as_ref(),
            MessageKind::Event => self.event.as_ref(),
            MessageKind::Rpc => self.rpc.as_ref(),
        }
    }

    /// Replace the pattern table for `kind`.
    pub fn with_table(mut self, kind: MessageKind, table: PatternTable) -> Self {
        let slot = match kind {
            MessageKind::Record => &mut self.record,
            MessageKind::Event => &mut self.event,
            MessageKind::Rpc => &mut self.rpc,
        };
        *slot = Some(table);
        self
    }

    /// Kinds with a configured table.
    pub fn configured_kinds(&self) -> Vec<MessageKind> {
        MessageKind::all()
            .iter()
            .copied()
            .filter(|kind| self.table(*kind).is_some())
            .collect()
    }
}
