//! # Validation Engine
//!
//! Runs the decode → match → validate pipeline for one message.
//!
//! ## Per-kind semantics
//!
//! - **event / rpc**: the descriptor bound to the first matching pattern is
//!   a JSON Schema applied to the decoded value. Error paths are rooted at
//!   `message` (events) or `argument` (RPCs).
//! - **record**: the descriptor must carry a `properties` mapping. A key
//!   listed there is validated against its own schema; any other key is
//!   rejected when `additionalProperties` is falsy, or validated against
//!   `additionalProperties` otherwise (omitted means accept anything). Error
//!   paths are rooted at the key name.
//!
//! Only the first violation is reported. Missing values (blank, `U`, or a
//! malformed `O` payload) satisfy every schema except `false` and schemas
//! with `"required": true`. NaN and the infinities fail `type`, `enum` and
//! `const` constraints and satisfy everything else.
//!
//! ## Caching
//!
//! Matchers are cached per `(kind, pattern)` in a [`MatcherCache`]; compiled
//! schemas per `(kind, pattern, slot)`. Both caches are owned by the engine,
//! start empty, and only grow. Compilation happens under the write lock, so
//! each entry is built at most once.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jsonschema::{Retrieve, Uri, Validator};
use parking_lot::RwLock;
use serde_json::Value;

use busguard_core::{decode, extract, DecodedValue, Message, MessageKind, ValidationError};

use crate::config::{PatternEntry, PluginOptions, SchemaDraft};
use crate::pattern::MatcherCache;

static ACCEPT_ALL: Value = Value::Bool(true);

/// Refuses every external `$ref`. Descriptors must be self-contained; the
/// engine never reaches out to the network or filesystem while validating
/// bus traffic.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external schema reference '{}' is not resolved", uri.as_str()).into())
    }
}

/// A descriptor compiled for repeated use.
pub(crate) enum CompiledSchema {
    /// The descriptor is `true`.
    AcceptAll,
    /// A compiled JSON Schema validator.
    Validator(Validator),
    /// The descriptor failed to compile.
    Invalid(String),
}

impl CompiledSchema {
    /// Compile `schema` under `draft`.
    ///
    /// A top-level boolean `required` (`"required": true`) only concerns
    /// missing values, which never reach a compiled validator, so it is
    /// dropped before compilation.
    pub(crate) fn compile(schema: &Value, draft: SchemaDraft) -> Self {
        if matches!(schema, Value::Bool(true)) {
            return Self::AcceptAll;
        }
        let stripped;
        let schema = match schema {
            Value::Object(map) if map.get("required").is_some_and(Value::is_boolean) => {
                let mut map = map.clone();
                map.remove("required");
                stripped = Value::Object(map);
                &stripped
            }
            _ => schema,
        };
        match jsonschema::options()
            .with_draft(draft.into())
            .with_retriever(OfflineRetriever)
            .build(schema)
        {
            Ok(validator) => Self::Validator(validator),
            Err(e) => Self::Invalid(e.to_string()),
        }
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcceptAll => f.write_str("AcceptAll"),
            Self::Validator(_) => f.write_str("Validator(..)"),
            Self::Invalid(reason) => f.debug_tuple("Invalid").field(reason).finish(),
        }
    }
}

/// Which part of a descriptor a compiled schema came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    /// The whole descriptor (events and RPCs).
    Whole,
    /// `properties.<key>` of a record descriptor.
    Property(String),
    /// `additionalProperties` of a record descriptor.
    Additional,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SlotKey {
    kind: MessageKind,
    pattern: String,
    slot: Slot,
}

/// Validates decoded message values against the configured schemas.
///
/// `ValidationEngine` is `Send + Sync`; one instance serves all three
/// message kinds and may be shared across threads behind an `Arc`.
#[derive(Debug)]
pub struct ValidationEngine {
    options: PluginOptions,
    matchers: MatcherCache,
    compiled: RwLock<HashMap<SlotKey, Arc<CompiledSchema>>>,
}

impl ValidationEngine {
    /// Create an engine with empty caches.
    pub fn new(options: PluginOptions) -> Self {
        Self {
            options,
            matchers: MatcherCache::new(),
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// The configuration this engine validates against.
    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// The engine's matcher cache.
    pub fn matchers(&self) -> &MatcherCache {
        &self.matchers
    }

    /// Number of compiled schemas held by the engine.
    pub fn compiled_schema_count(&self) -> usize {
        self.compiled.read().len()
    }

    /// The first configured binding for `kind` whose pattern matches
    /// `identifier`.
    pub fn resolve(&self, kind: MessageKind, identifier: &str) -> Option<&PatternEntry> {
        let table = self.options.table(kind)?;
        self.matchers.resolve(kind, table, identifier)
    }

    /// Route `message` as `kind` and validate it.
    ///
    /// Returns `None` when the frame's envelope or payload length does not
    /// belong to `kind`; such frames are not this kind's concern.
    pub fn validate_message(
        &self,
        kind: MessageKind,
        message: &Message,
    ) -> Option<Result<(), ValidationError>> {
        let extracted = extract(kind, message)?;
        Some(self.validate(
            kind,
            extracted.identifier,
            extracted.key,
            extracted.raw_value,
        ))
    }

    /// Decode `raw_value` and validate it against the schema bound to the
    /// first pattern matching `identifier`. `key` is only used for records.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the value violates the schema, when a
    /// record key is not allowed, or when the matched descriptor is
    /// unusable (missing `properties`, uncompilable schema).
    pub fn validate(
        &self,
        kind: MessageKind,
        identifier: &str,
        key: &str,
        raw_value: &str,
    ) -> Result<(), ValidationError> {
        let value = decode(raw_value);

        let Some(entry) = self.resolve(kind, identifier) else {
            tracing::debug!(%kind, identifier, "no pattern matched, passing unchecked");
            return Ok(());
        };

        match kind {
            MessageKind::Record => self.validate_record(entry, key, &value),
            MessageKind::Event => self.check(kind, entry, Slot::Whole, &entry.schema, &value, "message"),
            MessageKind::Rpc => self.check(kind, entry, Slot::Whole, &entry.schema, &value, "argument"),
        }
    }

    fn validate_record(
        &self,
        entry: &PatternEntry,
        key: &str,
        value: &DecodedValue,
    ) -> Result<(), ValidationError> {
        let descriptor = &entry.schema;
        let properties = descriptor
            .get("properties")
            .filter(|p| is_truthy(p))
            .ok_or_else(|| ValidationError::MissingProperties {
                pattern: entry.pattern.clone(),
            })?;
        // An explicit `false` or `null` must be honored; only omission
        // defaults to accepting any key.
        let additional = descriptor.get("additionalProperties").unwrap_or(&ACCEPT_ALL);

        let (slot, schema) = match properties.get(key).filter(|s| is_truthy(s)) {
            Some(schema) => (Slot::Property(key.to_string()), schema),
            None if !is_truthy(additional) => {
                return Err(ValidationError::KeyNotAllowed {
                    key: key.to_string(),
                })
            }
            None => (Slot::Additional, additional),
        };

        self.check(MessageKind::Record, entry, slot, schema, value, key)
    }

    fn check(
        &self,
        kind: MessageKind,
        entry: &PatternEntry,
        slot: Slot,
        schema: &Value,
        value: &DecodedValue,
        root: &str,
    ) -> Result<(), ValidationError> {
        let Some(instance) = value.to_json() else {
            return check_unrepresentable(schema, value, root);
        };

        let compiled = self.compiled(kind, &entry.pattern, slot, schema);
        match compiled.as_ref() {
            CompiledSchema::AcceptAll => Ok(()),
            CompiledSchema::Invalid(reason) => Err(ValidationError::InvalidSchema {
                pattern: entry.pattern.clone(),
                reason: reason.clone(),
            }),
            CompiledSchema::Validator(validator) => first_violation(validator, &instance, root),
        }
    }

    fn compiled(
        &self,
        kind: MessageKind,
        pattern: &str,
        slot: Slot,
        schema: &Value,
    ) -> Arc<CompiledSchema> {
        let key = SlotKey {
            kind,
            pattern: pattern.to_string(),
            slot,
        };
        if let Some(found) = self.compiled.read().get(&key) {
            return Arc::clone(found);
        }

        let draft = self.options.draft;
        let mut compiled = self.compiled.write();
        let entry = compiled.entry(key).or_insert_with(|| {
            let schema = CompiledSchema::compile(schema, draft);
            if let CompiledSchema::Invalid(reason) = &schema {
                tracing::warn!(%kind, pattern, %reason, "schema failed to compile");
            }
            Arc::new(schema)
        });
        Arc::clone(entry)
    }
}

fn first_violation(validator: &Validator, instance: &Value, root: &str) -> Result<(), ValidationError> {
    match validator.iter_errors(instance).next() {
        None => Ok(()),
        Some(err) => Err(ValidationError::SchemaViolation {
            path: property_path(root, &err.instance_path.to_string()),
            reason: err.to_string(),
        }),
    }
}

/// Validate a value that has no JSON form: a missing value or a non-finite
/// number. The descriptor is read as-is; it is never compiled for these.
fn check_unrepresentable(
    schema: &Value,
    value: &DecodedValue,
    root: &str,
) -> Result<(), ValidationError> {
    let violation = |reason: String| {
        Err(ValidationError::SchemaViolation {
            path: root.to_string(),
            reason,
        })
    };

    let constraints = match schema {
        Value::Bool(false) => return violation(format!("False schema does not allow {value}")),
        Value::Object(map) => map,
        _ => return Ok(()),
    };

    if value.is_missing() {
        return match constraints.get("required") {
            Some(Value::Bool(true)) => violation("is required".to_string()),
            _ => Ok(()),
        };
    }

    if let Some(types) = constraints.get("type") {
        return violation(format!("{value} is not of type {types}"));
    }
    if let Some(options) = constraints.get("enum") {
        return violation(format!("{value} is not one of {options}"));
    }
    if let Some(expected) = constraints.get("const") {
        return violation(format!("{expected} was expected"));
    }
    Ok(())
}

/// Render a JSON Pointer instance location as a property path under `root`:
/// `/a/0/b c` becomes `root.a[0]["b c"]`.
pub fn property_path(root: &str, pointer: &str) -> String {
    let mut path = root.to_string();
    for raw in pointer.split('/').skip(1) {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push_str(&format!("[{segment}]"));
        } else if is_identifier(&segment) {
            path.push('.');
            path.push_str(&segment);
        } else {
            path.push_str(&format!("[{}]", Value::String(segment)));
        }
    }
    path
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Truthiness of a configuration value: `null`, `false`, `0`, and `""` are
/// falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
