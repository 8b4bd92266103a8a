//! # Configuration Lint
//!
//! Startup-time checks over [`PluginOptions`]. The engine still reports
//! descriptor defects per message (that is what bus clients observe); the
//! lint pass surfaces the same defects once, up front, so operators see them
//! before traffic does.

use std::collections::HashSet;

use serde_json::Value;
use thiserror::Error;

use busguard_core::MessageKind;

use crate::config::{PatternEntry, PluginOptions, SchemaDraft};
use crate::engine::{is_truthy, CompiledSchema};
use crate::pattern::PatternMatcher;

/// A defect found in plugin configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    /// A pattern is not a valid glob and will never match.
    #[error("{kind} pattern '{pattern}' never matches: {reason}")]
    InvalidPattern {
        /// Message kind of the table.
        kind: MessageKind,
        /// The pattern text.
        pattern: String,
        /// Compiler error text.
        reason: String,
    },

    /// The same pattern is bound twice; the later binding is unreachable.
    #[error("{kind} pattern '{pattern}' is bound more than once; later bindings are unreachable")]
    DuplicatePattern {
        /// Message kind of the table.
        kind: MessageKind,
        /// The repeated pattern.
        pattern: String,
    },

    /// A record descriptor has no `properties` mapping; every message it
    /// matches will be rejected.
    #[error("missing properties in options.{pattern}")]
    MissingProperties {
        /// The record pattern.
        pattern: String,
    },

    /// A schema does not compile under the configured draft.
    #[error("{kind} pattern '{pattern}' has an invalid schema at {location}: {reason}")]
    InvalidSchema {
        /// Message kind of the table.
        kind: MessageKind,
        /// The pattern the schema is bound to.
        pattern: String,
        /// Where in the descriptor the schema sits.
        location: String,
        /// Compiler error text.
        reason: String,
    },
}

/// Check every configured table and return all issues found, in
/// configuration order.
pub fn lint(options: &PluginOptions) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    for kind in MessageKind::all().iter().copied() {
        let Some(table) = options.table(kind) else {
            continue;
        };
        let mut seen = HashSet::new();
        for entry in table {
            if !seen.insert(entry.pattern.as_str()) {
                issues.push(ConfigIssue::DuplicatePattern {
                    kind,
                    pattern: entry.pattern.clone(),
                });
                continue;
            }
            if let Err(e) = PatternMatcher::compile(&entry.pattern) {
                issues.push(ConfigIssue::InvalidPattern {
                    kind,
                    pattern: entry.pattern.clone(),
                    reason: e.reason,
                });
            }
            match kind {
                MessageKind::Record => lint_record(entry, options.draft, &mut issues),
                MessageKind::Event | MessageKind::Rpc => {
                    lint_schema(kind, entry, "(root)", &entry.schema, options.draft, &mut issues)
                }
            }
        }
    }
    issues
}

fn lint_record(entry: &PatternEntry, draft: SchemaDraft, issues: &mut Vec<ConfigIssue>) {
    let Some(properties) = entry.schema.get("properties").filter(|p| is_truthy(p)) else {
        issues.push(ConfigIssue::MissingProperties {
            pattern: entry.pattern.clone(),
        });
        return;
    };

    if let Value::Object(map) = properties {
        for (key, schema) in map.iter().filter(|(_, schema)| is_truthy(schema)) {
            let location = format!("properties.{key}");
            lint_schema(MessageKind::Record, entry, &location, schema, draft, issues);
        }
    }
    if let Some(additional @ Value::Object(_)) = entry.schema.get("additionalProperties") {
        lint_schema(
            MessageKind::Record,
            entry,
            "additionalProperties",
            additional,
            draft,
            issues,
        );
    }
}

fn lint_schema(
    kind: MessageKind,
    entry: &PatternEntry,
    location: &str,
    schema: &Value,
    draft: SchemaDraft,
    issues: &mut Vec<ConfigIssue>,
) {
    if let CompiledSchema::Invalid(reason) = CompiledSchema::compile(schema, draft) {
        issues.push(ConfigIssue::InvalidSchema {
            kind,
            pattern: entry.pattern.clone(),
            location: location.to_string(),
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternTable;
    use serde_json::json;

    #[test]
    fn test_clean_config_has_no_issues() {
        let options = PluginOptions::from_yaml_str(
            r#"
record:
  "user/*":
    properties:
      age: { type: integer, minimum: 0 }
    additionalProperties: false
event:
  "chat/*": { type: string }
"#,
        )
        .unwrap();
        assert!(lint(&options).is_empty());
    }

    #[test]
    fn test_missing_properties_reported() {
        let options = PluginOptions::default().with_table(
            MessageKind::Record,
            PatternTable::from_entries([("user/*", json!({"additionalProperties": false}))]),
        );
        assert_eq!(
            lint(&options),
            vec![ConfigIssue::MissingProperties {
                pattern: "user/*".to_string()
            }]
        );
    }

    #[test]
    fn test_invalid_property_schema_located() {
        let options = PluginOptions::default().with_table(
            MessageKind::Record,
            PatternTable::from_entries([(
                "user/*",
                json!({"properties": {"age": {"type": "whole number"}}}),
            )]),
        );
        let issues = lint(&options);
        assert_eq!(issues.len(), 1);
        match &issues[0] {
            ConfigIssue::InvalidSchema { location, .. } => assert_eq!(location, "properties.age"),
            other => panic!("expected InvalidSchema, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_pattern() {
        let mut table = PatternTable::default();
        table.push("x/*", json!({}));
        table.push("x/*", json!({"type": "string"}));
        let options = PluginOptions::default().with_table(MessageKind::Event, table);
        let issues = lint(&options);
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], ConfigIssue::DuplicatePattern { .. }));
        assert!(issues[0].to_string().starts_with("event pattern 'x/*'"));
    }

    #[test]
    fn test_lenient_patterns_are_clean() {
        let table = PatternTable::from_entries([
            ("chat**", json!({"type": "string"})),
            ("[oops", json!({})),
            ("user/a**b", json!({})),
        ]);
        let options = PluginOptions::default().with_table(MessageKind::Event, table);
        assert_eq!(lint(&options), Vec::new());
    }

    #[test]
    fn test_boolean_required_is_clean() {
        let options = PluginOptions::default().with_table(
            MessageKind::Rpc,
            PatternTable::from_entries([("*", json!({"type": "string", "required": true}))]),
        );
        assert_eq!(lint(&options), Vec::new());
    }
}
