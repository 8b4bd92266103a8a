//! # Identifier Patterns
//!
//! Glob patterns select the schema group for a message identifier. Matching
//! follows minimatch conventions:
//!
//! - `*` and `?` never cross a `/`; `**` as a whole segment spans segments.
//! - `**` inside a segment (`chat**`, `a/b**c`) is a plain `*`.
//! - `[...]`, `[!...]` and `[^...]` are character classes; a `[` that never
//!   closes is a literal character.
//! - `{a,b}` alternations are expanded before compilation (nested braces
//!   allowed; a brace group without a top-level comma is literal).
//! - An odd number of leading `!` negates the pattern.
//! - A pattern starting with `#` is a comment and matches nothing.
//! - A leading `.` in an identifier segment only matches a literal `.`.
//!
//! [`MatcherCache`] compiles each `(kind, pattern)` pair at most once and
//! hands out the same [`Arc`] on every subsequent lookup.

use std::collections::HashMap;
use std::sync::Arc;

use glob::{MatchOptions, Pattern};
use parking_lot::RwLock;
use thiserror::Error;

use busguard_core::MessageKind;

use crate::config::{PatternEntry, PatternTable};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// A pattern that could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid pattern '{pattern}': {reason}")]
pub struct PatternError {
    /// The offending pattern text.
    pub pattern: String,
    /// Why it was rejected.
    pub reason: String,
}

/// A compiled identifier pattern.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    source: String,
    alternatives: Vec<Pattern>,
    negated: bool,
}

impl PatternMatcher {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the glob compiler rejects a brace
    /// expansion of the pattern after it is rewritten into glob syntax.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.starts_with('#') {
            return Ok(Self::never(pattern));
        }

        let bangs = pattern.chars().take_while(|c| *c == '!').count();
        let body = &pattern[bangs..];

        let alternatives = expand_braces(body)
            .iter()
            .map(|alt| {
                Pattern::new(&glob_syntax(alt)).map_err(|e| PatternError {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: pattern.to_string(),
            alternatives,
            negated: bangs % 2 == 1,
        })
    }

    /// A matcher that rejects every identifier.
    pub fn never(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            alternatives: Vec::new(),
            negated: false,
        }
    }

    /// The pattern text this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Test an identifier against the pattern.
    pub fn is_match(&self, identifier: &str) -> bool {
        let hit = self
            .alternatives
            .iter()
            .any(|p| p.matches_with(identifier, MATCH_OPTIONS));
        hit != self.negated
    }
}

/// Process-scoped cache of compiled matchers, keyed by kind then pattern.
///
/// Starts empty, grows monotonically, and is never persisted. The number of
/// entries is bounded by the number of configured patterns.
#[derive(Debug, Default)]
pub struct MatcherCache {
    entries: RwLock<HashMap<MessageKind, HashMap<String, Arc<PatternMatcher>>>>,
}

impl MatcherCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached matcher for `(kind, pattern)`, compiling it on first
    /// use. Unparsable patterns are cached as matchers that never match.
    pub fn get_or_compile(&self, kind: MessageKind, pattern: &str) -> Arc<PatternMatcher> {
        if let Some(found) = self
            .entries
            .read()
            .get(&kind)
            .and_then(|by_pattern| by_pattern.get(pattern))
        {
            return Arc::clone(found);
        }

        let mut entries = self.entries.write();
        let by_pattern = entries.entry(kind).or_default();
        let matcher = by_pattern.entry(pattern.to_string()).or_insert_with(|| {
            let compiled = PatternMatcher::compile(pattern).unwrap_or_else(|e| {
                tracing::warn!(%kind, error = %e, "pattern never matches");
                PatternMatcher::never(pattern)
            });
            tracing::debug!(%kind, pattern, "compiled identifier pattern");
            Arc::new(compiled)
        });
        Arc::clone(matcher)
    }

    /// Find the first entry of `table` whose pattern matches `identifier`.
    ///
    /// Entries are tried in configuration order and evaluation stops at the
    /// first match, so an earlier broad pattern shadows later specific ones.
    pub fn resolve<'t>(
        &self,
        kind: MessageKind,
        table: &'t PatternTable,
        identifier: &str,
    ) -> Option<&'t PatternEntry> {
        table
            .iter()
            .find(|entry| self.get_or_compile(kind, &entry.pattern).is_match(identifier))
    }

    /// Number of compiled matchers across all kinds.
    pub fn len(&self) -> usize {
        self.entries.read().values().map(HashMap::len).sum()
    }

    /// Returns true if nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Expand `{a,b}` alternations into the full list of plain patterns.
///
/// Expansion is left-to-right, so `{a,b}{1,2}` yields `a1 a2 b1 b2`. Brace
/// groups with no top-level comma, and unbalanced braces, stay literal.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some((open, close, commas)) = first_alternation(pattern) else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut bounds = Vec::with_capacity(commas.len() + 2);
    bounds.push(open);
    bounds.extend(commas);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|w| {
            let option = &pattern[w[0] + 1..w[1]];
            expand_braces(&format!("{prefix}{option}{suffix}"))
        })
        .collect()
}

/// Locate the first brace group that contains a top-level comma. Returns the
/// byte offsets of `{`, its matching `}`, and the top-level commas between.
fn first_alternation(pattern: &str) -> Option<(usize, usize, Vec<usize>)> {
    let bytes = pattern.as_bytes();
    let mut start = 0;
    while let Some(rel) = pattern[start..].find('{') {
        let open = start + rel;
        let mut depth = 0usize;
        let mut commas = Vec::new();
        let mut close = None;
        for (i, b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                b',' if depth == 1 => commas.push(i),
                _ => {}
            }
        }
        match close {
            Some(close) if !commas.is_empty() => return Some((open, close, commas)),
            Some(_) => start = open + 1,
            None => return None,
        }
    }
    None
}

/// Rewrite a minimatch pattern into the syntax the glob compiler reads.
///
/// A `[` that opens a class keeps its body verbatim, with a leading `^`
/// turned into `!`; a `[` without a closing `]` becomes the literal class
/// `[[]`. A run of `*` is `**` only when it is exactly two stars filling a
/// whole segment, and `*` otherwise.
fn glob_syntax(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 2);
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '[' => match class_bounds(&chars, i) {
                Some((negated, body, close)) => {
                    out.push('[');
                    if negated {
                        out.push('!');
                    }
                    out.extend(&chars[body..=close]);
                    i = close + 1;
                }
                None => {
                    out.push_str("[[]");
                    i += 1;
                }
            },
            '*' => {
                let run = chars[i..].iter().take_while(|c| **c == '*').count();
                let starts_segment = i == 0 || chars[i - 1] == '/';
                let ends_segment = chars.get(i + run).map_or(true, |c| *c == '/');
                if run == 2 && starts_segment && ends_segment {
                    out.push_str("**");
                } else {
                    out.push('*');
                }
                i += run;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// For the `[` at `open`, return whether the class is negated, the index of
/// its first body character, and the index of its closing `]`. The first
/// body character is always literal, so `[]a]` contains `]` and `a`.
fn class_bounds(chars: &[char], open: usize) -> Option<(bool, usize, usize)> {
    let negated = matches!(chars.get(open + 1), Some('!' | '^'));
    let body = open + 1 + usize::from(negated);
    if body >= chars.len() {
        return None;
    }
    chars[body + 1..]
        .iter()
        .position(|c| *c == ']')
        .map(|j| (negated, body, body + 1 + j))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matches(pattern: &str, id: &str) -> bool {
        PatternMatcher::compile(pattern).unwrap().is_match(id)
    }

    #[test]
    fn test_star_stays_within_segment() {
        assert!(matches("user/*", "user/42"));
        assert!(!matches("user/*", "user/42/avatar"));
        assert!(!matches("*", "user/42"));
        assert!(matches("a*", "abc"));
        assert!(matches("a*", "a"));
    }

    #[test]
    fn test_globstar_spans_segments() {
        assert!(matches("user/**", "user/42/avatar"));
        assert!(matches("**", "a/b/c"));
        assert!(matches("**/settings", "app/user/settings"));
    }

    #[test]
    fn test_question_and_classes() {
        assert!(matches("item-?", "item-7"));
        assert!(!matches("item-?", "item-77"));
        assert!(matches("v[0-9]", "v3"));
        assert!(!matches("v[!0-9]", "v3"));
        assert!(!matches("v[^0-9]", "v3"));
        assert!(matches("v[^0-9]", "vx"));
    }

    #[test]
    fn test_leading_dot_requires_literal() {
        assert!(!matches("*", ".hidden"));
        assert!(matches(".*", ".hidden"));
    }

    #[test]
    fn test_braces() {
        assert!(matches("user/{a,b}", "user/a"));
        assert!(matches("user/{a,b}", "user/b"));
        assert!(!matches("user/{a,b}", "user/c"));
        assert!(matches("chat/{room,dm}/*", "chat/dm/7"));
    }

    #[test]
    fn test_brace_expansion_order_and_nesting() {
        assert_eq!(expand_braces("{a,b}{1,2}"), vec!["a1", "a2", "b1", "b2"]);
        assert_eq!(expand_braces("x{a,{b,c}}"), vec!["xa", "xb", "xc"]);
        assert_eq!(expand_braces("lit{eral}"), vec!["lit{eral}"]);
        assert_eq!(expand_braces("open{a,b"), vec!["open{a,b"]);
    }

    #[test]
    fn test_negation() {
        assert!(!matches("!admin/*", "admin/root"));
        assert!(matches("!admin/*", "user/1"));
        assert!(matches("!!admin/*", "admin/root"));
    }

    #[test]
    fn test_comment_matches_nothing() {
        assert!(!matches("#*", "#anything"));
    }

    #[test]
    fn test_double_star_inside_segment_is_single_star() {
        assert!(matches("chat**", "chat42"));
        assert!(!matches("chat**", "chat/42"));
        assert!(matches("user/a**b", "user/aXYb"));
        assert!(matches("***", "abc"));
        assert!(!matches("***", "a/b"));
        assert!(matches("**x/y", "abx/y"));
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        assert!(matches("[oops", "[oops"));
        assert!(!matches("[oops", "oops"));
        assert!(matches("a[", "a["));
        assert!(matches("[]", "[]"));
        assert!(matches("x[!", "x[!"));
    }

    #[test]
    fn test_caret_only_rewritten_where_class_opens() {
        assert!(matches("[[^]", "^"));
        assert!(matches("[[^]", "["));
        assert!(!matches("[[^]", "a"));
        assert!(matches("[]^]", "]"));
        assert!(matches("[^]]", "x"));
        assert!(!matches("[^]]", "]"));
    }

    #[test]
    fn test_glob_syntax_rewrites() {
        assert_eq!(glob_syntax("a/**/b"), "a/**/b");
        assert_eq!(glob_syntax("a**b"), "a*b");
        assert_eq!(glob_syntax("[^a-z]"), "[!a-z]");
        assert_eq!(glob_syntax("[[^]"), "[[^]");
        assert_eq!(glob_syntax("[oops"), "[[]oops");
    }

    #[test]
    fn test_cache_returns_identical_matcher() {
        let cache = MatcherCache::new();
        let first = cache.get_or_compile(MessageKind::Record, "user/*");
        let second = cache.get_or_compile(MessageKind::Record, "user/*");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_is_keyed_by_kind() {
        let cache = MatcherCache::new();
        let record = cache.get_or_compile(MessageKind::Record, "x");
        let event = cache.get_or_compile(MessageKind::Event, "x");
        assert!(!Arc::ptr_eq(&record, &event));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_compiles_lenient_patterns() {
        let cache = MatcherCache::new();
        let matcher = cache.get_or_compile(MessageKind::Event, "[oops");
        assert!(matcher.is_match("[oops"));
        let matcher = cache.get_or_compile(MessageKind::Event, "chat**");
        assert!(matcher.is_match("chat42"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let table = PatternTable::from_entries([
            ("a*", json!({"type": "number"})),
            ("*", json!({"type": "string"})),
        ]);
        let cache = MatcherCache::new();
        let hit = cache.resolve(MessageKind::Event, &table, "abc").unwrap();
        assert_eq!(hit.pattern, "a*");
        let hit = cache.resolve(MessageKind::Event, &table, "xyz").unwrap();
        assert_eq!(hit.pattern, "*");
    }

    #[test]
    fn test_resolve_stops_compiling_after_first_match() {
        let table = PatternTable::from_entries([
            ("a*", json!({})),
            ("b*", json!({})),
        ]);
        let cache = MatcherCache::new();
        cache.resolve(MessageKind::Rpc, &table, "abc");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_resolve_none() {
        let table = PatternTable::from_entries([("user/*", json!({}))]);
        let cache = MatcherCache::new();
        assert!(cache.resolve(MessageKind::Record, &table, "order/1").is_none());
    }
}
