//! # Compact Value Codec
//!
//! Values travel on the bus as strings prefixed by a single type tag:
//!
//! | Wire | Decoded |
//! |------|---------|
//! | `T` / `F` | boolean |
//! | `L` | null |
//! | `U` | explicit undefined |
//! | `S<text>` | string |
//! | `N<text>` | number (NaN when malformed) |
//! | `O<json>` | parsed JSON (undefined when malformed) |
//!
//! Blank input, one-character input that is not a bare tag, and unknown
//! tags decode to [`DecodedValue::Absent`]. Decoding never fails.

use std::fmt;

use serde_json::Value;

/// A value decoded from the compact wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    /// No value was sent (blank, too short, or unknown tag).
    Absent,
    /// The sender explicitly sent `undefined`, or an `O` payload failed to
    /// parse.
    Undefined,
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A string payload, verbatim.
    String(String),
    /// A numeric payload. NaN and the infinities are kept as-is.
    Number(f64),
    /// A parsed JSON payload.
    Json(Value),
}

impl DecodedValue {
    /// Returns true for [`Absent`](Self::Absent) and
    /// [`Undefined`](Self::Undefined), which validate identically.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Absent | Self::Undefined)
    }

    /// Converts the value into a JSON instance for schema validation.
    ///
    /// Returns `None` for missing values and non-finite numbers, which have
    /// no JSON representation.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Absent | Self::Undefined => None,
            Self::Null => Some(Value::Null),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::String(s) => Some(Value::String(s.clone())),
            Self::Number(n) => number_to_json(*n),
            Self::Json(v) => Some(v.clone()),
        }
    }

    /// Short name of the variant, for operator output.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Json(_) => "json",
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent | Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{}", Value::String(s.clone())),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Decode a raw wire string.
pub fn decode(raw: &str) -> DecodedValue {
    if raw.trim().is_empty() {
        return DecodedValue::Absent;
    }
    match raw {
        "T" => return DecodedValue::Bool(true),
        "F" => return DecodedValue::Bool(false),
        "U" => return DecodedValue::Undefined,
        "L" => return DecodedValue::Null,
        _ => {}
    }

    let mut chars = raw.chars();
    let Some(tag) = chars.next() else {
        return DecodedValue::Absent;
    };
    let payload = chars.as_str();
    if payload.is_empty() {
        return DecodedValue::Absent;
    }

    match tag {
        'S' => DecodedValue::String(payload.to_string()),
        'N' => DecodedValue::Number(parse_number(payload)),
        'O' => match serde_json::from_str::<Value>(payload) {
            Ok(value) => DecodedValue::Json(value),
            Err(_) => DecodedValue::Undefined,
        },
        _ => DecodedValue::Absent,
    }
}

/// Encode a value into its canonical wire form.
///
/// [`DecodedValue::Absent`] has no wire form. An empty string encodes to `S`,
/// which the codec reads back as absent.
pub fn encode(value: &DecodedValue) -> Option<String> {
    match value {
        DecodedValue::Absent => None,
        DecodedValue::Undefined => Some("U".to_string()),
        DecodedValue::Null => Some("L".to_string()),
        DecodedValue::Bool(true) => Some("T".to_string()),
        DecodedValue::Bool(false) => Some("F".to_string()),
        DecodedValue::String(s) => Some(format!("S{s}")),
        DecodedValue::Number(n) => Some(format!("N{}", format_number(*n))),
        DecodedValue::Json(v) => serde_json::to_string(v).ok().map(|s| format!("O{s}")),
    }
}

/// Parse numeric text with the bus's number grammar.
///
/// Surrounding whitespace is ignored and blank text is zero. Accepts decimal
/// and exponent forms, `0x`/`0o`/`0b` integer literals, and signed
/// `Infinity`. Anything else is NaN.
fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    for (prefix, radix) in [
        ("0x", 16),
        ("0X", 16),
        ("0o", 8),
        ("0O", 8),
        ("0b", 2),
        ("0B", 2),
    ] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return parse_radix(digits, radix);
        }
    }
    // Rust's float grammar also accepts "inf" and "nan" spellings.
    let decimal_chars = trimmed
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !decimal_chars {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        n.to_string()
    }
}

/// Largest integer magnitude an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn number_to_json(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Some(Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_is_absent() {
        assert_eq!(decode(""), DecodedValue::Absent);
        assert_eq!(decode("   "), DecodedValue::Absent);
        assert_eq!(decode("\t\n"), DecodedValue::Absent);
    }

    #[test]
    fn test_bare_tags() {
        assert_eq!(decode("T"), DecodedValue::Bool(true));
        assert_eq!(decode("F"), DecodedValue::Bool(false));
        assert_eq!(decode("L"), DecodedValue::Null);
        assert_eq!(decode("U"), DecodedValue::Undefined);
    }

    #[test]
    fn test_bare_tag_with_padding_is_not_a_tag() {
        // "T " is two characters with an unknown tag.
        assert_eq!(decode("T "), DecodedValue::Absent);
    }

    #[test]
    fn test_single_char_payloadless_tag_is_absent() {
        assert_eq!(decode("S"), DecodedValue::Absent);
        assert_eq!(decode("N"), DecodedValue::Absent);
        assert_eq!(decode("O"), DecodedValue::Absent);
        assert_eq!(decode("x"), DecodedValue::Absent);
    }

    #[test]
    fn test_string_payload_is_verbatim() {
        assert_eq!(decode("Shello"), DecodedValue::String("hello".into()));
        assert_eq!(decode("S  spaced "), DecodedValue::String("  spaced ".into()));
        assert_eq!(decode("SNfoo"), DecodedValue::String("Nfoo".into()));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(decode("N5"), DecodedValue::Number(5.0));
        assert_eq!(decode("N-1.5e2"), DecodedValue::Number(-150.0));
        assert_eq!(decode("N .25 "), DecodedValue::Number(0.25));
        assert_eq!(decode("N0x1F"), DecodedValue::Number(31.0));
        assert_eq!(decode("N0b101"), DecodedValue::Number(5.0));
        assert_eq!(decode("N "), DecodedValue::Number(0.0));
        assert_eq!(decode("NInfinity"), DecodedValue::Number(f64::INFINITY));
        assert_eq!(decode("N-Infinity"), DecodedValue::Number(f64::NEG_INFINITY));
    }

    #[test]
    fn test_malformed_number_is_nan_not_absent() {
        for raw in ["Nabc", "Ninf", "NNaN", "N1e", "N0x", "N1_000"] {
            match decode(raw) {
                DecodedValue::Number(n) => assert!(n.is_nan(), "{raw} decoded to {n}"),
                other => panic!("{raw} decoded to {other:?}"),
            }
        }
    }

    #[test]
    fn test_object_payload() {
        assert_eq!(
            decode(r#"O{"a":[1,2]}"#),
            DecodedValue::Json(json!({"a": [1, 2]}))
        );
        assert_eq!(decode("O42"), DecodedValue::Json(json!(42)));
        assert_eq!(decode(r#"O"x""#), DecodedValue::Json(json!("x")));
    }

    #[test]
    fn test_invalid_json_is_undefined() {
        assert_eq!(decode("Ohello"), DecodedValue::Undefined);
        assert_eq!(decode("O{"), DecodedValue::Undefined);
    }

    #[test]
    fn test_unknown_tag_is_absent() {
        assert_eq!(decode("Xpayload"), DecodedValue::Absent);
    }

    #[test]
    fn test_encode_canonical_forms() {
        assert_eq!(encode(&DecodedValue::Absent), None);
        assert_eq!(encode(&DecodedValue::Bool(true)).as_deref(), Some("T"));
        assert_eq!(encode(&DecodedValue::Number(2.5)).as_deref(), Some("N2.5"));
        assert_eq!(encode(&DecodedValue::Number(7.0)).as_deref(), Some("N7"));
        assert_eq!(
            encode(&DecodedValue::Number(f64::NEG_INFINITY)).as_deref(),
            Some("N-Infinity")
        );
        assert_eq!(
            encode(&DecodedValue::Json(json!({"k": null}))).as_deref(),
            Some(r#"O{"k":null}"#)
        );
    }

    #[test]
    fn test_to_json_prefers_integers() {
        assert_eq!(DecodedValue::Number(5.0).to_json(), Some(json!(5)));
        assert_eq!(DecodedValue::Number(0.5).to_json(), Some(json!(0.5)));
        assert_eq!(DecodedValue::Number(f64::NAN).to_json(), None);
        assert_eq!(DecodedValue::Undefined.to_json(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(DecodedValue::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(DecodedValue::String("a\"b".into()).to_string(), r#""a\"b""#);
        assert_eq!(DecodedValue::Absent.to_string(), "undefined");
    }
}
