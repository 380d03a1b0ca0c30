//! Rendering report values as C++ literals.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

struct TypePatterns {
    string: Regex,
    vector: Regex,
    list: Regex,
}

fn patterns() -> &'static TypePatterns {
    static PATTERNS: OnceLock<TypePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| TypePatterns {
        string: Regex::new(r"^((std::|)string|(const\s+)?char\*)$").unwrap(),
        vector: Regex::new(r"^(std::|)vector<.*>$").unwrap(),
        list: Regex::new(r"^(std::|)list<.*>$").unwrap(),
    })
}

/// Escape a string for embedding in a C++ string or char literal.
///
/// Fixed table: backslash, the common control characters, and both quote
/// characters become two-character escapes; everything else passes through.
pub fn escape_cpp(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out
}

/// Render one report value as the text it contributes to an argument
/// literal: strings raw (quoting is the caller's type decision), scalars in
/// JSON form, arrays as comma-joined elements.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Render a report input value as a C++ expression of the declared
/// parameter type.
///
/// String types get the quoted-constructor form, sequence types the
/// braced-list constructor, `char` a quoted char literal, `long double` and
/// `float` their suffixed numeric forms; anything else is passed through
/// verbatim.
pub fn render_argument(arg_type: &str, value: &Value) -> String {
    let p = patterns();
    if p.string.is_match(arg_type) {
        format!("std::string(\"{}\")", escape_cpp(&value_text(value)))
    } else if p.vector.is_match(arg_type) || p.list.is_match(arg_type) {
        format!("{}({{{}}})", arg_type, value_text(value))
    } else if arg_type == "char" {
        format!("'{}'", escape_cpp(&value_text(value)))
    } else if arg_type == "long double" {
        format!("{}l", value_text(value))
    } else if arg_type == "float" {
        format!("{}f", value_text(value))
    } else {
        value_text(value)
    }
}

/// Render an expected-output value as a standalone C++ literal: strings
/// quoted and escaped, booleans lowered, numbers verbatim.
pub fn render_expected(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", escape_cpp(s)),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        other => other.to_string(),
    }
}

/// Whether a value contains the report's null sentinel anywhere.
pub fn contains_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.iter().any(contains_null),
        Value::Object(map) => map.values().any(contains_null),
        _ => false,
    }
}
