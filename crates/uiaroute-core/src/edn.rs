//! Structured-literal encoding for UIA command arguments.
//!
//! The on-device UIA engine reads composite arguments (vectors and maps) as
//! [EDN](https://github.com/edn-format/edn) text. This module renders a
//! [`serde_json::Value`] as EDN.
//!
//! # Encoding
//!
//! | Value | EDN |
//! |-------|-----|
//! | `null` | `nil` |
//! | `true` / `false` | `true` / `false` |
//! | number | decimal rendering (`1`, `2.5`) |
//! | string | `"..."` with `\\ \" \n \r \t` escaped |
//! | array | `[a b c]` |
//! | object | `{:key value, :other value}` |
//!
//! Object keys that are valid EDN symbol text become keywords. Any other key
//! (containing spaces, starting with a digit, empty) is written as a string.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use uiaroute_core::edn::to_edn;
//!
//! assert_eq!(to_edn(&json!([1, 2, 3])), "[1 2 3]");
//! assert_eq!(to_edn(&json!({"a": "b"})), r#"{:a "b"}"#);
//! ```

use serde_json::Value;

/// Renders `value` as EDN text.
pub fn to_edn(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("nil"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_key(key, out);
                out.push(' ');
                write_value(item, out);
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
}

fn write_key(key: &str, out: &mut String) {
    if is_keyword_name(key) {
        out.push(':');
        out.push_str(key);
    } else {
        write_string(key, out);
    }
}

/// Characters besides alphanumerics that EDN allows inside a symbol.
const SYMBOL_PUNCTUATION: &str = "*+!-_?<>=./";

/// Returns `true` if `name` can be written as `:name` without quoting.
fn is_keyword_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if first.is_ascii_digit() {
        return false;
    }
    // `-1`, `+2`, `.5` would read back as numbers.
    if matches!(first, '-' | '+' | '.') && chars.clone().next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    name.chars()
        .all(|c| c.is_alphanumeric() || SYMBOL_PUNCTUATION.contains(c))
}
