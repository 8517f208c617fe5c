//! Built-in modifiers
//!
//! String modifiers leave non-string values untouched and apply to every
//! element of a collection.
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use super::registry::ModifierFn;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::OnceLock;

static TAG_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

/// Every built-in modifier with its registry name
pub fn all() -> Vec<(&'static str, ModifierFn)> {
    vec![
        ("trim", trim as ModifierFn),
        ("ltrim", ltrim),
        ("rtrim", rtrim),
        ("strtolower", lowercase),
        ("strtoupper", uppercase),
        ("ucfirst", ucfirst),
        ("ucwords", ucwords),
        ("intval", intval),
        ("floatval", floatval),
        ("strip_tags", strip_tags),
        ("nl2br", nl2br),
        ("slug", slug),
    ]
}

fn map_strings(value: &Value, f: impl Fn(&str) -> String + Copy) -> Value {
    match value {
        Value::String(s) => Value::String(f(s)),
        Value::Array(items) => Value::Array(items.iter().map(|item| map_strings(item, f)).collect()),
        other => other.clone(),
    }
}

pub fn trim(value: &Value) -> Value {
    map_strings(value, |s| s.trim().to_string())
}

pub fn ltrim(value: &Value) -> Value {
    map_strings(value, |s| s.trim_start().to_string())
}

pub fn rtrim(value: &Value) -> Value {
    map_strings(value, |s| s.trim_end().to_string())
}

pub fn lowercase(value: &Value) -> Value {
    map_strings(value, str::to_lowercase)
}

pub fn uppercase(value: &Value) -> Value {
    map_strings(value, str::to_uppercase)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn ucfirst(value: &Value) -> Value {
    map_strings(value, capitalize)
}

pub fn ucwords(value: &Value) -> Value {
    map_strings(value, |s| {
        let mut out = String::with_capacity(s.len());
        let mut at_word_start = true;
        for c in s.chars() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = c.is_whitespace();
        }
        out
    })
}

/// Leading integer of a string, zero when there is none
pub fn intval(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim_start();
            let end = trimmed
                .char_indices()
                .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
                .map(|(i, c)| i + c.len_utf8())
                .last()
                .unwrap_or(0);
            Value::Number(trimmed[..end].parse::<i64>().unwrap_or(0).into())
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Number(i.into()),
            None => Value::Number((n.as_f64().unwrap_or(0.0).trunc() as i64).into()),
        },
        Value::Bool(b) => Value::Number(i64::from(*b).into()),
        Value::Array(items) => Value::Array(items.iter().map(intval).collect()),
        Value::Null | Value::Object(_) => Value::Number(0.into()),
    }
}

/// Leading decimal number of a string, zero when there is none
pub fn floatval(value: &Value) -> Value {
    let parsed = match value {
        Value::String(s) => {
            let trimmed = s.trim_start();
            let mut end = 0;
            let mut seen_dot = false;
            for (i, c) in trimmed.char_indices() {
                let accepted = c.is_ascii_digit()
                    || (i == 0 && (c == '-' || c == '+'))
                    || (c == '.' && !seen_dot);
                if !accepted {
                    break;
                }
                seen_dot |= c == '.';
                end = i + c.len_utf8();
            }
            trimmed[..end].parse::<f64>().unwrap_or(0.0)
        }
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Array(items) => return Value::Array(items.iter().map(floatval).collect()),
        Value::Null | Value::Object(_) => 0.0,
    };
    Number::from_f64(parsed)
        .map(Value::Number)
        .unwrap_or_else(|| Value::Number(0.into()))
}

pub fn strip_tags(value: &Value) -> Value {
    let Some(re) = TAG_REGEX.get_or_init(|| Regex::new(r"(?s)<[^>]*>").ok()) else {
        return value.clone();
    };
    map_strings(value, |s| re.replace_all(s, "").into_owned())
}

/// Insert `<br />` before every line break, `\r\n` counting as one
pub fn nl2br(value: &Value) -> Value {
    map_strings(value, |s| {
        let mut out = String::with_capacity(s.len());
        let mut previous = None;
        for c in s.chars() {
            let continues_crlf = c == '\n' && previous == Some('\r');
            if (c == '\n' || c == '\r') && !continues_crlf {
                out.push_str("<br />");
            }
            out.push(c);
            previous = Some(c);
        }
        out
    })
}

/// Lowercase ASCII words joined by dashes
pub fn slug(value: &Value) -> Value {
    map_strings(value, |s| {
        let mut out = String::with_capacity(s.len());
        let mut pending_dash = false;
        for c in s.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_modifiers_map_over_collections() {
        assert_eq!(trim(&json!([" a ", "b "])), json!(["a", "b"]));
        assert_eq!(uppercase(&json!(["a", 1])), json!(["A", 1]));
        assert_eq!(lowercase(&json!(null)), json!(null));
    }

    #[test]
    fn test_capitalization() {
        assert_eq!(ucfirst(&json!("élan vital")), json!("Élan vital"));
        assert_eq!(ucwords(&json!("hello big world")), json!("Hello Big World"));
    }

    #[test]
    fn test_intval() {
        assert_eq!(intval(&json!("42abc")), json!(42));
        assert_eq!(intval(&json!("  -7")), json!(-7));
        assert_eq!(intval(&json!("abc")), json!(0));
        assert_eq!(intval(&json!(3.9)), json!(3));
    }

    #[test]
    fn test_floatval() {
        assert_eq!(floatval(&json!("3.14xyz")), json!(3.14));
        assert_eq!(floatval(&json!("1.2.3")), json!(1.2));
        assert_eq!(floatval(&json!("nope")), json!(0.0));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags(&json!("<b>bold</b> move")), json!("bold move"));
    }

    #[test]
    fn test_nl2br() {
        assert_eq!(nl2br(&json!("a\nb")), json!("a<br />\nb"));
        assert_eq!(nl2br(&json!("a\r\nb")), json!("a<br />\r\nb"));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug(&json!("  Hello, World! 2025 ")), json!("hello-world-2025"));
    }
}
