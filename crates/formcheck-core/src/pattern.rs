//! Verification patterns
//!
//! A field's `regExp` is either the name of a predefined pattern
//! (`Numeric`, `Mail`, ...) or a literal pattern written as
//! `custom:/body/flags`. Unknown names resolve to a pattern that never
//! matches, so a typo rejects input instead of accepting it.
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Prefix marking a literal pattern
pub const CUSTOM_PREFIX: &str = "custom:";

static NAMED_PATTERNS: OnceLock<HashMap<&'static str, Regex>> = OnceLock::new();

const NAMED_SOURCES: &[(&str, &str)] = &[
    ("alphanumeric", r"(?i)^[0-9a-z_\-]+$"),
    ("password", r"(?i)^[0-9a-z]{6,}$"),
    (
        "mail",
        r"^(?:[\w!#$%&'*+\-/=?^`{|}~]+\.)*[\w!#$%&'*+\-/=?^`{|}~]+@(?:(?:(?:[a-zA-Z0-9_](?:[a-zA-Z0-9_\-]{0,61}[a-zA-Z0-9_])?\.)+[a-zA-Z0-9_](?:[a-zA-Z0-9_\-]{0,61}[a-zA-Z0-9_])?)|(?:\[(?:(?:[01]?\d{1,2}|2[0-4]\d|25[0-5])\.){3}(?:[01]?\d{1,2}|2[0-4]\d|25[0-5])\]))$",
    ),
    ("numeric", r"^[0-9]+$"),
    (
        "date",
        r"^((19|20)[0-9]{2})-(0[1-9]|1[012])-(0[1-9]|[12][0-9]|3[01])$",
    ),
    ("text", r".{1,}"),
    ("url", r"(?i)^https?://www\.[a-z0-9_\-?&]+\.[a-z]{2,3}/$"),
    ("textnohtml", r"(?i)^[^<>]{1,}$"),
    ("hexa", r"(?i)^[0-9a-f]{6}$"),
];

fn named_patterns() -> &'static HashMap<&'static str, Regex> {
    NAMED_PATTERNS.get_or_init(|| {
        NAMED_SOURCES
            .iter()
            .filter_map(|(name, source)| Regex::new(source).ok().map(|re| (*name, re)))
            .collect()
    })
}

/// A declared pattern resolved to something that can be matched
#[derive(Debug, Clone)]
pub enum Pattern {
    Regex(Regex),
    /// Unknown pattern name: nothing matches
    Never,
}

impl Pattern {
    /// Resolve a `regExp` declaration
    ///
    /// Fails only when a custom pattern does not compile.
    pub fn resolve(declaration: &str) -> Result<Self> {
        if let Some(literal) = declaration.strip_prefix(CUSTOM_PREFIX) {
            return compile_literal(literal).map(Pattern::Regex);
        }
        Ok(named_patterns()
            .get(declaration.to_lowercase().as_str())
            .cloned()
            .map(Pattern::Regex)
            .unwrap_or(Pattern::Never))
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Pattern::Regex(re) => re.is_match(text),
            Pattern::Never => false,
        }
    }
}

/// Check a `regExp` declaration without keeping the compiled pattern
pub fn check_declaration(declaration: &str) -> Result<()> {
    Pattern::resolve(declaration).map(|_| ())
}

/// Compile `/body/flags`; a literal without delimiters is taken as the body
fn compile_literal(literal: &str) -> Result<Regex> {
    let (body, flags) = split_delimited(literal);
    let mut builder = RegexBuilder::new(body);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            'u' => {
                builder.unicode(true);
            }
            other => {
                return Err(Error::Configuration {
                    message: format!("unsupported pattern flag '{}' in '{}'", other, literal),
                    field: None,
                })
            }
        }
    }
    builder.build().map_err(|e| Error::Configuration {
        message: format!("invalid pattern '{}': {}", literal, e),
        field: None,
    })
}

fn split_delimited(literal: &str) -> (&str, &str) {
    let mut chars = literal.chars();
    let Some(delimiter) = chars.next() else {
        return (literal, "");
    };
    if delimiter.is_alphanumeric() || delimiter.is_whitespace() || delimiter == '\\' {
        return (literal, "");
    }
    let rest = &literal[delimiter.len_utf8()..];
    match rest.rfind(delimiter) {
        Some(end) => (&rest[..end], &rest[end + delimiter.len_utf8()..]),
        None => (literal, ""),
    }
}

/// Whether a string is made of ASCII digits only
pub fn is_numeric(text: &str) -> bool {
    named_patterns()
        .get("numeric")
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Whether a string is a `YYYY-MM-DD` date that exists in the calendar
pub fn is_date(text: &str) -> bool {
    let shape_ok = named_patterns()
        .get("date")
        .map(|re| re.is_match(text))
        .unwrap_or(false);
    shape_ok && NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}
