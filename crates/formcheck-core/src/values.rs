//! Submitted values and the emptiness rules applied to them
//!
//! Form submissions arrive as strings, numbers and lists of those. A value
//! is "empty" when it is absent, null, `false`, zero, `""`, `"0"` or an
//! empty collection. Required-field checks are stricter about what counts
//! as missing: `0` and `"0"` are legitimate answers there.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Ordered set of bound values, keyed by field name
pub type Values = Map<String, Value>;

/// Characters stripped from both ends of required values
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Raw data of one file sent with a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Field the file was sent for
    pub field: String,
    /// Client-side file name
    pub name: String,
    /// MIME type announced by the client
    #[serde(default)]
    pub mime_type: String,
    /// Location of the received bytes
    pub tmp_path: String,
    #[serde(default)]
    pub size: u64,
    /// Transfer status code, zero when the transfer completed
    #[serde(default)]
    pub error: i32,
}

impl FileEntry {
    /// Lowercased extension of the client-side file name
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// One submission of a form: posted values plus files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub values: Values,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn with_file(mut self, file: FileEntry) -> Self {
        self.files.push(file);
        self
    }

    /// A submission carrying no posted values is not a submission of this form
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Whether a value counts as empty
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty() || s == "0",
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}

/// Whether a required field should be reported as missing
///
/// Same as [`is_empty`] except that integer `0` and the string `"0"` are
/// present values.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) if s == "0" => false,
        Some(Value::Number(n)) if n.as_i64() == Some(0) || n.as_u64() == Some(0) => false,
        other => is_empty(other),
    }
}

/// Trim a string, or every string element of a collection
pub fn trim_value(value: &mut Value) {
    match value {
        Value::String(s) => trim_in_place(s),
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Value::String(s) = item {
                    trim_in_place(s);
                }
            }
        }
        _ => {}
    }
}

fn trim_in_place(s: &mut String) {
    let trimmed = s.trim_matches(TRIM_CHARS);
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}

/// Text form of a scalar value, `None` for collections and booleans
pub fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

/// Equality between two submitted values
///
/// Scalars compare by their text form so a number posted as `1` equals the
/// string `"1"`; an absent value equals `""`. Collections compare exactly.
pub fn loosely_equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    fn text(value: Option<&Value>) -> Option<Cow<'_, str>> {
        match value {
            None | Some(Value::Null) => Some(Cow::Borrowed("")),
            Some(Value::Bool(true)) => Some(Cow::Borrowed("1")),
            Some(Value::Bool(false)) => Some(Cow::Borrowed("")),
            Some(other) => scalar_text(other),
        }
    }

    match (text(left), text(right)) {
        (Some(l), Some(r)) => l == r,
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_empty() {
        assert!(is_empty(None));
        assert!(is_empty(Some(&json!(null))));
        assert!(is_empty(Some(&json!(""))));
        assert!(is_empty(Some(&json!("0"))));
        assert!(is_empty(Some(&json!(0))));
        assert!(is_empty(Some(&json!([]))));
        assert!(is_empty(Some(&json!(false))));
        assert!(!is_empty(Some(&json!(" "))));
        assert!(!is_empty(Some(&json!([""]))));
        assert!(!is_empty(Some(&json!("abc"))));
    }

    #[test]
    fn test_zero_is_not_missing() {
        assert!(!is_missing(Some(&json!(0))));
        assert!(!is_missing(Some(&json!("0"))));
        assert!(is_missing(Some(&json!(""))));
        assert!(is_missing(Some(&json!(0.0))));
        assert!(is_missing(None));
    }

    #[test]
    fn test_trim_value() {
        let mut value = json!("  hello \n");
        trim_value(&mut value);
        assert_eq!(value, json!("hello"));

        let mut value = json!([" a ", 3, "\tb"]);
        trim_value(&mut value);
        assert_eq!(value, json!(["a", 3, "b"]));
    }

    #[test]
    fn test_loosely_equal() {
        assert!(loosely_equal(Some(&json!("1")), Some(&json!(1))));
        assert!(loosely_equal(None, Some(&json!(""))));
        assert!(!loosely_equal(Some(&json!("abc123")), Some(&json!("abc124"))));
        assert!(loosely_equal(Some(&json!(["a"])), Some(&json!(["a"]))));
        assert!(!loosely_equal(Some(&json!(["a"])), Some(&json!("a"))));
    }

    #[test]
    fn test_file_extension() {
        let file = |name: &str| FileEntry {
            field: "f".to_string(),
            name: name.to_string(),
            mime_type: String::new(),
            tmp_path: "/tmp/x".to_string(),
            size: 0,
            error: 0,
        };
        assert_eq!(file("Report.PDF").extension().as_deref(), Some("pdf"));
        assert_eq!(file("archive.tar.gz").extension().as_deref(), Some("gz"));
        assert_eq!(file("README").extension(), None);
        assert_eq!(file("trailing.").extension(), None);
    }
}
