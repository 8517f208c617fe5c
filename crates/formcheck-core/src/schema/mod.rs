//! Form schema: the ordered set of field definitions of one form
//!
//! This module provides:
//! - [`FieldSpec`] and [`FieldKind`]: the declarative description of a field
//! - [`FormSchema`]: an insertion-ordered map from field name to spec
//! - [`normalizer`]: fills every field with its defaults before a pass
//!
//! Field order matters: it is the order fields are validated, reported and
//! rendered in, so the schema keeps the order fields were declared in.
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

pub mod normalizer;
pub mod types;

pub use normalizer::{normalize_field, Normalizer};
pub use types::{
    attr, Attributes, CaptchaConfig, FieldKind, FieldOption, FieldSpec, FromModel, SelectConfig,
    UploadConfig,
};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Extensions accepted by upload fields that declare no `fileType`
pub const DEFAULT_FILE_TYPES: &str = "txt|rtf|pdf|doc|docx|xls|xlsx|csv|ppt|pptx";

/// Challenge length of captcha fields that declare none
pub const DEFAULT_CAPTCHA_LENGTH: usize = 5;

/// Label every captcha field is reported under
pub const CAPTCHA_LABEL: &str = "Captcha";

/// Ordered mapping from field name to field definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSchema {
    fields: Vec<(String, FieldSpec)>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Insert or replace a field
    ///
    /// A replaced field keeps its position; a new field is appended.
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.fields.push((name, spec)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldSpec> {
        let index = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(index).1)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldSpec> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut FieldSpec)> {
        self.fields.iter_mut().map(|(n, s)| (n.as_str(), s))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Label of a field as used in error messages, falling back to its name
    pub fn display_label<'a>(&'a self, name: &'a str) -> &'a str {
        match self.get(name) {
            Some(spec) => spec.display_label(),
            None => name,
        }
    }
}

impl Serialize for FormSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, spec) in &self.fields {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FormSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = FormSchema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field definitions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FormSchema, A::Error> {
                let mut schema = FormSchema::new();
                while let Some((name, spec)) = access.next_entry::<String, FieldSpec>()? {
                    schema.insert(name, spec);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

impl FromIterator<(String, FieldSpec)> for FormSchema {
    fn from_iter<I: IntoIterator<Item = (String, FieldSpec)>>(iter: I) -> Self {
        let mut schema = FormSchema::new();
        for (name, spec) in iter {
            schema.insert(name, spec);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_keeps_declaration_order() {
        let schema: FormSchema = serde_json::from_value(json!({
            "zeta": {"tag": "input"},
            "alpha": {"tag": "textarea"},
            "mid": {"tag": "select"}
        }))
        .unwrap();

        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut schema = FormSchema::new()
            .with_field("a", FieldSpec::input())
            .with_field("b", FieldSpec::input());
        schema.insert("a", FieldSpec::textarea());

        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(schema.get("a").unwrap().kind, FieldKind::Textarea);
    }

    #[test]
    fn test_remove() {
        let mut schema = FormSchema::new().with_field("a", FieldSpec::input());
        assert!(schema.remove("a").is_some());
        assert!(schema.remove("a").is_none());
        assert!(schema.is_empty());
    }

    #[test]
    fn test_serialize_roundtrip_preserves_order() {
        let schema = FormSchema::new()
            .with_field("name", FieldSpec::input().with_label("Name"))
            .with_field("bio", FieldSpec::textarea());
        let text = serde_json::to_string(&schema).unwrap();
        assert!(text.find("\"name\"").unwrap() < text.find("\"bio\"").unwrap());
        let back: FormSchema = serde_json::from_str(&text).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_display_label_falls_back_to_name() {
        let schema = FormSchema::new();
        assert_eq!(schema.display_label("ghost"), "ghost");
    }
}
