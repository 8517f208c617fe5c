//! Schema normalization
//!
//! Fills every field with the defaults of its kind so the rest of the engine
//! never has to reason about absent configuration. Common attributes
//! (`label`, `require`, `regExp`, modifiers, ...) already default when a
//! schema is deserialized; this pass adds the kind-specific defaults and
//! resolves labels.

use super::types::{attr, FieldKind, FieldSpec};
use super::{FormSchema, DEFAULT_CAPTCHA_LENGTH, DEFAULT_FILE_TYPES};
use crate::collaborators::Dictionary;
use serde_json::{Map, Value};
use tracing::trace;

/// Applies field defaults and label resolution to a schema
pub struct Normalizer<'a> {
    dictionary: Option<&'a dyn Dictionary>,
}

impl<'a> Normalizer<'a> {
    /// Normalizer for forms whose labels are literal text
    pub fn new() -> Self {
        Self { dictionary: None }
    }

    /// Normalizer for forms whose labels are dictionary keys
    pub fn localized(dictionary: &'a dyn Dictionary) -> Self {
        Self {
            dictionary: Some(dictionary),
        }
    }

    /// Normalize every field of the schema
    pub fn normalize(&self, schema: &mut FormSchema) {
        for (name, spec) in schema.iter_mut() {
            trace!(field = name, tag = spec.kind.tag(), "normalizing field");
            normalize_field(spec, self.dictionary);
        }
    }

    /// Normalize only the fields accepted by `filter`
    pub fn normalize_where<F>(&self, schema: &mut FormSchema, mut filter: F)
    where
        F: FnMut(&str) -> bool,
    {
        for (name, spec) in schema.iter_mut() {
            if filter(name) {
                trace!(field = name, tag = spec.kind.tag(), "normalizing field");
                normalize_field(spec, self.dictionary);
            }
        }
    }
}

impl Default for Normalizer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a single field
///
/// Without a dictionary this is idempotent. With one, labels are looked up
/// on every call, so callers guard against normalizing a field twice.
pub fn normalize_field(spec: &mut FieldSpec, dictionary: Option<&dyn Dictionary>) {
    match &mut spec.kind {
        FieldKind::Upload(config) => {
            config
                .file_type
                .get_or_insert_with(|| DEFAULT_FILE_TYPES.to_string());
        }
        FieldKind::Captcha(config) => {
            config.length.get_or_insert(DEFAULT_CAPTCHA_LENGTH);
        }
        FieldKind::Select(config) => {
            config.parameters.get_or_insert_with(Map::new);
        }
        _ => {}
    }

    match dictionary {
        Some(dictionary) if !spec.label.is_empty() => {
            if let Some(term) = dictionary.term(&spec.label) {
                spec.label = term;
            }
        }
        Some(_) => {}
        None => {
            if spec.label.is_empty() {
                match spec.attributes.get(attr::PLACEHOLDER) {
                    Some(Value::String(placeholder)) => spec.error_label = placeholder.clone(),
                    Some(Value::Null) | None => {}
                    Some(other) => spec.error_label = other.to_string(),
                }
            }
        }
    }
}
