//! Load-time schema checks
//!
//! Defects that would abort a validation pass are reported as soon as a
//! form is built or a field is added: unknown modifier names, custom
//! patterns that do not compile and required fields that would be matched
//! without a pattern.
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::modifier::ModifierRegistry;
use crate::pattern::{self, CUSTOM_PREFIX};
use crate::schema::{attr, FieldKind, FieldSpec, FormSchema};

/// Schema checker run before any submission is processed
pub struct Preflight<'a> {
    registry: &'a ModifierRegistry,
}

impl<'a> Preflight<'a> {
    pub fn new(registry: &'a ModifierRegistry) -> Self {
        Self { registry }
    }

    /// Every defect of a schema, in field order
    pub fn issues(&self, schema: &FormSchema) -> Vec<Error> {
        schema
            .iter()
            .filter_map(|(name, spec)| self.check_field(schema, name, spec).err())
            .collect()
    }

    /// Fail with the first defect of a schema
    pub fn check(&self, schema: &FormSchema) -> Result<()> {
        match self.issues(schema).into_iter().next() {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }

    /// Check one field in the context of its schema
    pub fn check_field(&self, schema: &FormSchema, name: &str, spec: &FieldSpec) -> Result<()> {
        self.registry.check(name, &spec.input_modifiers)?;
        self.registry.check(name, &spec.output_modifiers)?;

        if spec.reg_exp.starts_with(CUSTOM_PREFIX) {
            pattern::check_declaration(&spec.reg_exp).map_err(|e| {
                Error::configuration(name, format!("field '{}': {}", name, e))
            })?;
        }

        if spec.require && spec.reg_exp.is_empty() && reaches_pattern_match(schema, spec) {
            return Err(missing_pattern(name));
        }
        Ok(())
    }
}

/// Error raised for a required field without a pattern
pub fn missing_pattern(name: &str) -> Error {
    Error::configuration(
        name,
        format!("required field '{}' must declare a regExp", name),
    )
}

/// Whether a required field can get past its relational checks
///
/// Captchas, submit buttons, upload fields and confirm fields with a
/// declared target all end before any pattern is matched.
fn reaches_pattern_match(schema: &FormSchema, spec: &FieldSpec) -> bool {
    if matches!(spec.kind, FieldKind::Captcha(_) | FieldKind::Upload(_)) {
        return false;
    }
    if spec.attribute(attr::TYPE).and_then(|t| t.as_str()) == Some("submit") {
        return false;
    }
    match &spec.is_confirm_for {
        Some(target) => !schema.contains(target),
        None => true,
    }
}
