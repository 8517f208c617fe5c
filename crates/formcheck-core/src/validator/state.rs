//! Per-pass state of the relational validator
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use crate::values::Values;
use serde::Serialize;
use std::collections::HashSet;

/// Classified failures of one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Failures {
    /// Upload fields whose file type is not allowed
    pub uploads_fail_mime_type: Vec<String>,
    /// Upload fields whose file could not be stored
    pub uploads_send_fail: Vec<String>,
    /// `(field, target)` alternative pairs left both empty
    pub inputs_with_alternative: Vec<(String, String)>,
    /// `(field, target)` confirm pairs holding different values
    pub inputs_with_confirm: Vec<(String, String)>,
    pub inputs_require: Vec<String>,
    pub inputs_incorrect: Vec<String>,
}

impl Failures {
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Number of failure entries over every category
    pub fn count(&self) -> usize {
        self.uploads_fail_mime_type.len()
            + self.uploads_send_fail.len()
            + self.inputs_with_alternative.len()
            + self.inputs_with_confirm.len()
            + self.inputs_require.len()
            + self.inputs_incorrect.len()
    }
}

/// Values and failures threaded through one relational pass
#[derive(Debug, Clone, Default)]
pub struct PassContext {
    /// Bound values, cleaned as the pass goes
    pub values: Values,
    pub failures: Failures,
    /// Fields whose file was stored during this pass
    pub uploaded: HashSet<String>,
}

impl PassContext {
    pub fn new(values: Values) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    pub fn with_uploaded<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uploaded.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn is_uploaded(&self, field: &str) -> bool {
        self.uploaded.contains(field)
    }

    pub(crate) fn require(&mut self, field: &str) {
        self.failures.inputs_require.push(field.to_string());
    }

    pub(crate) fn incorrect(&mut self, field: &str) {
        self.failures.inputs_incorrect.push(field.to_string());
    }

    pub(crate) fn alternative(&mut self, field: &str, target: &str) {
        self.failures
            .inputs_with_alternative
            .push((field.to_string(), target.to_string()));
    }

    pub(crate) fn confirm(&mut self, field: &str, target: &str) {
        self.failures
            .inputs_with_confirm
            .push((field.to_string(), target.to_string()));
    }
}
