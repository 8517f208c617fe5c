//! The form facade
//!
//! A [`Form`] owns one schema and runs submissions against it. Each call to
//! [`Form::is_valid`] starts from a clean state: uploads are bound, the
//! relational pass runs, and the outcome stays available through
//! [`Form::values`], [`Form::failures`] and [`Form::error`] until the next
//! call.
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use crate::collaborators::{Dictionary, Services};
use crate::error::Result;
use crate::modifier::ModifierRegistry;
use crate::report::ErrorReport;
use crate::schema::{FieldSpec, FormSchema, Normalizer};
use crate::upload::{self, UploadCoordinator, UploadRecord, UploadService};
use crate::validator::{Failures, PassContext, Preflight, RelationalValidator};
use crate::values::{Submission, Values};
use crate::view::{self, FormView};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Per-form behavior switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Labels are dictionary keys resolved during normalization
    pub localize_labels: bool,
}

/// Outcome of the last processed submission
#[derive(Debug, Clone, Default)]
struct LastPass {
    values: Values,
    failures: Failures,
}

/// A form schema together with the state of its last submission
#[derive(Debug, Clone)]
pub struct Form {
    name: String,
    schema: FormSchema,
    options: FormOptions,
    registry: ModifierRegistry,
    normalized: HashSet<String>,
    last_pass: Option<LastPass>,
    records: Vec<UploadRecord>,
}

impl Form {
    /// Create a form, rejecting schemas with configuration defects
    pub fn new(name: impl Into<String>, schema: FormSchema, registry: ModifierRegistry) -> Result<Self> {
        Preflight::new(&registry).check(&schema)?;
        Ok(Self {
            name: name.into(),
            schema,
            options: FormOptions::default(),
            registry,
            normalized: HashSet::new(),
            last_pass: None,
            records: Vec::new(),
        })
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn registry(&self) -> &ModifierRegistry {
        &self.registry
    }

    /// Set an attribute of a field; `false` when the field does not exist
    pub fn set_property(&mut self, field: &str, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.schema.get_mut(field) {
            Some(spec) => {
                spec.attributes.insert(key.into(), value.into());
                true
            }
            None => false,
        }
    }

    /// Add or replace a field
    pub fn set_input(&mut self, name: impl Into<String>, spec: FieldSpec) -> Result<()> {
        let name = name.into();
        Preflight::new(&self.registry).check_field(&self.schema, &name, &spec)?;
        self.normalized.remove(&name);
        self.schema.insert(name, spec);
        Ok(())
    }

    /// Remove a field, returning its definition
    pub fn unset_input(&mut self, name: &str) -> Option<FieldSpec> {
        self.normalized.remove(name);
        self.schema.remove(name)
    }

    pub fn input(&self, name: &str) -> Option<&FieldSpec> {
        self.schema.get(name)
    }

    pub fn inputs(&self) -> &FormSchema {
        &self.schema
    }

    /// Fill defaults of every field not normalized yet
    pub fn normalize(&mut self, dictionary: &dyn Dictionary) {
        let normalizer = if self.options.localize_labels {
            Normalizer::localized(dictionary)
        } else {
            Normalizer::new()
        };
        let normalized = &mut self.normalized;
        normalizer.normalize_where(&mut self.schema, |name| normalized.insert(name.to_string()));
    }

    /// Process a submission and tell whether it is acceptable
    ///
    /// A submission without any value for this form is never valid and
    /// leaves no state behind. Schema defects abort with an error.
    #[instrument(skip_all, fields(form = %self.name))]
    pub fn is_valid(&mut self, submission: &Submission, services: Services<'_>) -> Result<bool> {
        self.normalize(services.dictionary);
        self.last_pass = None;
        self.records.clear();

        if submission.is_empty() {
            debug!("empty submission");
            return Ok(false);
        }

        let mut values = submission.values.clone();
        let uploads = UploadCoordinator::new(services.uploads).run(
            &self.schema,
            &submission.files,
            &mut values,
        );

        let mut ctx = PassContext::new(values)
            .with_uploaded(uploads.records.iter().map(|record| record.field.clone()));
        ctx.failures.uploads_fail_mime_type = uploads.mime_rejected();
        ctx.failures.uploads_send_fail = uploads.send_failed();

        let validator = RelationalValidator::new(&self.name, &self.registry, services.challenges);
        let valid = validator.validate(&self.schema, &mut ctx)?;

        info!(
            valid,
            failures = ctx.failures.count(),
            uploads = uploads.records.len(),
            "submission processed"
        );
        self.records = uploads.records;
        self.last_pass = Some(LastPass {
            values: ctx.values,
            failures: ctx.failures,
        });
        Ok(valid)
    }

    /// Cleaned values of the last processed submission
    pub fn values(&self) -> Option<&Values> {
        self.last_pass.as_ref().map(|pass| &pass.values)
    }

    /// Classified failures of the last processed submission
    pub fn failures(&self) -> Option<&Failures> {
        self.last_pass.as_ref().map(|pass| &pass.failures)
    }

    /// Aggregated failure message, empty when no submission was processed
    pub fn error(&self, dictionary: &dyn Dictionary) -> String {
        match &self.last_pass {
            Some(pass) => ErrorReport::new(&self.schema, dictionary).describe(&pass.failures),
            None => String::new(),
        }
    }

    /// Uploads stored by the last submission and not finalized yet
    pub fn upload_records(&self) -> &[UploadRecord] {
        &self.records
    }

    /// Rename stored uploads once the caller's record is persisted
    pub fn finalize_names(&mut self, record_id: Option<&str>, uploads: &dyn UploadService) -> Result<()> {
        let empty = Values::new();
        let values = self.values().unwrap_or(&empty);
        upload::finalize_names(&self.schema, values, &self.records, record_id, uploads)?;
        self.records.clear();
        Ok(())
    }

    /// Copy values into the fields' attributes for redisplay
    pub fn inject_values(&mut self, values: &Values) {
        view::inject_values(&mut self.schema, values);
    }

    /// Build the renderer's view of the form
    ///
    /// Values of the last submission, if any, are injected first.
    pub fn prepare_view(&mut self, services: Services<'_>) -> Result<FormView> {
        self.normalize(services.dictionary);
        let submitted = match &self.last_pass {
            Some(pass) => {
                view::inject_values(&mut self.schema, &pass.values);
                true
            }
            None => false,
        };
        view::prepare_view(
            &self.name,
            &self.schema,
            submitted,
            self.options.localize_labels,
            services,
        )
    }
}
