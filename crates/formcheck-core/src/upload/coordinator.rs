//! Binding submitted files to upload fields
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use super::types::{
    has_id_placeholder, substitute_id, SendRequest, UploadOutcome, UploadRecord, UPLOAD_ROOT,
};
use super::UploadService;
use crate::error::Result;
use crate::schema::{FieldKind, FieldSpec, FormSchema};
use crate::values::{self, scalar_text, FileEntry, Values};
use rand::Rng;
use serde_json::Value;
use tracing::{debug, warn};

/// Outcomes of one upload pass, rebuilt for every submission
#[derive(Debug, Clone, Default)]
pub struct UploadPass {
    pub outcomes: Vec<(String, UploadOutcome)>,
    pub records: Vec<UploadRecord>,
}

impl UploadPass {
    /// Fields whose file had a disallowed extension
    pub fn mime_rejected(&self) -> Vec<String> {
        self.fields_where(|outcome| matches!(outcome, UploadOutcome::MimeRejected))
    }

    /// Fields whose file the service refused
    pub fn send_failed(&self) -> Vec<String> {
        self.fields_where(|outcome| matches!(outcome, UploadOutcome::SendFailed(_)))
    }

    /// Whether a file was stored for the field during this pass
    pub fn is_uploaded(&self, field: &str) -> bool {
        self.records.iter().any(|record| record.field == field)
    }

    fn fields_where(&self, predicate: impl Fn(&UploadOutcome) -> bool) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .map(|(field, _)| field.clone())
            .collect()
    }
}

/// Sends submitted files through an [`UploadService`]
pub struct UploadCoordinator<'a> {
    service: &'a dyn UploadService,
}

impl<'a> UploadCoordinator<'a> {
    pub fn new(service: &'a dyn UploadService) -> Self {
        Self { service }
    }

    /// Bind every submitted file, storing identifiers into `values`
    pub fn run(&self, schema: &FormSchema, files: &[FileEntry], values: &mut Values) -> UploadPass {
        let mut pass = UploadPass::default();
        for entry in files {
            let outcome = self.bind(&entry.field, entry, schema.get(&entry.field), values);
            if let UploadOutcome::Bound { handle, id } = &outcome {
                values.insert(entry.field.clone(), Value::String(id.clone()));
                pass.records.push(UploadRecord {
                    field: entry.field.clone(),
                    handle: handle.clone(),
                    id: id.clone(),
                });
            }
            pass.outcomes.push((entry.field.clone(), outcome));
        }
        pass
    }

    /// Decide what happens to one submitted file
    pub fn bind(
        &self,
        field: &str,
        entry: &FileEntry,
        spec: Option<&FieldSpec>,
        values: &Values,
    ) -> UploadOutcome {
        let Some(config) = spec.and_then(FieldSpec::upload_config) else {
            debug!(field, "file sent for a field that does not accept uploads");
            return UploadOutcome::Skipped;
        };
        if !values::is_empty(values.get(field)) {
            debug!(field, "value already posted, upload skipped");
            return UploadOutcome::Skipped;
        }

        let folder = format!("{}{}", UPLOAD_ROOT, config.folder.as_deref().unwrap_or(""));
        let file_name = config
            .file_name
            .as_ref()
            .map(|_| format!("file{}", rand::thread_rng().gen_range(0..=999_999)));

        if !self.service.accepts(entry, &config.allowed_types()) {
            warn!(field, file = %entry.name, "file type not allowed");
            return UploadOutcome::MimeRejected;
        }

        let request = SendRequest {
            entry,
            folder,
            file_name,
            resize: config.resize,
        };
        match self.service.send(&request) {
            Ok(stored) => {
                debug!(field, id = %stored.id, "file stored");
                UploadOutcome::Bound {
                    handle: stored.handle,
                    id: stored.id,
                }
            }
            Err(e) => {
                warn!(field, error = %e, "upload refused");
                UploadOutcome::SendFailed(e.to_string())
            }
        }
    }
}

/// Rewrite stored names once the caller's record has an id
///
/// Upload fields whose `fileName` contains `{id}` are renamed by upload id
/// to their final path. Files stored during the last pass are then renamed
/// after their template, using `record_id` or their own upload id, and
/// moved when their folder contains `{id}`.
pub fn finalize_names(
    schema: &FormSchema,
    values: &Values,
    records: &[UploadRecord],
    record_id: Option<&str>,
    service: &dyn UploadService,
) -> Result<()> {
    if let Some(record_id) = record_id {
        for (name, spec) in schema.iter() {
            let FieldKind::Upload(config) = &spec.kind else {
                continue;
            };
            if records.iter().any(|record| record.field == name) {
                continue;
            }
            let Some(template) = config.file_name.as_deref().filter(|t| has_id_placeholder(t))
            else {
                continue;
            };
            let Some(upload_id) = values
                .get(name)
                .filter(|value| !values::is_empty(Some(*value)))
                .and_then(scalar_text)
            else {
                continue;
            };

            let folder = substitute_id(config.folder.as_deref().unwrap_or(""), record_id);
            let new_path = format!(
                "{}{}{}",
                UPLOAD_ROOT,
                folder,
                substitute_id(template, record_id)
            );
            debug!(field = name, %new_path, "renaming stored upload");
            service.rename_by_id(&upload_id, &new_path)?;
        }
    }

    for record in records {
        let Some(config) = schema.get(&record.field).and_then(FieldSpec::upload_config) else {
            continue;
        };
        let id = record_id.unwrap_or(&record.id);
        if let Some(template) = &config.file_name {
            service.rename_file(&record.handle, &substitute_id(template, id))?;
        }
        if let Some(folder) = config.folder.as_deref().filter(|f| has_id_placeholder(f)) {
            let target = format!("{}{}", UPLOAD_ROOT, substitute_id(folder, id));
            service.move_to_folder(&record.handle, &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UploadConfig;
    use crate::upload::MemoryUploadService;
    use serde_json::json;

    fn file(field: &str, name: &str) -> FileEntry {
        FileEntry {
            field: field.to_string(),
            name: name.to_string(),
            mime_type: String::new(),
            tmp_path: format!("/tmp/{}", name),
            size: 10,
            error: 0,
        }
    }

    fn schema() -> FormSchema {
        FormSchema::new()
            .with_field(
                "resume",
                FieldSpec::upload(UploadConfig {
                    file_type: Some("pdf".to_string()),
                    folder: Some("users/{id}/".to_string()),
                    file_name: Some("cv_{id}".to_string()),
                    ..UploadConfig::default()
                }),
            )
            .with_field("name", FieldSpec::input())
    }

    #[test]
    fn test_successful_upload_binds_id() {
        let service = MemoryUploadService::new();
        let mut values = Values::new();
        let pass = UploadCoordinator::new(&service).run(
            &schema(),
            &[file("resume", "cv.pdf")],
            &mut values,
        );
        assert_eq!(values.get("resume"), Some(&json!("1")));
        assert!(pass.is_uploaded("resume"));
        assert!(pass.mime_rejected().is_empty());

        let stored = service.stored("1").unwrap();
        assert_eq!(stored.folder, "files/uploads/users/{id}/");
        assert!(stored.file_name.starts_with("file"));
    }

    #[test]
    fn test_rejections() {
        let service = MemoryUploadService::failing();
        let schema = schema().with_field(
            "photo",
            FieldSpec::upload(UploadConfig {
                file_type: Some("jpg".to_string()),
                ..UploadConfig::default()
            }),
        );
        let mut values = Values::new();
        let pass = UploadCoordinator::new(&service).run(
            &schema,
            &[file("resume", "cv.exe"), file("photo", "me.jpg")],
            &mut values,
        );
        assert_eq!(pass.mime_rejected(), vec!["resume".to_string()]);
        assert_eq!(pass.send_failed(), vec!["photo".to_string()]);
        assert!(values.is_empty());
    }

    #[test]
    fn test_posted_value_and_unknown_field_skip_upload() {
        let service = MemoryUploadService::new();
        let mut values = Values::new();
        values.insert("resume".to_string(), json!("17"));
        let pass = UploadCoordinator::new(&service).run(
            &schema(),
            &[file("resume", "cv.pdf"), file("name", "x.pdf"), file("ghost", "y.pdf")],
            &mut values,
        );
        assert!(pass
            .outcomes
            .iter()
            .all(|(_, outcome)| *outcome == UploadOutcome::Skipped));
        assert!(service.is_empty());
        assert_eq!(values.get("resume"), Some(&json!("17")));
    }

    #[test]
    fn test_finalize_names_with_record_id() {
        let service = MemoryUploadService::new();
        let schema = schema();
        let mut values = Values::new();
        let pass = UploadCoordinator::new(&service).run(
            &schema,
            &[file("resume", "cv.pdf")],
            &mut values,
        );
        finalize_names(&schema, &values, &pass.records, Some("42"), &service).unwrap();
        assert_eq!(
            service.stored("1").unwrap().path(),
            "files/uploads/users/42/cv_42.pdf"
        );
    }

    #[test]
    fn test_finalize_names_without_record_id_uses_upload_id() {
        let service = MemoryUploadService::new();
        let schema = schema();
        let mut values = Values::new();
        let pass = UploadCoordinator::new(&service).run(
            &schema,
            &[file("resume", "cv.pdf")],
            &mut values,
        );
        finalize_names(&schema, &values, &pass.records, None, &service).unwrap();
        assert_eq!(
            service.stored("1").unwrap().path(),
            "files/uploads/users/1/cv_1.pdf"
        );
    }

    #[test]
    fn test_finalize_names_renames_previously_stored_upload() {
        let service = MemoryUploadService::new();
        let schema = schema();
        let mut values = Values::new();
        UploadCoordinator::new(&service).run(&schema, &[file("resume", "cv.pdf")], &mut values);

        finalize_names(&schema, &values, &[], Some("9"), &service).unwrap();
        assert_eq!(
            service.stored("1").unwrap().path(),
            "files/uploads/users/9/cv_9.pdf"
        );
    }

    #[test]
    fn test_finalize_names_reports_storage_errors() {
        let service = MemoryUploadService::new();
        let mut values = Values::new();
        values.insert("resume".to_string(), json!("404"));
        let err = finalize_names(&schema(), &values, &[], Some("1"), &service).unwrap_err();
        assert!(matches!(err, crate::Error::Storage { .. }));
    }
}
