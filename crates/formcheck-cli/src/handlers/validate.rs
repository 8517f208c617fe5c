//! Validate command handler

use super::utils::{load_form, read_document, Sources, SubmissionDocument};
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{redaction, timing::Timer};
use crate::output::{OutputWriter, StoredUploadSummary, SubmissionReport};
use formcheck_core::UploadService;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
///
/// Prints the report and fails with [`Error::Rejected`] when the submission
/// is not acceptable.
#[instrument(skip(config, output), fields(schema = %args.schema.display(), submission = %args.submission.display()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details(
        "validate_command",
        &format!("schema: {}", args.schema.display()),
    );

    if args.record_id.as_deref().is_some_and(str::is_empty) {
        return Err(Error::invalid_args("--record-id must not be empty"));
    }

    let sources = Sources::load(config, &args.sources)?;
    let mut form = load_form(&args.schema, args.form.as_deref(), sources.localize_labels)?;
    let document: SubmissionDocument = read_document(&args.submission)?;
    sources.register_challenges(form.name(), &document.challenges);

    if tracing::enabled!(tracing::Level::DEBUG) {
        let mut logged = Value::Object(document.submission.values.clone());
        redaction::redact_json_value(&mut logged);
        debug!(values = %logged, files = document.submission.files.len(), "submission loaded");
    }
    output.info(&format!(
        "Validating {} against form '{}'",
        args.submission.display(),
        form.name()
    ))?;

    let pass_timer = Timer::new("validation_pass");
    let valid = form.is_valid(&document.submission, sources.services())?;
    pass_timer.finish();

    let records = form.upload_records().to_vec();
    if valid && !records.is_empty() {
        form.finalize_names(args.record_id.as_deref(), &sources.uploads)?;
        info!(uploads = records.len(), record_id = ?args.record_id, "stored upload names finalized");
    } else if !records.is_empty() {
        warn!(uploads = records.len(), "submission rejected, stored uploads left as received");
    }

    let mut values = form.values().cloned();
    if config.output.redact && !args.reveal {
        if let Some(values) = values.as_mut() {
            let mut redacted = Value::Object(std::mem::take(values));
            redaction::redact_json_value(&mut redacted);
            if let Value::Object(map) = redacted {
                *values = map;
            }
        }
    }

    let failures = form.failures().cloned();
    let failure_count = failures.as_ref().map(|f| f.count()).unwrap_or(0);
    let report = SubmissionReport {
        form: form.name().to_string(),
        valid,
        values,
        failures,
        message: form.error(&sources.dictionary),
        stored_uploads: records
            .iter()
            .map(|record| StoredUploadSummary {
                field: record.field.clone(),
                id: record.id.clone(),
                path: sources.uploads.resolve_path_by_id(None, &record.id),
            })
            .collect(),
    };
    output.report(&report)?;

    if valid {
        info!(
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "submission accepted"
        );
        Ok(())
    } else {
        Err(Error::Rejected {
            failures: failure_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{OutputFormat, SourceArgs};
    use crate::config::ConfigBuilder;
    use serde_json::json;
    use std::cell::RefCell;
    use std::fs;
    use std::io::{self, Write};
    use std::path::{Path, PathBuf};
    use std::rc::Rc;
    use tempfile::{tempdir, TempDir};

    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn json(&self) -> Value {
            serde_json::from_slice(&self.0.borrow()).unwrap()
        }
    }

    fn write_json(dir: &Path, name: &str, value: Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
        path
    }

    fn signup_schema(dir: &TempDir) -> PathBuf {
        write_json(
            dir.path(),
            "form.signup.json",
            json!({
                "login": {"tag": "input", "label": "Login", "require": true, "regExp": "AlphaNumeric",
                          "inputModifiers": ["trim"]},
                "password": {"tag": "input", "label": "Password", "require": true, "regExp": "Password"},
                "resume": {"tag": "upload", "label": "Resume", "fileType": "pdf",
                           "folder": "applicants/{id}/", "fileName": "resume_{id}"}
            }),
        )
    }

    fn args(schema: PathBuf, submission: PathBuf, record_id: Option<&str>) -> ValidateArgs {
        ValidateArgs {
            schema,
            submission,
            form: None,
            record_id: record_id.map(str::to_string),
            reveal: false,
            sources: SourceArgs::default(),
        }
    }

    fn run(dir: &TempDir, args: ValidateArgs) -> (Result<()>, Value) {
        let config = ConfigBuilder::new().upload_root(dir.path().join("store")).build();
        let captured = Captured::default();
        let mut output =
            OutputWriter::with_writer(OutputFormat::Json, false, false, 0, Box::new(captured.clone()));
        let result = handle_validate(args, &config, &mut output);
        (result, captured.json())
    }

    #[test]
    fn test_accepted_submission_with_upload() {
        let dir = tempdir().unwrap();
        let schema = signup_schema(&dir);
        let received = dir.path().join("php-upload");
        fs::write(&received, b"%PDF").unwrap();
        let submission = write_json(
            dir.path(),
            "post.json",
            json!({
                "values": {"login": "  ada ", "password": "abc123"},
                "files": [{"field": "resume", "name": "cv.pdf", "tmpPath": received.display().to_string()}]
            }),
        );

        let (result, report) = run(&dir, args(schema, submission, Some("42")));
        assert!(result.is_ok());
        assert_eq!(report["form"], json!("signup"));
        assert_eq!(report["valid"], json!(true));
        assert_eq!(report["values"]["login"], json!("ada"));
        assert_eq!(report["values"]["password"], json!("***"));
        assert_eq!(
            report["storedUploads"][0]["path"],
            json!("files/uploads/applicants/42/resume_42.pdf")
        );
        assert!(dir
            .path()
            .join("store/files/uploads/applicants/42/resume_42.pdf")
            .exists());
    }

    #[test]
    fn test_rejected_submission_reports_failures() {
        let dir = tempdir().unwrap();
        let schema = signup_schema(&dir);
        let submission = write_json(
            dir.path(),
            "post.json",
            json!({"values": {"login": "not valid!"}}),
        );

        let (result, report) = run(&dir, args(schema, submission, None));
        assert!(matches!(result, Err(Error::Rejected { failures: 2 })));
        assert_eq!(report["valid"], json!(false));
        assert_eq!(report["failures"]["inputsRequire"], json!(["password"]));
        assert_eq!(report["failures"]["inputsIncorrect"], json!(["login"]));
        assert_eq!(
            report["message"],
            json!("<p>The field <b>Password</b> is required.</p><p>The field <b>Login</b> is incorrect.</p>")
        );
    }

    #[test]
    fn test_captcha_answer_from_document() {
        let dir = tempdir().unwrap();
        let schema = write_json(
            dir.path(),
            "contact.json",
            json!({
                "message": {"tag": "textarea", "label": "Message", "require": true, "regExp": "Text"},
                "code": {"tag": "captcha", "require": true}
            }),
        );
        let submission = write_json(
            dir.path(),
            "post.json",
            json!({"values": {"message": "Hello", "code": "K3Y9Z"}, "challenges": {"code": "K3Y9Z"}}),
        );

        let (result, report) = run(&dir, args(schema, submission, None));
        assert!(result.is_ok());
        assert!(report["values"].get("code").is_none());
    }

    #[test]
    fn test_broken_schema_is_a_core_error() {
        let dir = tempdir().unwrap();
        let schema = write_json(
            dir.path(),
            "broken.json",
            json!({"email": {"tag": "input", "require": true}}),
        );
        let submission = write_json(dir.path(), "post.json", json!({"values": {"email": "x"}}));

        let config = ConfigBuilder::new().upload_root(dir.path().join("store")).build();
        let mut output = OutputWriter::with_writer(
            OutputFormat::Json,
            false,
            false,
            0,
            Box::new(Captured::default()),
        );
        let result = handle_validate(args(schema, submission, None), &config, &mut output);
        assert!(matches!(result, Err(Error::Core(ref e)) if e.is_configuration()));
    }
}
