// Tests for output formatting
//
// These tests check the specialized rendering of submission reports and
// form views, and the writer's handling of quiet and machine formats.

use super::*;
use formcheck_core::{FieldSpec, FieldView};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

/// Writer whose bytes stay inspectable after being boxed
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
    colored::control::set_override(false);
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, 0, Box::new(buffer.clone()));
    (writer, buffer)
}

fn rejected_report() -> SubmissionReport {
    let mut failures = Failures::default();
    failures.inputs_require.push("password".to_string());
    SubmissionReport {
        form: "signup".to_string(),
        valid: false,
        values: json!({"login": "ada", "tags": ["a", "b"]}).as_object().cloned(),
        failures: Some(failures),
        message: "<p>The field <b>Password</b> is required.</p><p><b>A</b> &amp; <b>B</b> do not match.</p>"
            .to_string(),
        stored_uploads: Vec::new(),
    }
}

#[test]
fn test_message_lines() {
    assert_eq!(
        message_lines("<p>The field <b>Password</b> is required.</p><p><b>A</b> &amp; <b>B</b> do not match.</p>"),
        vec![
            "The field Password is required.".to_string(),
            "A & B do not match.".to_string()
        ]
    );
    assert!(message_lines("").is_empty());
}

#[test]
fn test_report_human() {
    let (mut output, buffer) = writer(OutputFormat::Human, false);
    output.report(&rejected_report()).unwrap();
    let text = buffer.contents();

    assert!(text.contains("✗ Submission rejected by form 'signup'"));
    assert!(text.contains("  • The field Password is required."));
    assert!(text.contains("  • A & B do not match."));
    assert!(text.contains("login │ \"ada\""));
    assert!(text.contains("tags  │ [\"a\", \"b\"]"));
}

#[test]
fn test_report_json_skips_empty_parts() {
    let report = SubmissionReport {
        form: "signup".to_string(),
        valid: true,
        values: json!({"login": "ada"}).as_object().cloned(),
        failures: Some(Failures::default()),
        message: String::new(),
        stored_uploads: vec![StoredUploadSummary {
            field: "resume".to_string(),
            id: "1".to_string(),
            path: Some("files/uploads/cv.pdf".to_string()),
        }],
    };
    let formatted = OutputFormat::Json.format_report(&report).unwrap();
    let parsed: Value = serde_json::from_str(&formatted).unwrap();

    assert_eq!(parsed["valid"], json!(true));
    assert!(parsed.get("message").is_none());
    assert_eq!(parsed["failures"]["inputsRequire"], json!([]));
    assert_eq!(parsed["storedUploads"][0]["path"], json!("files/uploads/cv.pdf"));
}

#[test]
fn test_report_yaml() {
    let formatted = OutputFormat::Yaml.format_report(&rejected_report()).unwrap();
    assert!(formatted.contains("form: signup"));
    assert!(formatted.contains("valid: false"));
}

#[test]
fn test_view_human() {
    let view = FormView {
        name: "signup".to_string(),
        fields: vec![
            FieldView {
                name: "login".to_string(),
                spec: FieldSpec::input()
                    .with_label("Login")
                    .required()
                    .with_pattern("Text")
                    .with_attribute("value", "ada"),
                file_path: None,
            },
            FieldView {
                name: "resume".to_string(),
                spec: FieldSpec::upload(Default::default()).with_label("Resume"),
                file_path: Some("files/uploads/cv.pdf".to_string()),
            },
        ],
        has_upload: true,
        has_date_picker: false,
        has_color_picker: false,
        mandatory_count: 1,
        mandatory_key: Some("global.forms.inputRequire"),
    };
    let text = OutputFormat::Human.format_view(&view).unwrap();

    assert!(text.contains("Form signup"));
    assert!(text.contains("login  │ input  │ Login  │ *   │ \"ada\""));
    assert!(text.contains("files/uploads/cv.pdf"));
    assert!(text.contains("Needs: upload"));
    assert!(text.contains("Mandatory fields: 1 (global.forms.inputRequire)"));
}

#[test]
fn test_quiet_and_machine_formats_suppress_messages() {
    let (mut quiet, buffer) = writer(OutputFormat::Human, true);
    quiet.info("hidden").unwrap();
    quiet.success("hidden").unwrap();
    quiet.section("hidden").unwrap();
    assert_eq!(buffer.contents(), "");

    let (mut json, buffer) = writer(OutputFormat::Json, false);
    json.info("hidden").unwrap();
    json.error("hidden").unwrap();
    json.data(&json!({"a": 1})).unwrap();
    assert_eq!(buffer.contents(), "{\"a\":1}\n");
}

#[test]
fn test_plain_messages() {
    let (mut output, buffer) = writer(OutputFormat::Human, false);
    output.info("loading").unwrap();
    output.warning("careful").unwrap();
    output.error("broken").unwrap();
    output.section("Values").unwrap();
    assert_eq!(
        buffer.contents(),
        "INFO: loading\nWARNING: careful\nERROR: broken\n\n=== Values ===\n"
    );
}

#[test]
fn test_table() {
    let rendered = render_table(
        &["Field", "Value"],
        &[
            vec!["a".to_string(), "1".to_string()],
            vec!["long_name".to_string(), "2".to_string()],
        ],
    );
    assert_eq!(
        rendered,
        "Field     │ Value\n──────────┼──────\na         │ 1\nlong_name │ 2"
    );
}
