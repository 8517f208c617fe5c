//! End-to-end tests of the form facade
//!
//! Forms are declared the way applications ship them, as JSON documents,
//! and run against the in-memory collaborators.


use formcheck_core::{Error, Form, FormSchema, ModifierRegistry, Submission};
use serde_json::{json, Value};
use test_support::{file, values, Harness};

fn form(name: &str, schema: Value) -> Form {
    let schema: FormSchema = serde_json::from_value(schema).expect("schema should parse");
    Form::new(name, schema, ModifierRegistry::default()).expect("schema should be valid")
}

fn submit(pairs: Value) -> Submission {
    Submission {
        values: values(pairs),
        files: Vec::new(),
    }
}

fn signup() -> Form {
    form(
        "signup",
        json!({
            "login": {"tag": "input", "label": "Login", "require": true, "regExp": "AlphaNumeric",
                      "inputModifiers": ["trim", "strtolower"]},
            "password": {"tag": "input", "label": "Password", "require": true, "regExp": "Password",
                         "attributes": {"type": "password"}},
            "password_confirm": {"tag": "input", "label": "Confirmation", "require": true,
                                 "isConfirmFor": "password", "attributes": {"type": "password"}},
            "phone": {"tag": "input", "label": "Phone", "regExp": "Numeric", "isAlternativeFor": "email"},
            "email": {"tag": "input", "label": "Email", "errorLabel": "E-mail address", "regExp": "Mail"},
            "newsletter": {"tag": "input", "label": "Newsletter",
                           "attributes": {"type": "checkbox", "value": "1", "valueOff": "0"}},
            "submit": {"tag": "input", "attributes": {"type": "submit", "value": "Send"}}
        }),
    )
}

#[test]
fn test_valid_signup_is_cleaned() {
    let harness = Harness::new();
    let mut form = signup();
    let submission = submit(json!({
        "login": "  Ada_L ",
        "password": "abc123",
        "password_confirm": "abc123",
        "phone": "",
        "email": "ada@example.com",
        "submit": "Send"
    }));

    assert!(form.is_valid(&submission, harness.services()).unwrap());
    let cleaned = form.values().unwrap();
    assert_eq!(cleaned.get("login"), Some(&json!("ada_l")));
    assert_eq!(cleaned.get("newsletter"), Some(&json!("0")));
    assert!(cleaned.get("password_confirm").is_none());
    assert!(cleaned.get("submit").is_none());
    assert_eq!(form.error(&harness.dictionary), "");
}

#[test]
fn test_confirm_mismatch() {
    let harness = Harness::new();
    let mut form = signup();
    let submission = submit(json!({
        "login": "ada",
        "password": "abc123",
        "password_confirm": "abc124",
        "email": "ada@example.com"
    }));

    assert!(!form.is_valid(&submission, harness.services()).unwrap());
    let failures = form.failures().unwrap();
    assert_eq!(
        failures.inputs_with_confirm,
        vec![("password_confirm".to_string(), "password".to_string())]
    );
    assert_eq!(
        form.error(&harness.dictionary),
        "<p><b>Confirmation</b> &amp; <b>Password</b> do not match.</p>"
    );
}

#[test]
fn test_every_category_in_order() {
    let harness = Harness::new();
    let mut form = signup();
    let submission = submit(json!({
        "login": "not valid!",
        "password": "",
        "password_confirm": "",
        "phone": "",
        "email": ""
    }));

    assert!(!form.is_valid(&submission, harness.services()).unwrap());
    assert_eq!(
        form.error(&harness.dictionary),
        "<p>Please fill in <b>Phone</b> &amp; <b>E-mail address</b>.</p>\
         <p>The field <b>Password</b> is required.</p>\
         <p>The field <b>Login</b> is incorrect.</p>"
    );
    assert!(form.values().unwrap().get("password_confirm").is_none());
}

#[test]
fn test_plural_messages() {
    let harness = Harness::new();
    let mut form = signup();
    let submission = submit(json!({"phone": "0612345678"}));

    assert!(!form.is_valid(&submission, harness.services()).unwrap());
    assert_eq!(
        form.error(&harness.dictionary),
        "<p>The fields <b>Login</b>, <b>Password</b> are required.</p>"
    );
}

#[test]
fn test_required_numeric_zero() {
    let harness = Harness::new();
    let mut form = form(
        "order",
        json!({"quantity": {"tag": "input", "label": "Quantity", "require": true, "regExp": "Numeric"}}),
    );
    assert!(form
        .is_valid(&submit(json!({"quantity": "0"})), harness.services())
        .unwrap());
    assert_eq!(form.values().unwrap().get("quantity"), Some(&json!("0")));
}

#[test]
fn test_field_specific_singular_message() {
    let mut harness = Harness::new();
    harness.dictionary.insert(
        "global.forms.errorInputIncorrectlogin",
        "Logins only use letters, digits and dashes: %s",
    );
    let mut form = signup();
    let submission = submit(json!({
        "login": "bad login",
        "password": "abc123",
        "password_confirm": "abc123",
        "email": "ada@example.com"
    }));
    assert!(!form.is_valid(&submission, harness.services()).unwrap());
    assert_eq!(
        form.error(&harness.dictionary),
        "<p>Logins only use letters, digits and dashes: <b>Login</b></p>"
    );
}

fn application() -> Form {
    form(
        "application",
        json!({
            "name": {"tag": "input", "label": "Name", "require": true, "regExp": "Text"},
            "resume": {"tag": "upload", "label": "Resume", "require": true, "fileType": "pdf|doc",
                       "folder": "applicants/{id}/", "fileName": "resume_{id}"},
            "photo": {"tag": "upload", "label": "Photo", "fileType": "jpg|png"}
        }),
    )
}

#[test]
fn test_required_upload_without_file() {
    let harness = Harness::new();
    let mut form = application();
    assert!(!form
        .is_valid(&submit(json!({"name": "Ada"})), harness.services())
        .unwrap());
    assert_eq!(form.failures().unwrap().inputs_require, vec!["resume".to_string()]);
}

#[test]
fn test_upload_binds_identifier_and_finalizes() {
    let harness = Harness::new();
    let mut form = application();
    let submission = submit(json!({"name": "Ada"})).with_file(file("resume", "cv.pdf"));

    assert!(form.is_valid(&submission, harness.services()).unwrap());
    assert_eq!(form.values().unwrap().get("resume"), Some(&json!("1")));
    assert_eq!(form.upload_records().len(), 1);

    form.finalize_names(Some("42"), &harness.uploads).unwrap();
    assert!(form.upload_records().is_empty());
    assert_eq!(
        harness.uploads.stored("1").unwrap().path(),
        "files/uploads/applicants/42/resume_42.pdf"
    );
}

#[test]
fn test_rejected_uploads_are_reported() {
    let harness = Harness::new();
    let mut form = application();
    let submission = submit(json!({"name": "Ada"}))
        .with_file(file("resume", "cv.exe"))
        .with_file(file("photo", "me.gif"));

    assert!(!form.is_valid(&submission, harness.services()).unwrap());
    let failures = form.failures().unwrap();
    assert_eq!(
        failures.uploads_fail_mime_type,
        vec!["resume".to_string(), "photo".to_string()]
    );
    assert_eq!(failures.inputs_require, vec!["resume".to_string()]);
    assert_eq!(
        form.error(&harness.dictionary),
        "<p>The file types of <b>Resume</b>, <b>Photo</b> are not allowed.</p>\
         <p>The field <b>Resume</b> is required.</p>"
    );
}

#[test]
fn test_storage_failure_is_reported() {
    let harness = Harness::with_failing_storage();
    let mut form = application();
    let submission = submit(json!({"name": "Ada"})).with_file(file("resume", "cv.pdf"));

    assert!(!form.is_valid(&submission, harness.services()).unwrap());
    assert_eq!(
        form.failures().unwrap().uploads_send_fail,
        vec!["resume".to_string()]
    );
    assert!(form.upload_records().is_empty());
}

#[test]
fn test_previously_stored_upload_satisfies_requirement() {
    let harness = Harness::new();
    let mut form = application();
    assert!(form.set_property("resume", "value", "17"));
    assert!(form
        .is_valid(&submit(json!({"name": "Ada"})), harness.services())
        .unwrap());
}

#[test]
fn test_captcha_round() {
    let harness = Harness::new();
    let mut form = form(
        "contact",
        json!({
            "message": {"tag": "textarea", "label": "Message", "require": true, "regExp": "Text"},
            "code": {"tag": "captcha", "require": true}
        }),
    );
    harness.challenges.set("contact", "code", "K3Y9Z");

    let wrong = submit(json!({"message": "Hello", "code": "AAAAA"}));
    assert!(!form.is_valid(&wrong, harness.services()).unwrap());
    assert_eq!(
        form.error(&harness.dictionary),
        "<p>The field <b>Captcha</b> is incorrect.</p>"
    );

    let right = submit(json!({"message": "Hello", "code": "K3Y9Z"}));
    assert!(form.is_valid(&right, harness.services()).unwrap());
    assert!(form.values().unwrap().get("code").is_none());

    assert!(!form.is_valid(&right, harness.services()).unwrap());
}

#[test]
fn test_unknown_modifier_in_document_is_rejected() {
    let schema: FormSchema = serde_json::from_value(json!({
        "title": {"tag": "input", "outputModifiers": ["htmlentities"]}
    }))
    .unwrap();
    let err = Form::new("post", schema, ModifierRegistry::default()).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));

    fn shout(value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(s.to_uppercase() + "!"),
            other => other.clone(),
        }
    }
    let schema: FormSchema = serde_json::from_value(json!({
        "title": {"tag": "input", "outputModifiers": ["shout"]}
    }))
    .unwrap();
    let registry = ModifierRegistry::default().register("shout", shout);
    let mut form = Form::new("post", schema, registry).unwrap();
    let harness = Harness::new();
    assert!(form
        .is_valid(&submit(json!({"title": "hi"})), harness.services())
        .unwrap());
    assert_eq!(form.values().unwrap().get("title"), Some(&json!("HI!")));
}

#[test]
fn test_view_after_submission() {
    let harness = Harness::new();
    let mut form = signup();
    let submission = submit(json!({"login": "ada", "newsletter": "1", "email": "x"}));
    form.is_valid(&submission, harness.services()).unwrap();

    let view = form.prepare_view(harness.services()).unwrap();
    assert_eq!(view.mandatory_count, 3);
    assert_eq!(view.mandatory_key, Some("global.forms.inputsRequire"));
    let newsletter = view.field("newsletter").unwrap();
    assert_eq!(newsletter.spec.attribute("checked"), Some(&json!("checked")));
    assert!(newsletter.spec.attribute("valueOff").is_none());
    assert_eq!(
        view.field("login").unwrap().spec.attribute("value"),
        Some(&json!("ada"))
    );
}
