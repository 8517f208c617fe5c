//! View preparation
//!
//! Produces the data a renderer needs to display a form: every field with
//! its submitted value injected, dynamic option lists resolved, stored
//! uploads resolved to paths, plus a few form-wide flags.

use crate::collaborators::Services;
use crate::error::{Error, Result};
use crate::report::keys;
use crate::schema::{attr, FieldKind, FieldOption, FieldSpec, FormSchema};
use crate::values::{self, Values};
use serde::Serialize;
use serde_json::Value;

/// One field ready to be rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub name: String,
    #[serde(flatten)]
    pub spec: FieldSpec,
    /// Path of the stored upload currently bound to the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

/// A form ready to be rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub name: String,
    pub fields: Vec<FieldView>,
    pub has_upload: bool,
    pub has_date_picker: bool,
    pub has_color_picker: bool,
    pub mandatory_count: usize,
    /// Dictionary key of the mandatory-fields notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mandatory_key: Option<&'static str>,
}

impl FormView {
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Copy values into the fields' `value` attributes
///
/// Checkboxes are checked instead when the value equals their own `value`.
/// Values for unknown fields are ignored.
pub fn inject_values(schema: &mut FormSchema, values: &Values) {
    for (name, value) in values {
        let Some(spec) = schema.get_mut(name) else {
            continue;
        };
        if spec.input_type() == Some("checkbox") {
            if values::loosely_equal(spec.attribute(attr::VALUE), Some(value)) {
                spec.attributes
                    .insert(attr::CHECKED.to_string(), Value::String("checked".to_string()));
            } else {
                spec.attributes.remove(attr::CHECKED);
            }
            continue;
        }
        let injected = match value {
            Value::Number(n) => Value::String(n.to_string()),
            other => other.clone(),
        };
        spec.attributes.insert(attr::VALUE.to_string(), injected);
    }
}

/// Build the view of a normalized schema
///
/// `submitted` tells whether a submission was processed; when none was,
/// options loaded from a model start checked if the field carries a
/// `checked` attribute.
pub fn prepare_view(
    name: &str,
    schema: &FormSchema,
    submitted: bool,
    localize: bool,
    services: Services<'_>,
) -> Result<FormView> {
    let mut view = FormView {
        name: name.to_string(),
        fields: Vec::with_capacity(schema.len()),
        has_upload: false,
        has_date_picker: false,
        has_color_picker: false,
        mandatory_count: 0,
        mandatory_key: None,
    };

    for (field_name, spec) in schema.iter() {
        let mut spec = spec.clone();
        let mut file_path = None;

        match spec.kind {
            FieldKind::Upload(_) => view.has_upload = true,
            FieldKind::Datepicker => view.has_date_picker = true,
            FieldKind::Colorpicker => view.has_color_picker = true,
            _ => {}
        }
        if matches!(spec.kind, FieldKind::Input) {
            let input_type = spec.input_type().map(str::to_owned);
            match input_type.as_deref() {
                Some("checkbox") => {
                    spec.attributes.remove(attr::VALUE_OFF);
                }
                Some("file") => view.has_upload = true,
                Some("submit") if localize => localize_submit(&mut spec, services),
                _ => {}
            }
        }

        if spec.kind.has_options() {
            let loaded = load_options(field_name, &spec, submitted, services)?;
            spec.options.extend(loaded);
        }

        if let Some(config) = spec.upload_config() {
            file_path = spec
                .attribute(attr::VALUE)
                .filter(|value| !values::is_empty(Some(*value)))
                .and_then(values::scalar_text)
                .and_then(|id| services.uploads.resolve_path_by_id(config.model.as_deref(), &id));
        }

        if spec.require {
            view.mandatory_count += 1;
        }
        view.fields.push(FieldView {
            name: field_name.to_string(),
            spec,
            file_path,
        });
    }

    view.mandatory_key = match view.mandatory_count {
        0 => None,
        1 => Some(keys::INPUT_REQUIRE),
        _ => Some(keys::INPUTS_REQUIRE),
    };
    Ok(view)
}

fn localize_submit(spec: &mut FieldSpec, services: Services<'_>) {
    let term = spec
        .attribute(attr::VALUE)
        .and_then(Value::as_str)
        .and_then(|key| services.dictionary.term(key));
    if let Some(term) = term {
        spec.attributes.insert(attr::VALUE.to_string(), Value::String(term));
    }
}

fn load_options(
    field: &str,
    spec: &FieldSpec,
    submitted: bool,
    services: Services<'_>,
) -> Result<Vec<FieldOption>> {
    let Some(query) = &spec.from_model else {
        return Ok(Vec::new());
    };
    let default_checked = !submitted && spec.attribute(attr::CHECKED).is_some();
    let rows = services.options.options(query).map_err(|e| Error::OptionSource {
        field: field.to_string(),
        message: e.to_string(),
    })?;
    Ok(rows
        .into_iter()
        .map(|(name, value)| FieldOption {
            label: name.clone(),
            name,
            value,
            checked: default_checked,
        })
        .collect())
}
