//! Field definitions
//!
//! A [`FieldSpec`] carries the attributes every field shares plus a
//! [`FieldKind`] holding the configuration that only makes sense for one
//! tag (upload destinations, captcha length, select parameters).
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::CAPTCHA_LABEL;

/// Presentation and behavioral attributes of a field
pub type Attributes = Map<String, Value>;

/// Attribute keys the engine gives meaning to
pub mod attr {
    pub const TYPE: &str = "type";
    pub const VALUE: &str = "value";
    pub const VALUE_OFF: &str = "valueOff";
    pub const MULTIPLE: &str = "multiple";
    pub const PLACEHOLDER: &str = "placeholder";
    pub const CHECKED: &str = "checked";
}

/// Field kind with its kind-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum FieldKind {
    Input,
    Textarea,
    Select(SelectConfig),
    Upload(UploadConfig),
    Captcha(CaptchaConfig),
    Richeditor,
    Datepicker,
    Colorpicker,
    Radiogroup,
    Checkboxgroup,
}

impl FieldKind {
    /// The tag name as written in schema documents
    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::Input => "input",
            FieldKind::Textarea => "textarea",
            FieldKind::Select(_) => "select",
            FieldKind::Upload(_) => "upload",
            FieldKind::Captcha(_) => "captcha",
            FieldKind::Richeditor => "richeditor",
            FieldKind::Datepicker => "datepicker",
            FieldKind::Colorpicker => "colorpicker",
            FieldKind::Radiogroup => "radiogroup",
            FieldKind::Checkboxgroup => "checkboxgroup",
        }
    }

    /// Whether the field presents a list of options
    pub fn has_options(&self) -> bool {
        matches!(
            self,
            FieldKind::Select(_) | FieldKind::Radiogroup | FieldKind::Checkboxgroup
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Upload destination and acceptance rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadConfig {
    /// Allowed extensions separated by `|`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Subfolder under the upload root, may contain `{id}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Final file name template, may contain `{id}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Width and height to resize images to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<[u32; 2]>,
    /// Model that resolves stored upload ids to paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl UploadConfig {
    /// Allowed extensions, lowercased
    pub fn allowed_types(&self) -> Vec<String> {
        self.file_type
            .as_deref()
            .unwrap_or(crate::schema::DEFAULT_FILE_TYPES)
            .split('|')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
}

/// One entry of an option list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub checked: bool,
}

/// Dynamic option list sourced from a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromModel {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Equality filters applied by the option source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Map<String, Value>>,
    /// Column used as the option name
    pub name: String,
    /// Column used as the option value
    pub value: String,
}

/// Declarative description of one form field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub error_label: String,
    #[serde(default)]
    pub require: bool,
    #[serde(default, rename = "regExp")]
    pub reg_exp: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub input_modifiers: Vec<String>,
    #[serde(default)]
    pub output_modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_alternative_for: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_confirm_for: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_model: Option<FromModel>,
}

impl FieldSpec {
    /// Create a field of the given kind with every attribute at its default
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            label: String::new(),
            error_label: String::new(),
            require: false,
            reg_exp: String::new(),
            attributes: Attributes::new(),
            input_modifiers: Vec::new(),
            output_modifiers: Vec::new(),
            is_alternative_for: None,
            is_confirm_for: None,
            options: Vec::new(),
            from_model: None,
        }
    }

    pub fn input() -> Self {
        Self::new(FieldKind::Input)
    }

    pub fn textarea() -> Self {
        Self::new(FieldKind::Textarea)
    }

    pub fn select() -> Self {
        Self::new(FieldKind::Select(SelectConfig::default()))
    }

    pub fn upload(config: UploadConfig) -> Self {
        Self::new(FieldKind::Upload(config))
    }

    pub fn captcha() -> Self {
        Self::new(FieldKind::Captcha(CaptchaConfig::default()))
    }

    pub fn checkbox_group() -> Self {
        Self::new(FieldKind::Checkboxgroup)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_error_label(mut self, label: impl Into<String>) -> Self {
        self.error_label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.require = true;
        self
    }

    pub fn with_pattern(mut self, reg_exp: impl Into<String>) -> Self {
        self.reg_exp = reg_exp.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_input_modifiers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_modifiers = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_output_modifiers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_modifiers = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn alternative_for(mut self, target: impl Into<String>) -> Self {
        self.is_alternative_for = Some(target.into());
        self
    }

    pub fn confirm_for(mut self, target: impl Into<String>) -> Self {
        self.is_confirm_for = Some(target.into());
        self
    }

    pub fn with_from_model(mut self, from_model: FromModel) -> Self {
        self.from_model = Some(from_model);
        self
    }

    /// The `type` attribute, when it is a string
    pub fn input_type(&self) -> Option<&str> {
        self.attributes.get(attr::TYPE).and_then(Value::as_str)
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Label used in error messages: `errorLabel` when set, `label` otherwise
    ///
    /// Captchas are always reported as `Captcha`.
    pub fn display_label(&self) -> &str {
        if matches!(self.kind, FieldKind::Captcha(_)) {
            CAPTCHA_LABEL
        } else if self.error_label.is_empty() {
            &self.label
        } else {
            &self.error_label
        }
    }

    /// Upload configuration for fields that accept files
    ///
    /// Plain inputs typed `file` upload with the default configuration.
    pub fn upload_config(&self) -> Option<UploadConfig> {
        match &self.kind {
            FieldKind::Upload(config) => Some(config.clone()),
            FieldKind::Input if self.input_type() == Some("file") => Some(UploadConfig::default()),
            _ => None,
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self.kind, FieldKind::Upload(_))
    }

    /// Select fields carrying `multiple="multiple"`
    pub fn is_multiple_select(&self) -> bool {
        matches!(self.kind, FieldKind::Select(_))
            && self.attribute(attr::MULTIPLE).and_then(Value::as_str) == Some("multiple")
    }
}
