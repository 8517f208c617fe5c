//! Shared utilities for command handlers

use crate::cli::SourceArgs;
use crate::config::{Config, DocumentFormat};
use crate::error::{Error, Result};
use crate::storage::DirectoryUploadService;
use formcheck_core::{
    Form, FormOptions, FormSchema, MapDictionary, MemoryChallengeStore, ModifierRegistry,
    Services, StaticOptionSource, Submission,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a JSON, YAML or TOML document
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "document read");

    let format = DocumentFormat::of(path);
    let parsed = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::from_str(&content).map_err(|e| e.to_string()),
        DocumentFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: format.name().to_string(),
        reason,
    })
}

/// Form name derived from a schema path
///
/// `forms/form.signup.yaml` names the form `signup`.
pub fn form_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("form");
    stem.strip_prefix("form.").unwrap_or(stem).to_string()
}

/// Load a schema and build its form
pub fn load_form(schema_path: &Path, name: Option<&str>, localize_labels: bool) -> Result<Form> {
    let schema: FormSchema = read_document(schema_path)?;
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| form_name_from_path(schema_path));
    debug!(form = %name, fields = schema.len(), "schema loaded");

    let form = Form::new(name, schema, ModifierRegistry::default())?
        .with_options(FormOptions { localize_labels });
    Ok(form)
}

/// A submission document
///
/// Besides values and files, a document may carry the captcha answers of
/// the session it was posted from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionDocument {
    #[serde(flatten)]
    pub submission: Submission,
    #[serde(default)]
    pub challenges: BTreeMap<String, String>,
}

/// Every collaborator a command hands to the engine
pub struct Sources {
    pub dictionary: MapDictionary,
    pub uploads: DirectoryUploadService,
    pub challenges: MemoryChallengeStore,
    pub options: StaticOptionSource,
    pub localize_labels: bool,
}

impl Sources {
    /// Resolve collaborators from the configuration, flags taking precedence
    pub fn load(config: &Config, args: &SourceArgs) -> Result<Self> {
        let mut messages = default_messages();
        if let Some(path) = args.dictionary.as_ref().or(config.dictionary.path.as_ref()) {
            let overrides: Value = read_document(path)?;
            merge_values(&mut messages, overrides);
        }

        let options = match args.option_rows.as_ref().or(config.sources.option_rows.as_ref()) {
            Some(path) => {
                let rows: Value = read_document(path)?;
                StaticOptionSource::from_value(&rows)?
            }
            None => StaticOptionSource::new(),
        };

        let uploads = DirectoryUploadService::from_config(&config.storage)?;

        Ok(Self {
            dictionary: MapDictionary::from_value(&messages),
            uploads,
            challenges: MemoryChallengeStore::new(),
            options,
            localize_labels: args.localize_labels || config.dictionary.localize_labels,
        })
    }

    /// Register the captcha answers of a submission's session
    pub fn register_challenges(&self, form: &str, challenges: &BTreeMap<String, String>) {
        for (field, answer) in challenges {
            self.challenges.set(form, field, answer.clone());
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services::new(
            &self.dictionary,
            &self.uploads,
            &self.challenges,
            &self.options,
        )
    }
}

/// Built-in English failure messages
pub fn default_messages() -> Value {
    json!({
        "global": {
            "forms": {
                "errorMimeType": "The file type of %s is not allowed.",
                "errorMimeTypes": "The file types of %s are not allowed.",
                "errorUploadSend": "The file of %s could not be saved.",
                "errorUploadsSend": "The files of %s could not be saved.",
                "errorInputWithAlternative": "Please fill in %s.",
                "errorInputsWithAlternative": "Please fill in each of %s.",
                "errorInputWithConfirm": "%s do not match.",
                "errorInputsWithConfirm": "These pairs do not match: %s.",
                "errorInputRequire": "The field %s is required.",
                "errorInputsRequire": "The fields %s are required.",
                "errorInputIncorrect": "The field %s is incorrect.",
                "errorInputsIncorrect": "The fields %s are incorrect.",
                "inputRequire": "The field marked with * is required.",
                "inputsRequire": "The fields marked with * are required."
            }
        }
    })
}

/// Deep-merge `overrides` into `base`; objects merge, anything else replaces
pub fn merge_values(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}
