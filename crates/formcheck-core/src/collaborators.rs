//! External collaborators of the engine
//!
//! The engine never looks up display text, session state, option lists or
//! stored files by itself. Each of those concerns is a trait implemented by
//! the embedding application; in-memory implementations are provided for
//! tests and small deployments.
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::schema::FromModel;
use crate::upload::UploadService;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// Localized string lookup
pub trait Dictionary {
    /// Resolve a key to display text, `None` when the key is undefined
    fn term(&self, key: &str) -> Option<String>;
}

/// Session-scoped captcha challenges
pub trait ChallengeStore {
    /// The answer expected for a captcha field
    fn current_challenge(&self, form: &str, field: &str) -> Option<String>;

    /// Discard the challenge once it has been answered correctly
    fn invalidate(&self, form: &str, field: &str);
}

/// Source of dynamically loaded option lists
pub trait OptionSource {
    /// Ordered `(name, value)` pairs for a `fromModel` declaration
    fn options(&self, query: &FromModel) -> Result<Vec<(String, Value)>>;
}

/// Bundle of collaborators handed to a validation pass
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub dictionary: &'a dyn Dictionary,
    pub uploads: &'a dyn UploadService,
    pub challenges: &'a dyn ChallengeStore,
    pub options: &'a dyn OptionSource,
}

impl<'a> Services<'a> {
    pub fn new(
        dictionary: &'a dyn Dictionary,
        uploads: &'a dyn UploadService,
        challenges: &'a dyn ChallengeStore,
        options: &'a dyn OptionSource,
    ) -> Self {
        Self {
            dictionary,
            uploads,
            challenges,
            options,
        }
    }
}

/// Dictionary backed by a flat key/value map
#[derive(Debug, Clone, Default)]
pub struct MapDictionary {
    terms: HashMap<String, String>,
}

impl MapDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            terms: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build from a nested document, joining nested keys with dots
    ///
    /// `{"global": {"forms": {"errorInputRequire": "..."}}}` defines
    /// `global.forms.errorInputRequire`.
    pub fn from_value(value: &Value) -> Self {
        let mut dictionary = Self::new();
        dictionary.flatten("", value);
        dictionary
    }

    pub fn insert(&mut self, key: impl Into<String>, term: impl Into<String>) {
        self.terms.insert(key.into(), term.into());
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn flatten(&mut self, prefix: &str, value: &Value) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    self.flatten(&path, child);
                }
            }
            Value::String(text) => self.insert(prefix, text.clone()),
            Value::Null => {}
            other => self.insert(prefix, other.to_string()),
        }
    }
}

impl Dictionary for MapDictionary {
    fn term(&self, key: &str) -> Option<String> {
        self.terms.get(key).cloned()
    }
}

/// Challenge store kept in memory
#[derive(Debug, Default)]
pub struct MemoryChallengeStore {
    challenges: Mutex<HashMap<(String, String), String>>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the expected answer for a captcha field
    pub fn set(&self, form: &str, field: &str, answer: impl Into<String>) {
        if let Ok(mut challenges) = self.challenges.lock() {
            challenges.insert((form.to_string(), field.to_string()), answer.into());
        }
    }
}

impl ChallengeStore for MemoryChallengeStore {
    fn current_challenge(&self, form: &str, field: &str) -> Option<String> {
        self.challenges
            .lock()
            .ok()?
            .get(&(form.to_string(), field.to_string()))
            .cloned()
    }

    fn invalidate(&self, form: &str, field: &str) {
        if let Ok(mut challenges) = self.challenges.lock() {
            challenges.remove(&(form.to_string(), field.to_string()));
        }
    }
}

/// Option source serving rows registered per model
#[derive(Debug, Clone, Default)]
pub struct StaticOptionSource {
    rows: HashMap<String, Vec<Map<String, Value>>>,
}

impl StaticOptionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rows a model returns
    pub fn with_rows(mut self, model: impl Into<String>, rows: Vec<Map<String, Value>>) -> Self {
        self.rows.insert(model.into(), rows);
        self
    }

    /// Build from a document mapping model names to arrays of row objects
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut source = Self::new();
        let Some(models) = value.as_object() else {
            return Ok(source);
        };
        for (model, rows) in models {
            let rows: Vec<Map<String, Value>> = serde_json::from_value(rows.clone())?;
            source.rows.insert(model.clone(), rows);
        }
        Ok(source)
    }
}

impl OptionSource for StaticOptionSource {
    fn options(&self, query: &FromModel) -> Result<Vec<(String, Value)>> {
        let rows = self.rows.get(&query.model).ok_or_else(|| Error::OptionSource {
            field: query.model.clone(),
            message: format!("model '{}' is not registered", query.model),
        })?;

        let options = rows
            .iter()
            .filter(|row| match &query.condition {
                Some(condition) => condition
                    .iter()
                    .all(|(column, expected)| row.get(column) == Some(expected)),
                None => true,
            })
            .map(|row| {
                let name = match row.get(&query.name) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                let value = row.get(&query.value).cloned().unwrap_or_else(|| Value::String(String::new()));
                (name, value)
            })
            .collect();

        Ok(options)
    }
}

/// Option source for forms without dynamic option lists
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOptions;

impl OptionSource for NoOptions {
    fn options(&self, query: &FromModel) -> Result<Vec<(String, Value)>> {
        Err(Error::OptionSource {
            field: query.model.clone(),
            message: "no option source configured".to_string(),
        })
    }
}
