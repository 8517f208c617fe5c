//! Modifier registry and pipeline
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use super::built_in;
use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A function that transforms a submitted value
pub type ModifierFn = fn(&Value) -> Value;

/// Mapping from stable modifier names to transform functions
#[derive(Clone)]
pub struct ModifierRegistry {
    modifiers: HashMap<String, ModifierFn>,
}

impl ModifierRegistry {
    /// Registry without any modifier
    pub fn empty() -> Self {
        Self {
            modifiers: HashMap::new(),
        }
    }

    /// Registry holding the built-in modifiers
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for (name, modifier) in built_in::all() {
            registry.modifiers.insert(name.to_string(), modifier);
        }
        registry
    }

    /// Register a modifier, replacing any modifier of the same name
    pub fn register(mut self, name: impl Into<String>, modifier: ModifierFn) -> Self {
        self.modifiers.insert(name.into(), modifier);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modifiers.contains_key(name)
    }

    /// Resolve a name to its function
    pub fn resolve(&self, name: &str) -> Result<ModifierFn> {
        self.modifiers.get(name).copied().ok_or_else(|| Error::Configuration {
            message: format!("unknown modifier '{}'", name),
            field: None,
        })
    }

    /// Ensure every name of a modifier list resolves
    pub fn check(&self, field: &str, names: &[String]) -> Result<()> {
        match names.iter().find(|name| !self.contains(name)) {
            Some(unknown) => Err(Error::configuration(
                field,
                format!("field '{}' uses unknown modifier '{}'", field, unknown),
            )),
            None => Ok(()),
        }
    }

    /// Apply modifiers left to right
    pub fn apply(&self, names: &[String], value: Value) -> Result<Value> {
        let mut current = value;
        for name in names {
            let modifier = self.resolve(name)?;
            current = modifier(&current);
        }
        Ok(current)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modifiers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &self.names())
            .finish()
    }
}
