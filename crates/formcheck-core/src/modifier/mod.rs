//! Value modifiers applied before and after validation
//!
//! A field lists modifiers by name in `inputModifiers` and
//! `outputModifiers`. Names resolve through a [`ModifierRegistry`] to typed
//! transform functions, and the pipeline applies them left to right, each
//! consuming the output of the previous one.
//!
//! # Module Organization
//!
//! - [`registry`] - name to function mapping and pipeline application
//! - [`built_in`] - the transforms every registry starts with
//!
//! # Examples
//!
//! ```
//! use formcheck_core::modifier::ModifierRegistry;
//! use serde_json::json;
//!
//! let registry = ModifierRegistry::default();
//! let names = vec!["trim".to_string(), "strtoupper".to_string()];
//! let value = registry.apply(&names, json!("  abc ")).unwrap();
//! assert_eq!(value, json!("ABC"));
//! ```
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

pub mod built_in;
pub mod registry;

pub use registry::{ModifierFn, ModifierRegistry};
