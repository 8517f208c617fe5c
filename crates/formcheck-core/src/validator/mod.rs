//! Relational validation of submitted values
//!
//! The validator decides whether a submission is acceptable. It runs after
//! uploads have been bound and before error messages are built.
//!
//! The validator is organized into focused modules:
//! - `state`: failure classification and the per-pass context
//! - `preflight`: schema checks run when a form is built
//! - `core`: the relational pass itself
//! - `tests`: scenario tests of the pass
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

pub mod core;
pub mod preflight;
pub mod state;

pub use self::core::RelationalValidator;
pub use preflight::Preflight;
pub use state::{Failures, PassContext};
