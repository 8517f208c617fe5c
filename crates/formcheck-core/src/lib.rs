//! Formcheck Core - schema-driven form validation engine
//!
//! This crate decides whether a form submission is acceptable against a
//! declarative schema, cleans the accepted values and explains every
//! failure in a human-readable message.
//!
//! # Main Components
//!
//! - **Schema**: field definitions and their normalization
//! - **Modifiers**: named transforms applied before and after validation
//! - **Uploads**: binding submitted files to fields through a storage service
//! - **Validator**: the relational pass over required, alternative, confirm
//!   and pattern-governed fields
//! - **Report**: singular/plural failure messages resolved through a dictionary
//! - **Form**: the facade tying everything together
//!
//! # Example
//!
//! ```
//! use formcheck_core::{
//!     FieldSpec, Form, FormSchema, MapDictionary, MemoryChallengeStore,
//!     MemoryUploadService, ModifierRegistry, NoOptions, Services, Submission,
//! };
//!
//! fn example() -> formcheck_core::Result<()> {
//!     let schema = FormSchema::new()
//!         .with_field("email", FieldSpec::input().with_label("Email").required().with_pattern("Mail"));
//!     let mut form = Form::new("contact", schema, ModifierRegistry::default())?;
//!
//!     let dictionary = MapDictionary::from_pairs([("global.forms.errorInputIncorrect", "%s is invalid")]);
//!     let uploads = MemoryUploadService::new();
//!     let challenges = MemoryChallengeStore::new();
//!     let services = Services::new(&dictionary, &uploads, &challenges, &NoOptions);
//!
//!     let submission = Submission::new().with_value("email", "not-an-address");
//!     assert!(!form.is_valid(&submission, services)?);
//!     assert_eq!(form.error(&dictionary), "<p><b>Email</b> is invalid</p>");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod collaborators;
pub mod error;
pub mod form;
pub mod modifier;
pub mod pattern;
pub mod report;
pub mod schema;
pub mod upload;
pub mod validator;
pub mod values;
pub mod view;

// Re-export main types for convenience
pub use collaborators::{
    ChallengeStore, Dictionary, MapDictionary, MemoryChallengeStore, NoOptions, OptionSource,
    Services, StaticOptionSource,
};
pub use error::{Error, Result, SendError};
pub use form::{Form, FormOptions};
pub use modifier::{ModifierFn, ModifierRegistry};
pub use pattern::{is_date, is_numeric, Pattern};
pub use report::ErrorReport;
pub use schema::{
    FieldKind, FieldOption, FieldSpec, FormSchema, FromModel, Normalizer, UploadConfig,
};
pub use upload::{MemoryUploadService, UploadOutcome, UploadRecord, UploadService};
pub use validator::{Failures, Preflight};
pub use values::{FileEntry, Submission, Values};
pub use view::{FieldView, FormView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
