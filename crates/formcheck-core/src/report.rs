//! Error aggregation
//!
//! Turns the classified failures of a pass into one message per category,
//! each resolved through the dictionary. One failing entry selects the
//! singular message, with a per-field override tried first; several select
//! the plural one.
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

use crate::collaborators::Dictionary;
use crate::schema::FormSchema;
use crate::validator::Failures;

/// Dictionary keys of the failure messages
pub mod keys {
    pub const ERROR_MIME_TYPE: &str = "global.forms.errorMimeType";
    pub const ERROR_MIME_TYPES: &str = "global.forms.errorMimeTypes";
    pub const ERROR_UPLOAD_SEND: &str = "global.forms.errorUploadSend";
    pub const ERROR_UPLOADS_SEND: &str = "global.forms.errorUploadsSend";
    pub const ERROR_INPUT_WITH_ALTERNATIVE: &str = "global.forms.errorInputWithAlternative";
    pub const ERROR_INPUTS_WITH_ALTERNATIVE: &str = "global.forms.errorInputsWithAlternative";
    pub const ERROR_INPUT_WITH_CONFIRM: &str = "global.forms.errorInputWithConfirm";
    pub const ERROR_INPUTS_WITH_CONFIRM: &str = "global.forms.errorInputsWithConfirm";
    pub const ERROR_INPUT_REQUIRE: &str = "global.forms.errorInputRequire";
    pub const ERROR_INPUTS_REQUIRE: &str = "global.forms.errorInputsRequire";
    pub const ERROR_INPUT_INCORRECT: &str = "global.forms.errorInputIncorrect";
    pub const ERROR_INPUTS_INCORRECT: &str = "global.forms.errorInputsIncorrect";
    pub const INPUT_REQUIRE: &str = "global.forms.inputRequire";
    pub const INPUTS_REQUIRE: &str = "global.forms.inputsRequire";
}

/// Failure categories, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    UploadMime,
    UploadSend,
    Alternative,
    Confirm,
    Require,
    Incorrect,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::UploadMime,
        Category::UploadSend,
        Category::Alternative,
        Category::Confirm,
        Category::Require,
        Category::Incorrect,
    ];

    pub fn singular_key(self) -> &'static str {
        match self {
            Category::UploadMime => keys::ERROR_MIME_TYPE,
            Category::UploadSend => keys::ERROR_UPLOAD_SEND,
            Category::Alternative => keys::ERROR_INPUT_WITH_ALTERNATIVE,
            Category::Confirm => keys::ERROR_INPUT_WITH_CONFIRM,
            Category::Require => keys::ERROR_INPUT_REQUIRE,
            Category::Incorrect => keys::ERROR_INPUT_INCORRECT,
        }
    }

    pub fn plural_key(self) -> &'static str {
        match self {
            Category::UploadMime => keys::ERROR_MIME_TYPES,
            Category::UploadSend => keys::ERROR_UPLOADS_SEND,
            Category::Alternative => keys::ERROR_INPUTS_WITH_ALTERNATIVE,
            Category::Confirm => keys::ERROR_INPUTS_WITH_CONFIRM,
            Category::Require => keys::ERROR_INPUTS_REQUIRE,
            Category::Incorrect => keys::ERROR_INPUTS_INCORRECT,
        }
    }

    /// Entries of this category in a failure classification
    pub fn entries(self, failures: &Failures) -> Vec<Entry<'_>> {
        match self {
            Category::UploadMime => fields(&failures.uploads_fail_mime_type),
            Category::UploadSend => fields(&failures.uploads_send_fail),
            Category::Alternative => pairs(&failures.inputs_with_alternative),
            Category::Confirm => pairs(&failures.inputs_with_confirm),
            Category::Require => fields(&failures.inputs_require),
            Category::Incorrect => fields(&failures.inputs_incorrect),
        }
    }
}

fn fields(list: &[String]) -> Vec<Entry<'_>> {
    list.iter().map(|f| Entry::Field(f.as_str())).collect()
}

fn pairs(list: &[(String, String)]) -> Vec<Entry<'_>> {
    list.iter().map(|(a, b)| Entry::Pair(a.as_str(), b.as_str())).collect()
}

/// One failing field, or a pair of related fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    Field(&'a str),
    Pair(&'a str, &'a str),
}

impl<'a> Entry<'a> {
    /// Field whose name selects a singular override message
    pub fn primary(&self) -> &'a str {
        match self {
            Entry::Field(name) | Entry::Pair(name, _) => *name,
        }
    }
}

/// Builds failure messages for a schema
pub struct ErrorReport<'a> {
    schema: &'a FormSchema,
    dictionary: &'a dyn Dictionary,
}

impl<'a> ErrorReport<'a> {
    pub fn new(schema: &'a FormSchema, dictionary: &'a dyn Dictionary) -> Self {
        Self { schema, dictionary }
    }

    /// Message for every failing category, concatenated in reporting order
    pub fn describe(&self, failures: &Failures) -> String {
        Category::ALL
            .iter()
            .map(|category| {
                self.describe_entries(
                    &category.entries(failures),
                    category.singular_key(),
                    category.plural_key(),
                )
            })
            .collect()
    }

    /// Message for one category, empty when nothing failed
    pub fn describe_entries(&self, entries: &[Entry<'_>], singular: &str, plural: &str) -> String {
        let Some(first) = entries.first() else {
            return String::new();
        };

        let labels = entries
            .iter()
            .map(|entry| self.render_entry(entry))
            .collect::<Vec<_>>()
            .join(", ");

        let format = if entries.len() == 1 {
            let override_key = format!("{}{}", singular, first.primary());
            self.dictionary
                .term(&override_key)
                .or_else(|| self.dictionary.term(singular))
                .unwrap_or_else(|| singular.to_string())
        } else {
            self.dictionary
                .term(plural)
                .unwrap_or_else(|| plural.to_string())
        };

        format!("<p>{}</p>", fill_placeholder(&format, &labels))
    }

    fn render_entry(&self, entry: &Entry<'_>) -> String {
        match entry {
            Entry::Field(name) => format!("<b>{}</b>", self.schema.display_label(name)),
            Entry::Pair(field, target) => format!(
                "<b>{}</b> &amp; <b>{}</b>",
                self.schema.display_label(field),
                self.schema.display_label(target)
            ),
        }
    }
}

/// Put the label list in place of the first `%s`
fn fill_placeholder(format: &str, labels: &str) -> String {
    match format.split_once("%s") {
        Some((before, after)) => format!("{}{}{}", before, labels, after),
        None => format!("{} {}", format, labels),
    }
}
