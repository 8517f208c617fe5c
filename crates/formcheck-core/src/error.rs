//! Error types for the Formcheck core library
//!
//! Only schema configuration defects and collaborator breakdowns surface as
//! [`Error`]. A submission that fails validation is not an error: its
//! failures are collected in [`crate::validator::Failures`] and reported
//! through the aggregated message.

use thiserror::Error;

/// Main error type for Formcheck operations
#[derive(Error, Debug)]
pub enum Error {
    /// The form schema is broken (unknown modifier, missing pattern, ...)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// An operation referenced a field the schema does not declare
    #[error("Unknown field '{field}' in form '{form}'")]
    UnknownField { form: String, field: String },

    /// The storage collaborator refused a post-persistence operation
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<SendError>,
    },

    /// An option source could not produce the options of a field
    #[error("Option source error for field '{field}': {message}")]
    OptionSource { field: String, message: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error attached to a field
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Whether this error denotes a broken schema rather than a runtime failure
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
}

/// Failure reported by an upload service while storing or moving a file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The client-side transfer did not complete
    #[error("transfer incomplete for '{file}' (code {code})")]
    Transfer { file: String, code: i32 },

    /// The destination could not be written
    #[error("cannot write '{path}': {reason}")]
    Write { path: String, reason: String },

    /// The upload id is not known to the service
    #[error("unknown upload '{id}'")]
    UnknownUpload { id: String },

    /// Any other refusal
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<SendError> for Error {
    fn from(err: SendError) -> Self {
        Error::Storage {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("email", "required fields must declare a pattern");
        assert_eq!(
            err.to_string(),
            "Configuration error: required fields must declare a pattern"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_send_error_converts_to_storage() {
        let err: Error = SendError::UnknownUpload { id: "42".to_string() }.into();
        assert!(matches!(err, Error::Storage { .. }));
        assert!(err.to_string().contains("unknown upload '42'"));
    }

    #[test]
    fn test_unknown_field_display() {
        let err = Error::UnknownField {
            form: "contact".to_string(),
            field: "phone".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown field 'phone' in form 'contact'");
    }
}
