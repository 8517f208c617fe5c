//! Upload data types

use crate::values::FileEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root every upload folder is resolved under
pub const UPLOAD_ROOT: &str = "files/uploads/";

/// Placeholder substituted with a record id in names and folders
pub const ID_PLACEHOLDER: &str = "{id}";

/// Opaque reference to a stored upload, meaningful only to its service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadHandle(pub String);

impl fmt::Display for UploadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a service returns once a file is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub handle: UploadHandle,
    /// Identifier bound as the field's value
    pub id: String,
}

/// Everything a service needs to store one file
#[derive(Debug, Clone)]
pub struct SendRequest<'a> {
    pub entry: &'a FileEntry,
    /// Destination folder, upload root included
    pub folder: String,
    /// Provisional name; `None` keeps the client-side name
    pub file_name: Option<String>,
    /// Width and height to resize images to
    pub resize: Option<[u32; 2]>,
}

/// Result of binding one submitted file to its field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Not an upload field, or a value was already posted for it
    Skipped,
    /// Extension outside the field's allowed set
    MimeRejected,
    /// The service refused the file
    SendFailed(String),
    Bound { handle: UploadHandle, id: String },
}

impl UploadOutcome {
    pub fn is_bound(&self) -> bool {
        matches!(self, UploadOutcome::Bound { .. })
    }
}

/// A successful upload kept until stored names are finalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    pub field: String,
    pub handle: UploadHandle,
    pub id: String,
}

/// Replace every `{id}` of a template
pub fn substitute_id(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, id)
}

/// Whether a template carries the `{id}` placeholder
pub fn has_id_placeholder(template: &str) -> bool {
    template.contains(ID_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_id() {
        assert_eq!(substitute_id("cv_{id}.pdf", "42"), "cv_42.pdf");
        assert_eq!(substitute_id("{id}/{id}", "7"), "7/7");
        assert_eq!(substitute_id("static.pdf", "7"), "static.pdf");
        assert!(has_id_placeholder("users/{id}/"));
        assert!(!has_id_placeholder("users/"));
    }
}
