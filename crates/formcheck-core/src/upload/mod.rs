//! Upload gating
//!
//! Files sent with a submission are bound to their fields before the
//! relational pass runs. A stored file's identifier becomes the field's
//! value, so an upload field is satisfied by a successful transfer. Once
//! the caller has persisted its record, stored names can be rewritten with
//! the record id through [`finalize_names`].
//!
//! Physical storage belongs to an [`UploadService`]. The library ships
//! [`MemoryUploadService`]; the command-line tool stores files on disk.
//!
//! Copyright (c) 2025 Formcheck Team
//! Licensed under the Apache-2.0 license

pub mod coordinator;
pub mod memory;
pub mod types;

pub use coordinator::{finalize_names, UploadCoordinator, UploadPass};
pub use memory::{MemoryUploadService, StoredFile};
pub use types::{
    has_id_placeholder, substitute_id, SendRequest, StoredUpload, UploadHandle, UploadOutcome,
    UploadRecord, ID_PLACEHOLDER, UPLOAD_ROOT,
};

use crate::error::SendError;
use crate::values::FileEntry;

/// Storage collaborator for uploaded files
pub trait UploadService {
    /// Whether the file may be stored for a field allowing `allowed_types`
    ///
    /// The default implementation compares the file extension with the
    /// allowed extensions.
    fn accepts(&self, entry: &FileEntry, allowed_types: &[String]) -> bool {
        entry
            .extension()
            .map(|ext| allowed_types.iter().any(|allowed| *allowed == ext))
            .unwrap_or(false)
    }

    /// Store a file and return its handle and identifier
    fn send(&self, request: &SendRequest<'_>) -> std::result::Result<StoredUpload, SendError>;

    /// Move the upload known by `id` to `new_path`
    fn rename_by_id(&self, id: &str, new_path: &str) -> std::result::Result<(), SendError>;

    /// Give a stored upload a new file name inside its folder
    fn rename_file(
        &self,
        handle: &UploadHandle,
        file_name: &str,
    ) -> std::result::Result<(), SendError>;

    /// Move a stored upload to another folder, keeping its file name
    fn move_to_folder(&self, handle: &UploadHandle, folder: &str)
        -> std::result::Result<(), SendError>;

    /// Path of a stored upload, used to display previously uploaded files
    fn resolve_path_by_id(&self, model: Option<&str>, id: &str) -> Option<String>;
}
