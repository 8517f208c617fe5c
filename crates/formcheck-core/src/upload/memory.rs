//! Upload service keeping stored files in memory

use super::types::{SendRequest, StoredUpload, UploadHandle};
use super::UploadService;
use crate::error::SendError;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A file stored by [`MemoryUploadService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub id: String,
    pub handle: UploadHandle,
    /// Folder, upload root included, with a trailing slash
    pub folder: String,
    pub file_name: String,
    pub original_name: String,
    pub size: u64,
}

impl StoredFile {
    pub fn path(&self) -> String {
        format!("{}{}", self.folder, self.file_name)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    files: BTreeMap<String, StoredFile>,
}

/// In-memory [`UploadService`]
///
/// Identifiers are sequential integers starting at 1. A service built with
/// [`MemoryUploadService::failing`] refuses every send.
#[derive(Debug, Default)]
pub struct MemoryUploadService {
    state: Mutex<MemoryState>,
    refuse_sends: bool,
}

impl MemoryUploadService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service whose storage is unavailable
    pub fn failing() -> Self {
        Self {
            state: Mutex::default(),
            refuse_sends: true,
        }
    }

    /// Stored file by upload id
    pub fn stored(&self, id: &str) -> Option<StoredFile> {
        self.state.lock().ok()?.files.get(id).cloned()
    }

    /// Every stored file, ordered by id
    pub fn files(&self) -> Vec<StoredFile> {
        self.state
            .lock()
            .map(|state| state.files.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.files.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut MemoryState) -> Result<T, SendError>,
    ) -> Result<T, SendError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SendError::Other("upload store poisoned".to_string()))?;
        f(&mut state)
    }

    fn with_handle<T>(
        &self,
        handle: &UploadHandle,
        f: impl FnOnce(&mut StoredFile) -> T,
    ) -> Result<T, SendError> {
        self.with_state(|state| {
            state
                .files
                .values_mut()
                .find(|file| file.handle == *handle)
                .map(f)
                .ok_or_else(|| SendError::UnknownUpload {
                    id: handle.to_string(),
                })
        })
    }
}

fn with_extension(name: &str, original: &str) -> String {
    match original.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !name.contains('.') => format!("{}.{}", name, ext),
        _ => name.to_string(),
    }
}

fn with_trailing_slash(folder: &str) -> String {
    if folder.is_empty() || folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{}/", folder)
    }
}

impl UploadService for MemoryUploadService {
    fn send(&self, request: &SendRequest<'_>) -> Result<StoredUpload, SendError> {
        let entry = request.entry;
        if entry.error != 0 {
            return Err(SendError::Transfer {
                file: entry.name.clone(),
                code: entry.error,
            });
        }
        if self.refuse_sends {
            return Err(SendError::Write {
                path: request.folder.clone(),
                reason: "storage unavailable".to_string(),
            });
        }

        self.with_state(|state| {
            state.next_id += 1;
            let id = state.next_id.to_string();
            let handle = UploadHandle(format!("memory-{}", id));
            let file_name = match &request.file_name {
                Some(name) => with_extension(name, &entry.name),
                None => entry.name.clone(),
            };
            state.files.insert(
                id.clone(),
                StoredFile {
                    id: id.clone(),
                    handle: handle.clone(),
                    folder: with_trailing_slash(&request.folder),
                    file_name,
                    original_name: entry.name.clone(),
                    size: entry.size,
                },
            );
            Ok(StoredUpload { handle, id })
        })
    }

    fn rename_by_id(&self, id: &str, new_path: &str) -> Result<(), SendError> {
        self.with_state(|state| {
            let file = state
                .files
                .get_mut(id)
                .ok_or_else(|| SendError::UnknownUpload { id: id.to_string() })?;
            let (folder, name) = match new_path.rsplit_once('/') {
                Some((folder, name)) => (format!("{}/", folder), name.to_string()),
                None => (String::new(), new_path.to_string()),
            };
            file.folder = folder;
            file.file_name = with_extension(&name, &file.original_name);
            Ok(())
        })
    }

    fn rename_file(&self, handle: &UploadHandle, file_name: &str) -> Result<(), SendError> {
        self.with_handle(handle, |file| {
            file.file_name = with_extension(file_name, &file.original_name);
        })
    }

    fn move_to_folder(&self, handle: &UploadHandle, folder: &str) -> Result<(), SendError> {
        self.with_handle(handle, |file| {
            file.folder = with_trailing_slash(folder);
        })
    }

    fn resolve_path_by_id(&self, _model: Option<&str>, id: &str) -> Option<String> {
        self.stored(id).map(|file| file.path())
    }
}
