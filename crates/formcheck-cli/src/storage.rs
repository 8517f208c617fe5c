//! Upload storage on the local file system
//!
//! Files are copied from their temporary location into a tree rooted at the
//! configured directory. A manifest next to the tree maps upload ids to
//! stored paths so that later runs can resolve and rename them.

use crate::config::StorageConfig;
use formcheck_core::upload::{SendRequest, StoredUpload, UploadHandle, UploadService};
use formcheck_core::SendError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Manifest file name, relative to the storage root
pub const MANIFEST_FILE: &str = ".formcheck-uploads.json";

const HANDLE_PREFIX: &str = "disk-";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    next_id: u64,
    /// Upload id to path relative to the storage root
    files: BTreeMap<String, String>,
}

/// [`UploadService`] writing files under a root directory
#[derive(Debug)]
pub struct DirectoryUploadService {
    root: PathBuf,
    allow_overwrite: bool,
    manifest: Mutex<Manifest>,
}

impl DirectoryUploadService {
    /// Open the storage rooted at `root`, reading its manifest if any
    pub fn open(root: impl Into<PathBuf>, allow_overwrite: bool) -> std::io::Result<Self> {
        let root = root.into();
        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            let content = fs::read_to_string(&manifest_path)?;
            serde_json::from_str(&content)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?
        } else {
            Manifest::default()
        };
        debug!(root = %root.display(), files = manifest.files.len(), "upload storage opened");

        Ok(Self {
            root,
            allow_overwrite,
            manifest: Mutex::new(manifest),
        })
    }

    pub fn from_config(config: &StorageConfig) -> std::io::Result<Self> {
        Self::open(&config.upload_root, config.allow_overwrite)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stored path of an upload, relative to the root
    pub fn stored_path(&self, id: &str) -> Option<String> {
        self.manifest.lock().ok()?.files.get(id).cloned()
    }

    fn with_manifest<T>(
        &self,
        f: impl FnOnce(&mut Manifest) -> Result<T, SendError>,
    ) -> Result<T, SendError> {
        let mut manifest = self
            .manifest
            .lock()
            .map_err(|_| SendError::Other("upload manifest poisoned".to_string()))?;
        let result = f(&mut manifest)?;
        self.persist(&manifest)?;
        Ok(result)
    }

    fn persist(&self, manifest: &Manifest) -> Result<(), SendError> {
        let path = self.root.join(MANIFEST_FILE);
        let content = serde_json::to_string_pretty(manifest)
            .map_err(|e| SendError::Other(e.to_string()))?;
        fs::create_dir_all(&self.root).map_err(|e| write_error(&self.root, e))?;
        fs::write(&path, content).map_err(|e| write_error(&path, e))
    }

    /// Move the file of `id` to `relative`, updating the manifest
    fn relocate(&self, manifest: &mut Manifest, id: &str, relative: String) -> Result<(), SendError> {
        let current = manifest
            .files
            .get(id)
            .cloned()
            .ok_or_else(|| SendError::UnknownUpload { id: id.to_string() })?;
        let relative = confine(&relative)?;
        if current == relative {
            return Ok(());
        }

        let from = self.root.join(&current);
        let to = self.root.join(&relative);
        self.ensure_writable(&to)?;
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
        }
        fs::rename(&from, &to).map_err(|e| write_error(&to, e))?;
        info!(id, from = %current, to = %relative, "stored upload moved");

        manifest.files.insert(id.to_string(), relative);
        Ok(())
    }

    fn ensure_writable(&self, path: &Path) -> Result<(), SendError> {
        if path.exists() && !self.allow_overwrite {
            return Err(SendError::Write {
                path: path.display().to_string(),
                reason: "file already exists".to_string(),
            });
        }
        Ok(())
    }
}

fn write_error(path: &Path, err: std::io::Error) -> SendError {
    SendError::Write {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn id_of(handle: &UploadHandle) -> Result<&str, SendError> {
    handle
        .0
        .strip_prefix(HANDLE_PREFIX)
        .ok_or_else(|| SendError::UnknownUpload {
            id: handle.to_string(),
        })
}

/// Append the extension of `original` unless `name` already has one
fn with_extension(name: &str, original: &str) -> String {
    match original.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !name.contains('.') => format!("{}.{}", name, ext),
        _ => name.to_string(),
    }
}

fn join_folder(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", folder, file_name)
    }
}

/// Final component of a client-supplied file name
fn client_file_name(name: &str) -> Result<String, SendError> {
    Path::new(&name.replace('\\', "/"))
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| SendError::Write {
            path: name.to_string(),
            reason: "invalid file name".to_string(),
        })
}

/// Check that a relative path stays below the storage root
fn confine(relative: &str) -> Result<String, SendError> {
    let inside = Path::new(relative)
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if inside && !relative.is_empty() {
        Ok(relative.to_string())
    } else {
        Err(SendError::Write {
            path: relative.to_string(),
            reason: "path leaves the upload root".to_string(),
        })
    }
}

fn split_path(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

impl UploadService for DirectoryUploadService {
    fn send(&self, request: &SendRequest<'_>) -> Result<StoredUpload, SendError> {
        let entry = request.entry;
        if entry.error != 0 {
            return Err(SendError::Transfer {
                file: entry.name.clone(),
                code: entry.error,
            });
        }
        if let Some([width, height]) = request.resize {
            debug!(width, height, file = %entry.name, "resizing is not supported, storing original");
        }

        let original = client_file_name(&entry.name)?;
        let file_name = match &request.file_name {
            Some(name) => with_extension(name, &original),
            None => original,
        };
        let relative = confine(&join_folder(&request.folder, &file_name))?;
        let destination = self.root.join(&relative);

        self.with_manifest(|manifest| {
            self.ensure_writable(&destination)?;
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
            }
            fs::copy(&entry.tmp_path, &destination).map_err(|e| write_error(&destination, e))?;

            manifest.next_id += 1;
            let id = manifest.next_id.to_string();
            manifest.files.insert(id.clone(), relative.clone());
            info!(id = %id, path = %relative, "upload stored");

            Ok(StoredUpload {
                handle: UploadHandle(format!("{}{}", HANDLE_PREFIX, id)),
                id,
            })
        })
    }

    fn rename_by_id(&self, id: &str, new_path: &str) -> Result<(), SendError> {
        self.with_manifest(|manifest| {
            let current = manifest
                .files
                .get(id)
                .cloned()
                .ok_or_else(|| SendError::UnknownUpload { id: id.to_string() })?;
            let (folder, name) = split_path(new_path);
            let relative = join_folder(folder, &with_extension(name, split_path(&current).1));
            self.relocate(manifest, id, relative)
        })
    }

    fn rename_file(&self, handle: &UploadHandle, file_name: &str) -> Result<(), SendError> {
        let id = id_of(handle)?;
        self.with_manifest(|manifest| {
            let current = manifest
                .files
                .get(id)
                .cloned()
                .ok_or_else(|| SendError::UnknownUpload { id: id.to_string() })?;
            let (folder, name) = split_path(&current);
            let relative = join_folder(folder, &with_extension(file_name, name));
            self.relocate(manifest, id, relative)
        })
    }

    fn move_to_folder(&self, handle: &UploadHandle, folder: &str) -> Result<(), SendError> {
        let id = id_of(handle)?;
        self.with_manifest(|manifest| {
            let current = manifest
                .files
                .get(id)
                .cloned()
                .ok_or_else(|| SendError::UnknownUpload { id: id.to_string() })?;
            let (_, name) = split_path(&current);
            let relative = join_folder(folder, name);
            self.relocate(manifest, id, relative)
        })
    }

    fn resolve_path_by_id(&self, _model: Option<&str>, id: &str) -> Option<String> {
        self.stored_path(id)
    }
}
