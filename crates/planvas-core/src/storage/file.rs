//! Directory-backed storage. One `{id}.json` file per document.

use super::{BoxFuture, Storage, StorageError, StorageResult, decode};
use crate::document::SceneDocument;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores documents as JSON files in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Io(format!("Failed to {action} {}: {e}", path.display()))
}

impl FileStorage {
    /// Open storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| io_error("create", &base_path, e))?;
        }
        Ok(Self { base_path })
    }

    /// Ids are reduced to `[A-Za-z0-9_-]` so they are always safe file names.
    fn document_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_id}.json"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, document: &SceneDocument) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(id);
        let json = document.to_json();
        Box::pin(async move {
            let json = json?;
            fs::write(&path, &json).map_err(|e| io_error("write", &path, e))?;
            log::info!("Saved document to {} ({} bytes)", path.display(), json.len());
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<SceneDocument>> {
        let path = self.document_path(id);
        let id = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            let json = fs::read_to_string(&path).map_err(|e| io_error("read", &path, e))?;
            decode(&id, &json)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(id);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| io_error("delete", &path, e))?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(Vec::new());
            }
            let entries = fs::read_dir(&base).map_err(|e| io_error("list", &base, e))?;
            let mut ids: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.document_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}
