//! One JSON document per library key, in a directory on disk.

use super::{BoxFuture, Storage, StorageError, StorageResult, decode, encode};
use crate::store::AnnotationLibrary;
use std::fs;
use std::path::{Path, PathBuf};

/// Saves each library as `<sanitized key>.json` under `base_path`.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Annotations live in `base_path`, which is created when missing.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&base_path)
            .map_err(|e| StorageError::Io(format!("cannot create {}: {e}", base_path.display())))?;
        Ok(Self { base_path })
    }

    /// `pdfink/annotations` under the platform's local data directory
    /// (`~/.local/share` on Linux), or under the home directory.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Other("no data or home directory to keep annotations in".to_string()))?;
        Self::new(base.join("pdfink").join("annotations"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Anything outside `[A-Za-z0-9_-]` becomes `_`, so `docs/a:b*c` is
    /// stored as `docs_a_b_c.json`.
    fn entry_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe}.json"))
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, library: &AnnotationLibrary) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.entry_path(key);
        let json = encode(library);
        Box::pin(async move {
            let json = json?;
            fs::write(&path, json)
                .map_err(|e| StorageError::Io(format!("cannot write {}: {e}", path.display())))?;
            log::debug!("Wrote annotation library {}", path.display());
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<AnnotationLibrary>> {
        let path = self.entry_path(key);
        let key = key.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            let json = fs::read_to_string(&path)
                .map_err(|e| StorageError::Io(format!("cannot read {}: {e}", path.display())))?;
            decode(&key, &json)
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| StorageError::Io(format!("cannot remove {}: {e}", path.display())))?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }
            let entries =
                fs::read_dir(&base).map_err(|e| StorageError::Io(format!("cannot list {}: {e}", base.display())))?;
            let keys = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
                .collect();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.entry_path(key);
        Box::pin(async move { Ok(path.exists()) })
    }
}
