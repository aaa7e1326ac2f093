//! Key-value blob persistence behind the activity store.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// A named-blob store. Each key holds one opaque string that is always read
/// and written in full.
pub trait BlobStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, String>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: &str, value: impl Into<String>) -> Self {
        let mut blobs = HashMap::new();
        blobs.insert(key.to_string(), value.into());
        Self { blobs }
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`. Writes land in a sibling temp file
/// that is renamed over the target.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path, err)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(|err| io_error(&self.dir, err))?;

        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));
        let mut file = fs::File::create(&tmp_path).map_err(|err| io_error(&tmp_path, err))?;
        file.write_all(value.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|err| io_error(&tmp_path, err))?;
        drop(file);

        fs::rename(&tmp_path, &path).map_err(|err| io_error(&path, err))?;
        tracing::debug!(path = %path.display(), bytes = value.len(), "Blob written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_reads_back_writes() {
        let mut store = MemoryBlobStore::new();
        assert_eq!(store.read("k").unwrap(), None);
        store.write("k", "[]").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("[]"));
        store.write("k", "[1]").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().join("data"));
        assert_eq!(store.read("extracurriculars").unwrap(), None);
    }

    #[test]
    fn file_store_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileBlobStore::new(dir.path().join("nested").join("data"));

        store.write("extracurriculars", "[\"a\"]").unwrap();
        store.write("extracurriculars", "[\"b\"]").unwrap();

        let path = store.path_for("extracurriculars").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[\"b\"]");
        assert_eq!(
            store.read("extracurriculars").unwrap().as_deref(),
            Some("[\"b\"]")
        );
        assert!(!dir
            .path()
            .join("nested/data/.extracurriculars.json.tmp")
            .exists());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileBlobStore::new(dir.path());
        assert!(matches!(
            store.write("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.read(""), Err(StorageError::InvalidKey(_))));
    }
}
