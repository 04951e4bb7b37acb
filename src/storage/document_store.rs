// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON document store on the local filesystem.
//!
//! One document per file. Writes go to a temp file that is then renamed
//! into place, so readers never observe a half-written document. Creation
//! uses a hard link from the temp file, which fails if the target already
//! exists and therefore doubles as a uniqueness check.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

/// Error type for document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(io::Error),
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Document not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// Document already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    /// Storage not initialized
    #[error("Storage not initialized")]
    NotInitialized,
    /// Health check read back different bytes
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(e.to_string()),
            _ => StorageError::Io(e),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Filesystem-backed JSON document store.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    paths: StoragePaths,
    initialized: bool,
}

impl DocumentStore {
    /// Create a new DocumentStore instance.
    ///
    /// Does NOT create the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the directory structure. Idempotent.
    pub fn initialize(&mut self) -> StorageResult<()> {
        fs::create_dir_all(self.paths.users_dir())?;
        self.initialized = true;
        Ok(())
    }

    /// Write-read-delete check of the data directory.
    pub fn health_check(&self) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let test_file = self.paths.root().join(".health_check");
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(StorageError::IntegrityViolation(
                "Health check data mismatch".to_string(),
            ));
        }

        Ok(())
    }

    /// Read a JSON file and deserialize it.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let value = serde_json::from_reader(reader)?;
        Ok(value)
    }

    /// Replace a JSON document (atomic write via rename).
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        let temp_path = self.write_temp(path, value)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Create a JSON document, failing with `AlreadyExists` if one is present.
    pub fn create_json<T: Serialize>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        let temp_path = self.write_temp(path, value)?;
        let linked = fs::hard_link(&temp_path, path);
        fs::remove_file(&temp_path)?;

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_temp<T: Serialize>(&self, path: &Path, value: &T) -> StorageResult<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(temp_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    fn test_store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = DocumentStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("Failed to initialize test storage");
        (dir, store)
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        id: String,
        value: i32,
    }

    #[test]
    fn initialize_creates_directories() {
        let (_dir, store) = test_store();
        assert!(store.paths().users_dir().exists());
    }

    #[test]
    fn write_and_read_json() {
        let (_dir, store) = test_store();
        let data = TestData {
            id: "test-1".to_string(),
            value: 42,
        };

        let path = store.paths().user("test-1");
        store.write_json(&path, &data).unwrap();

        let read: TestData = store.read_json(&path).unwrap();
        assert_eq!(read, data);
    }

    #[test]
    fn create_json_refuses_to_overwrite() {
        let (_dir, store) = test_store();
        let path = store.paths().user("dup");
        let first = TestData {
            id: "dup".to_string(),
            value: 1,
        };
        store.create_json(&path, &first).unwrap();

        let second = TestData {
            id: "dup".to_string(),
            value: 2,
        };
        let result = store.create_json(&path, &second);
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

        let read: TestData = store.read_json(&path).unwrap();
        assert_eq!(read, first);

        // No temp files left behind
        let entries = fs::read_dir(store.paths().users_dir()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn missing_document_is_not_found() {
        let (_dir, store) = test_store();
        let result = store.read_json::<TestData>(store.paths().user("nobody"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn health_check_works() {
        let (_dir, store) = test_store();
        store.health_check().expect("Health check should pass");
    }

    #[test]
    fn write_json_replaces_existing_document() {
        let (_dir, store) = test_store();
        let path = store.paths().user("replace");
        for value in [1, 2] {
            let data = TestData {
                id: "replace".to_string(),
                value,
            };
            store.write_json(&path, &data).unwrap();
        }

        let read: TestData = store.read_json(&path).unwrap();
        assert_eq!(read.value, 2);
    }

    #[test]
    fn uninitialized_storage_returns_error() {
        let store = DocumentStore::new(StoragePaths::new("/tmp/never-init"));
        let result = store.read_json::<TestData>("/tmp/any.json");
        assert!(matches!(result, Err(StorageError::NotInitialized)));
    }
}
