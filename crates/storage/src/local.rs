//! Durable adapter backed by a JSON file in a data directory.
//!
//! All keys live in one object file, mirroring a browser origin's local
//! storage. A detached instance has no backing directory and behaves as an
//! unavailable medium: reads return `None`, writes are dropped.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::repository::{KeyValueStore, StorageError, check_quota};

pub const STORAGE_FILE_NAME: &str = "local-storage.json";

/// Default quota, matching what browsers grant one origin.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

pub struct LocalStorage {
    file: Option<PathBuf>,
    quota: Option<usize>,
    lock: Mutex<()>,
}

impl LocalStorage {
    /// Opens storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self {
            file: Some(dir.as_ref().join(STORAGE_FILE_NAME)),
            quota: Some(DEFAULT_QUOTA_BYTES),
            lock: Mutex::new(()),
        }
    }

    /// Storage with no backing medium; every operation is a silent no-op.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            file: None,
            quota: None,
            lock: Mutex::new(()),
        }
    }

    /// Replaces the quota; `None` removes the limit.
    #[must_use]
    pub fn with_quota(mut self, bytes: Option<usize>) -> Self {
        self.quota = bytes;
        self
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.file.is_some()
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    fn read_entries(file: &Path) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(file) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }

    fn write_entries(file: &Path, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |e: io::Error| StorageError::Io(e.to_string());
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let raw = serde_json::to_string(entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = file.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(io_err)?;
        fs::rename(&tmp, file).map_err(io_err)
    }

    /// Read-modify-write under the instance lock. No-op when detached.
    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        let Some(file) = self.file.as_deref() else {
            return Ok(());
        };
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        let mut entries = Self::read_entries(file)?;
        apply(&mut entries)?;
        Self::write_entries(file, &entries)
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        let file = self.file.as_deref()?;
        let _guard = self.lock.lock().ok()?;
        match Self::read_entries(file) {
            Ok(mut entries) => entries.remove(key),
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "local storage unreadable");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let quota = self.quota;
        self.update(|entries| {
            check_quota(entries, key, value, quota)?;
            entries.insert(key.to_owned(), value.to_owned());
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
            Ok(())
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.clear();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_storage_is_a_no_op() {
        let storage = LocalStorage::detached();
        assert!(!storage.is_available());
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k"), None);
        storage.remove("k").unwrap();
        storage.clear().unwrap();
    }

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        LocalStorage::open(dir.path()).set("k", "値").unwrap();

        let reopened = LocalStorage::open(dir.path());
        assert_eq!(reopened.get("k").as_deref(), Some("値"));
    }

    #[test]
    fn creates_missing_directory_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = LocalStorage::open(&nested);
        assert_eq!(storage.get("k"), None);
        storage.set("k", "v").unwrap();
        assert!(nested.join(STORAGE_FILE_NAME).exists());
    }

    #[test]
    fn remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path());
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        storage.remove("a").unwrap();
        assert_eq!(storage.get("a"), None);
        assert_eq!(storage.get("b").as_deref(), Some("2"));
        storage.clear().unwrap();
        assert_eq!(storage.get("b"), None);
    }

    #[test]
    fn corrupt_file_reads_as_missing_and_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STORAGE_FILE_NAME), "{not json").unwrap();
        let storage = LocalStorage::open(dir.path());
        assert_eq!(storage.get("k"), None);
        assert!(matches!(
            storage.set("k", "v").unwrap_err(),
            StorageError::Serialization(_)
        ));
    }

    #[test]
    fn quota_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).with_quota(Some(4));
        assert!(matches!(
            storage.set("key", "value").unwrap_err(),
            StorageError::QuotaExceeded { .. }
        ));
        assert_eq!(storage.get("key"), None);
    }
}
