//! File-backed key store.
//!
//! One JSON record per key under a base directory. The full store name is
//! hex-encoded into the file name, so arbitrary names (including the managed
//! namespace prefix) never meet file-system naming rules.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{KeyAlgorithm, KeyCreationParams, KeyHandle, KeyRecord, KeyStore};

const KEY_FILE_EXT: &str = "key";

/// A `KeyStore` persisting each key as a JSON file
pub struct FileKeyStore {
    base_dir: PathBuf,
}

impl FileKeyStore {
    /// Open a store rooted at the given directory, creating it if absent
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)
            .map_err(|e| Error::StoreWriteError(format!("cannot create store directory: {}", e)))?;
        Ok(Self { base_dir })
    }

    /// The directory this store persists into
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn record_path(&self, full_name: &str) -> PathBuf {
        self.base_dir
            .join(hex::encode(full_name.as_bytes()))
            .with_extension(KEY_FILE_EXT)
    }

    fn read_record(&self, full_name: &str) -> Result<KeyRecord> {
        let path = self.record_path(full_name);
        if !path.exists() {
            return Err(Error::StoreNotFound(full_name.to_string()));
        }

        let json = fs::read_to_string(&path)?;
        let record: KeyRecord = serde_json::from_str(&json)?;
        Ok(record)
    }
}

impl KeyStore for FileKeyStore {
    fn exists(&self, full_name: &str) -> Result<bool> {
        Ok(self.record_path(full_name).exists())
    }

    fn open(&self, full_name: &str) -> Result<KeyHandle> {
        self.read_record(full_name)?.to_handle(full_name)
    }

    fn create(
        &self,
        algorithm: KeyAlgorithm,
        full_name: &str,
        params: &KeyCreationParams,
    ) -> Result<KeyHandle> {
        let path = self.record_path(full_name);
        if path.exists() {
            return Err(Error::StoreWriteError(format!(
                "a key already exists under '{}'",
                full_name
            )));
        }

        let record = KeyRecord::generate(algorithm, params);
        let handle = record.to_handle(full_name)?;

        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| Error::StoreWriteError(e.to_string()))?;
        fs::write(&path, json).map_err(|e| Error::StoreWriteError(e.to_string()))?;

        tracing::debug!(name = full_name, %algorithm, "created key in file store");
        Ok(handle)
    }

    fn delete(&self, full_name: &str) -> Result<bool> {
        let path = self.record_path(full_name);
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).map_err(|e| Error::StoreWriteError(e.to_string()))?;
        tracing::debug!(name = full_name, "deleted key from file store");
        Ok(true)
    }

    fn enumerate(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(KEY_FILE_EXT) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match hex::decode(stem).ok().and_then(|b| String::from_utf8(b).ok()) {
                Some(name) => names.push(name),
                None => {
                    // Not one of ours; leave it alone
                    tracing::warn!(file = %path.display(), "skipping unrecognized store file");
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let params = KeyCreationParams::default();

        let unique = {
            let store = FileKeyStore::open(dir.path()).unwrap();
            let handle = store
                .create(KeyAlgorithm::EcdhP521, "alice", &params)
                .unwrap();
            handle.unique_name().to_string()
        };

        let store = FileKeyStore::open(dir.path()).unwrap();
        assert!(store.exists("alice").unwrap());
        let handle = store.open("alice").unwrap();
        assert_eq!(handle.unique_name(), unique);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::open(dir.path()).unwrap();
        assert!(!store.delete("nobody").unwrap());
    }

    #[test]
    fn test_enumerate_lists_created_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::open(dir.path()).unwrap();
        let params = KeyCreationParams::default();

        store
            .create(KeyAlgorithm::EcdhP521, "with spaces and / chars", &params)
            .unwrap();
        store.create(KeyAlgorithm::Ed25519, "plain", &params).unwrap();

        let names = store.enumerate().unwrap();
        assert_eq!(names, vec!["plain", "with spaces and / chars"]);
    }

    #[test]
    fn test_corrupt_record_surfaces_as_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::open(dir.path()).unwrap();
        let params = KeyCreationParams::default();

        store
            .create(KeyAlgorithm::EcdhP521, "alice", &params)
            .unwrap();
        let path = store.record_path("alice");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            store.open("alice").unwrap_err(),
            Error::StoreCorrupted(_)
        ));
    }
}
