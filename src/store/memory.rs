//! In-memory key store for tests and embedding.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::{Error, Result};

use super::{KeyAlgorithm, KeyCreationParams, KeyHandle, KeyRecord, KeyStore};

/// A `KeyStore` backed by a `HashMap`
///
/// Keys live only as long as the store instance; useful for tests and for
/// callers that manage persistence themselves.
#[derive(Default)]
pub struct MemoryKeyStore {
    records: RwLock<HashMap<String, KeyRecord>>,
}

impl MemoryKeyStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn exists(&self, full_name: &str) -> Result<bool> {
        Ok(self.records.read().contains_key(full_name))
    }

    fn open(&self, full_name: &str) -> Result<KeyHandle> {
        let records = self.records.read();
        let record = records
            .get(full_name)
            .ok_or_else(|| Error::StoreNotFound(full_name.to_string()))?;
        record.to_handle(full_name)
    }

    fn create(
        &self,
        algorithm: KeyAlgorithm,
        full_name: &str,
        params: &KeyCreationParams,
    ) -> Result<KeyHandle> {
        let mut records = self.records.write();
        if records.contains_key(full_name) {
            return Err(Error::StoreWriteError(format!(
                "a key already exists under '{}'",
                full_name
            )));
        }

        let record = KeyRecord::generate(algorithm, params);
        let handle = record.to_handle(full_name)?;
        records.insert(full_name.to_string(), record);

        tracing::debug!(name = full_name, %algorithm, "created key in memory store");
        Ok(handle)
    }

    fn delete(&self, full_name: &str) -> Result<bool> {
        let removed = self.records.write().remove(full_name).is_some();
        if removed {
            tracing::debug!(name = full_name, "deleted key from memory store");
        }
        Ok(removed)
    }

    fn enumerate(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.records.read().keys().cloned().collect();
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
    fn test_create_open_delete() {
        let store = MemoryKeyStore::new();
        let params = KeyCreationParams::default();

        assert!(!store.exists("k1").unwrap());

        let created = store.create(KeyAlgorithm::EcdhP521, "k1", &params).unwrap();
        assert!(store.exists("k1").unwrap());

        let opened = store.open("k1").unwrap();
        assert_eq!(opened.unique_name(), created.unique_name());
        assert_eq!(opened.secret(), created.secret());

        assert!(store.delete("k1").unwrap());
        assert!(!store.delete("k1").unwrap());
        assert!(!store.exists("k1").unwrap());
    }

    #[test]
    fn test_create_duplicate_fails() {
        let store = MemoryKeyStore::new();
        let params = KeyCreationParams::default();

        store.create(KeyAlgorithm::EcdhP521, "k1", &params).unwrap();
        let err = store
            .create(KeyAlgorithm::EcdhP521, "k1", &params)
            .unwrap_err();
        assert!(matches!(err, Error::StoreWriteError(_)));
    }

    #[test]
    fn test_open_missing_fails() {
        let store = MemoryKeyStore::new();
        assert!(matches!(
            store.open("missing").unwrap_err(),
            Error::StoreNotFound(_)
        ));
    }

    #[test]
    fn test_enumerate_sorted() {
        let store = MemoryKeyStore::new();
        let params = KeyCreationParams::default();
        store.create(KeyAlgorithm::EcdhP521, "b", &params).unwrap();
        store.create(KeyAlgorithm::Ed25519, "a", &params).unwrap();

        assert_eq!(store.enumerate().unwrap(), vec!["a", "b"]);
    }
}
