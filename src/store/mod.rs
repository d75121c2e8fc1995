//! # Key Store Module
//!
//! Persistent storage for private key pairs.
//!
//! ## Store Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          KEY STORE                                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  KeyStore Trait                                                 │   │
//! │  │  ──────────────                                                  │   │
//! │  │                                                                 │   │
//! │  │  • exists(full_name)          - Check for a key                 │   │
//! │  │  • open(full_name)            - Open an existing key            │   │
//! │  │  • create(alg, name, params)  - Create a new key pair           │   │
//! │  │  • delete(full_name)          - Remove a key                    │   │
//! │  │  • enumerate()                - List all store names            │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  Implementations:                                                      │
//! │  ────────────────                                                       │
//! │                                                                         │
//! │  ┌───────────────────┐      ┌───────────────────┐                      │
//! │  │  MemoryKeyStore   │      │   FileKeyStore    │                      │
//! │  │                   │      │                   │                      │
//! │  │  - HashMap behind │      │  - One JSON       │                      │
//! │  │    an RwLock      │      │    record per key │                      │
//! │  │  - Tests,         │      │  - Hex-encoded    │                      │
//! │  │    embedding      │      │    file names     │                      │
//! │  └───────────────────┘      └───────────────────┘                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store assigns every created key a unique name (UUID v4) that survives
//! re-opens; callers use it to confirm that two opens of the same store name
//! resolved to the same key material. The store serializes conflicting
//! create/open/delete races internally; no higher-level locking is provided.

mod file;
mod memory;

pub use file::FileKeyStore;
pub use memory::MemoryKeyStore;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::ExchangeKeyPair;
use crate::error::Result;

/// The asymmetric algorithm a stored key pair belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// ECDH on NIST P-521 — the only algorithm the exchange pipeline accepts
    EcdhP521,
    /// Ed25519 signing keys; storable and enumerable, but incompatible with
    /// the exchange pipeline
    Ed25519,
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyAlgorithm::EcdhP521 => write!(f, "ECDH-P521"),
            KeyAlgorithm::Ed25519 => write!(f, "Ed25519"),
        }
    }
}

/// Export policy of a stored key pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportPolicy {
    /// Key material may not leave the store
    NoExport,
    /// Key material may be exported freely
    #[default]
    AllowExport,
    /// Key material may be exported without encryption
    AllowPlaintextExport,
    /// Key material may only be exported for archival
    AllowArchiving,
    /// Key material may be archived without encryption
    AllowPlaintextArchiving,
}

/// Permitted usages of a stored key pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyUsages {
    /// All standard usages
    #[default]
    AllUsages,
    /// Key agreement only
    KeyAgreement,
    /// Signing only
    Signing,
    /// Decryption only
    Decryption,
}

/// Parameters for creating a new key pair in a store
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyCreationParams {
    /// Export policy for the new key
    pub export_policy: ExportPolicy,
    /// Permitted usages for the new key
    pub usages: KeyUsages,
}

/// An opened key pair, as handed out by a store
///
/// Owns a copy of the private key material for the duration of its lifetime;
/// the secret is zeroized on drop. The authoritative copy stays in the store.
pub struct KeyHandle {
    store_name: String,
    unique_name: String,
    algorithm: KeyAlgorithm,
    export_policy: ExportPolicy,
    usages: KeyUsages,
    secret: Zeroizing<Vec<u8>>,
}

impl KeyHandle {
    /// The full store name this key was created under
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// The store-assigned unique name, stable across re-opens
    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// The algorithm of the stored key pair
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// The export policy the key was created with
    pub fn export_policy(&self) -> ExportPolicy {
        self.export_policy
    }

    /// The permitted usages the key was created with
    pub fn usages(&self) -> KeyUsages {
        self.usages
    }

    /// The raw private key material
    ///
    /// ## Security Warning
    ///
    /// Only use this to reconstruct a key pair for a scoped session. Never
    /// log or transmit these bytes.
    pub(crate) fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl std::fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyHandle")
            .field("store_name", &self.store_name)
            .field("unique_name", &self.unique_name)
            .field("algorithm", &self.algorithm)
            .field("export_policy", &self.export_policy)
            .field("usages", &self.usages)
            .finish_non_exhaustive()
    }
}

/// Persistent key store interface
///
/// Implementations must serialize conflicting operations internally. All
/// calls are synchronous and blocking; there is no cancellation contract.
pub trait KeyStore: Send + Sync {
    /// Check whether a key exists under the given full store name
    fn exists(&self, full_name: &str) -> Result<bool>;

    /// Open an existing key
    ///
    /// Fails with `StoreNotFound` if no key exists under that name.
    fn open(&self, full_name: &str) -> Result<KeyHandle>;

    /// Create a new key pair under the given full store name
    ///
    /// Fails with `StoreWriteError` if a key already exists under that name.
    fn create(
        &self,
        algorithm: KeyAlgorithm,
        full_name: &str,
        params: &KeyCreationParams,
    ) -> Result<KeyHandle>;

    /// Delete the key under the given full store name
    ///
    /// Returns `false` without error if no such key exists.
    fn delete(&self, full_name: &str) -> Result<bool>;

    /// List the full store names of every key in the store
    fn enumerate(&self) -> Result<Vec<String>>;
}

// ============================================================================
// SHARED RECORD FORM
// ============================================================================

/// The stored form of one key pair, shared by all store implementations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct KeyRecord {
    pub unique_name: String,
    pub algorithm: KeyAlgorithm,
    pub export_policy: ExportPolicy,
    pub usages: KeyUsages,
    /// Hex-encoded private key material
    pub secret: String,
}

impl KeyRecord {
    /// Generate a fresh key pair record for the given algorithm
    pub fn generate(algorithm: KeyAlgorithm, params: &KeyCreationParams) -> Self {
        let secret = match algorithm {
            KeyAlgorithm::EcdhP521 => ExchangeKeyPair::generate().secret_bytes(),
            KeyAlgorithm::Ed25519 => {
                use rand::RngCore;
                let mut bytes = Zeroizing::new(vec![0u8; 32]);
                rand::rngs::OsRng.fill_bytes(&mut bytes);
                bytes
            }
        };

        Self {
            unique_name: uuid::Uuid::new_v4().to_string(),
            algorithm,
            export_policy: params.export_policy,
            usages: params.usages,
            secret: hex::encode(&secret),
        }
    }

    /// Materialize a handle from this record
    pub fn to_handle(&self, store_name: &str) -> Result<KeyHandle> {
        let secret = hex::decode(&self.secret).map_err(|_| {
            crate::error::Error::StoreCorrupted(format!(
                "key record for '{}' holds invalid key material",
                store_name
            ))
        })?;

        Ok(KeyHandle {
            store_name: store_name.to_string(),
            unique_name: self.unique_name.clone(),
            algorithm: self.algorithm,
            export_policy: self.export_policy,
            usages: self.usages,
            secret: Zeroizing::new(secret),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
