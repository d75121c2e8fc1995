//! # Error Handling
//!
//! This module provides the error types for Keyhaven Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Validation Errors                                                 │
//! │  │   ├── InvalidArgument       - Missing/empty required input          │
//! │  │   └── InvalidState          - Mutation of an initialized identity   │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                     │
//! │  │   ├── UnsupportedAlgorithm  - Handle on the wrong curve             │
//! │  │   ├── KeyAgreementFailed    - Peer key unusable for ECDH            │
//! │  │   ├── KeyDerivationFailed   - HKDF expansion failed                 │
//! │  │   ├── EncryptionFailed      - Cipher encryption failed              │
//! │  │   └── DecryptionFailed      - Authentication tag mismatch           │
//! │  │                                                                      │
//! │  └── Store Errors                                                      │
//! │      ├── StoreReadError        - Failed to read from the key store     │
//! │      ├── StoreWriteError       - Failed to write to the key store      │
//! │      ├── StoreNotFound         - Key not present in the store          │
//! │      └── StoreCorrupted        - Key record corruption detected        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//!
//! Validation errors are raised immediately and locally, before any key
//! material or cipher context is acquired. Store failures during enumeration
//! are the single exception to fail-fast: individual unreadable entries are
//! skipped and logged, never propagated. Everything else propagates with `?`
//! and no silent recovery — blind retries in a cryptographic core are unsafe.

use thiserror::Error;

/// Result type alias for Keyhaven Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Keyhaven Core
///
/// All errors are categorized by domain to make error handling clearer and
/// to provide meaningful error messages to callers.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// A required argument is missing or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Attempt to mutate a field that has already been initialized
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ========================================================================
    // Crypto Errors
    // ========================================================================
    /// A supplied key handle is not on the required curve
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The peer's public key is unusable for key agreement
    #[error("Key agreement failed: {0}")]
    KeyAgreementFailed(String),

    /// Key derivation failed
    #[error("Failed to derive keys: {0}")]
    KeyDerivationFailed(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (authentication tag mismatch, wrong key, or
    /// tampered ciphertext)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    // ========================================================================
    // Store Errors
    // ========================================================================
    /// Failed to read from the key store
    #[error("Failed to read from the key store: {0}")]
    StoreReadError(String),

    /// Failed to write to the key store
    #[error("Failed to write to the key store: {0}")]
    StoreWriteError(String),

    /// Key not found in the store
    #[error("Key not found in the store: {0}")]
    StoreNotFound(String),

    /// Key record corruption detected
    #[error("Key store corruption detected: {0}")]
    StoreCorrupted(String),
}

impl Error {
    /// Check whether this error is a validation failure raised before any
    /// resource was acquired
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidArgument(_) | Error::InvalidState(_))
    }

    /// Check whether this error originated in the underlying key store
    pub fn is_store(&self) -> bool {
        matches!(
            self,
            Error::StoreReadError(_)
                | Error::StoreWriteError(_)
                | Error::StoreNotFound(_)
                | Error::StoreCorrupted(_)
        )
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::StoreReadError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::StoreCorrupted(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(Error::InvalidArgument("name".into()).is_validation());
        assert!(Error::InvalidState("name already set".into()).is_validation());
        assert!(!Error::DecryptionFailed("tag mismatch".into()).is_validation());
    }

    #[test]
    fn test_store_classification() {
        assert!(Error::StoreReadError("io".into()).is_store());
        assert!(Error::StoreNotFound("alice".into()).is_store());
        assert!(!Error::KeyAgreementFailed("no key".into()).is_store());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = Error::UnsupportedAlgorithm("expected NIST P-521".into());
        assert!(err.to_string().contains("NIST P-521"));
    }
}
