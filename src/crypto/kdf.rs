//! # Key Derivation
//!
//! Derivation of the symmetric cipher key from an ECDH shared secret.
//!
//! ## Derivation Scheme
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 SHARED SECRET → CIPHER KEY                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  P-521 ECDH output (66 bytes)                                          │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  HKDF-SHA512(                                                          │
//! │    ikm  = shared_secret,                                               │
//! │    salt = empty,                                                       │
//! │    info = "keyhaven-exchange-key-v1"                                   │
//! │  )                                                                     │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  AES-256-GCM key (32 bytes)                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The fixed info string gives cryptographic domain separation and carries a
//! version suffix so the scheme can be upgraded without ambiguity.

use hkdf::Hkdf;
use sha2::Sha512;

use crate::error::{Error, Result};

use super::encryption::{EncryptionKey, SharedSecret};
use super::KEY_SIZE;

/// Domain separation strings for HKDF
pub mod domain {
    /// Domain for the exchange cipher key derivation
    pub const EXCHANGE_KEY: &[u8] = b"keyhaven-exchange-key-v1";
}

/// Derive the symmetric cipher key for one exchange from a shared secret
///
/// Deterministic: both parties derive the same key from the same ECDH output.
pub fn derive_exchange_key(shared: &SharedSecret) -> Result<EncryptionKey> {
    let hkdf = Hkdf::<Sha512>::new(None, shared.as_bytes());

    let mut key = [0u8; KEY_SIZE];
    hkdf.expand(domain::EXCHANGE_KEY, &mut key)
        .map_err(|_| Error::KeyDerivationFailed("HKDF expansion failed".into()))?;

    Ok(EncryptionKey::from_bytes(key))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SHARED_SECRET_SIZE;

    #[test]
    fn test_derivation_deterministic() {
        let shared = SharedSecret::from_slice(&[42u8; SHARED_SECRET_SIZE]);

        let key1 = derive_exchange_key(&shared).unwrap();
        let key2 = derive_exchange_key(&shared).unwrap();

        assert_eq!(key1.as_inner(), key2.as_inner());
    }

    #[test]
    fn test_different_secrets_different_keys() {
        let shared1 = SharedSecret::from_slice(&[1u8; SHARED_SECRET_SIZE]);
        let shared2 = SharedSecret::from_slice(&[2u8; SHARED_SECRET_SIZE]);

        let key1 = derive_exchange_key(&shared1).unwrap();
        let key2 = derive_exchange_key(&shared2).unwrap();

        assert_ne!(key1.as_inner(), key2.as_inner());
    }
}
