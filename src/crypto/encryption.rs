//! # Encryption
//!
//! AES-256-GCM symmetric encryption for the exchange envelope payload.
//!
//! The reference scheme this replaces used CBC with PKCS#7 padding. GCM is an
//! authenticated mode: tampering with the ciphertext or decrypting with the
//! wrong derived key is detected as a tag mismatch instead of producing
//! garbage plaintext, so "padding failure" and "verification failure" both
//! surface as [`Error::DecryptionFailed`].
//!
//! ## Security Properties
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Confidentiality | Only holders of the derived key can read the payload |
//! | Integrity | Any modification is detected |
//! | Nonce discipline | Fresh random 96-bit nonce per encrypt operation |

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use rand::RngCore;
use zeroize::ZeroizeOnDrop;

use crate::error::{Error, Result};

use super::{KEY_SIZE, SHARED_SECRET_SIZE};

/// Size of the AES-GCM nonce in bytes (96 bits)
///
/// This is the envelope's initialization vector.
pub const NONCE_SIZE: usize = 12;

/// A nonce (number used once) for AES-GCM encryption
///
/// ## Critical Security Requirement
///
/// **Never reuse a nonce with the same key.** The encrypt path always
/// generates a fresh random nonce; the decrypt path always takes the nonce
/// from the envelope, never regenerates it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a cryptographically random nonce
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice of the exact nonce size
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; NONCE_SIZE] = bytes.try_into().map_err(|_| {
            Error::InvalidArgument(format!(
                "initialization vector must be {} bytes, got {}",
                NONCE_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// A shared secret produced by P-521 key agreement
///
/// Raw ECDH output; used only as input key material for
/// [`derive_exchange_key`](super::derive_exchange_key). Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: [u8; SHARED_SECRET_SIZE],
}

impl SharedSecret {
    /// Create from raw ECDH output
    ///
    /// The slice must be exactly [`SHARED_SECRET_SIZE`] bytes; the only
    /// producer is the key agreement itself, which guarantees the length.
    pub fn from_slice(raw: &[u8]) -> Self {
        let mut bytes = [0u8; SHARED_SECRET_SIZE];
        bytes.copy_from_slice(raw);
        Self { bytes }
    }

    /// Get the raw bytes (for key derivation)
    pub(crate) fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.bytes
    }
}

/// An AES-256-GCM encryption key
///
/// Zeroized when dropped.
#[derive(ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw key bytes
    pub(crate) fn as_inner(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Encrypt a full plaintext buffer in one pass
///
/// Generates a fresh random nonce as part of cipher initialization.
///
/// ## Returns
///
/// Tuple of (nonce, ciphertext_with_tag)
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> Result<(Nonce, Vec<u8>)> {
    let nonce = Nonce::random();
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce.0), plaintext)
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    Ok((nonce, ciphertext))
}

/// Decrypt a full ciphertext buffer in one pass
///
/// The nonce is the one supplied in the envelope, never regenerated.
///
/// ## Errors
///
/// Returns `DecryptionFailed` if the ciphertext was tampered with, the key
/// is wrong, or the nonce is wrong.
pub fn decrypt(key: &EncryptionKey, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| Error::DecryptionFailed(format!("Invalid key: {}", e)))?;

    cipher
        .decrypt(AesNonce::from_slice(&nonce.0), ciphertext)
        .map_err(|_| Error::DecryptionFailed("authentication tag mismatch".into()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_basic() {
        let key = EncryptionKey::from_bytes([42u8; KEY_SIZE]);
        let plaintext = b"Hello, World!";

        let (nonce, ciphertext) = encrypt(&key, plaintext).unwrap();
        let decrypted = decrypt(&key, &nonce, &ciphertext).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let key = EncryptionKey::from_bytes([42u8; KEY_SIZE]);

        let (nonce, ciphertext) = encrypt(&key, b"").unwrap();
        let decrypted = decrypt(&key, &nonce, &ciphertext).unwrap();

        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = EncryptionKey::from_bytes([42u8; KEY_SIZE]);

        let (nonce, mut ciphertext) = encrypt(&key, b"Hello, World!").unwrap();
        ciphertext[0] ^= 0xFF;

        assert!(decrypt(&key, &nonce, &ciphertext).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = EncryptionKey::from_bytes([42u8; KEY_SIZE]);
        let key2 = EncryptionKey::from_bytes([99u8; KEY_SIZE]);

        let (nonce, ciphertext) = encrypt(&key1, b"secret").unwrap();
        assert!(decrypt(&key2, &nonce, &ciphertext).is_err());
    }

    #[test]
    fn test_wrong_nonce_fails() {
        let key = EncryptionKey::from_bytes([42u8; KEY_SIZE]);

        let (_, ciphertext) = encrypt(&key, b"secret").unwrap();
        let wrong = Nonce::from_bytes([7u8; NONCE_SIZE]);
        assert!(decrypt(&key, &wrong, &ciphertext).is_err());
    }

    #[test]
    fn test_different_nonces_produce_different_ciphertext() {
        let key = EncryptionKey::from_bytes([42u8; KEY_SIZE]);

        let (_, ct1) = encrypt(&key, b"Hello, World!").unwrap();
        let (_, ct2) = encrypt(&key, b"Hello, World!").unwrap();

        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_nonce_from_slice_rejects_bad_length() {
        assert!(Nonce::from_slice(&[0u8; 11]).is_err());
        assert!(Nonce::from_slice(&[0u8; 12]).is_ok());
    }
}
