//! # Key Management
//!
//! P-521 key pair handling for the exchange pipeline.
//!
//! Every identity in the system owns one NIST P-521 key pair. The private
//! scalar lives in the key store and is only reconstructed here, transiently,
//! for the duration of a [`KeyExchangeSession`](super::KeyExchangeSession).
//! The public half travels as a SEC1 uncompressed point blob (133 bytes)
//! inside a key descriptor.

use p521::elliptic_curve::sec1::ToEncodedPoint;
use p521::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

use super::encryption::SharedSecret;
use super::{CURVE_NAME, SECRET_KEY_SIZE};

/// A P-521 key pair for key agreement
///
/// ## Security
///
/// The private scalar is zeroized when this struct is dropped (the
/// `elliptic-curve` `SecretKey` type handles its own zeroization).
pub struct ExchangeKeyPair {
    /// Private scalar (secret)
    secret: SecretKey,
    /// Public point (derived from the secret)
    public: PublicKey,
}

impl ExchangeKeyPair {
    /// Generate a new random key pair
    ///
    /// Uses the operating system's secure random number generator.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Reconstruct a key pair from a stored private scalar
    ///
    /// Fails with a store-corruption error if the bytes are not a valid
    /// P-521 scalar, since the only source of these bytes is a key store
    /// record.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(Error::StoreCorrupted(format!(
                "private scalar must be {} bytes, got {}",
                SECRET_KEY_SIZE,
                bytes.len()
            )));
        }

        let secret = SecretKey::from_slice(bytes)
            .map_err(|_| Error::StoreCorrupted("invalid P-521 private scalar".into()))?;
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    /// Get the private scalar bytes (for storage)
    ///
    /// ## Security Warning
    ///
    /// Only use this to persist the key into a store. Never log or transmit
    /// these bytes.
    pub fn secret_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.secret.to_bytes().to_vec())
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Export the public key as a SEC1 uncompressed point blob
    pub fn export_public(&self) -> Vec<u8> {
        export_public_key(&self.public)
    }

    /// Perform Diffie-Hellman key agreement with a peer's public key
    ///
    /// Both parties compute the same shared secret:
    /// - Sender: sender_secret × recipient_public
    /// - Recipient: recipient_secret × sender_public
    pub fn diffie_hellman(&self, their_public: &PublicKey) -> SharedSecret {
        let shared =
            p521::ecdh::diffie_hellman(self.secret.to_nonzero_scalar(), their_public.as_affine());
        SharedSecret::from_slice(shared.raw_secret_bytes())
    }
}

impl std::fmt::Debug for ExchangeKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Export a public key as a SEC1 uncompressed point blob (133 bytes)
pub(crate) fn export_public_key(key: &PublicKey) -> Vec<u8> {
    key.to_encoded_point(false).as_bytes().to_vec()
}

/// Import a public key from a SEC1 point blob
///
/// Fails with `UnsupportedAlgorithm` if the blob does not encode a point on
/// the fixed exchange curve.
pub(crate) fn import_public_key(blob: &[u8]) -> Result<PublicKey> {
    PublicKey::from_sec1_bytes(blob).map_err(|_| {
        Error::UnsupportedAlgorithm(format!("public key blob is not a point on {}", CURVE_NAME))
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PUBLIC_KEY_BLOB_SIZE;

    #[test]
    fn test_keypair_generation() {
        let kp1 = ExchangeKeyPair::generate();
        let kp2 = ExchangeKeyPair::generate();

        assert_ne!(kp1.export_public(), kp2.export_public());
    }

    #[test]
    fn test_secret_round_trip() {
        let kp = ExchangeKeyPair::generate();
        let restored = ExchangeKeyPair::from_secret_bytes(&kp.secret_bytes()).unwrap();

        // Same scalar must yield the same public point
        assert_eq!(kp.export_public(), restored.export_public());
    }

    #[test]
    fn test_export_blob_size() {
        let kp = ExchangeKeyPair::generate();
        assert_eq!(kp.export_public().len(), PUBLIC_KEY_BLOB_SIZE);
    }

    #[test]
    fn test_import_rejects_garbage() {
        assert!(import_public_key(&[0x04; 64]).is_err());
        assert!(import_public_key(b"not a point").is_err());
    }

    #[test]
    fn test_diffie_hellman_agreement() {
        let alice = ExchangeKeyPair::generate();
        let bob = ExchangeKeyPair::generate();

        let alice_shared = alice.diffie_hellman(bob.public_key());
        let bob_shared = bob.diffie_hellman(alice.public_key());

        assert_eq!(alice_shared.as_bytes(), bob_shared.as_bytes());
    }

    #[test]
    fn test_invalid_secret_bytes_rejected() {
        assert!(ExchangeKeyPair::from_secret_bytes(&[0u8; 10]).is_err());
        // An all-zero scalar is outside the valid range
        assert!(ExchangeKeyPair::from_secret_bytes(&[0u8; 66]).is_err());
    }
}
