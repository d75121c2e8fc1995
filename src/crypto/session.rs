//! # Key Exchange Session
//!
//! A scoped unit of work binding one identity's private key material to a
//! symmetric cipher context for the duration of one encrypt or decrypt
//! operation.
//!
//! ## Session Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SESSION LIFECYCLE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  KeyExchangeSession::new(identity)                                     │
//! │    │  loads the identity's key handle (create-if-absent)               │
//! │    │  reconstructs the P-521 key pair                                  │
//! │    │  exports the identity's own public key descriptor                 │
//! │    ▼                                                                   │
//! │  derive_shared_key(peer_descriptor)                                    │
//! │    │  ECDH(our_private, peer_public) → HKDF-SHA512 → AES-256 key      │
//! │    ▼                                                                   │
//! │  encrypt(plaintext) → (nonce, ciphertext)     [fresh random nonce]    │
//! │       — or —                                                           │
//! │  decrypt(nonce, ciphertext) → plaintext       [nonce from envelope]   │
//! │    │                                                                   │
//! │    ▼                                                                   │
//! │  drop: private scalar and derived key zeroized on every exit path     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Resource Discipline
//!
//! The session exclusively owns both the asymmetric key material and the
//! derived cipher key for its lifetime. Ownership is scoped: when the session
//! drops — on success, on a logical failure, or on an early `?` return — both
//! are zeroized. A failure while initializing one context cannot leak the
//! other, because partially constructed sessions drop their already-built
//! fields the same way.

use crate::error::{Error, Result};
use crate::exchange::KeyDescriptor;
use crate::identity::KeyIdentity;

use super::encryption::{self, EncryptionKey, Nonce};
use super::kdf::derive_exchange_key;
use super::keys::ExchangeKeyPair;

/// A scoped key-agreement and cipher context for one exchange operation
pub struct KeyExchangeSession {
    /// The identity's key pair, reconstructed from the store for this session
    keypair: ExchangeKeyPair,
    /// The identity's own exported public key descriptor
    own_descriptor: KeyDescriptor,
    /// Symmetric key derived by `derive_shared_key`
    key: Option<EncryptionKey>,
    /// Nonce of the last encrypt, or the one supplied for decrypt
    iv: Option<Nonce>,
}

impl KeyExchangeSession {
    /// Open a session against an identity
    ///
    /// Loads (or creates) the identity's backing key pair and exports its
    /// public half as a descriptor named after the identity.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument` if the identity has neither a name nor a handle
    /// - `InvalidState` if the identity's backing key has been removed
    pub fn new(identity: &mut KeyIdentity) -> Result<Self> {
        if identity.name().is_empty() && !identity.has_handle() {
            return Err(Error::InvalidArgument(
                "identity has no resolvable name or key handle".into(),
            ));
        }

        let name = identity.name().to_string();
        let handle = identity.handle()?;
        let keypair = ExchangeKeyPair::from_secret_bytes(handle.secret())?;
        let own_descriptor = KeyDescriptor::from_public_key(name, keypair.public_key());

        Ok(Self {
            keypair,
            own_descriptor,
            key: None,
            iv: None,
        })
    }

    /// The identity's own public key descriptor, as exported at session open
    pub fn public_descriptor(&self) -> &KeyDescriptor {
        &self.own_descriptor
    }

    /// Derive the shared symmetric key against a peer's public key
    ///
    /// Runs P-521 ECDH between this session's private key and the peer's
    /// imported public key, then derives the cipher key with HKDF-SHA512.
    ///
    /// ## Errors
    ///
    /// `KeyAgreementFailed` if the peer descriptor is empty or its blob does
    /// not import as a usable key.
    pub fn derive_shared_key(&mut self, peer: &KeyDescriptor) -> Result<()> {
        let peer_key = peer
            .imported()
            .map_err(|e| Error::KeyAgreementFailed(e.to_string()))?
            .ok_or_else(|| Error::KeyAgreementFailed("peer descriptor has no usable key".into()))?;

        let shared = self.keypair.diffie_hellman(peer_key);
        self.key = Some(derive_exchange_key(&shared)?);
        Ok(())
    }

    /// Encrypt a full plaintext buffer in one pass
    ///
    /// A fresh random nonce is generated as part of cipher initialization
    /// and becomes the session's IV.
    ///
    /// ## Errors
    ///
    /// `InvalidState` if `derive_shared_key` has not been called.
    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<(Nonce, Vec<u8>)> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| Error::InvalidState("shared key has not been derived".into()))?;

        let (nonce, ciphertext) = encryption::encrypt(key, plaintext)?;
        self.iv = Some(nonce);
        Ok((nonce, ciphertext))
    }

    /// Decrypt a full ciphertext buffer in one pass
    ///
    /// The session's IV is set to the supplied nonce, never regenerated.
    ///
    /// ## Errors
    ///
    /// - `InvalidState` if `derive_shared_key` has not been called
    /// - `DecryptionFailed` on authentication failure
    pub fn decrypt(&mut self, iv: Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| Error::InvalidState("shared key has not been derived".into()))?;

        self.iv = Some(iv);
        encryption::decrypt(key, &iv, ciphertext)
    }

    /// The session's current IV, if one has been generated or supplied
    pub fn iv(&self) -> Option<&Nonce> {
        self.iv.as_ref()
    }
}

impl std::fmt::Debug for KeyExchangeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyExchangeSession")
            .field("own_descriptor", &self.own_descriptor)
            .field("has_key", &self.key.is_some())
            .field("iv", &self.iv)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
