//! Exchange envelopes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        EXCHANGE ENVELOPE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SenderPublicKey            name + public key blob of the sender       │
//! │  InitializationVector       cipher nonce for this payload              │
//! │  EncryptedData              authenticated ciphertext                   │
//! │                                                                         │
//! │  Binary fields keep dual representations (raw bytes / base64 text);   │
//! │  the serialized document carries only text.                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Creating an envelope runs the full sender-side pipeline (key agreement,
//! key derivation, encryption); opening one runs the recipient side. The
//! envelope itself never holds key material beyond the sender's public blob.

use serde::{Deserialize, Serialize};

use crate::crypto::{KeyExchangeSession, Nonce};
use crate::error::{Error, Result};
use crate::identity::KeyIdentity;

use super::descriptor::KeyDescriptor;
use super::encoding::{from_base64, to_base64};

/// A sealed exchange payload: sender key, nonce, and ciphertext
///
/// Like the descriptor's key field, the binary fields keep dual byte/text
/// representations. Writing a field with its current value is a no-op; a new
/// value replaces the field and invalidates the derived representation,
/// which is recomputed on next read. Each field compares only against
/// itself, never against a sibling field.
#[derive(Debug, Default)]
pub struct ExchangeEnvelope {
    sender: KeyDescriptor,
    iv: Vec<u8>,
    iv_encoded: String,
    ciphertext: Vec<u8>,
    ciphertext_encoded: String,
}

impl ExchangeEnvelope {
    /// Create an empty envelope to be filled in field by field
    pub fn new() -> Self {
        Self::default()
    }

    /// Encrypt a payload from a sender identity to a recipient's public key
    ///
    /// Runs the complete sender pipeline and returns a sealed envelope
    /// carrying the sender's own public key descriptor.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if the recipient descriptor carries no key.
    pub fn create(
        sender: &mut KeyIdentity,
        plaintext: &[u8],
        recipient: &KeyDescriptor,
    ) -> Result<Self> {
        if recipient.is_empty() {
            return Err(Error::InvalidArgument(
                "recipient public key is required".into(),
            ));
        }

        let mut session = KeyExchangeSession::new(sender)?;
        session.derive_shared_key(recipient)?;
        let (nonce, ciphertext) = session.encrypt(plaintext)?;

        tracing::debug!(
            sender = sender.name(),
            recipient = recipient.name(),
            payload_len = plaintext.len(),
            "sealed exchange envelope"
        );

        Ok(Self {
            sender: session.public_descriptor().clone(),
            iv: nonce.as_bytes().to_vec(),
            iv_encoded: String::new(),
            ciphertext,
            ciphertext_encoded: String::new(),
        })
    }

    /// Decrypt this envelope's payload with a recipient identity
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument` if the sender key, nonce, or ciphertext is missing
    /// - `DecryptionFailed` if authentication fails (wrong recipient, or a
    ///   tampered payload)
    pub fn open(&mut self, recipient: &mut KeyIdentity) -> Result<Vec<u8>> {
        if self.sender.is_empty() {
            return Err(Error::InvalidArgument(
                "sender public key is missing from the envelope".into(),
            ));
        }

        let nonce = Nonce::from_slice(self.iv()?)?;

        let ciphertext = self.ciphertext()?;
        if ciphertext.is_empty() {
            return Err(Error::InvalidArgument(
                "encrypted data is missing from the envelope".into(),
            ));
        }
        let ciphertext = ciphertext.to_vec();

        let mut session = KeyExchangeSession::new(recipient)?;
        session.derive_shared_key(&self.sender)?;
        session.decrypt(nonce, &ciphertext)
    }

    /// The sender's public key descriptor
    pub fn sender(&self) -> &KeyDescriptor {
        &self.sender
    }

    /// Mutable access to the sender descriptor, for field-by-field assembly
    pub fn sender_mut(&mut self) -> &mut KeyDescriptor {
        &mut self.sender
    }

    // ========================================================================
    // INITIALIZATION VECTOR
    // ========================================================================

    /// The raw nonce bytes, decoding the text form if needed
    pub fn iv(&mut self) -> Result<&[u8]> {
        if self.iv.is_empty() && !self.iv_encoded.is_empty() {
            self.iv = from_base64(&self.iv_encoded)?;
        }
        Ok(&self.iv)
    }

    /// The base64 text form of the nonce, encoding the bytes if needed
    pub fn iv_encoded(&mut self) -> &str {
        if self.iv_encoded.is_empty() && !self.iv.is_empty() {
            self.iv_encoded = to_base64(&self.iv);
        }
        &self.iv_encoded
    }

    /// Set the raw nonce bytes (same value is a no-op, new value replaces)
    pub fn set_iv(&mut self, iv: Vec<u8>) {
        if self.iv == iv {
            return;
        }
        self.iv = iv;
        self.iv_encoded.clear();
    }

    /// Set the base64 text form of the nonce (same value is a no-op, new value replaces)
    pub fn set_iv_encoded(&mut self, text: &str) {
        if self.iv_encoded == text {
            return;
        }
        self.iv_encoded = text.to_string();
        self.iv.clear();
    }

    // ========================================================================
    // ENCRYPTED DATA
    // ========================================================================

    /// The raw ciphertext, decoding the text form if needed
    pub fn ciphertext(&mut self) -> Result<&[u8]> {
        if self.ciphertext.is_empty() && !self.ciphertext_encoded.is_empty() {
            self.ciphertext = from_base64(&self.ciphertext_encoded)?;
        }
        Ok(&self.ciphertext)
    }

    /// The base64 text form of the ciphertext, encoding the bytes if needed
    pub fn ciphertext_encoded(&mut self) -> &str {
        if self.ciphertext_encoded.is_empty() && !self.ciphertext.is_empty() {
            self.ciphertext_encoded = to_base64(&self.ciphertext);
        }
        &self.ciphertext_encoded
    }

    /// Set the raw ciphertext (same value is a no-op, new value replaces)
    pub fn set_ciphertext(&mut self, ciphertext: Vec<u8>) {
        if self.ciphertext == ciphertext {
            return;
        }
        self.ciphertext = ciphertext;
        self.ciphertext_encoded.clear();
    }

    /// Set the base64 text form of the ciphertext (same value is a no-op, new value replaces)
    pub fn set_ciphertext_encoded(&mut self, text: &str) {
        if self.ciphertext_encoded == text {
            return;
        }
        self.ciphertext_encoded = text.to_string();
        self.ciphertext.clear();
    }

    // ========================================================================
    // WIRE FORM
    // ========================================================================

    /// Serialize to the JSON wire document (text fields only)
    pub fn to_json(&mut self) -> Result<String> {
        let wire = EnvelopeWire {
            sender: SenderKeyWire {
                name: self.sender.name().to_string(),
                key_data: self.sender.encoded().to_string(),
            },
            initialization_vector: self.iv_encoded().to_string(),
            encrypted_data: self.ciphertext_encoded().to_string(),
        };

        serde_json::to_string_pretty(&wire)
            .map_err(|e| Error::InvalidState(format!("cannot serialize envelope: {}", e)))
    }

    /// Parse an envelope from its JSON wire document
    pub fn from_json(text: &str) -> Result<Self> {
        let wire: EnvelopeWire = serde_json::from_str(text)
            .map_err(|e| Error::InvalidArgument(format!("invalid envelope document: {}", e)))?;

        let mut envelope = Self::new();
        envelope.sender.set_name(&wire.sender.name);
        envelope.sender.set_encoded(&wire.sender.key_data);
        envelope.set_iv_encoded(&wire.initialization_vector);
        envelope.set_ciphertext_encoded(&wire.encrypted_data);
        Ok(envelope)
    }
}

#[derive(Serialize, Deserialize)]
struct EnvelopeWire {
    #[serde(rename = "SenderPublicKey")]
    sender: SenderKeyWire,
    #[serde(rename = "InitializationVector", default)]
    initialization_vector: String,
    #[serde(rename = "EncryptedData", default)]
    encrypted_data: String,
}

#[derive(Serialize, Deserialize)]
struct SenderKeyWire {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "KeyData", default)]
    key_data: String,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKeyStore;
    use std::sync::Arc;

    fn identity(store: &Arc<MemoryKeyStore>, name: &str) -> KeyIdentity {
        KeyIdentity::open_or_create(store.clone(), name).unwrap()
    }

    fn descriptor_of(identity: &mut KeyIdentity) -> KeyDescriptor {
        KeyExchangeSession::new(identity)
            .unwrap()
            .public_descriptor()
            .clone()
    }

    #[test]
    fn test_create_open_round_trip() {
        let store = Arc::new(MemoryKeyStore::new());
        let mut alice = identity(&store, "alice");
        let mut bob = identity(&store, "bob");

        let bob_key = descriptor_of(&mut bob);
        let mut envelope = ExchangeEnvelope::create(&mut alice, b"hello bob", &bob_key).unwrap();

        assert_eq!(envelope.sender().name(), "alice");
        assert_eq!(envelope.open(&mut bob).unwrap(), b"hello bob");
    }

    #[test]
    fn test_wire_document_round_trip() {
        let store = Arc::new(MemoryKeyStore::new());
        let mut alice = identity(&store, "alice");
        let mut bob = identity(&store, "bob");

        let bob_key = descriptor_of(&mut bob);
        let mut sealed = ExchangeEnvelope::create(&mut alice, b"over the wire", &bob_key).unwrap();

        let json = sealed.to_json().unwrap();
        assert!(json.contains("SenderPublicKey"));
        assert!(json.contains("InitializationVector"));
        assert!(json.contains("EncryptedData"));

        let mut received = ExchangeEnvelope::from_json(&json).unwrap();
        assert_eq!(received.open(&mut bob).unwrap(), b"over the wire");
    }

    #[test]
    fn test_wrong_recipient_cannot_open() {
        let store = Arc::new(MemoryKeyStore::new());
        let mut alice = identity(&store, "alice");
        let mut bob = identity(&store, "bob");
        let mut eve = identity(&store, "eve");

        let bob_key = descriptor_of(&mut bob);
        let mut envelope = ExchangeEnvelope::create(&mut alice, b"for bob only", &bob_key).unwrap();

        assert!(matches!(
            envelope.open(&mut eve).unwrap_err(),
            Error::DecryptionFailed(_)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let store = Arc::new(MemoryKeyStore::new());
        let mut alice = identity(&store, "alice");
        let mut bob = identity(&store, "bob");

        let bob_key = descriptor_of(&mut bob);
        let mut sealed = ExchangeEnvelope::create(&mut alice, b"payload", &bob_key).unwrap();

        let mut tampered = ExchangeEnvelope::from_json(&sealed.to_json().unwrap()).unwrap();
        let mut bytes = tampered.ciphertext().unwrap().to_vec();
        bytes[0] ^= 0x01;
        let mut forged = ExchangeEnvelope::new();
        forged.sender_mut().set_name(sealed.sender().name());
        forged
            .sender_mut()
            .set_encoded(&sealed.sender_mut().encoded().to_string());
        forged.set_iv(sealed.iv().unwrap().to_vec());
        forged.set_ciphertext(bytes);

        assert!(matches!(
            forged.open(&mut bob).unwrap_err(),
            Error::DecryptionFailed(_)
        ));
    }

    #[test]
    fn test_create_requires_recipient_key() {
        let store = Arc::new(MemoryKeyStore::new());
        let mut alice = identity(&store, "alice");

        let err = ExchangeEnvelope::create(&mut alice, b"data", &KeyDescriptor::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_open_requires_sender_key() {
        let store = Arc::new(MemoryKeyStore::new());
        let mut bob = identity(&store, "bob");

        let mut envelope = ExchangeEnvelope::new();
        envelope.set_iv(vec![0u8; 12]);
        envelope.set_ciphertext(vec![1, 2, 3]);

        assert!(matches!(
            envelope.open(&mut bob).unwrap_err(),
            Error::InvalidArgument(_)
        ));
    }

    #[test]
    fn test_fields_update_independently() {
        let mut envelope = ExchangeEnvelope::new();
        let text = to_base64(&[0xAA; 16]);

        envelope.set_iv_encoded(&text);
        // The same value landing in a different field is a genuine write to
        // that field, not a redundant write to the first one
        envelope.set_ciphertext_encoded(&text);
        assert_eq!(envelope.iv().unwrap().to_vec(), vec![0xAA; 16]);
        assert_eq!(envelope.ciphertext().unwrap().to_vec(), vec![0xAA; 16]);

        // Replacing one field leaves the sibling untouched
        let other = to_base64(&[0xBB; 16]);
        envelope.set_iv_encoded(&other);
        assert_eq!(envelope.iv().unwrap().to_vec(), vec![0xBB; 16]);
        assert_eq!(envelope.ciphertext().unwrap().to_vec(), vec![0xAA; 16]);
    }

    #[test]
    fn test_replacing_field_recomputes_derived_form() {
        let mut envelope = ExchangeEnvelope::new();

        // Populate through the text form, then overwrite with new bytes:
        // the stale text must not survive
        envelope.set_iv_encoded(&to_base64(&[1u8; 12]));
        envelope.set_iv(vec![2u8; 12]);

        assert_eq!(envelope.iv().unwrap().to_vec(), vec![2u8; 12]);
        let text = envelope.iv_encoded().to_string();
        assert_eq!(from_base64(&text).unwrap(), vec![2u8; 12]);
    }

    #[test]
    fn test_byte_and_text_forms_stay_consistent() {
        let mut envelope = ExchangeEnvelope::new();
        let iv = vec![7u8; 12];

        envelope.set_iv(iv.clone());
        let text = envelope.iv_encoded().to_string();

        let mut from_text = ExchangeEnvelope::new();
        from_text.set_iv_encoded(&text);
        assert_eq!(from_text.iv().unwrap(), iv.as_slice());
    }
}
