//! Public key descriptors.
//!
//! A descriptor is the shareable half of an identity: a name plus the
//! identity's exported public key blob. It carries the key in two
//! interchangeable representations — raw bytes and base64 text — and
//! materializes whichever one is missing on demand. The parsed curve point is
//! imported lazily, once per key value, on first cryptographic use.

use std::borrow::Cow;

use once_cell::sync::OnceCell;
use p521::PublicKey;
use sha2::{Digest, Sha256};

use crate::crypto::{export_public_key, import_public_key};
use crate::error::Result;

use super::encoding::{from_base64, to_base64};

/// A named public key, as shared between exchange parties
///
/// Either representation of the key (bytes or base64 text) may be written;
/// the other is derived when read. Writing a field with its current value is
/// a no-op; a new value replaces the field and invalidates the derived
/// representation and the imported point, which are recomputed on next use.
#[derive(Clone)]
pub struct KeyDescriptor {
    /// Name of the identity the key belongs to; empty if unknown
    name: String,
    /// Raw public key blob (SEC1 uncompressed point); empty until set or derived
    blob: Vec<u8>,
    /// Base64 text form of the blob; empty until set or derived
    encoded: String,
    /// Parsed curve point, imported on first use of the current key value
    imported: OnceCell<PublicKey>,
}

impl KeyDescriptor {
    /// Create an empty descriptor to be filled in field by field
    pub fn new() -> Self {
        Self {
            name: String::new(),
            blob: Vec::new(),
            encoded: String::new(),
            imported: OnceCell::new(),
        }
    }

    /// Build a descriptor for a known public key
    pub fn from_public_key(name: String, public: &PublicKey) -> Self {
        Self {
            name,
            blob: export_public_key(public),
            encoded: String::new(),
            imported: OnceCell::with_value(*public),
        }
    }

    /// The name of the identity this key belongs to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the identity name
    pub fn set_name(&mut self, name: &str) {
        if self.name != name {
            self.name = name.to_string();
        }
    }

    /// Whether no key material has been supplied in either representation
    pub fn is_empty(&self) -> bool {
        self.blob.is_empty() && self.encoded.is_empty()
    }

    /// The raw public key blob, decoding the text form if needed
    pub fn blob(&mut self) -> Result<&[u8]> {
        if self.blob.is_empty() && !self.encoded.is_empty() {
            self.blob = from_base64(&self.encoded)?;
        }
        Ok(&self.blob)
    }

    /// The base64 text form of the key, encoding the blob if needed
    pub fn encoded(&mut self) -> &str {
        if self.encoded.is_empty() && !self.blob.is_empty() {
            self.encoded = to_base64(&self.blob);
        }
        &self.encoded
    }

    /// Set the raw public key blob
    ///
    /// Writing the bytes already held is a no-op. A new value replaces the
    /// blob; the text form and imported point are recomputed on next read.
    pub fn set_blob(&mut self, blob: Vec<u8>) {
        if self.blob == blob {
            return;
        }
        self.blob = blob;
        self.encoded.clear();
        self.imported = OnceCell::new();
    }

    /// Set the base64 text form of the key
    ///
    /// Mirrors [`set_blob`]: the current text is a no-op, a new value
    /// replaces it and invalidates the byte form and imported point.
    ///
    /// [`set_blob`]: KeyDescriptor::set_blob
    pub fn set_encoded(&mut self, encoded: &str) {
        if self.encoded == encoded {
            return;
        }
        self.encoded = encoded.to_string();
        self.blob.clear();
        self.imported = OnceCell::new();
    }

    /// Replace the key with an already-parsed public key
    ///
    /// Re-exports the blob and refreshes both representations; the imported
    /// point cache is primed with the key itself, so no re-parse happens.
    pub fn set_public_key(&mut self, public: &PublicKey) {
        let blob = export_public_key(public);
        if self.blob == blob {
            return;
        }
        self.blob = blob;
        self.encoded.clear();
        self.imported = OnceCell::with_value(*public);
    }

    /// The parsed public key, imported on first call
    ///
    /// Returns `Ok(None)` when the descriptor is empty. The import happens at
    /// most once per key value; later calls return the cached point.
    ///
    /// ## Errors
    ///
    /// `UnsupportedAlgorithm` if the blob is not a point on the exchange
    /// curve; `InvalidArgument` if the text form is not valid base64.
    pub fn imported(&self) -> Result<Option<&PublicKey>> {
        let material = self.material()?;
        if material.is_empty() {
            return Ok(None);
        }

        self.imported
            .get_or_try_init(|| import_public_key(&material))
            .map(Some)
    }

    /// A short hex fingerprint of the key blob, for logs and display
    pub fn fingerprint(&self) -> Result<Option<String>> {
        let material = self.material()?;
        if material.is_empty() {
            return Ok(None);
        }

        let digest = Sha256::digest(material.as_ref());
        Ok(Some(hex::encode(&digest[..8])))
    }

    /// The key bytes in whichever representation is already present
    fn material(&self) -> Result<Cow<'_, [u8]>> {
        if !self.blob.is_empty() {
            Ok(Cow::Borrowed(&self.blob))
        } else if !self.encoded.is_empty() {
            Ok(Cow::Owned(from_base64(&self.encoded)?))
        } else {
            Ok(Cow::Borrowed(&[]))
        }
    }
}

impl Default for KeyDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyDescriptor")
            .field("name", &self.name)
            .field("blob_len", &self.blob.len())
            .field("has_encoded", &!self.encoded.is_empty())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
