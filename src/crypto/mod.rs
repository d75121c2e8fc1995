//! # Cryptography Module
//!
//! Cryptographic primitives for the exchange pipeline.
//!
//! ## Exchange Scheme
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      EXCHANGE ENCRYPTION SCHEME                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Key Agreement: ECDH on NIST P-521                                  │
//! │     Sender's Private × Recipient's Public = Shared Secret (66 bytes)  │
//! │                                                                         │
//! │  2. Key Derivation: HKDF-SHA512                                        │
//! │     Shared Secret → AES-256 key (32 bytes)                            │
//! │                                                                         │
//! │  3. Encryption: AES-256-GCM                                            │
//! │     • 256-bit key                                                      │
//! │     • 96-bit nonce (random per session)                                │
//! │     • 128-bit authentication tag                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | P-521 ECDH | Key Agreement | Fixed exchange curve, 256-bit security |
//! | HKDF-SHA512 | Key Derivation | Hash-based KDF over the ECDH output |
//! | AES-256-GCM | Encryption | Hardware acceleration, AEAD |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: Secret scalars and cipher keys are zeroized on drop
//! 2. **Secure Random**: `rand::rngs::OsRng` for key generation and nonces
//! 3. **No Nonce Reuse**: A fresh random nonce for every encrypt operation

mod encryption;
mod kdf;
mod keys;
mod session;

pub use encryption::{decrypt, encrypt, EncryptionKey, Nonce, SharedSecret, NONCE_SIZE};
pub use kdf::derive_exchange_key;
pub use keys::ExchangeKeyPair;
pub(crate) use keys::{export_public_key, import_public_key};
pub use session::KeyExchangeSession;

/// Human-readable name of the fixed exchange curve
pub const CURVE_NAME: &str = "NIST P-521";

/// Size of an exported public key blob in bytes (SEC1 uncompressed point)
pub const PUBLIC_KEY_BLOB_SIZE: usize = 133;

/// Size of a P-521 private scalar in bytes
pub const SECRET_KEY_SIZE: usize = 66;

/// Size of the raw ECDH shared secret in bytes
pub const SHARED_SECRET_SIZE: usize = 66;

/// Size of the derived symmetric key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;
