//! # Keyhaven Core
//!
//! Named persistent key pairs and ECDH-based exchange encryption.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        KEYHAVEN CORE MODULES                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────────────────────────────────────┐   │
//! │  │   Identity   │   │                  Exchange                    │   │
//! │  │              │   │                                              │   │
//! │  │ - Named keys │   │ - KeyDescriptor   (shareable public key)     │   │
//! │  │ - Managed /  │   │ - ExchangeEnvelope (sealed payload)          │   │
//! │  │   foreign    │   │ - Base64 text transport                      │   │
//! │  │ - Lifecycle  │   │                                              │   │
//! │  └──────┬───────┘   └──────────────────────┬───────────────────────┘   │
//! │         │                                  │                           │
//! │         └──────────────┬───────────────────┘                           │
//! │                        ▼                                               │
//! │  ┌──────────────┐   ┌──────────────────────────────────────────────┐   │
//! │  │    Store     │   │                   Crypto                     │   │
//! │  │              │   │                                              │   │
//! │  │ - KeyStore   │   │ - P-521 ECDH key agreement                   │   │
//! │  │   trait      │   │ - HKDF-SHA512 key derivation                 │   │
//! │  │ - Memory /   │   │ - AES-256-GCM encryption                     │   │
//! │  │   File impls │   │ - KeyExchangeSession (scoped context)        │   │
//! │  └──────────────┘   └──────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Cryptographic primitives (key agreement, derivation, cipher)
//! - [`store`] - Persistent key stores (trait, memory and file backends)
//! - [`identity`] - Named key pair identities (lifecycle, classification)
//! - [`exchange`] - Descriptors, envelopes, and text transport
//!
//! ## Quick Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use keyhaven_core::exchange::ExchangeEnvelope;
//! use keyhaven_core::identity::KeyIdentity;
//! use keyhaven_core::store::MemoryKeyStore;
//! use keyhaven_core::crypto::KeyExchangeSession;
//!
//! # fn main() -> keyhaven_core::Result<()> {
//! let store = Arc::new(MemoryKeyStore::new());
//!
//! // Each party owns a named, persistent key pair
//! let mut alice = KeyIdentity::open_or_create(store.clone(), "alice")?;
//! let mut bob = KeyIdentity::open_or_create(store.clone(), "bob")?;
//!
//! // Bob shares his public key descriptor with Alice
//! let bob_key = KeyExchangeSession::new(&mut bob)?.public_descriptor().clone();
//!
//! // Alice seals a payload for Bob and sends the JSON document
//! let mut envelope = ExchangeEnvelope::create(&mut alice, b"hello bob", &bob_key)?;
//! let document = envelope.to_json()?;
//!
//! // Bob opens it with his own identity
//! let mut received = ExchangeEnvelope::from_json(&document)?;
//! let plaintext = received.open(&mut bob)?;
//! assert_eq!(plaintext, b"hello bob");
//! # Ok(())
//! # }
//! ```

pub mod crypto;
pub mod error;
pub mod exchange;
pub mod identity;
pub mod store;

pub use error::{Error, Result};

pub use crypto::KeyExchangeSession;
pub use exchange::{ExchangeEnvelope, KeyDescriptor};
pub use identity::KeyIdentity;
pub use store::{FileKeyStore, KeyStore, MemoryKeyStore};
