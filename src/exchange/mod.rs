//! # Exchange Module
//!
//! Public key exchange: descriptors, envelopes, and text transport.
//!
//! ## Exchange Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          EXCHANGE FLOW                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SENDER                                    RECIPIENT                   │
//! │  ──────                                    ─────────                   │
//! │                                                                         │
//! │  1. obtain recipient's KeyDescriptor  ◄─── share public key            │
//! │  2. ExchangeEnvelope::create(...)                                      │
//! │       ECDH → HKDF → AES-256-GCM                                        │
//! │  3. envelope.to_json() ──────────────────► 4. from_json(document)      │
//! │                                            5. envelope.open(identity)  │
//! │                                                 ECDH → HKDF → decrypt  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A [`KeyDescriptor`] carries one party's name and public key blob in
//! interchangeable byte/text representations. An [`ExchangeEnvelope`] seals a
//! payload for one recipient: the sender's descriptor, the cipher nonce, and
//! the authenticated ciphertext. [`to_base64`] and [`from_base64`] are the
//! text transport every binary field uses.

mod descriptor;
mod encoding;
mod envelope;

pub use descriptor::KeyDescriptor;
pub use encoding::{from_base64, to_base64};
pub use envelope::ExchangeEnvelope;
