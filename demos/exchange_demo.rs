//! # Exchange Encryption Demo
//!
//! This example demonstrates the full exchange pipeline:
//! 1. Create two named identities backed by a key store
//! 2. Share a public key descriptor
//! 3. Seal an envelope and serialize it to its JSON wire form
//! 4. Open the envelope on the recipient side
//!
//! ## Run
//!
//! ```bash
//! cargo run --example exchange_demo
//! ```

use std::sync::Arc;

use keyhaven_core::crypto::KeyExchangeSession;
use keyhaven_core::exchange::ExchangeEnvelope;
use keyhaven_core::identity::KeyIdentity;
use keyhaven_core::store::MemoryKeyStore;

fn main() {
    println!("=================================================");
    println!("         KEYHAVEN EXCHANGE PIPELINE DEMO");
    println!("=================================================\n");

    let store = Arc::new(MemoryKeyStore::new());

    // =========================================================================
    // STEP 1: Create named identities
    // =========================================================================
    println!("1. Creating identities...\n");

    let mut alice = KeyIdentity::open_or_create(store.clone(), "alice")
        .expect("Failed to create Alice's identity");
    let mut bob = KeyIdentity::open_or_create(store.clone(), "bob")
        .expect("Failed to create Bob's identity");

    println!("   Alice: {}", alice.name());
    println!("   Bob:   {}", bob.name());
    println!();

    // =========================================================================
    // STEP 2: Bob shares his public key descriptor
    // =========================================================================
    println!("2. Exporting Bob's public key descriptor...\n");

    let mut bob_key = KeyExchangeSession::new(&mut bob)
        .expect("Failed to open Bob's session")
        .public_descriptor()
        .clone();

    println!("   Name:        {}", bob_key.name());
    println!(
        "   Fingerprint: {}",
        bob_key
            .fingerprint()
            .expect("Failed to fingerprint")
            .unwrap_or_default()
    );
    println!("   Key (base64, first line):");
    println!(
        "     {}",
        bob_key.encoded().lines().next().unwrap_or_default()
    );
    println!();

    // =========================================================================
    // STEP 3: Alice seals an envelope for Bob
    // =========================================================================
    println!("3. Sealing an envelope from Alice to Bob...\n");

    let plaintext = b"The package arrives at midnight.";
    let mut envelope = ExchangeEnvelope::create(&mut alice, plaintext, &bob_key)
        .expect("Failed to seal envelope");

    let document = envelope.to_json().expect("Failed to serialize envelope");
    println!("   Wire document:\n");
    for line in document.lines() {
        println!("   {}", line);
    }
    println!();

    // =========================================================================
    // STEP 4: Bob opens the envelope
    // =========================================================================
    println!("4. Opening the envelope as Bob...\n");

    let mut received = ExchangeEnvelope::from_json(&document).expect("Failed to parse envelope");
    let recovered = received.open(&mut bob).expect("Failed to open envelope");

    println!("   Sender:    {}", received.sender().name());
    println!("   Plaintext: {}", String::from_utf8_lossy(&recovered));
    println!();

    assert_eq!(recovered, plaintext);
    println!("=================================================");
    println!("   Round trip complete: payload recovered intact");
    println!("=================================================");
}
