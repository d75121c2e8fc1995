//! # Identity Lifecycle Demo
//!
//! This example demonstrates named identity management:
//! 1. Lazily create a named key pair in a file-backed store
//! 2. Re-open the identity and confirm the same key material
//! 3. Enumerate compatible identities
//! 4. Remove the backing key
//!
//! ## Run
//!
//! ```bash
//! cargo run --example identity_lifecycle_demo
//! ```

use std::sync::Arc;

use keyhaven_core::identity::KeyIdentity;
use keyhaven_core::store::FileKeyStore;

fn main() {
    println!("=================================================");
    println!("        KEYHAVEN IDENTITY LIFECYCLE DEMO");
    println!("=================================================\n");

    let dir = std::env::temp_dir().join("keyhaven-identity-demo");
    let store = Arc::new(FileKeyStore::open(&dir).expect("Failed to open store"));
    println!("   Store directory: {}\n", dir.display());

    // =========================================================================
    // STEP 1: Lazy creation
    // =========================================================================
    println!("1. Creating identity 'alice' (lazily)...\n");

    let mut alice =
        KeyIdentity::open_or_create(store.clone(), "alice").expect("Failed to create identity");
    println!("   Exists before first use: {}", alice.exists().unwrap());

    let unique = alice
        .unique_store_name()
        .expect("Failed to load identity")
        .to_string();
    println!("   Exists after first use:  {}", alice.exists().unwrap());
    println!("   Unique store name: {}", unique);
    println!("   Managed: {}", alice.is_managed().unwrap());
    println!();

    // =========================================================================
    // STEP 2: Re-open resolves to the same key
    // =========================================================================
    println!("2. Re-opening 'alice'...\n");

    let mut again =
        KeyIdentity::open_or_create(store.clone(), "alice").expect("Failed to open identity");
    let unique_again = again.unique_store_name().expect("Failed to load").to_string();
    println!("   Unique store name: {}", unique_again);
    println!("   Same key material: {}", unique == unique_again);
    println!();

    // =========================================================================
    // STEP 3: Enumerate compatible identities
    // =========================================================================
    println!("3. Enumerating compatible identities...\n");

    KeyIdentity::open_or_create(store.clone(), "bob")
        .expect("Failed to create identity")
        .unique_store_name()
        .expect("Failed to load");

    let identities =
        KeyIdentity::list_all_compatible(store.clone()).expect("Failed to enumerate");
    for identity in &identities {
        println!("   - {}", identity.name());
    }
    println!();

    // =========================================================================
    // STEP 4: Removal
    // =========================================================================
    println!("4. Removing identities...\n");

    println!("   Removed alice: {}", alice.remove().unwrap());
    println!(
        "   Removed bob:   {}",
        KeyIdentity::remove_named(store.as_ref(), "bob").unwrap()
    );
    println!(
        "   Alice exists:  {}",
        KeyIdentity::exists_named(store.as_ref(), "alice").unwrap()
    );
    println!();

    println!("=================================================");
    println!("            Lifecycle demo complete");
    println!("=================================================");
}
