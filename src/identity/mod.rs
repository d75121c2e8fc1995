//! # Identity Module
//!
//! Maps a human-readable name to a persistent key pair in a key store.
//!
//! ## Identity Lifecycle
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       IDENTITY STATE MACHINE                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   Uninitialized ──set name──► Named ─────┐                             │
//! │        │                                 │  first access to handle     │
//! │        └───────set handle──► Loaded ◄────┘  or any metadata field      │
//! │                                 │           (open-or-create, atomic)   │
//! │                                 ▼                                      │
//! │                              Removed        (terminal; no reuse)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Name and handle are mutually derivable but only one may be supplied at
//! construction; once either is set, both are immutable for the object's
//! lifetime. All lazily populated metadata (`is_managed`, `export_policy`,
//! `usages`, `unique_store_name`) is filled in together, atomically, the
//! first time any one of them or the handle is read.
//!
//! ## Managed vs Foreign
//!
//! A key whose store name carries the fixed namespace prefix was created by
//! this system ("managed"); anything else was supplied externally
//! ("foreign"). The full store name of a managed identity is the prefix plus
//! the bare name; foreign names pass through unchanged in both directions.

use std::sync::Arc;

use crate::crypto::CURVE_NAME;
use crate::error::{Error, Result};
use crate::store::{ExportPolicy, KeyAlgorithm, KeyCreationParams, KeyHandle, KeyStore, KeyUsages};

/// Namespace prefix marking keys created by this system (33 characters)
pub const NAMESPACE_PREFIX: &str = "8F3BC6A1D9E44F7B92C05A6E1B8D4F20-";

// ============================================================================
// SET-ONCE FIELDS
// ============================================================================

/// A value that starts unset and transitions exactly once to set
///
/// Re-setting with the same value is a no-op; re-setting with a different
/// value is an `InvalidState` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetOnce<T> {
    Unset,
    Set(T),
}

impl<T: PartialEq> SetOnce<T> {
    fn get(&self) -> Option<&T> {
        match self {
            SetOnce::Unset => None,
            SetOnce::Set(v) => Some(v),
        }
    }

    fn set(&mut self, value: T, field: &str) -> Result<()> {
        match self {
            SetOnce::Unset => {
                *self = SetOnce::Set(value);
                Ok(())
            }
            SetOnce::Set(current) if *current == value => Ok(()),
            SetOnce::Set(_) => Err(Error::InvalidState(format!(
                "{} cannot be changed once it has been initialized",
                field
            ))),
        }
    }

    /// Overwrite unconditionally; only the atomic load path uses this, when
    /// the authoritative value comes back from the store.
    fn force(&mut self, value: T) {
        *self = SetOnce::Set(value);
    }
}

// ============================================================================
// NAME DERIVATION
// ============================================================================

/// Derive the full store name from a bare name
///
/// Managed identities are stored under the namespace prefix; foreign names
/// pass through unchanged.
pub fn to_full_name(name: &str, managed: bool) -> String {
    if managed {
        format!("{}{}", NAMESPACE_PREFIX, name)
    } else {
        name.to_string()
    }
}

/// Derive the bare name from a full store name
///
/// The prefix is stripped only when the managed flag is true and the name
/// actually carries it; everything else passes through unchanged.
pub fn local_name(full_name: &str, managed: bool) -> String {
    if managed {
        if let Some(bare) = full_name.strip_prefix(NAMESPACE_PREFIX) {
            return bare.to_string();
        }
    }
    full_name.to_string()
}

// ============================================================================
// KEY IDENTITY
// ============================================================================

/// A named, persistent key pair identity
///
/// Owns its key handle exclusively once loaded. The key material itself is
/// owned by the store; the handle's transient copy exists only for the key
/// agreement and is zeroized with the handle.
pub struct KeyIdentity {
    store: Arc<dyn KeyStore>,
    /// Bare name; empty until set
    name: String,
    /// Store-assigned unique name; empty until loaded
    unique_store_name: String,
    /// Managed/foreign classification; tri-state until resolved
    is_managed: SetOnce<bool>,
    export_policy: SetOnce<ExportPolicy>,
    usages: SetOnce<KeyUsages>,
    handle: Option<KeyHandle>,
    removed: bool,
}

impl KeyIdentity {
    /// Create an identity with no name or handle yet
    ///
    /// The name or handle must be set before any cryptographic use.
    pub fn unnamed(store: Arc<dyn KeyStore>) -> Self {
        Self {
            store,
            name: String::new(),
            unique_store_name: String::new(),
            is_managed: SetOnce::Unset,
            export_policy: SetOnce::Unset,
            usages: SetOnce::Unset,
            handle: None,
            removed: false,
        }
    }

    /// Create an identity for a named key, opening or creating it lazily
    ///
    /// No store access happens here; the backing key pair is opened — or
    /// created on the fixed curve — the first time the handle or any
    /// metadata field is read.
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` if `name` is empty.
    pub fn open_or_create(store: Arc<dyn KeyStore>, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("name cannot be empty".into()));
        }

        let mut identity = Self::unnamed(store);
        identity.name = name.to_string();
        Ok(identity)
    }

    /// Wrap an already-open key handle
    ///
    /// Classifies the identity as managed or foreign by inspecting the
    /// handle's store name against the namespace prefix.
    ///
    /// ## Errors
    ///
    /// `UnsupportedAlgorithm` if the handle's key is not on the fixed curve.
    pub fn from_handle(store: Arc<dyn KeyStore>, handle: KeyHandle) -> Result<Self> {
        Self::require_curve(&handle)?;

        let mut identity = Self::unnamed(store);
        identity.adopt(handle);
        Ok(identity)
    }

    /// Enumerate every key in the store and open those on the fixed curve
    ///
    /// Individual keys that cannot be opened, or that belong to an
    /// incompatible algorithm, are skipped and logged; a single corrupt or
    /// foreign-format entry never aborts the enumeration.
    pub fn list_all_compatible(store: Arc<dyn KeyStore>) -> Result<Vec<KeyIdentity>> {
        let names = store.enumerate()?;

        let mut identities = Vec::new();
        for full_name in names {
            let handle = match store.open(&full_name) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(name = %full_name, error = %e, "skipping unopenable key");
                    continue;
                }
            };

            if handle.algorithm() != KeyAlgorithm::EcdhP521 {
                tracing::debug!(
                    name = %full_name,
                    algorithm = %handle.algorithm(),
                    "skipping key with incompatible algorithm"
                );
                continue;
            }

            match Self::from_handle(store.clone(), handle) {
                Ok(identity) => identities.push(identity),
                Err(e) => tracing::warn!(name = %full_name, error = %e, "skipping key"),
            }
        }

        Ok(identities)
    }

    // ========================================================================
    // SET-ONCE MUTATORS
    // ========================================================================

    /// Set the identity's name
    ///
    /// Setting the same name again is a no-op; any other change after the
    /// name or handle has been initialized is an `InvalidState` error.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if self.name == name {
            return Ok(());
        }

        if !self.name.is_empty() || self.handle.is_some() {
            return Err(Error::InvalidState(
                "cannot change name or key after they have been initialized".into(),
            ));
        }

        self.name = name.to_string();
        Ok(())
    }

    /// Set the identity's handle
    ///
    /// Setting a handle to the same underlying key is a no-op.
    pub fn set_handle(&mut self, handle: KeyHandle) -> Result<()> {
        if let Some(current) = &self.handle {
            if current.unique_name() == handle.unique_name() {
                return Ok(());
            }
            return Err(Error::InvalidState(
                "cannot change name or key after they have been initialized".into(),
            ));
        }

        if !self.name.is_empty() {
            return Err(Error::InvalidState(
                "cannot change name or key after they have been initialized".into(),
            ));
        }

        Self::require_curve(&handle)?;
        self.adopt(handle);
        Ok(())
    }

    /// Override the managed/foreign classification before first load
    pub fn set_managed(&mut self, managed: bool) -> Result<()> {
        self.is_managed.set(managed, "IsManagedIdentity")
    }

    /// Override the export policy used if a key must be created
    pub fn set_export_policy(&mut self, policy: ExportPolicy) -> Result<()> {
        self.export_policy.set(policy, "ExportPolicy")
    }

    /// Override the usages used if a key must be created
    pub fn set_usages(&mut self, usages: KeyUsages) -> Result<()> {
        self.usages.set(usages, "Usages")
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// The bare name; empty if unset
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a handle has already been loaded or supplied
    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether the backing key has been removed from the store
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// The full store name (loads the backing key on first call)
    pub fn full_store_name(&mut self) -> Result<String> {
        self.load()?;
        Ok(self.handle.as_ref().map(|h| h.store_name().to_string()).unwrap_or_default())
    }

    /// The store-assigned unique name (loads the backing key on first call)
    pub fn unique_store_name(&mut self) -> Result<&str> {
        self.load()?;
        Ok(&self.unique_store_name)
    }

    /// Whether this key was created by this system (loads on first call)
    pub fn is_managed(&mut self) -> Result<bool> {
        self.load()?;
        Ok(*self.is_managed.get().unwrap_or(&false))
    }

    /// The key's export policy (loads on first call)
    pub fn export_policy(&mut self) -> Result<ExportPolicy> {
        self.load()?;
        Ok(*self.export_policy.get().unwrap_or(&ExportPolicy::AllowExport))
    }

    /// The key's permitted usages (loads on first call)
    pub fn usages(&mut self) -> Result<KeyUsages> {
        self.load()?;
        Ok(*self.usages.get().unwrap_or(&KeyUsages::AllUsages))
    }

    /// The backing key handle (loads on first call)
    pub fn handle(&mut self) -> Result<&KeyHandle> {
        self.load()?;
        // load() guarantees the handle on success
        self.handle
            .as_ref()
            .ok_or_else(|| Error::InvalidState("identity has no backing key".into()))
    }

    /// Check whether a backing key currently exists in the store
    pub fn exists(&self) -> Result<bool> {
        if self.name.is_empty() && self.handle.is_none() {
            return Ok(false);
        }

        let full = match &self.handle {
            Some(handle) => handle.store_name().to_string(),
            None => to_full_name(&self.name, *self.is_managed.get().unwrap_or(&true)),
        };
        self.store.exists(&full)
    }

    // ========================================================================
    // REMOVAL
    // ========================================================================

    /// Delete the backing key from the store
    ///
    /// Returns `false` without touching the store if no backing key exists
    /// yet. After a successful removal the identity is terminal: it cannot
    /// be reused for cryptographic operations.
    pub fn remove(&mut self) -> Result<bool> {
        if self.removed {
            return Ok(false);
        }

        let full = match &self.handle {
            Some(handle) => handle.store_name().to_string(),
            None => {
                if self.name.is_empty() {
                    return Ok(false);
                }
                to_full_name(&self.name, *self.is_managed.get().unwrap_or(&true))
            }
        };

        if self.handle.is_none() && !self.store.exists(&full)? {
            return Ok(false);
        }

        let deleted = self.store.delete(&full)?;
        self.handle = None;
        self.removed = true;

        tracing::info!(name = %self.name, "removed identity key from store");
        Ok(deleted)
    }

    /// Delete a named key without constructing a full identity
    ///
    /// The name is taken as a bare managed name. Returns `false` if no such
    /// key exists.
    pub fn remove_named(store: &dyn KeyStore, name: &str) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }

        let full = to_full_name(name, true);
        if !store.exists(&full)? {
            return Ok(false);
        }
        store.delete(&full)
    }

    /// Check for a named key without constructing a full identity
    pub fn exists_named(store: &dyn KeyStore, name: &str) -> Result<bool> {
        if name.is_empty() {
            return Ok(false);
        }
        store.exists(&to_full_name(name, true))
    }

    // ========================================================================
    // LOAD-OR-CREATE
    // ========================================================================

    /// Populate the handle and all metadata fields in one atomic step
    fn load(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        if self.removed {
            return Err(Error::InvalidState(
                "identity's backing key has been removed".into(),
            ));
        }

        if self.name.is_empty() {
            return Err(Error::InvalidState("name has not been defined".into()));
        }

        let managed = *self.is_managed.get().unwrap_or(&true);
        let full = to_full_name(&self.name, managed);

        let handle = if self.store.exists(&full)? {
            tracing::debug!(name = %full, "opening existing key");
            self.store.open(&full)?
        } else {
            self.create_key(&full)?
        };

        Self::require_curve(&handle)?;
        self.adopt(handle);
        Ok(())
    }

    /// Create the backing key pair on the fixed curve
    ///
    /// A failed first attempt is retried once with the archiving-only export
    /// policy — same curve, same store name. Any other failure propagates.
    fn create_key(&self, full_name: &str) -> Result<KeyHandle> {
        let params = KeyCreationParams {
            export_policy: *self.export_policy.get().unwrap_or(&ExportPolicy::AllowExport),
            usages: *self.usages.get().unwrap_or(&KeyUsages::AllUsages),
        };

        tracing::info!(name = %full_name, curve = CURVE_NAME, "creating key pair");
        match self.store.create(KeyAlgorithm::EcdhP521, full_name, &params) {
            Ok(handle) => Ok(handle),
            Err(first) => {
                tracing::debug!(
                    name = %full_name,
                    error = %first,
                    "key creation failed, retrying with archiving export policy"
                );
                let fallback = KeyCreationParams {
                    export_policy: ExportPolicy::AllowArchiving,
                    usages: params.usages,
                };
                self.store.create(KeyAlgorithm::EcdhP521, full_name, &fallback)
            }
        }
    }

    /// Take ownership of a handle and fill in every metadata field from it
    fn adopt(&mut self, handle: KeyHandle) {
        let managed = handle.store_name().starts_with(NAMESPACE_PREFIX);
        self.name = local_name(handle.store_name(), managed);
        self.unique_store_name = handle.unique_name().to_string();
        self.is_managed.force(managed);
        self.export_policy.force(handle.export_policy());
        self.usages.force(handle.usages());
        self.handle = Some(handle);
    }

    fn require_curve(handle: &KeyHandle) -> Result<()> {
        if handle.algorithm() != KeyAlgorithm::EcdhP521 {
            return Err(Error::UnsupportedAlgorithm(format!(
                "identity requires a {} key, got {}",
                CURVE_NAME,
                handle.algorithm()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for KeyIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyIdentity")
            .field("name", &self.name)
            .field("unique_store_name", &self.unique_store_name)
            .field("is_managed", &self.is_managed.get())
            .field("has_handle", &self.handle.is_some())
            .field("removed", &self.removed)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKeyStore;

    fn store() -> Arc<MemoryKeyStore> {
        Arc::new(MemoryKeyStore::new())
    }

    #[test]
    fn test_prefix_is_33_chars() {
        assert_eq!(NAMESPACE_PREFIX.len(), 33);
    }

    #[test]
    fn test_name_mapping_round_trip() {
        let full = format!("{}alice", NAMESPACE_PREFIX);
        assert_eq!(to_full_name(&local_name(&full, true), true), full);

        // Foreign names pass through unchanged in both directions
        assert_eq!(local_name("external-key", false), "external-key");
        assert_eq!(to_full_name("external-key", false), "external-key");

        // Managed stripping only fires when the prefix is present
        assert_eq!(local_name("bare", true), "bare");
    }

    #[test]
    fn test_open_or_create_rejects_empty_name() {
        let err = KeyIdentity::open_or_create(store(), "").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_first_access_creates_key_under_prefixed_name() {
        let store = store();
        let mut alice = KeyIdentity::open_or_create(store.clone(), "alice").unwrap();

        // Construction touches nothing
        assert!(!store.exists(&to_full_name("alice", true)).unwrap());

        let unique = alice.unique_store_name().unwrap().to_string();
        assert!(!unique.is_empty());
        assert!(store.exists(&to_full_name("alice", true)).unwrap());
        assert!(alice.is_managed().unwrap());
    }

    #[test]
    fn test_reopen_returns_same_key_material() {
        let store = store();

        let unique_first = KeyIdentity::open_or_create(store.clone(), "alice")
            .unwrap()
            .unique_store_name()
            .unwrap()
            .to_string();

        let unique_second = KeyIdentity::open_or_create(store, "alice")
            .unwrap()
            .unique_store_name()
            .unwrap()
            .to_string();

        assert_eq!(unique_first, unique_second);
    }

    #[test]
    fn test_metadata_populated_atomically() {
        let store = store();
        let mut alice = KeyIdentity::open_or_create(store, "alice").unwrap();

        // Reading one metadata field populates all of them
        alice.is_managed().unwrap();
        assert!(alice.has_handle());
        assert!(!alice.unique_store_name().unwrap().is_empty());
        assert_eq!(alice.export_policy().unwrap(), ExportPolicy::AllowExport);
        assert_eq!(alice.usages().unwrap(), KeyUsages::AllUsages);
    }

    #[test]
    fn test_set_name_twice_with_different_value_fails() {
        let store = store();
        let mut identity = KeyIdentity::unnamed(store);

        identity.set_name("alice").unwrap();
        // Same value is a no-op
        identity.set_name("alice").unwrap();

        let err = identity.set_name("bob").unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(identity.name(), "alice");
    }

    #[test]
    fn test_set_export_policy_once() {
        let store = store();
        let mut identity = KeyIdentity::open_or_create(store, "alice").unwrap();

        identity.set_export_policy(ExportPolicy::AllowArchiving).unwrap();
        identity.set_export_policy(ExportPolicy::AllowArchiving).unwrap();
        let err = identity
            .set_export_policy(ExportPolicy::AllowExport)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        // Created with the overridden policy
        assert_eq!(identity.export_policy().unwrap(), ExportPolicy::AllowArchiving);
    }

    #[test]
    fn test_from_handle_rejects_wrong_curve() {
        let store = store();
        let handle = store
            .create(
                KeyAlgorithm::Ed25519,
                "signing-key",
                &KeyCreationParams::default(),
            )
            .unwrap();

        let err = KeyIdentity::from_handle(store, handle).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_from_handle_classifies_managed_and_foreign() {
        let store = store();
        let params = KeyCreationParams::default();

        let managed_name = to_full_name("alice", true);
        let managed = store
            .create(KeyAlgorithm::EcdhP521, &managed_name, &params)
            .unwrap();
        let mut identity = KeyIdentity::from_handle(store.clone(), managed).unwrap();
        assert!(identity.is_managed().unwrap());
        assert_eq!(identity.name(), "alice");

        let foreign = store
            .create(KeyAlgorithm::EcdhP521, "imported-key", &params)
            .unwrap();
        let mut identity = KeyIdentity::from_handle(store, foreign).unwrap();
        assert!(!identity.is_managed().unwrap());
        assert_eq!(identity.name(), "imported-key");
    }

    #[test]
    fn test_remove_without_backing_key_is_noop() {
        let store = store();
        let mut alice = KeyIdentity::open_or_create(store, "alice").unwrap();

        // Nothing was ever created
        assert!(!alice.remove().unwrap());
    }

    #[test]
    fn test_remove_deletes_and_is_terminal() {
        let store = store();
        let mut alice = KeyIdentity::open_or_create(store.clone(), "alice").unwrap();
        alice.unique_store_name().unwrap();

        assert!(alice.remove().unwrap());
        assert!(!store.exists(&to_full_name("alice", true)).unwrap());
        assert!(alice.is_removed());

        // No transition back from Removed
        assert!(matches!(
            alice.unique_store_name().unwrap_err(),
            Error::InvalidState(_)
        ));
    }

    #[test]
    fn test_remove_named() {
        let store = store();
        KeyIdentity::open_or_create(store.clone(), "alice")
            .unwrap()
            .unique_store_name()
            .unwrap();

        assert!(KeyIdentity::exists_named(store.as_ref(), "alice").unwrap());
        assert!(KeyIdentity::remove_named(store.as_ref(), "alice").unwrap());
        assert!(!KeyIdentity::remove_named(store.as_ref(), "alice").unwrap());
        assert!(!KeyIdentity::exists_named(store.as_ref(), "alice").unwrap());
    }

    #[test]
    fn test_list_all_compatible_skips_incompatible() {
        let store = store();
        let params = KeyCreationParams::default();

        KeyIdentity::open_or_create(store.clone(), "alice")
            .unwrap()
            .unique_store_name()
            .unwrap();
        store
            .create(KeyAlgorithm::Ed25519, "unrelated-signing-key", &params)
            .unwrap();

        let identities = KeyIdentity::list_all_compatible(store).unwrap();
        assert_eq!(identities.len(), 1);
        assert_eq!(identities[0].name(), "alice");
    }
}
