//! The raw store contract shared by every backend.
//!
//! A [`Store`] is bound to one namespace and handles opaque string values.
//! A [`Database`] owns one backend connection and hands out stores for any
//! number of namespaces over it.
//!
//! # Contract
//!
//! - `get` on a missing key is `Ok(None)`, never an error. A failing backend
//!   is an error, never `None`.
//! - `set` upserts and leaves the key enumerable.
//! - `delete` of a missing key is a no-op.
//! - `clear` only touches the store's own namespace.
//! - `keys`, `values` and `entries` agree pointwise when no writes race them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cursor::BoxCursor;
use crate::error::{StorageError, StorageResult};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Namespace-scoped raw key-value operations.
#[async_trait]
pub trait Store: Send + Sync {
    /// The namespace this store is scoped to.
    fn namespace(&self) -> &str;

    /// Get the raw value for `key`.
    ///
    /// Returns `None` if the key was never set or has been deleted.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Set the raw value for `key`, overwriting any previous value.
    async fn set(&self, key: &str, value: String) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Remove every key in this namespace.
    async fn clear(&self) -> StorageResult<()>;

    /// Cursor over the keys present when the cursor is created.
    async fn keys(&self) -> StorageResult<BoxCursor<String>>;

    /// Cursor over the values present when the cursor is created.
    async fn values(&self) -> StorageResult<BoxCursor<String>>;

    /// Cursor over the `(key, value)` pairs present when the cursor is created.
    async fn entries(&self) -> StorageResult<BoxCursor<(String, String)>>;
}

/// Factory producing namespace-scoped stores over one backend connection.
pub trait Database: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Create a store scoped to `namespace`.
    ///
    /// Stores created for the same namespace share their entries.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the backend cannot represent
    /// the namespace.
    fn create_store(&self, namespace: &str) -> StorageResult<Arc<dyn Store>>;
}

// ---------------------------------------------------------------------------
// Backing store
// ---------------------------------------------------------------------------

/// A store together with the database that produced it.
///
/// The database is kept so the connection outlives every store built on it.
#[derive(Clone)]
pub struct BackingStore {
    /// The database the store was created from.
    pub database: Arc<dyn Database>,
    /// The namespace-scoped store.
    pub store: Arc<dyn Store>,
}

impl BackingStore {
    /// Create a store for `namespace` from `database`.
    ///
    /// # Errors
    ///
    /// Propagates the database's namespace validation error.
    pub fn open(database: Arc<dyn Database>, namespace: &str) -> StorageResult<Self> {
        let store = database.create_store(namespace)?;
        Ok(Self { database, store })
    }
}

impl std::fmt::Debug for BackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackingStore")
            .field("backend", &self.database.backend())
            .field("namespace", &self.store.namespace())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that a namespace contains none of the `reserved` characters.
///
/// The empty namespace is valid; it is the default.
pub(crate) fn validate_namespace(namespace: &str, reserved: &[char]) -> StorageResult<()> {
    if namespace.contains('\0') {
        return Err(StorageError::InvalidKey(
            "namespace must not contain null bytes".into(),
        ));
    }
    if let Some(c) = namespace.chars().find(|c| reserved.contains(c)) {
        return Err(StorageError::InvalidKey(format!(
            "namespace {namespace:?} must not contain {c:?}"
        )));
    }
    Ok(())
}
