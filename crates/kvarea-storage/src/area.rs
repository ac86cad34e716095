//! Typed storage areas.
//!
//! A [`StorageArea`] is the entry point for callers. It binds a namespace on
//! some [`Database`], and a [`Codec`] that maps typed values to the raw
//! strings the store keeps. Keys are never encoded.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kvarea_storage::{MemoryDatabase, StorageArea, StorageOptions};
//!
//! # async fn example() -> kvarea_storage::StorageResult<()> {
//! let db = Arc::new(MemoryDatabase::new());
//! let a: StorageArea<String> = StorageArea::open(
//!     StorageOptions::new().with_namespace("keyv1").with_database(db.clone()),
//! )?;
//! let b: StorageArea<String> = StorageArea::open(
//!     StorageOptions::new().with_namespace("keyv2").with_database(db),
//! )?;
//!
//! a.set("foo", &"keyv1".to_owned()).await?;
//! b.set("foo", &"keyv2".to_owned()).await?;
//! assert_eq!(a.get("foo").await?.as_deref(), Some("keyv1"));
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::codec::{Codec, JsonCodec};
use crate::config::StorageConfig;
use crate::cursor::{BoxCursor, MapCursor};
use crate::error::StorageResult;
use crate::memory::MemoryDatabase;
use crate::store::{BackingStore, Database};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Construction options for a [`StorageArea`].
///
/// Defaults: the empty namespace, a fresh [`MemoryDatabase`], and
/// [`JsonCodec`].
pub struct StorageOptions<C = JsonCodec> {
    namespace: String,
    database: Option<Arc<dyn Database>>,
    codec: C,
}

impl StorageOptions<JsonCodec> {
    /// Options with every default.
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespace: String::new(),
            database: None,
            codec: JsonCodec,
        }
    }

    /// Options described by a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`](crate::StorageError::Config) if the
    /// configuration is invalid or names an unavailable backend.
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        Ok(Self::new()
            .with_namespace(config.namespace.clone())
            .with_database(config.open_database()?))
    }
}

impl Default for StorageOptions<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> StorageOptions<C> {
    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Use `database` instead of a fresh in-memory one.
    #[must_use]
    pub fn with_database(mut self, database: Arc<dyn Database>) -> Self {
        self.database = Some(database);
        self
    }

    /// Replace the codec.
    #[must_use]
    pub fn with_codec<C2>(self, codec: C2) -> StorageOptions<C2> {
        StorageOptions {
            namespace: self.namespace,
            database: self.database,
            codec,
        }
    }
}

impl<C> std::fmt::Debug for StorageOptions<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageOptions")
            .field("namespace", &self.namespace)
            .field(
                "backend",
                &self.database.as_ref().map(|db| db.backend()),
            )
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Storage area
// ---------------------------------------------------------------------------

/// Typed key-value area over a namespace-scoped store.
pub struct StorageArea<T, C = JsonCodec> {
    backing: BackingStore,
    codec: Arc<C>,
    _value: PhantomData<fn() -> T>,
}

impl<T, C> Clone for StorageArea<T, C> {
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
            codec: Arc::clone(&self.codec),
            _value: PhantomData,
        }
    }
}

impl<T, C> std::fmt::Debug for StorageArea<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageArea")
            .field("backing", &self.backing)
            .finish_non_exhaustive()
    }
}

impl<T, C> StorageArea<T, C>
where
    T: Send + 'static,
    C: Codec<T>,
{
    /// Open a storage area.
    ///
    /// Without a database in `options`, a new [`MemoryDatabase`] is created
    /// and owned by this area alone.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`](crate::StorageError::InvalidKey)
    /// if the database rejects the namespace.
    pub fn open(options: StorageOptions<C>) -> StorageResult<Self> {
        let database: Arc<dyn Database> = match options.database {
            Some(database) => database,
            None => Arc::new(MemoryDatabase::new()),
        };
        Ok(Self {
            backing: BackingStore::open(database, &options.namespace)?,
            codec: Arc::new(options.codec),
            _value: PhantomData,
        })
    }

    /// The namespace this area is scoped to.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.backing.store.namespace()
    }

    /// The store and database behind this area.
    #[must_use]
    pub fn backing_store(&self) -> &BackingStore {
        &self.backing
    }

    /// Get and decode the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or a serialization error if the stored
    /// value cannot be decoded.
    pub async fn get(&self, key: &str) -> StorageResult<Option<T>> {
        self.backing
            .store
            .get(key)
            .await?
            .map(|raw| self.codec.decode(&raw))
            .transpose()
    }

    /// Encode and store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the value cannot be encoded, or the
    /// backend's error.
    pub async fn set(&self, key: &str, value: &T) -> StorageResult<()> {
        let raw = self.codec.encode(value)?;
        self.backing.store.set(key, raw).await
    }

    /// Store `value`, or remove `key` when `value` is `None`.
    ///
    /// `None` is the undefined value: it has no stored form, so it reads back
    /// as absent and is not enumerated.
    ///
    /// # Errors
    ///
    /// See [`set`](Self::set) and [`delete`](Self::delete).
    pub async fn set_optional(&self, key: &str, value: Option<&T>) -> StorageResult<()> {
        match value {
            Some(value) => self.set(key, value).await,
            None => self.delete(key).await,
        }
    }

    /// Remove `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.backing.store.delete(key).await
    }

    /// Remove every key in this namespace.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn clear(&self) -> StorageResult<()> {
        self.backing.store.clear().await
    }

    /// Cursor over the keys in this namespace.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn keys(&self) -> StorageResult<BoxCursor<String>> {
        self.backing.store.keys().await
    }

    /// Cursor over the decoded values in this namespace.
    ///
    /// # Errors
    ///
    /// Returns the backend's error. Decoding errors surface from `advance`.
    pub async fn values(&self) -> StorageResult<BoxCursor<T>> {
        let raw = self.backing.store.values().await?;
        let codec = Arc::clone(&self.codec);
        Ok(Box::new(MapCursor::new(raw, move |value: String| {
            codec.decode(&value)
        })))
    }

    /// Cursor over the `(key, decoded value)` pairs in this namespace.
    ///
    /// # Errors
    ///
    /// Returns the backend's error. Decoding errors surface from `advance`.
    pub async fn entries(&self) -> StorageResult<BoxCursor<(String, T)>> {
        let raw = self.backing.store.entries().await?;
        let codec = Arc::clone(&self.codec);
        Ok(Box::new(MapCursor::new(
            raw,
            move |(key, value): (String, String)| Ok((key, codec.decode(&value)?)),
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::codec::FnCodec;
    use crate::cursor::{Cursor, collect};
    use crate::error::StorageError;
    use crate::remote::RemoteDatabase;

    fn json_area(namespace: &str, db: Arc<dyn Database>) -> StorageArea<Value> {
        StorageArea::open(
            StorageOptions::new()
                .with_namespace(namespace)
                .with_database(db),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_default_area_is_in_memory() {
        let area: StorageArea<Value> = StorageArea::open(StorageOptions::new()).unwrap();
        assert_eq!(area.namespace(), "");
        assert_eq!(area.backing_store().database.backend(), "memory");
        area.set("foo", &json!("bar")).await.unwrap();
        assert_eq!(area.get("foo").await.unwrap(), Some(json!("bar")));
    }

    #[tokio::test]
    async fn test_object_round_trip() {
        let area = json_area("ns", Arc::new(MemoryDatabase::new()));
        let value = json!({ "fizz": "buzz" });
        area.set("foo", &value).await.unwrap();
        assert_eq!(area.get("foo").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_set_optional_none_reads_absent() {
        let area = json_area("ns", Arc::new(MemoryDatabase::new()));
        area.set("foo", &json!(1)).await.unwrap();
        area.set_optional("foo", None).await.unwrap();
        assert!(area.get("foo").await.unwrap().is_none());
        assert!(collect(area.keys().await.unwrap()).await.unwrap().is_empty());

        area.set_optional("foo", Some(&json!(null))).await.unwrap();
        assert_eq!(area.get("foo").await.unwrap(), Some(Value::Null));
    }

    #[tokio::test]
    async fn test_entries_decode_values() {
        let area = json_area("", Arc::new(MemoryDatabase::new()));
        area.set("foo", &json!("bar")).await.unwrap();
        area.set("fizz", &json!({ "n": 1 })).await.unwrap();

        let mut entries = area.entries().await.unwrap();
        assert_eq!(
            entries.advance().await.unwrap(),
            Some(("foo".to_owned(), json!("bar")))
        );
        assert_eq!(
            entries.advance().await.unwrap(),
            Some(("fizz".to_owned(), json!({ "n": 1 })))
        );
        assert!(entries.advance().await.unwrap().is_none());

        let values = collect(area.values().await.unwrap()).await.unwrap();
        assert_eq!(values, vec![json!("bar"), json!({ "n": 1 })]);
    }

    #[tokio::test]
    async fn test_undecodable_value_errors_on_read() {
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
        let raw = db.create_store("ns").unwrap();
        raw.set("bad", "{not json".into()).await.unwrap();

        let area = json_area("ns", db);
        assert!(matches!(
            area.get("bad").await,
            Err(StorageError::Serialization(_))
        ));
        let mut values = area.values().await.unwrap();
        assert!(values.advance().await.is_err());
    }

    #[tokio::test]
    async fn test_custom_codec() {
        let codec = FnCodec::new(
            |v: &String| Ok(v.chars().rev().collect()),
            |raw: &str| Ok(raw.chars().rev().collect()),
        );
        let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
        let area: StorageArea<String, _> = StorageArea::open(
            StorageOptions::new()
                .with_database(Arc::clone(&db))
                .with_codec(codec),
        )
        .unwrap();

        area.set("k", &"abc".to_owned()).await.unwrap();
        let raw = db.create_store("").unwrap().get("k").await.unwrap();
        assert_eq!(raw.as_deref(), Some("cba"));
        assert_eq!(area.get("k").await.unwrap().as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_areas_share_remote_connection() {
        let db: Arc<dyn Database> = Arc::new(RemoteDatabase::new("mem://").unwrap());
        let a = json_area("keyv1", Arc::clone(&db));
        let b = json_area("keyv2", db);
        a.set("foo", &json!("keyv1")).await.unwrap();
        b.set("foo", &json!("keyv2")).await.unwrap();
        assert_eq!(a.get("foo").await.unwrap(), Some(json!("keyv1")));
        assert_eq!(b.get("foo").await.unwrap(), Some(json!("keyv2")));
    }

    #[test]
    fn test_open_rejects_invalid_namespace() {
        let db: Arc<dyn Database> = Arc::new(RemoteDatabase::new("mem://").unwrap());
        let result: StorageResult<StorageArea<Value>> = StorageArea::open(
            StorageOptions::new()
                .with_namespace("a:b")
                .with_database(db),
        );
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
