//! Remote (Redis-like) backend.
//!
//! The remote protocol has no "list keys under a prefix" primitive, so each
//! namespace keeps a membership index next to its data:
//!
//! | Record | Key | Kind |
//! |--------|-----|------|
//! | data | `"{namespace}:{key}"` | scalar string |
//! | membership index | `"{namespace}"` | set of bare keys |
//!
//! Namespaces may not contain `:`. Data keys always contain one and index
//! keys never do, so no namespace can address another namespace's records.
//!
//! # Write ordering
//!
//! Every mutation is two independent remote calls with no rollback. They are
//! ordered so that a failure between them can only leave an index member
//! whose data record is missing:
//!
//! - `set`: add to the index, then write the data record.
//! - `delete`: delete the data record, then remove from the index.
//! - `clear`: delete every member's data record, then delete the index.
//!
//! A dangling member reads back as absent and enumeration skips it, so the
//! namespace heals itself on the next `set` or `delete` of that key. Data is
//! never left outside the index, where it could not be enumerated or cleared.
//!
//! # Enumeration
//!
//! Cursors read the index once when created and iterate that snapshot,
//! fetching each data record as they advance. `keys`, `values` and `entries`
//! share that walk, so they agree pointwise even over dangling members.

mod loopback;
#[cfg(feature = "redis")]
mod redis_client;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::cursor::{BoxCursor, Cursor, MapCursor};
use crate::error::{BackendError, Operation, StorageError, StorageResult};
use crate::store::{Database, Store, validate_namespace};

pub use loopback::MemoryConnection;
#[cfg(feature = "redis")]
pub use redis_client::RedisConnection;

/// Separator between namespace and key in data record names.
const SEPARATOR: char = ':';

// ---------------------------------------------------------------------------
// Connection trait
// ---------------------------------------------------------------------------

/// The primitives a remote key-value backend must expose.
///
/// Implementations own reconnection, pooling, timeouts and retries; the
/// storage layer calls each primitive once and propagates any error.
#[async_trait]
pub trait RemoteConnection: Send + Sync {
    /// Read a scalar record.
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Write a scalar record, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Delete a record of any kind. Deleting a missing record succeeds.
    async fn del(&self, key: &str) -> Result<(), BackendError>;

    /// Add `member` to the set record `key`, creating it if needed.
    async fn sadd(&self, key: &str, member: &str) -> Result<(), BackendError>;

    /// Remove `member` from the set record `key`.
    async fn srem(&self, key: &str, member: &str) -> Result<(), BackendError>;

    /// All members of the set record `key`; empty if it does not exist.
    async fn smembers(&self, key: &str) -> Result<Vec<String>, BackendError>;
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// How a [`RemoteDatabase`] obtains its connection.
pub enum RemoteTarget {
    /// An already-connected client.
    Connected(Arc<dyn RemoteConnection>),
    /// A locator such as `mem://` or `redis://127.0.0.1:6379/0`.
    Locator(String),
}

impl std::fmt::Debug for RemoteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(_) => f.write_str("Connected(..)"),
            Self::Locator(locator) => f.debug_tuple("Locator").field(locator).finish(),
        }
    }
}

impl From<Arc<dyn RemoteConnection>> for RemoteTarget {
    fn from(conn: Arc<dyn RemoteConnection>) -> Self {
        Self::Connected(conn)
    }
}

impl From<&str> for RemoteTarget {
    fn from(locator: &str) -> Self {
        Self::Locator(locator.to_owned())
    }
}

impl From<String> for RemoteTarget {
    fn from(locator: String) -> Self {
        Self::Locator(locator)
    }
}

/// Database over one shared remote connection.
///
/// Every store it creates uses the same connection.
pub struct RemoteDatabase {
    conn: Arc<dyn RemoteConnection>,
}

impl RemoteDatabase {
    /// Resolve `target` into a database.
    ///
    /// Locators are resolved once, here. Supported schemes:
    ///
    /// - `mem://`: a fresh in-process [`MemoryConnection`]
    /// - `redis://`, `rediss://`: a lazily connected `RedisConnection`
    ///   (requires the `redis` feature)
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Config`] if the locator cannot be parsed or
    /// names an unsupported scheme.
    pub fn new(target: impl Into<RemoteTarget>) -> StorageResult<Self> {
        let conn = match target.into() {
            RemoteTarget::Connected(conn) => conn,
            RemoteTarget::Locator(locator) => resolve_locator(&locator)?,
        };
        Ok(Self { conn })
    }

    /// Create a database over an already-connected client.
    #[must_use]
    pub fn with_connection(conn: Arc<dyn RemoteConnection>) -> Self {
        Self { conn }
    }

    /// The shared connection.
    #[must_use]
    pub fn connection(&self) -> &Arc<dyn RemoteConnection> {
        &self.conn
    }
}

impl std::fmt::Debug for RemoteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDatabase").finish_non_exhaustive()
    }
}

impl Database for RemoteDatabase {
    fn backend(&self) -> &'static str {
        "remote"
    }

    fn create_store(&self, namespace: &str) -> StorageResult<Arc<dyn Store>> {
        validate_namespace(namespace, &[SEPARATOR])?;
        Ok(Arc::new(RemoteStore {
            conn: Arc::clone(&self.conn),
            namespace: namespace.to_owned(),
        }))
    }
}

fn resolve_locator(locator: &str) -> StorageResult<Arc<dyn RemoteConnection>> {
    let parsed = url::Url::parse(locator)
        .map_err(|e| StorageError::Config(format!("invalid locator {locator:?}: {e}")))?;
    match parsed.scheme() {
        "mem" => {
            info!("opening in-process remote backend");
            Ok(Arc::new(MemoryConnection::new()))
        }
        #[cfg(feature = "redis")]
        "redis" | "rediss" => {
            info!(
                host = parsed.host_str().unwrap_or_default(),
                "opening redis backend"
            );
            Ok(Arc::new(RedisConnection::open(locator)?))
        }
        #[cfg(not(feature = "redis"))]
        "redis" | "rediss" => Err(StorageError::Config(
            "redis locators require the `redis` feature".into(),
        )),
        other => Err(StorageError::Config(format!(
            "unsupported backend scheme {other:?}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// A namespace's view into a [`RemoteDatabase`].
pub struct RemoteStore {
    conn: Arc<dyn RemoteConnection>,
    namespace: String,
}

impl RemoteStore {
    /// Name of the data record holding `key`.
    fn data_key(&self, key: &str) -> String {
        data_key(&self.namespace, key)
    }

    /// Name of the membership index record.
    fn index_key(&self) -> &str {
        &self.namespace
    }

    async fn members(&self) -> StorageResult<Vec<String>> {
        self.conn
            .smembers(self.index_key())
            .await
            .map_err(|e| StorageError::backend(Operation::Enumerate, e))
    }

    async fn entry_cursor(&self) -> StorageResult<EntryCursor> {
        let members = self.members().await?;
        debug!(namespace = %self.namespace, count = members.len(), "snapshot membership index");
        Ok(EntryCursor {
            conn: Arc::clone(&self.conn),
            namespace: self.namespace.clone(),
            members: members.into_iter(),
        })
    }
}

fn data_key(namespace: &str, key: &str) -> String {
    format!("{namespace}{SEPARATOR}{key}")
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for RemoteStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.conn
            .get(&self.data_key(key))
            .await
            .map_err(|e| StorageError::backend(Operation::Get, e))
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        debug!(namespace = %self.namespace, key, "set");
        let err = |e| StorageError::backend(Operation::Set, e);
        self.conn.sadd(self.index_key(), key).await.map_err(err)?;
        self.conn
            .set(&self.data_key(key), &value)
            .await
            .map_err(err)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        debug!(namespace = %self.namespace, key, "delete");
        let err = |e| StorageError::backend(Operation::Delete, e);
        self.conn.del(&self.data_key(key)).await.map_err(err)?;
        self.conn.srem(self.index_key(), key).await.map_err(err)
    }

    async fn clear(&self) -> StorageResult<()> {
        let err = |e| StorageError::backend(Operation::Clear, e);
        let members = self.conn.smembers(self.index_key()).await.map_err(err)?;
        debug!(namespace = %self.namespace, count = members.len(), "clear");
        let data_keys: Vec<String> = members.iter().map(|k| self.data_key(k)).collect();
        try_join_all(data_keys.iter().map(|k| self.conn.del(k)))
            .await
            .map_err(err)?;
        self.conn.del(self.index_key()).await.map_err(err)
    }

    async fn keys(&self) -> StorageResult<BoxCursor<String>> {
        let entries = self.entry_cursor().await?;
        Ok(Box::new(MapCursor::new(entries, |(key, _)| Ok(key))))
    }

    async fn values(&self) -> StorageResult<BoxCursor<String>> {
        let entries = self.entry_cursor().await?;
        Ok(Box::new(MapCursor::new(entries, |(_, value)| Ok(value))))
    }

    async fn entries(&self) -> StorageResult<BoxCursor<(String, String)>> {
        Ok(Box::new(self.entry_cursor().await?))
    }
}

// ---------------------------------------------------------------------------
// Cursors
// ---------------------------------------------------------------------------

/// Walks a membership index snapshot, reading each data record on demand.
///
/// Backs all three enumerations, so a member without data is skipped by
/// `keys`, `values` and `entries` alike. A member is consumed only once its
/// read succeeds; after a failed step the next `advance` retries it.
struct EntryCursor {
    conn: Arc<dyn RemoteConnection>,
    namespace: String,
    members: std::vec::IntoIter<String>,
}

#[async_trait]
impl Cursor for EntryCursor {
    type Item = (String, String);

    async fn advance(&mut self) -> StorageResult<Option<(String, String)>> {
        while let Some(key) = self.members.as_slice().first().cloned() {
            let value = self
                .conn
                .get(&data_key(&self.namespace, &key))
                .await
                .map_err(|e| StorageError::backend(Operation::Enumerate, e))?;
            self.members.next();
            match value {
                Some(value) => return Ok(Some((key, value))),
                None => {
                    // Deleted after the snapshot, or left dangling by a failed write.
                    warn!(
                        namespace = %self.namespace,
                        key = %key,
                        "index member has no data record"
                    );
                }
            }
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::collect;

    fn database() -> (RemoteDatabase, Arc<MemoryConnection>) {
        let conn = Arc::new(MemoryConnection::new());
        let db = RemoteDatabase::with_connection(Arc::clone(&conn) as Arc<dyn RemoteConnection>);
        (db, conn)
    }

    fn sorted(mut items: Vec<String>) -> Vec<String> {
        items.sort();
        items
    }

    #[tokio::test]
    async fn test_remote_set_writes_data_and_index() {
        let (db, conn) = database();
        let store = db.create_store("ns").unwrap();
        store.set("foo", "bar".into()).await.unwrap();

        assert_eq!(conn.get("ns:foo").await.unwrap().as_deref(), Some("bar"));
        assert_eq!(conn.smembers("ns").await.unwrap(), vec!["foo"]);
    }

    #[tokio::test]
    async fn test_remote_get_missing_and_empty_value() {
        let (db, _conn) = database();
        let store = db.create_store("ns").unwrap();
        assert!(store.get("missing").await.unwrap().is_none());

        store.set("empty", String::new()).await.unwrap();
        assert_eq!(store.get("empty").await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_remote_delete_removes_data_and_index() {
        let (db, conn) = database();
        let store = db.create_store("ns").unwrap();
        store.set("foo", "bar".into()).await.unwrap();
        store.delete("foo").await.unwrap();
        store.delete("never-set").await.unwrap();

        assert!(conn.get("ns:foo").await.unwrap().is_none());
        assert!(conn.smembers("ns").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_clear_only_touches_namespace() {
        let (db, conn) = database();
        let a = db.create_store("keyv1").unwrap();
        let b = db.create_store("keyv2").unwrap();
        for store in [&a, &b] {
            store.set("foo", store.namespace().to_owned()).await.unwrap();
            store.set("bar", store.namespace().to_owned()).await.unwrap();
        }

        a.clear().await.unwrap();

        assert!(a.get("foo").await.unwrap().is_none());
        assert!(a.get("bar").await.unwrap().is_none());
        assert!(conn.smembers("keyv1").await.unwrap().is_empty());
        assert_eq!(b.get("foo").await.unwrap().as_deref(), Some("keyv2"));
        assert_eq!(
            sorted(collect(b.keys().await.unwrap()).await.unwrap()),
            vec!["bar", "foo"]
        );
    }

    #[tokio::test]
    async fn test_remote_entries_match_keys_and_values() {
        let (db, _conn) = database();
        let store = db.create_store("").unwrap();
        store.set("foo", "bar".into()).await.unwrap();
        store.set("fizz", "buzz".into()).await.unwrap();

        let keys = collect(store.keys().await.unwrap()).await.unwrap();
        let values = collect(store.values().await.unwrap()).await.unwrap();
        let entries = collect(store.entries().await.unwrap()).await.unwrap();

        assert_eq!(entries.len(), 2);
        for (i, (k, v)) in entries.iter().enumerate() {
            assert_eq!(&keys[i], k);
            assert_eq!(&values[i], v);
        }
    }

    #[tokio::test]
    async fn test_remote_cursor_snapshot_skips_deleted_keys() {
        let (db, _conn) = database();
        let store = db.create_store("ns").unwrap();
        store.set("a", "1".into()).await.unwrap();
        store.set("b", "2".into()).await.unwrap();

        let mut entries = store.entries().await.unwrap();
        store.delete("a").await.unwrap();
        store.set("c", "3".into()).await.unwrap();

        assert_eq!(
            entries.advance().await.unwrap(),
            Some(("b".to_owned(), "2".to_owned()))
        );
        assert!(entries.advance().await.unwrap().is_none());
        assert!(entries.advance().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remote_dangling_member_reads_absent() {
        let (db, conn) = database();
        let store = db.create_store("ns").unwrap();
        conn.sadd("ns", "ghost").await.unwrap();

        assert!(store.get("ghost").await.unwrap().is_none());
        assert!(collect(store.keys().await.unwrap()).await.unwrap().is_empty());
        assert!(collect(store.values().await.unwrap()).await.unwrap().is_empty());
        assert!(collect(store.entries().await.unwrap()).await.unwrap().is_empty());

        // Still indexed, so clear removes it.
        store.clear().await.unwrap();
        assert!(conn.smembers("ns").await.unwrap().is_empty());
    }

    #[test]
    fn test_remote_rejects_separator_in_namespace() {
        let (db, _conn) = database();
        let Err(err) = db.create_store("a:b") else {
            panic!("expected create_store to fail");
        };
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[test]
    fn test_locator_resolution() {
        assert!(RemoteDatabase::new("mem://").is_ok());
        assert!(matches!(
            RemoteDatabase::new("ftp://example.com"),
            Err(StorageError::Config(_))
        ));
        assert!(matches!(
            RemoteDatabase::new("not a locator"),
            Err(StorageError::Config(_))
        ));
    }

    #[cfg(not(feature = "redis"))]
    #[test]
    fn test_redis_locator_requires_feature() {
        assert!(matches!(
            RemoteDatabase::new("redis://127.0.0.1/"),
            Err(StorageError::Config(_))
        ));
    }
}
