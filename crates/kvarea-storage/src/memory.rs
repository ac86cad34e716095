//! In-memory backend.
//!
//! [`MemoryDatabase`] keeps one container per namespace. Every
//! [`MemoryStore`] created for a namespace shares that container, so two
//! storage areas opened on the same database and namespace see each other's
//! writes while other namespaces stay isolated without any key prefixing.
//!
//! Entries enumerate in insertion order. Overwriting a key keeps its
//! original position.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::cursor::{BoxCursor, SnapshotCursor};
use crate::error::{StorageError, StorageResult};
use crate::store::{Database, Store, validate_namespace};

/// A namespace's entries, ordered by first insertion.
#[derive(Debug, Default)]
struct Container {
    entries: HashMap<String, (u64, String)>,
    next_seq: u64,
}

impl Container {
    fn insert(&mut self, key: &str, value: String) {
        if let Some(slot) = self.entries.get_mut(key) {
            slot.1 = value;
            return;
        }
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.insert(key.to_owned(), (seq, value));
    }

    fn snapshot(&self) -> Vec<(String, String)> {
        let mut ordered: Vec<(&u64, &String, &String)> = self
            .entries
            .iter()
            .map(|(k, (seq, v))| (seq, k, v))
            .collect();
        ordered.sort_unstable_by_key(|(seq, _, _)| **seq);
        ordered
            .into_iter()
            .map(|(_, k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

type SharedContainer = Arc<RwLock<Container>>;

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// In-memory database for tests and ephemeral data.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    namespaces: RwLock<HashMap<String, SharedContainer>>,
}

impl MemoryDatabase {
    /// Create a new empty in-memory database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn container(&self, namespace: &str) -> StorageResult<SharedContainer> {
        if let Some(existing) = self
            .namespaces
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .get(namespace)
        {
            return Ok(Arc::clone(existing));
        }
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(Arc::clone(namespaces.entry(namespace.to_owned()).or_default()))
    }
}

impl Database for MemoryDatabase {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn create_store(&self, namespace: &str) -> StorageResult<Arc<dyn Store>> {
        validate_namespace(namespace, &[])?;
        let container = self.container(namespace)?;
        Ok(Arc::new(MemoryStore {
            namespace: namespace.to_owned(),
            container,
        }))
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// A namespace's view into a [`MemoryDatabase`].
pub struct MemoryStore {
    namespace: String,
    container: SharedContainer,
}

impl MemoryStore {
    fn snapshot(&self) -> StorageResult<Vec<(String, String)>> {
        let container = self
            .container
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(container.snapshot())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let container = self
            .container
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(container.entries.get(key).map(|(_, v)| v.clone()))
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        let mut container = self
            .container
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        container.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut container = self
            .container
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        container.entries.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        let mut container = self
            .container
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        container.entries.clear();
        Ok(())
    }

    async fn keys(&self) -> StorageResult<BoxCursor<String>> {
        let keys = self.snapshot()?.into_iter().map(|(k, _)| k).collect();
        Ok(Box::new(SnapshotCursor::new(keys)))
    }

    async fn values(&self) -> StorageResult<BoxCursor<String>> {
        let values = self.snapshot()?.into_iter().map(|(_, v)| v).collect();
        Ok(Box::new(SnapshotCursor::new(values)))
    }

    async fn entries(&self) -> StorageResult<BoxCursor<(String, String)>> {
        Ok(Box::new(SnapshotCursor::new(self.snapshot()?)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{Cursor, collect};

    fn store(db: &MemoryDatabase, namespace: &str) -> Arc<dyn Store> {
        db.create_store(namespace).unwrap()
    }

    #[tokio::test]
    async fn test_memory_get_set() {
        let db = MemoryDatabase::new();
        let s = store(&db, "ns1");
        s.set("key1", "hello".into()).await.unwrap();
        assert_eq!(s.get("key1").await.unwrap().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_memory_get_missing() {
        let db = MemoryDatabase::new();
        assert!(store(&db, "ns1").get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_overwrite_keeps_position() {
        let db = MemoryDatabase::new();
        let s = store(&db, "ns1");
        s.set("a", "1".into()).await.unwrap();
        s.set("b", "2".into()).await.unwrap();
        s.set("a", "3".into()).await.unwrap();
        let entries = collect(s.entries().await.unwrap()).await.unwrap();
        assert_eq!(
            entries,
            vec![
                ("a".to_owned(), "3".to_owned()),
                ("b".to_owned(), "2".to_owned())
            ]
        );
    }

    #[tokio::test]
    async fn test_memory_delete_missing_is_noop() {
        let db = MemoryDatabase::new();
        let s = store(&db, "ns1");
        s.delete("never-set").await.unwrap();
        s.set("k", "v".into()).await.unwrap();
        s.delete("k").await.unwrap();
        assert!(s.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_stores_share_namespace() {
        let db = MemoryDatabase::new();
        let first = store(&db, "ns1");
        let second = store(&db, "ns1");
        first.set("k", "v".into()).await.unwrap();
        assert_eq!(second.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_memory_namespace_isolation() {
        let db = MemoryDatabase::new();
        let a = store(&db, "ns1");
        let b = store(&db, "ns2");
        a.set("k", "v1".into()).await.unwrap();
        b.set("k", "v2".into()).await.unwrap();
        a.clear().await.unwrap();
        assert!(a.get("k").await.unwrap().is_none());
        assert_eq!(b.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_memory_enumeration_in_insertion_order() {
        let db = MemoryDatabase::new();
        let s = store(&db, "");
        s.set("foo", "bar".into()).await.unwrap();
        s.set("fizz", "buzz".into()).await.unwrap();

        assert_eq!(
            collect(s.keys().await.unwrap()).await.unwrap(),
            vec!["foo", "fizz"]
        );
        assert_eq!(
            collect(s.values().await.unwrap()).await.unwrap(),
            vec!["bar", "buzz"]
        );
    }

    #[tokio::test]
    async fn test_memory_cursor_is_snapshot() {
        let db = MemoryDatabase::new();
        let s = store(&db, "ns");
        s.set("a", "1".into()).await.unwrap();
        let mut keys = s.keys().await.unwrap();
        s.set("b", "2".into()).await.unwrap();
        s.delete("a").await.unwrap();
        assert_eq!(keys.advance().await.unwrap().as_deref(), Some("a"));
        assert!(keys.advance().await.unwrap().is_none());
    }

    #[test]
    fn test_memory_rejects_null_byte_namespace() {
        let db = MemoryDatabase::new();
        assert!(db.create_store("bad\0ns").is_err());
    }
}
