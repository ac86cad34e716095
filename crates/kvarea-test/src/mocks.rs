//! Mock implementations for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use kvarea_storage::{BackendError, MemoryConnection, RemoteConnection};

/// A remote connection primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Scalar read.
    Get,
    /// Scalar write.
    Set,
    /// Record removal.
    Del,
    /// Set member insertion.
    Sadd,
    /// Set member removal.
    Srem,
    /// Set member listing.
    Smembers,
}

/// One primitive issued through a [`FaultyConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Which primitive was issued.
    pub primitive: Primitive,
    /// The record it addressed.
    pub key: String,
    /// Whether it was failed on purpose.
    pub failed: bool,
}

/// A [`RemoteConnection`] wrapper that fails chosen primitives on demand.
///
/// Every call is recorded, including failed ones. A primitive armed with
/// [`fail_next`](Self::fail_next) fails exactly once without reaching the
/// inner connection; [`fail_always`](Self::fail_always) keeps failing until
/// [`heal`](Self::heal) is called.
///
/// Uses `std::sync::Mutex` internally so arming works outside a runtime.
#[derive(Clone)]
pub struct FaultyConnection {
    inner: Arc<dyn RemoteConnection>,
    armed: Arc<Mutex<Vec<Primitive>>>,
    broken: Arc<Mutex<HashSet<Primitive>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FaultyConnection {
    /// Wrap a fresh [`MemoryConnection`].
    #[must_use]
    pub fn new() -> Self {
        Self::wrap(Arc::new(MemoryConnection::new()))
    }

    /// Wrap an existing connection.
    #[must_use]
    pub fn wrap(inner: Arc<dyn RemoteConnection>) -> Self {
        Self {
            inner,
            armed: Arc::new(Mutex::new(Vec::new())),
            broken: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The wrapped connection, for inspecting state behind the faults.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn RemoteConnection> {
        &self.inner
    }

    /// Fail the next call of `primitive`.
    ///
    /// Arming the same primitive twice fails its next two calls.
    pub fn fail_next(&self, primitive: Primitive) {
        if let Ok(mut guard) = self.armed.lock() {
            guard.push(primitive);
        }
    }

    /// Fail every call of `primitive` until healed.
    pub fn fail_always(&self, primitive: Primitive) {
        if let Ok(mut guard) = self.broken.lock() {
            guard.insert(primitive);
        }
    }

    /// Disarm every pending and persistent failure.
    pub fn heal(&self) {
        if let Ok(mut guard) = self.armed.lock() {
            guard.clear();
        }
        if let Ok(mut guard) = self.broken.lock() {
            guard.clear();
        }
    }

    /// Every call issued so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// The primitives issued so far, in order.
    #[must_use]
    pub fn primitives(&self) -> Vec<Primitive> {
        self.calls().into_iter().map(|c| c.primitive).collect()
    }

    /// Forget the recorded calls.
    pub fn clear_calls(&self) {
        if let Ok(mut guard) = self.calls.lock() {
            guard.clear();
        }
    }

    /// Record the call and decide whether it fails.
    fn intercept(&self, primitive: Primitive, key: &str) -> Result<(), BackendError> {
        let persistent = self
            .broken
            .lock()
            .map(|g| g.contains(&primitive))
            .unwrap_or(false);
        let one_shot = self.armed.lock().is_ok_and(|mut g| {
            match g.iter().position(|p| *p == primitive) {
                Some(index) => {
                    g.remove(index);
                    true
                }
                None => false,
            }
        });
        let failed = persistent || one_shot;

        if let Ok(mut guard) = self.calls.lock() {
            guard.push(Call {
                primitive,
                key: key.to_owned(),
                failed,
            });
        }

        if failed {
            Err(BackendError::new(format!(
                "injected {primitive:?} failure on {key:?}"
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for FaultyConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FaultyConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyConnection")
            .field("calls", &self.calls().len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteConnection for FaultyConnection {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        self.intercept(Primitive::Get, key)?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.intercept(Primitive::Set, key)?;
        self.inner.set(key, value).await
    }

    async fn del(&self, key: &str) -> Result<(), BackendError> {
        self.intercept(Primitive::Del, key)?;
        self.inner.del(key).await
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), BackendError> {
        self.intercept(Primitive::Sadd, key)?;
        self.inner.sadd(key, member).await
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), BackendError> {
        self.intercept(Primitive::Srem, key)?;
        self.inner.srem(key, member).await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, BackendError> {
        self.intercept(Primitive::Smembers, key)?;
        self.inner.smembers(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_records_calls() {
        let conn = FaultyConnection::new();
        conn.set("a", "1").await.unwrap();
        assert_eq!(conn.get("a").await.unwrap(), Some("1".to_owned()));

        assert_eq!(conn.primitives(), vec![Primitive::Set, Primitive::Get]);
        assert!(conn.calls().iter().all(|c| !c.failed && c.key == "a"));
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let conn = FaultyConnection::new();
        conn.fail_next(Primitive::Set);

        let err = conn.set("a", "1").await.unwrap_err();
        assert!(err.message().contains("Set"));
        assert_eq!(conn.inner().get("a").await.unwrap(), None);

        conn.set("a", "1").await.unwrap();
        assert_eq!(conn.inner().get("a").await.unwrap(), Some("1".to_owned()));
    }

    #[tokio::test]
    async fn test_fail_always_until_healed() {
        let conn = FaultyConnection::new();
        conn.fail_always(Primitive::Smembers);

        assert!(conn.smembers("s").await.is_err());
        assert!(conn.smembers("s").await.is_err());

        conn.heal();
        assert!(conn.smembers("s").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_calls() {
        let conn = FaultyConnection::new();
        conn.del("a").await.unwrap();
        conn.clear_calls();
        assert!(conn.calls().is_empty());
    }
}
