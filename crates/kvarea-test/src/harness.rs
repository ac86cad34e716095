//! Test harness helpers.

use std::sync::Arc;

use kvarea_storage::{Database, MemoryConnection, MemoryDatabase, RemoteConnection, RemoteDatabase};
use tracing_subscriber::EnvFilter;

/// Set up test logging with the given filter.
///
/// This initializes the tracing subscriber for tests. Should be called
/// at the beginning of tests that need logging.
///
/// # Example
///
/// ```rust,ignore
/// use kvarea_test::setup_test_logging;
///
/// #[tokio::test]
/// async fn my_test() {
///     setup_test_logging("kvarea_storage=debug");
///     // ... test code
/// }
/// ```
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging with default filter (warn level).
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// A fresh, empty in-memory database.
#[must_use]
pub fn memory_database() -> Arc<dyn Database> {
    Arc::new(MemoryDatabase::new())
}

/// A fresh remote database over an in-process [`MemoryConnection`].
#[must_use]
pub fn loopback_database() -> Arc<dyn Database> {
    remote_database(Arc::new(MemoryConnection::new()))
}

/// A remote database over the given connection.
#[must_use]
pub fn remote_database(conn: Arc<dyn RemoteConnection>) -> Arc<dyn Database> {
    Arc::new(RemoteDatabase::with_connection(conn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_backends() {
        assert_eq!(memory_database().backend(), "memory");
        assert_eq!(loopback_database().backend(), "remote");
    }

    #[test]
    fn test_logging_init_is_idempotent() {
        setup_test_logging_default();
        setup_test_logging("debug");
    }

    #[tokio::test]
    async fn test_fixtures_are_independent() {
        let first = loopback_database();
        let second = loopback_database();

        let store = first.create_store("ns").unwrap();
        store.set("k", "v".to_owned()).await.unwrap();

        let other = second.create_store("ns").unwrap();
        assert_eq!(other.get("k").await.unwrap(), None);
    }
}
