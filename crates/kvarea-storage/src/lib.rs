//! kvarea storage: typed, namespaced key-value areas over pluggable backends.
//!
//! # Layers
//!
//! - [`Store`]: raw string key-value operations scoped to one namespace,
//!   plus enumeration through pull-based [`Cursor`]s.
//! - [`Database`]: a factory handing out one [`Store`] per namespace from a
//!   single shared backend connection.
//! - [`StorageArea`]: the typed facade. It encodes values through a
//!   [`Codec`] (JSON by default) and decodes them again on the way out.
//!
//! # Backends
//!
//! | Backend | Database | Namespace isolation |
//! |---------|----------|---------------------|
//! | In-memory | [`MemoryDatabase`] | one container per namespace |
//! | Remote (Redis-like) | [`RemoteDatabase`] | prefixed keys + membership index |
//!
//! The remote adapter talks to any [`RemoteConnection`]. Two connections
//! ship with the crate: [`MemoryConnection`], an in-process emulation of the
//! protocol (`mem://`), and `RedisConnection` behind the **`redis`** feature
//! (`redis://`, `rediss://`).
//!
//! # Enumeration
//!
//! Every cursor iterates a snapshot taken when the cursor is created. Writes
//! made afterwards are not observed. The remote adapter reads each value
//! lazily, so a key deleted after the snapshot is skipped rather than
//! reported as an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use kvarea_storage::{StorageArea, StorageOptions, cursor};
//!
//! # async fn example() -> kvarea_storage::StorageResult<()> {
//! let area: StorageArea<serde_json::Value> =
//!     StorageArea::open(StorageOptions::new().with_namespace("sessions"))?;
//!
//! area.set("foo", &serde_json::json!({ "fizz": "buzz" })).await?;
//! let entries = cursor::collect(area.entries().await?).await?;
//! assert_eq!(entries.len(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod area;
pub mod codec;
pub mod config;
pub mod cursor;
pub mod error;
pub mod memory;
pub mod remote;
pub mod store;

pub use area::{StorageArea, StorageOptions};
pub use codec::{Codec, FnCodec, JsonCodec};
pub use config::{BackendConfig, StorageConfig};
pub use cursor::{BoxCursor, Cursor};
pub use error::{BackendError, Operation, StorageError, StorageResult};
pub use memory::{MemoryDatabase, MemoryStore};
pub use remote::{
    MemoryConnection, RemoteConnection, RemoteDatabase, RemoteStore, RemoteTarget,
};
pub use store::{BackingStore, Database, Store};

#[cfg(feature = "redis")]
pub use remote::RedisConnection;
