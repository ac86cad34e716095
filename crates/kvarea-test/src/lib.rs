//! kvarea Test - backend conformance suite and shared test utilities.
//!
//! Any new [`Database`](kvarea_storage::Database) implementation is certified
//! by passing the conformance suite. Add this crate as a dev-dependency and
//! expand the suite for a database factory:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kvarea_storage::MemoryDatabase;
//!
//! kvarea_test::storage_conformance_suite!(|| Arc::new(MemoryDatabase::new()));
//! ```
//!
//! Each check becomes its own `#[tokio::test]`, so the calling crate needs
//! `tokio` with the `macros` and `rt` features. To run the whole suite against
//! a single shared database instead, call [`conformance::run_all`].
//!
//! The crate also provides [`FaultyConnection`], a remote connection that
//! fails chosen primitives on demand, for exercising partial-failure paths.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod conformance;
pub mod harness;
pub mod mocks;

pub use harness::*;
pub use mocks::*;

#[doc(hidden)]
pub use kvarea_storage;
