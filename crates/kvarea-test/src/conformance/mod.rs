//! Backend-agnostic behavioural contract for [`Database`] implementations.
//!
//! The suite is split the way the contract is:
//!
//! - [`api`]: operation semantics and enumeration
//! - [`namespace`]: isolation between namespaces on one backend
//! - [`values`]: value fidelity through the default JSON codec
//!
//! Every check takes the database under test, opens the storage areas it
//! needs, clears them, and panics on the first violated expectation.
//! Enumeration order is backend-defined, so checks compare sorted keys and
//! only require `entries` to agree pointwise with `keys` and `values`.
//!
//! # Panics
//!
//! Every check panics when the database under test violates the contract.

pub mod api;
pub mod namespace;
pub mod values;

use std::sync::Arc;

use kvarea_storage::{Database, StorageArea, StorageOptions};
use serde_json::Value;

/// Open an area on `database` in `namespace` and clear it.
///
/// # Panics
///
/// Panics if the area cannot be opened or cleared.
pub async fn fresh_area(database: &Arc<dyn Database>, namespace: &str) -> StorageArea<Value> {
    let area = StorageArea::open(
        StorageOptions::new()
            .with_namespace(namespace)
            .with_database(Arc::clone(database)),
    )
    .expect("failed to open storage area");
    area.clear().await.expect("failed to clear storage area");
    area
}

/// Run every check in sequence against one shared database.
///
/// # Panics
///
/// Panics on the first check the database under test fails.
pub async fn run_all(database: Arc<dyn Database>) {
    tracing::info!(backend = database.backend(), "running storage conformance suite");

    api::set_then_get(Arc::clone(&database)).await;
    api::set_overwrites(Arc::clone(&database)).await;
    api::get_missing_is_absent(Arc::clone(&database)).await;
    api::delete_removes_key(Arc::clone(&database)).await;
    api::delete_missing_is_noop(Arc::clone(&database)).await;
    api::clear_removes_all(Arc::clone(&database)).await;
    api::keys_enumerate_once(Arc::clone(&database)).await;
    api::values_enumerate_once(Arc::clone(&database)).await;
    api::entries_match_keys_and_values(Arc::clone(&database)).await;
    api::exhausted_cursor_stays_done(Arc::clone(&database)).await;
    api::cursor_ignores_later_keys(Arc::clone(&database)).await;
    api::deleted_key_not_enumerated(Arc::clone(&database)).await;

    namespace::set_get_isolated(Arc::clone(&database)).await;
    namespace::delete_isolated(Arc::clone(&database)).await;
    namespace::clear_isolated(Arc::clone(&database)).await;
    namespace::enumeration_isolated(Arc::clone(&database)).await;

    values::value_false(Arc::clone(&database)).await;
    values::value_null(Arc::clone(&database)).await;
    values::value_undefined(Arc::clone(&database)).await;
    values::value_zero(Arc::clone(&database)).await;
    values::value_empty_string(Arc::clone(&database)).await;
    values::value_quote(Arc::clone(&database)).await;
    values::value_object(Arc::clone(&database)).await;
    values::value_nested(database).await;
}

/// Expand the conformance suite into one `#[tokio::test]` per check.
///
/// `$factory` is called once per test and must return something that
/// coerces to `Arc<dyn Database>`.
#[macro_export]
macro_rules! storage_conformance_suite {
    ($factory:expr) => {
        $crate::storage_conformance_suite!(@tests $factory;
            api::set_then_get,
            api::set_overwrites,
            api::get_missing_is_absent,
            api::delete_removes_key,
            api::delete_missing_is_noop,
            api::clear_removes_all,
            api::keys_enumerate_once,
            api::values_enumerate_once,
            api::entries_match_keys_and_values,
            api::exhausted_cursor_stays_done,
            api::cursor_ignores_later_keys,
            api::deleted_key_not_enumerated,
            namespace::set_get_isolated,
            namespace::delete_isolated,
            namespace::clear_isolated,
            namespace::enumeration_isolated,
            values::value_false,
            values::value_null,
            values::value_undefined,
            values::value_zero,
            values::value_empty_string,
            values::value_quote,
            values::value_object,
            values::value_nested,
        );
    };
    (@tests $factory:expr; $($module:ident :: $check:ident),* $(,)?) => {
        $(
            #[::tokio::test]
            async fn $check() {
                let database: ::std::sync::Arc<dyn $crate::kvarea_storage::Database> =
                    ($factory)();
                $crate::conformance::$module::$check(database).await;
            }
        )*
    };
}
