//! Isolation between namespaces sharing one backend.

use std::sync::Arc;

use kvarea_storage::Database;
use kvarea_storage::cursor::collect;
use serde_json::json;

use super::fresh_area;

/// The same key in two namespaces holds two values.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn set_get_isolated(database: Arc<dyn Database>) {
    let store1 = fresh_area(&database, "keyv1").await;
    let store2 = fresh_area(&database, "keyv2").await;

    store1.set("foo", &json!("keyv1")).await.expect("set failed");
    store2.set("foo", &json!("keyv2")).await.expect("set failed");

    assert_eq!(store1.get("foo").await.expect("get failed"), Some(json!("keyv1")));
    assert_eq!(store2.get("foo").await.expect("get failed"), Some(json!("keyv2")));
}

/// `delete` only deletes from its own namespace.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn delete_isolated(database: Arc<dyn Database>) {
    let store1 = fresh_area(&database, "keyv1").await;
    let store2 = fresh_area(&database, "keyv2").await;

    store1.set("foo", &json!("keyv1")).await.expect("set failed");
    store2.set("foo", &json!("keyv2")).await.expect("set failed");

    store1.delete("foo").await.expect("delete failed");

    assert_eq!(store1.get("foo").await.expect("get failed"), None);
    assert_eq!(store2.get("foo").await.expect("get failed"), Some(json!("keyv2")));
}

/// `clear` only clears its own namespace.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn clear_isolated(database: Arc<dyn Database>) {
    let store1 = fresh_area(&database, "keyv1").await;
    let store2 = fresh_area(&database, "keyv2").await;

    store1.set("foo", &json!("keyv1")).await.expect("set failed");
    store1.set("bar", &json!("keyv1")).await.expect("set failed");
    store2.set("foo", &json!("keyv2")).await.expect("set failed");
    store2.set("bar", &json!("keyv2")).await.expect("set failed");

    store1.clear().await.expect("clear failed");

    assert_eq!(store1.get("foo").await.expect("get failed"), None);
    assert_eq!(store1.get("bar").await.expect("get failed"), None);
    assert_eq!(store2.get("foo").await.expect("get failed"), Some(json!("keyv2")));
    assert_eq!(store2.get("bar").await.expect("get failed"), Some(json!("keyv2")));
}

/// Enumeration only reports the namespace's own keys.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn enumeration_isolated(database: Arc<dyn Database>) {
    let store1 = fresh_area(&database, "keyv1").await;
    let store2 = fresh_area(&database, "keyv2").await;

    store1.set("only-in-1", &json!(1)).await.expect("set failed");
    store2.set("only-in-2", &json!(2)).await.expect("set failed");

    let keys1 = collect(store1.keys().await.expect("keys failed"))
        .await
        .expect("advance failed");
    let entries2 = collect(store2.entries().await.expect("entries failed"))
        .await
        .expect("advance failed");

    assert_eq!(keys1, vec!["only-in-1"]);
    assert_eq!(entries2, vec![("only-in-2".to_owned(), json!(2))]);
}
