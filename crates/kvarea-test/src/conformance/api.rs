//! Operation semantics and enumeration.

use std::sync::Arc;

use kvarea_storage::cursor::collect;
use kvarea_storage::{Cursor, Database};
use serde_json::{Value, json};

use super::fresh_area;

fn sorted(mut keys: Vec<String>) -> Vec<String> {
    keys.sort();
    keys
}

/// `set` stores a value that `get` returns.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn set_then_get(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");
    assert_eq!(area.get("foo").await.expect("get failed"), Some(json!("bar")));
}

/// A second `set` replaces the first value.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn set_overwrites(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");
    area.set("foo", &json!("baz")).await.expect("set failed");
    assert_eq!(area.get("foo").await.expect("get failed"), Some(json!("baz")));
    let keys = collect(area.keys().await.expect("keys failed"))
        .await
        .expect("advance failed");
    assert_eq!(keys, vec!["foo"], "overwritten key enumerated twice");
}

/// `get` of a never-set key is absent, not an error.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn get_missing_is_absent(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    assert_eq!(area.get("foo").await.expect("get failed"), None);
}

/// `delete` makes a key absent.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn delete_removes_key(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");
    assert_eq!(area.get("foo").await.expect("get failed"), Some(json!("bar")));

    area.delete("foo").await.expect("delete failed");

    assert_eq!(area.get("foo").await.expect("get failed"), None);
}

/// `delete` of a never-set key succeeds.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn delete_missing_is_noop(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.delete("foo").await.expect("delete of a missing key failed");
    assert_eq!(area.get("foo").await.expect("get failed"), None);
}

/// `clear` removes every key of the namespace.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn clear_removes_all(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");
    area.set("fizz", &json!("buzz")).await.expect("set failed");

    area.clear().await.expect("clear failed");

    assert_eq!(area.get("foo").await.expect("get failed"), None);
    assert_eq!(area.get("fizz").await.expect("get failed"), None);
    let keys = collect(area.keys().await.expect("keys failed"))
        .await
        .expect("advance failed");
    assert!(keys.is_empty(), "keys survived clear: {keys:?}");
}

/// `keys` yields every key exactly once, then done.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn keys_enumerate_once(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");
    area.set("fizz", &json!("buzz")).await.expect("set failed");

    let keys = collect(area.keys().await.expect("keys failed"))
        .await
        .expect("advance failed");
    assert_eq!(sorted(keys), vec!["fizz", "foo"]);
}

/// `values` yields every value exactly once, then done.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn values_enumerate_once(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");
    area.set("fizz", &json!("buzz")).await.expect("set failed");

    let mut values: Vec<String> = collect(area.values().await.expect("values failed"))
        .await
        .expect("advance failed")
        .into_iter()
        .map(|v| v.as_str().map(str::to_owned).unwrap_or_default())
        .collect();
    values.sort();
    assert_eq!(values, vec!["bar", "buzz"]);
}

/// `entries` agrees pointwise with `keys` and `values`.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn entries_match_keys_and_values(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");
    area.set("fizz", &json!("buzz")).await.expect("set failed");

    let keys = collect(area.keys().await.expect("keys failed"))
        .await
        .expect("advance failed");
    let values = collect(area.values().await.expect("values failed"))
        .await
        .expect("advance failed");
    let entries = collect(area.entries().await.expect("entries failed"))
        .await
        .expect("advance failed");

    let (entry_keys, entry_values): (Vec<String>, Vec<Value>) = entries.into_iter().unzip();
    assert_eq!(entry_keys, keys);
    assert_eq!(entry_values, values);

    let mut pairs: Vec<(String, Value)> = entry_keys.into_iter().zip(entry_values).collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        pairs,
        vec![
            ("fizz".to_owned(), json!("buzz")),
            ("foo".to_owned(), json!("bar")),
        ]
    );
}

/// Advancing an exhausted cursor keeps reporting done.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn exhausted_cursor_stays_done(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");

    let mut entries = area.entries().await.expect("entries failed");
    assert_eq!(
        entries.advance().await.expect("advance failed"),
        Some(("foo".to_owned(), json!("bar")))
    );
    for _ in 0..3 {
        assert_eq!(entries.advance().await.expect("advance failed"), None);
    }
}

/// Keys written after a cursor is created are not observed by it.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn cursor_ignores_later_keys(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");

    let keys = area.keys().await.expect("keys failed");
    let entries = area.entries().await.expect("entries failed");
    area.set("late", &json!("entry")).await.expect("set failed");

    assert_eq!(collect(keys).await.expect("advance failed"), vec!["foo"]);
    assert_eq!(
        collect(entries).await.expect("advance failed"),
        vec![("foo".to_owned(), json!("bar"))]
    );
}

/// A deleted key is not enumerated by cursors created afterwards.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn deleted_key_not_enumerated(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");
    area.set("fizz", &json!("buzz")).await.expect("set failed");
    area.delete("foo").await.expect("delete failed");

    let keys = collect(area.keys().await.expect("keys failed"))
        .await
        .expect("advance failed");
    assert_eq!(keys, vec!["fizz"]);
    let entries = collect(area.entries().await.expect("entries failed"))
        .await
        .expect("advance failed");
    assert_eq!(entries, vec![("fizz".to_owned(), json!("buzz"))]);
}
