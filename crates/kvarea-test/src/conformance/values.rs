//! Value fidelity through the default JSON codec.

use std::sync::Arc;

use kvarea_storage::Database;
use kvarea_storage::cursor::collect;
use serde_json::{Value, json};

use super::fresh_area;

async fn assert_round_trip(database: &Arc<dyn Database>, value: Value) {
    let area = fresh_area(database, "").await;
    area.set("foo", &value).await.expect("set failed");
    assert_eq!(area.get("foo").await.expect("get failed"), Some(value));
}

/// `false` is a value, not absence.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn value_false(database: Arc<dyn Database>) {
    assert_round_trip(&database, json!(false)).await;
}

/// `null` is a value, not absence.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn value_null(database: Arc<dyn Database>) {
    assert_round_trip(&database, Value::Null).await;
}

/// The undefined value reads back as absent.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn value_undefined(database: Arc<dyn Database>) {
    let area = fresh_area(&database, "").await;
    area.set("foo", &json!("bar")).await.expect("set failed");

    area.set_optional("foo", None).await.expect("set failed");

    assert_eq!(area.get("foo").await.expect("get failed"), None);
    let keys = collect(area.keys().await.expect("keys failed"))
        .await
        .expect("advance failed");
    assert!(keys.is_empty(), "undefined value was enumerated");
}

/// `0` is a value, not absence.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn value_zero(database: Arc<dyn Database>) {
    assert_round_trip(&database, json!(0)).await;
}

/// The empty string is a value, not absence.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn value_empty_string(database: Arc<dyn Database>) {
    assert_round_trip(&database, json!("")).await;
}

/// Strings containing quotes survive encoding.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn value_quote(database: Arc<dyn Database>) {
    assert_round_trip(&database, json!("\"")).await;
}

/// Objects come back structurally equal.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn value_object(database: Arc<dyn Database>) {
    assert_round_trip(&database, json!({ "fizz": "buzz" })).await;
}

/// Deeply nested structures come back structurally equal.
///
/// # Panics
///
/// Panics if the database under test fails an operation or breaks this
/// expectation.
pub async fn value_nested(database: Arc<dyn Database>) {
    assert_round_trip(
        &database,
        json!({
            "list": [1, -2, 3.5, null, true],
            "inner": { "text": "a \"quoted\"\nline", "empty": {} },
        }),
    )
    .await;
}
