//! Property tests: typed values survive every bundled backend unchanged.

use std::sync::Arc;

use kvarea_storage::{Database, RemoteDatabase, StorageArea, StorageOptions};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    name: String,
    count: i64,
    enabled: bool,
    tags: Vec<String>,
    note: Option<String>,
}

fn record() -> impl Strategy<Value = Record> {
    (
        any::<String>(),
        any::<i64>(),
        any::<bool>(),
        prop::collection::vec(any::<String>(), 0..4),
        any::<Option<String>>(),
    )
        .prop_map(|(name, count, enabled, tags, note)| Record {
            name,
            count,
            enabled,
            tags,
            note,
        })
}

fn databases() -> Vec<Arc<dyn Database>> {
    vec![
        kvarea_test::memory_database(),
        Arc::new(RemoteDatabase::new("mem://round-trip").unwrap()),
    ]
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn prop_record_round_trips(key in "[a-z0-9_.-]{1,16}", value in record()) {
        for database in databases() {
            let read = block_on(async {
                let area: StorageArea<Record> =
                    StorageArea::open(StorageOptions::new().with_database(database)).unwrap();
                area.set(&key, &value).await.unwrap();
                area.get(&key).await.unwrap()
            });
            prop_assert_eq!(read, Some(value.clone()));
        }
    }

    #[test]
    fn prop_last_write_wins(key in "[a-z]{1,8}", values in prop::collection::vec(record(), 1..5)) {
        for database in databases() {
            let (read, keys) = block_on(async {
                let area: StorageArea<Record> =
                    StorageArea::open(StorageOptions::new().with_database(database)).unwrap();
                for value in &values {
                    area.set(&key, value).await.unwrap();
                }
                let keys = kvarea_storage::cursor::collect(area.keys().await.unwrap())
                    .await
                    .unwrap();
                (area.get(&key).await.unwrap(), keys)
            });
            prop_assert_eq!(read.as_ref(), values.last());
            prop_assert_eq!(keys, vec![key.clone()]);
        }
    }

    #[test]
    fn prop_any_key_is_addressable(key in any::<String>()) {
        for database in databases() {
            let read = block_on(async {
                let area: StorageArea<Record> = StorageArea::open(
                    StorageOptions::new().with_namespace("keys").with_database(database),
                )
                .unwrap();
                let value = Record {
                    name: key.clone(),
                    count: 0,
                    enabled: true,
                    tags: Vec::new(),
                    note: None,
                };
                area.set(&key, &value).await.unwrap();
                area.get(&key).await.unwrap().map(|r| r.name)
            });
            prop_assert_eq!(read, Some(key.clone()));
        }
    }
}
