//! In-process emulation of the remote key-value protocol.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use super::RemoteConnection;
use crate::error::BackendError;

/// A record in the shared keyspace.
#[derive(Debug, Clone)]
enum Record {
    Scalar(String),
    Set(BTreeSet<String>),
}

/// In-process [`RemoteConnection`].
///
/// Scalars and sets share a single keyspace, as on a real server, and
/// operating on a record of the other kind fails with a `WRONGTYPE` error.
/// Set members are returned in lexicographic order.
#[derive(Debug, Default)]
pub struct MemoryConnection {
    records: RwLock<HashMap<String, Record>>,
}

impl MemoryConnection {
    /// Create an empty connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across every namespace.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the keyspace lock is poisoned.
    pub fn record_count(&self) -> Result<usize, BackendError> {
        Ok(self.read()?.len())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Record>>, BackendError> {
        self.records
            .read()
            .map_err(|e| BackendError::new(e.to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Record>>, BackendError> {
        self.records
            .write()
            .map_err(|e| BackendError::new(e.to_string()))
    }
}

fn wrong_type(key: &str) -> BackendError {
    BackendError::new(format!(
        "WRONGTYPE Operation against a key holding the wrong kind of value: {key}"
    ))
}

#[async_trait]
impl RemoteConnection for MemoryConnection {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        match self.read()?.get(key) {
            None => Ok(None),
            Some(Record::Scalar(value)) => Ok(Some(value.clone())),
            Some(Record::Set(_)) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.write()?
            .insert(key.to_owned(), Record::Scalar(value.to_owned()));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), BackendError> {
        self.write()?.remove(key);
        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), BackendError> {
        let mut records = self.write()?;
        match records
            .entry(key.to_owned())
            .or_insert_with(|| Record::Set(BTreeSet::new()))
        {
            Record::Set(members) => {
                members.insert(member.to_owned());
                Ok(())
            }
            Record::Scalar(_) => Err(wrong_type(key)),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> Result<(), BackendError> {
        let mut records = self.write()?;
        let now_empty = match records.get_mut(key) {
            None => return Ok(()),
            Some(Record::Set(members)) => {
                members.remove(member);
                members.is_empty()
            }
            Some(Record::Scalar(_)) => return Err(wrong_type(key)),
        };
        // Empty sets do not exist.
        if now_empty {
            records.remove(key);
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, BackendError> {
        match self.read()?.get(key) {
            None => Ok(Vec::new()),
            Some(Record::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(Record::Scalar(_)) => Err(wrong_type(key)),
        }
    }
}
