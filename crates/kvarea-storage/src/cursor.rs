//! Pull-based enumeration cursors.
//!
//! A [`Cursor`] is single-use and forward-only. Each call to
//! [`advance`](Cursor::advance) produces the next item, or `None` once the
//! sequence is exhausted; every later call keeps returning `None`.
//!
//! Cursors make no promise about writes that race with them. Both shipped
//! adapters snapshot the namespace when the cursor is created, so keys added
//! afterwards are never observed. The remote adapter reads values lazily, so a
//! key removed after the snapshot is skipped.

use async_trait::async_trait;

use crate::error::StorageResult;

/// A single-pass asynchronous sequence.
#[async_trait]
pub trait Cursor: Send {
    /// The item produced on each step.
    type Item: Send;

    /// Produce the next item, or `None` when the sequence is exhausted.
    async fn advance(&mut self) -> StorageResult<Option<Self::Item>>;
}

/// A boxed cursor, as returned by [`Store`](crate::Store) enumeration.
pub type BoxCursor<T> = Box<dyn Cursor<Item = T>>;

#[async_trait]
impl<C: Cursor + ?Sized> Cursor for Box<C> {
    type Item = C::Item;

    async fn advance(&mut self) -> StorageResult<Option<Self::Item>> {
        (**self).advance().await
    }
}

/// Cursor over items materialized up front.
#[derive(Debug)]
pub struct SnapshotCursor<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> SnapshotCursor<T> {
    /// Create a cursor yielding `items` in order.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

#[async_trait]
impl<T: Send> Cursor for SnapshotCursor<T> {
    type Item = T;

    async fn advance(&mut self) -> StorageResult<Option<T>> {
        Ok(self.items.next())
    }
}

/// Cursor applying a fallible conversion to every item of another cursor.
pub struct MapCursor<C, F> {
    inner: C,
    map: F,
}

impl<C, F> MapCursor<C, F> {
    /// Wrap `inner`, converting each item with `map`.
    pub fn new<U>(inner: C, map: F) -> Self
    where
        C: Cursor,
        F: FnMut(C::Item) -> StorageResult<U> + Send,
    {
        Self { inner, map }
    }
}

impl<C, F> std::fmt::Debug for MapCursor<C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapCursor").finish_non_exhaustive()
    }
}

#[async_trait]
impl<C, F, U> Cursor for MapCursor<C, F>
where
    C: Cursor,
    F: FnMut(C::Item) -> StorageResult<U> + Send,
    U: Send,
{
    type Item = U;

    async fn advance(&mut self) -> StorageResult<Option<U>> {
        match self.inner.advance().await? {
            Some(item) => (self.map)(item).map(Some),
            None => Ok(None),
        }
    }
}

/// Drain a cursor into a `Vec`.
///
/// # Errors
///
/// Returns the first error the cursor produces.
pub async fn collect<C: Cursor>(mut cursor: C) -> StorageResult<Vec<C::Item>> {
    let mut items = Vec::new();
    while let Some(item) = cursor.advance().await? {
        items.push(item);
    }
    Ok(items)
}
