//! Value codecs for [`StorageArea`](crate::StorageArea).
//!
//! A [`Codec`] turns a typed value into the raw string a [`Store`](crate::Store)
//! keeps, and back. Decoding an encoded value must give back a structurally
//! equal value.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StorageError, StorageResult};

/// Encoder/decoder pair for values of type `T`.
pub trait Codec<T>: Send + Sync + 'static {
    /// Encode `value` into its stored form.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the value cannot be encoded.
    fn encode(&self, value: &T) -> StorageResult<String>;

    /// Decode a stored value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if `raw` is not a valid encoding.
    fn decode(&self, raw: &str) -> StorageResult<T>;
}

/// JSON codec, the default.
///
/// Round-trips booleans, null, numbers, strings (quotes included) and nested
/// structures through `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec {
    fn encode(&self, value: &T) -> StorageResult<String> {
        serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn decode(&self, raw: &str) -> StorageResult<T> {
        serde_json::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Codec built from a pair of caller-supplied functions.
///
/// ```rust
/// use kvarea_storage::{Codec, FnCodec};
///
/// let upper = FnCodec::new(
///     |v: &String| Ok(v.to_uppercase()),
///     |raw: &str| Ok(raw.to_lowercase()),
/// );
/// assert_eq!(upper.encode(&"abc".to_owned()).unwrap(), "ABC");
/// ```
#[derive(Clone, Copy)]
pub struct FnCodec<E, D> {
    encode: E,
    decode: D,
}

impl<E, D> FnCodec<E, D> {
    /// Combine an encoder and a decoder.
    pub fn new<T>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> StorageResult<String>,
        D: Fn(&str) -> StorageResult<T>,
    {
        Self { encode, decode }
    }
}

impl<E, D> std::fmt::Debug for FnCodec<E, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCodec").finish_non_exhaustive()
    }
}

impl<T, E, D> Codec<T> for FnCodec<E, D>
where
    E: Fn(&T) -> StorageResult<String> + Send + Sync + 'static,
    D: Fn(&str) -> StorageResult<T> + Send + Sync + 'static,
{
    fn encode(&self, value: &T) -> StorageResult<String> {
        (self.encode)(value)
    }

    fn decode(&self, raw: &str) -> StorageResult<T> {
        (self.decode)(raw)
    }
}
