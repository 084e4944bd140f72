//! Typed messages on top of the byte-oriented cache.
//!
//! The cache itself only stores opaque payloads. A [`MessageCodec`] turns
//! caller types into payloads and back, and [`TypedCache`] applies it on
//! every append and read.

use crate::cache::Cache;
use crate::error::CacheResult;
use ringcache_storage::{FileBackend, StorageBackend};
#[cfg(feature = "json")]
use std::marker::PhantomData;

/// Converts between a message type and its stored payload.
pub trait MessageCodec {
    /// The type stored in the cache.
    type Message;

    /// Encodes a message into a payload.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Codec`](crate::CacheError::Codec) if the message
    /// cannot be encoded.
    fn encode(&self, message: &Self::Message) -> CacheResult<Vec<u8>>;

    /// Decodes a payload read back from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Codec`](crate::CacheError::Codec) if the payload
    /// is not a valid encoding.
    fn decode(&self, payload: &[u8]) -> CacheResult<Self::Message>;
}

/// A [`Cache`] that stores messages through a [`MessageCodec`].
pub struct TypedCache<C: MessageCodec, B: StorageBackend = FileBackend> {
    cache: Cache<B>,
    codec: C,
}

impl<C: MessageCodec, B: StorageBackend> TypedCache<C, B> {
    /// Wraps an open cache.
    pub fn new(cache: Cache<B>, codec: C) -> Self {
        Self { cache, codec }
    }

    /// Encodes and appends a message.
    ///
    /// # Errors
    ///
    /// Returns codec errors and everything [`Cache::append`] returns.
    pub fn append(&mut self, message: &C::Message) -> CacheResult<()> {
        let payload = self.codec.encode(message)?;
        self.cache.append(&payload)
    }

    /// Reads and decodes every message, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the first read or decode error.
    pub fn messages(&mut self) -> CacheResult<Vec<C::Message>> {
        let codec = &self.codec;
        self.cache
            .messages()
            .map(|payload| payload.and_then(|payload| codec.decode(&payload)))
            .collect()
    }

    /// Returns the underlying cache.
    pub fn cache(&mut self) -> &mut Cache<B> {
        &mut self.cache
    }

    /// Unwraps the underlying cache.
    pub fn into_inner(self) -> Cache<B> {
        self.cache
    }
}

/// Stores messages as JSON documents.
#[cfg(feature = "json")]
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

#[cfg(feature = "json")]
impl<T> JsonCodec<T> {
    /// Creates a JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

#[cfg(feature = "json")]
impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "json")]
impl<T> MessageCodec for JsonCodec<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    type Message = T;

    fn encode(&self, message: &T) -> CacheResult<Vec<u8>> {
        serde_json::to_vec(message).map_err(|e| crate::CacheError::codec(e.to_string()))
    }

    fn decode(&self, payload: &[u8]) -> CacheResult<T> {
        serde_json::from_slice(payload).map_err(|e| crate::CacheError::codec(e.to_string()))
    }
}

/// Stores UTF-8 strings as raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl MessageCodec for Utf8Codec {
    type Message = String;

    fn encode(&self, message: &String) -> CacheResult<Vec<u8>> {
        Ok(message.as_bytes().to_vec())
    }

    fn decode(&self, payload: &[u8]) -> CacheResult<String> {
        String::from_utf8(payload.to_vec()).map_err(|e| crate::CacheError::codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::error::CacheError;
    use ringcache_storage::InMemoryBackend;

    fn cache(maximum_bytes: u64) -> Cache<InMemoryBackend> {
        Cache::with_backend(InMemoryBackend::new(), CacheConfig::new(maximum_bytes)).unwrap()
    }

    #[test]
    fn utf8_messages_round_trip() {
        let mut typed = TypedCache::new(cache(512), Utf8Codec);
        typed.append(&"disk full".to_string()).unwrap();
        typed.append(&"retrying".to_string()).unwrap();

        assert_eq!(typed.messages().unwrap(), vec!["disk full", "retrying"]);
    }

    #[test]
    fn invalid_utf8_is_codec_error() {
        let mut inner = cache(512);
        inner.append(&[0xFF, 0xFE]).unwrap();

        let mut typed = TypedCache::new(inner, Utf8Codec);
        assert!(matches!(typed.messages(), Err(CacheError::Codec { .. })));
    }

    #[test]
    fn into_inner_keeps_contents() {
        let mut typed = TypedCache::new(cache(512), Utf8Codec);
        typed.append(&"kept".to_string()).unwrap();

        let mut inner = typed.into_inner();
        assert_eq!(inner.read_all().unwrap(), vec!["kept"]);
    }

    #[cfg(feature = "json")]
    mod json {
        use super::*;
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Event {
            level: String,
            code: u32,
        }

        #[test]
        fn json_messages_round_trip() {
            let mut typed = TypedCache::new(cache(1024), JsonCodec::<Event>::new());
            let event = Event {
                level: "warn".into(),
                code: 7,
            };
            typed.append(&event).unwrap();
            assert_eq!(typed.messages().unwrap(), vec![event]);
        }

        #[test]
        fn malformed_json_is_codec_error() {
            let mut inner = cache(1024);
            inner.append(b"{not json").unwrap();

            let mut typed = TypedCache::new(inner, JsonCodec::<Event>::new());
            assert!(matches!(typed.messages(), Err(CacheError::Codec { .. })));
        }
    }
}
