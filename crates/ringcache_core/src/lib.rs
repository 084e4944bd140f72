//! # ringcache Core
//!
//! A bounded, file-backed circular message cache.
//!
//! Messages are variable-length byte payloads appended to a single file and
//! read back in insertion order. Once the file reaches its configured
//! `maximum_bytes`, new messages wrap to the start of the data region and
//! evict the oldest messages they overwrite.
//!
//! ## File Layout
//!
//! ```text
//! | header (32) | frame | frame | ... | frame | unused |
//! ```
//!
//! Each frame is a big-endian `u32` span followed by that many payload bytes.
//! The header records the capacity and the offsets of the oldest message and
//! of the end of the newest message. See [`header`] for the exact layout.
//!
//! ## Durability
//!
//! - A frame is written before the header that makes it visible
//! - The header is rewritten as one contiguous block
//! - Structural damage is reported as [`CacheError::FileCorrupted`] and never
//!   repaired
//!
//! ## Example
//!
//! ```rust
//! use ringcache_core::{Cache, CacheConfig};
//! use ringcache_storage::InMemoryBackend;
//!
//! let mut cache = Cache::with_backend(InMemoryBackend::new(), CacheConfig::new(64))?;
//! cache.append(b"aaaaaaaaaa")?;
//! cache.append(b"bbbbbbbbbb")?;
//! // Does not fit before the end of the file: wraps and evicts "aaaaaaaaaa".
//! cache.append(b"cccccc")?;
//!
//! assert_eq!(cache.read_all()?, vec!["bbbbbbbbbb", "cccccc"]);
//! # Ok::<(), ringcache_core::CacheError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
pub mod codec;
mod config;
mod error;
pub mod header;
pub mod reader;
pub mod span;
pub mod typed;
pub mod writer;

pub use cache::{Cache, Messages};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use header::{FileHeader, FORMAT_VERSION, HEADER_MAGIC, HEADER_SIZE};
pub use reader::CacheReader;
pub use span::{MessageSpan, SPAN_WIDTH};
#[cfg(feature = "json")]
pub use typed::JsonCodec;
pub use typed::{MessageCodec, TypedCache, Utf8Codec};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
