//! # ringcache Storage
//!
//! Storage backend trait and implementations for ringcache.
//!
//! Backends are **opaque, positional byte stores**. They do not know
//! anything about cache headers, spans or wraparound; `ringcache_core`
//! owns all format interpretation.
//!
//! ## Design Principles
//!
//! - Reads follow POSIX semantics: a read near the end of the store returns
//!   the bytes that exist, and a read at or past the end returns nothing
//! - Writes are positional and may extend the store
//! - Truncation only ever shrinks the store
//! - Must be `Send + Sync` so a cache can be moved between threads
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral caches
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use ringcache_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.write_at(0, b"hello world").unwrap();
//! assert_eq!(backend.read_at(6, 5).unwrap(), b"world");
//! // Reads past the end come back short instead of failing.
//! assert_eq!(backend.read_at(9, 8).unwrap(), b"ld");
//! assert!(backend.read_at(11, 4).unwrap().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
