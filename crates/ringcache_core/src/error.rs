//! Error types for ringcache core.

use std::io;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur in cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] ringcache_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The on-disk structure violates the framing invariants.
    #[error("file corrupted at offset {offset}: {message}")]
    FileCorrupted {
        /// Offset at which the inconsistency was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// A message cannot fit even in an empty cache.
    #[error("message of {size} bytes exceeds cache capacity of {capacity} bytes")]
    MessageTooLarge {
        /// Size of the framed message in bytes.
        size: u64,
        /// Bytes available in the data region of an empty cache.
        capacity: u64,
    },

    /// A message does not fit in the space left by a cache that never
    /// overwrites old messages.
    #[error("message of {size} bytes exceeds remaining cache space of {remaining} bytes")]
    MessageLargerThanRemainingCacheSize {
        /// Size of the framed message in bytes.
        size: u64,
        /// Bytes left before the end of the file.
        remaining: u64,
    },

    /// Empty payloads cannot be framed; a zero span marks unused space.
    #[error("cannot append an empty message")]
    EmptyMessage,

    /// The cache file was opened read-only.
    #[error("cache file is not writable: {message}")]
    FileNotWritable {
        /// Why the file cannot be written.
        message: String,
    },

    /// The supplied configuration is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// A message codec failed to encode or decode.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },
}

impl CacheError {
    /// Creates a file corruption error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::FileCorrupted {
            offset,
            message: message.into(),
        }
    }

    /// Creates a file not writable error.
    pub fn not_writable(message: impl Into<String>) -> Self {
        Self::FileNotWritable {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Returns `true` if the error describes structural corruption.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::FileCorrupted { .. })
    }
}
