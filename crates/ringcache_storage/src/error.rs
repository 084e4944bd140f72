//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An offset plus length does not fit in the addressable range.
    #[error("offset overflow: offset {offset}, len {len}")]
    OffsetOverflow {
        /// The requested offset.
        offset: u64,
        /// The requested length.
        len: usize,
    },
}

pub(crate) fn checked_end(offset: u64, len: usize) -> StorageResult<u64> {
    offset
        .checked_add(len as u64)
        .ok_or(StorageError::OffsetOverflow { offset, len })
}
