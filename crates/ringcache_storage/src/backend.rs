//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level positional storage backend.
///
/// Storage backends are **opaque byte stores** addressed by absolute offset.
/// They behave like a single file handle that is repositioned before every
/// operation, which is how the cache multiplexes its read cursor and write
/// cursor over one resource.
///
/// # Invariants
///
/// - `read_at` never fails because the store is too short; it returns fewer
///   bytes instead, and an empty buffer at or past the end
/// - `write_at` past the current end extends the store, filling any gap
///   with zeros
/// - `truncate` never grows the store
/// - Backends must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads up to `len` bytes starting at `offset`.
    ///
    /// The returned buffer is shorter than `len` when the store ends first.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs or `offset + len` overflows.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Writes all of `data` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs or `offset + len` overflows.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()>;

    /// Flushes all pending writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// This is a stronger guarantee than `flush` - it ensures that
    /// file metadata (size, timestamps) is also durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Truncates the storage to the given size.
    ///
    /// All bytes at or after `new_size` are discarded. The cache writer uses
    /// this when it wraps, so the abandoned tail of the previous lap reads
    /// back as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The truncation fails
    /// - `new_size` is greater than current size
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}
