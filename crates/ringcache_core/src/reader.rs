//! Sequential frame reader.
//!
//! The reader walks frames from the oldest live message to the end of the
//! newest one. Frames carry no delimiter besides their span, so the reader
//! relies on two signals:
//!
//! - The header's `end_of_newest_message_offset` marks where a traversal
//!   stops.
//! - An *empty read* (no bytes, or an all-zero span) means the rest of the
//!   file is unused, so the next frame lives at the start of the data region.
//!
//! ## Corruption Policy
//!
//! - Two empty reads in a row: the file has no next frame but the cursor has
//!   not reached the end marker
//! - A span read that returns 1 to 3 bytes
//! - A payload read that returns fewer bytes than the span declares
//! - A frame that would end past `maximum_bytes`
//! - A second wrap within one traversal
//!
//! All of these surface as [`CacheError::FileCorrupted`]; nothing is repaired.

use crate::error::{CacheError, CacheResult};
use crate::header::{FileHeader, HEADER_SIZE};
use crate::span::{frame_len, NextSpan, SPAN_WIDTH};
use bytes::Bytes;
use ringcache_storage::StorageBackend;

/// Cursor state for walking the frames of one cache file.
///
/// The reader does not own the storage. Every operation borrows the backend
/// from the cache that owns both, so the read cursor and the write cursor
/// never compete for the same handle.
#[derive(Debug, Clone)]
pub struct CacheReader {
    cursor: u64,
    oldest: u64,
    end: u64,
    maximum_bytes: u64,
    seek_forward_only: bool,
    wrapped: bool,
}

impl CacheReader {
    /// Creates a reader positioned at the oldest message of `header`.
    #[must_use]
    pub fn new(header: &FileHeader) -> Self {
        Self {
            cursor: header.oldest_message_offset,
            oldest: header.oldest_message_offset,
            end: header.end_of_newest_message_offset,
            maximum_bytes: header.maximum_bytes,
            seek_forward_only: false,
            wrapped: false,
        }
    }

    /// Sets whether an empty read past the start of the data region ends the
    /// traversal instead of wrapping.
    #[must_use]
    pub fn with_seek_forward_only(mut self, value: bool) -> Self {
        self.seek_forward_only = value;
        self
    }

    /// Changes the wraparound policy of an existing reader.
    pub fn set_seek_forward_only(&mut self, value: bool) {
        self.seek_forward_only = value;
    }

    /// Returns `true` if the reader stops at empty reads instead of wrapping.
    #[must_use]
    pub fn seek_forward_only(&self) -> bool {
        self.seek_forward_only
    }

    /// Current cursor offset.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.cursor
    }

    /// Returns `true` if the cursor sits at the end of the newest message.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.cursor == self.end
    }

    /// Adopts the offsets of a freshly written header.
    ///
    /// The cursor is left where it was; call [`seek_to_oldest`] to restart.
    ///
    /// [`seek_to_oldest`]: CacheReader::seek_to_oldest
    pub fn sync_with(&mut self, header: &FileHeader) {
        self.oldest = header.oldest_message_offset;
        self.end = header.end_of_newest_message_offset;
        self.maximum_bytes = header.maximum_bytes;
    }

    /// Moves the cursor to the oldest message and starts a new traversal.
    pub fn seek_to_oldest(&mut self) {
        self.cursor = self.oldest;
        self.wrapped = false;
    }

    /// Reads the message at the cursor and advances past it.
    ///
    /// Returns `Ok(None)` once the cursor reaches the end of the newest
    /// message, or, in forward-only mode, at the first empty read past the
    /// start of the data region.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::FileCorrupted`] when the framing is inconsistent
    /// and a storage error if the backend fails.
    pub fn next_message<B>(&mut self, backend: &B) -> CacheResult<Option<Bytes>>
    where
        B: StorageBackend + ?Sized,
    {
        self.read_next(backend, false)
    }

    fn read_next<B>(&mut self, backend: &B, previous_read_was_empty: bool) -> CacheResult<Option<Bytes>>
    where
        B: StorageBackend + ?Sized,
    {
        let start = self.cursor;
        if start == self.end {
            return Ok(None);
        }

        match self.span_at(backend, start)? {
            NextSpan::Span(len) => {
                let len = u64::from(len);
                self.check_frame_bounds(start, len)?;
                let payload = backend.read_at(start + SPAN_WIDTH, len as usize)?;
                if (payload.len() as u64) != len {
                    return Err(CacheError::corrupted(
                        start,
                        format!(
                            "payload truncated: span declares {len} bytes, read {}",
                            payload.len()
                        ),
                    ));
                }
                self.cursor = start + frame_len(len);
                Ok(Some(Bytes::from(payload)))
            }
            NextSpan::EmptyRead => {
                if previous_read_was_empty {
                    return Err(CacheError::corrupted(
                        start,
                        "two consecutive empty reads before the end of the newest message",
                    ));
                }
                if self.seek_forward_only && start > HEADER_SIZE {
                    return Ok(None);
                }
                self.wrap(start)?;
                self.read_next(backend, true)
            }
            NextSpan::Truncated(read) => Err(CacheError::corrupted(
                start,
                format!("span truncated: read {read} of {SPAN_WIDTH} bytes"),
            )),
        }
    }

    /// Advances the cursor past one frame without reading its payload.
    ///
    /// Returns `true` if a frame was skipped and `false` if an empty read
    /// wrapped the cursor to the start of the data region, the same way
    /// [`next_message`] does.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::FileCorrupted`] for a truncated span, a frame
    /// that overruns the file, an empty read at the start of the data region,
    /// or a second wrap in one traversal.
    ///
    /// [`next_message`]: CacheReader::next_message
    pub fn skip_to_next_message<B>(&mut self, backend: &B) -> CacheResult<bool>
    where
        B: StorageBackend + ?Sized,
    {
        let start = self.cursor;
        match self.span_at(backend, start)? {
            NextSpan::Span(len) => {
                let len = u64::from(len);
                self.check_frame_bounds(start, len)?;
                self.cursor = start + frame_len(len);
                Ok(true)
            }
            NextSpan::EmptyRead => {
                if start == HEADER_SIZE {
                    return Err(CacheError::corrupted(
                        start,
                        "empty read at the start of the data region",
                    ));
                }
                self.wrap(start)?;
                Ok(false)
            }
            NextSpan::Truncated(read) => Err(CacheError::corrupted(
                start,
                format!("span truncated: read {read} of {SPAN_WIDTH} bytes"),
            )),
        }
    }

    /// Starts a new traversal at an arbitrary frame boundary.
    pub(crate) fn seek_to(&mut self, offset: u64) {
        self.cursor = offset;
        self.wrapped = false;
    }

    fn span_at<B>(&self, backend: &B, offset: u64) -> CacheResult<NextSpan>
    where
        B: StorageBackend + ?Sized,
    {
        let raw = backend.read_at(offset, SPAN_WIDTH as usize)?;
        Ok(NextSpan::classify(&raw))
    }

    fn check_frame_bounds(&self, start: u64, payload_len: u64) -> CacheResult<()> {
        if start + frame_len(payload_len) > self.maximum_bytes {
            return Err(CacheError::corrupted(
                start,
                format!(
                    "frame of {payload_len} bytes overruns maximum size {}",
                    self.maximum_bytes
                ),
            ));
        }
        Ok(())
    }

    fn wrap(&mut self, at: u64) -> CacheResult<()> {
        if self.wrapped {
            return Err(CacheError::corrupted(
                at,
                "traversal wrapped twice without reaching the newest message",
            ));
        }
        self.wrapped = true;
        self.cursor = HEADER_SIZE;
        Ok(())
    }
}
