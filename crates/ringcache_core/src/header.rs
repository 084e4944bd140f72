//! Cache file header.
//!
//! ## Header Layout
//!
//! ```text
//! | magic (4) | version (1) | flags (1) | reserved (2) |
//! | maximum_bytes (8) | oldest_message_offset (8) | end_of_newest_message_offset (8) |
//! ```
//!
//! All integers are big-endian. Bit 0 of `flags` records whether the cache
//! overwrites its oldest messages when full.
//!
//! The header is always rewritten as one contiguous 32-byte block after the
//! frame it describes has been written. That rewrite is the commit point of
//! an append.

use crate::codec::FixedWidth;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::span::SPAN_WIDTH;

/// Magic bytes identifying a cache file.
pub const HEADER_MAGIC: [u8; 4] = *b"RNGC";

/// Current file format version.
pub const FORMAT_VERSION: u8 = 1;

/// Size of the header, and offset of the first byte of the data region.
pub const HEADER_SIZE: u64 = 32;

const FLAG_OVERWRITES_OLD_MESSAGES: u8 = 0b0000_0001;

/// The fixed-size block at the start of every cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Format version the file was written with.
    pub version: u8,
    /// Total capacity of the file in bytes. Immutable once created.
    pub maximum_bytes: u64,
    /// Whether the writer evicts old messages when the cache is full.
    pub overwrites_old_messages: bool,
    /// Offset of the first byte of the oldest live message.
    pub oldest_message_offset: u64,
    /// Offset immediately after the last byte of the newest live message.
    pub end_of_newest_message_offset: u64,
}

impl FileHeader {
    /// Creates the header of an empty cache.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            version: FORMAT_VERSION,
            maximum_bytes: config.maximum_bytes,
            overwrites_old_messages: config.overwrites_old_messages,
            oldest_message_offset: HEADER_SIZE,
            end_of_newest_message_offset: HEADER_SIZE,
        }
    }

    /// Serializes the header.
    #[must_use]
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[0..4].copy_from_slice(&HEADER_MAGIC);
        self.version.encode_into(&mut buf[4..5]);
        let flags = if self.overwrites_old_messages {
            FLAG_OVERWRITES_OLD_MESSAGES
        } else {
            0
        };
        flags.encode_into(&mut buf[5..6]);
        self.maximum_bytes.encode_into(&mut buf[8..16]);
        self.oldest_message_offset.encode_into(&mut buf[16..24]);
        self.end_of_newest_message_offset
            .encode_into(&mut buf[24..32]);
        buf
    }

    /// Parses and bounds-checks a header.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::FileCorrupted`] if the buffer is short, the
    /// magic or version is wrong, or an offset lies outside the data region.
    pub fn decode(buf: &[u8]) -> CacheResult<Self> {
        if (buf.len() as u64) < HEADER_SIZE {
            return Err(CacheError::corrupted(
                0,
                format!("header truncated to {} bytes", buf.len()),
            ));
        }
        if buf[0..4] != HEADER_MAGIC {
            return Err(CacheError::corrupted(0, "invalid header magic"));
        }

        let version = u8::decode(&buf[4..5]);
        if version != FORMAT_VERSION {
            return Err(CacheError::corrupted(
                4,
                format!("unsupported format version {version}"),
            ));
        }

        let flags = u8::decode(&buf[5..6]);
        let header = Self {
            version,
            maximum_bytes: u64::decode(&buf[8..16]),
            overwrites_old_messages: flags & FLAG_OVERWRITES_OLD_MESSAGES != 0,
            oldest_message_offset: u64::decode(&buf[16..24]),
            end_of_newest_message_offset: u64::decode(&buf[24..32]),
        };
        header.check_bounds()?;
        Ok(header)
    }

    fn check_bounds(&self) -> CacheResult<()> {
        if self.maximum_bytes <= HEADER_SIZE + SPAN_WIDTH {
            return Err(CacheError::corrupted(
                8,
                format!("maximum_bytes {} leaves no data region", self.maximum_bytes),
            ));
        }
        let in_range = |offset: u64| (HEADER_SIZE..=self.maximum_bytes).contains(&offset);
        if !in_range(self.oldest_message_offset) {
            return Err(CacheError::corrupted(
                16,
                format!(
                    "oldest message offset {} outside data region",
                    self.oldest_message_offset
                ),
            ));
        }
        if !in_range(self.end_of_newest_message_offset) {
            return Err(CacheError::corrupted(
                24,
                format!(
                    "end of newest message offset {} outside data region",
                    self.end_of_newest_message_offset
                ),
            ));
        }
        Ok(())
    }

    /// Checks the header against the physical size of the file it came from.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::FileCorrupted`] if the newest message would end
    /// past the physical end of the file. Frames are written before the
    /// header that points at them, so this cannot happen without damage.
    pub fn validate(&self, physical_size: u64) -> CacheResult<()> {
        self.check_bounds()?;
        if self.end_of_newest_message_offset > physical_size {
            return Err(CacheError::corrupted(
                self.end_of_newest_message_offset,
                format!(
                    "newest message ends past the physical end of the file ({physical_size} bytes)"
                ),
            ));
        }
        Ok(())
    }

    /// Returns `true` if no live message is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.oldest_message_offset == self.end_of_newest_message_offset
    }

    /// Returns `true` if the live messages wrap past the physical end.
    #[must_use]
    pub fn is_wrapped(&self) -> bool {
        self.oldest_message_offset > self.end_of_newest_message_offset
    }

    /// Size of the data region: the most bytes that can ever be live.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.maximum_bytes - HEADER_SIZE
    }

    /// Bytes occupied by live frames.
    ///
    /// A wrapped cache holds the frames from the oldest message to the
    /// physical end of the file plus the frames from the start of the data
    /// region to the end of the newest message.
    #[must_use]
    pub fn used_bytes(&self, physical_size: u64) -> u64 {
        if self.is_wrapped() {
            physical_size.saturating_sub(self.oldest_message_offset)
                + (self.end_of_newest_message_offset - HEADER_SIZE)
        } else {
            self.end_of_newest_message_offset - self.oldest_message_offset
        }
    }

    /// Returns `true` if a writer configured with `config` may append to a
    /// file carrying this header.
    #[must_use]
    pub fn is_compatible_with(&self, config: &CacheConfig) -> bool {
        self.version == FORMAT_VERSION
            && self.maximum_bytes == config.maximum_bytes
            && self.overwrites_old_messages == config.overwrites_old_messages
    }
}
