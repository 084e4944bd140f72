//! Cache configuration.

use crate::error::{CacheError, CacheResult};
use crate::header::HEADER_SIZE;
use crate::span::SPAN_WIDTH;

/// Configuration for opening a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Total size of the cache file in bytes, header included.
    pub maximum_bytes: u64,

    /// Whether a full cache evicts its oldest messages to make room.
    ///
    /// When `false`, an append that does not fit before the end of the file
    /// fails instead.
    pub overwrites_old_messages: bool,

    /// Whether to sync the file after every append (safer but slower).
    /// When disabled the file is only flushed.
    pub sync_on_append: bool,

    /// Whether to create missing parent directories when opening by path.
    pub create_dirs: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            maximum_bytes: 1024 * 1024, // 1 MB
            overwrites_old_messages: true,
            sync_on_append: false,
            create_dirs: false,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration with the given capacity and default options.
    #[must_use]
    pub fn new(maximum_bytes: u64) -> Self {
        Self {
            maximum_bytes,
            ..Self::default()
        }
    }

    /// Sets the total file capacity.
    #[must_use]
    pub const fn maximum_bytes(mut self, value: u64) -> Self {
        self.maximum_bytes = value;
        self
    }

    /// Sets whether old messages are evicted when the cache is full.
    #[must_use]
    pub const fn overwrites_old_messages(mut self, value: bool) -> Self {
        self.overwrites_old_messages = value;
        self
    }

    /// Sets whether to sync after every append.
    #[must_use]
    pub const fn sync_on_append(mut self, value: bool) -> Self {
        self.sync_on_append = value;
        self
    }

    /// Sets whether missing parent directories are created.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Checks that at least one single-byte message can ever fit.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::InvalidConfig`] when `maximum_bytes` leaves no
    /// room for a frame after the header.
    pub fn validate(&self) -> CacheResult<()> {
        let minimum = HEADER_SIZE + SPAN_WIDTH + 1;
        if self.maximum_bytes < minimum {
            return Err(CacheError::invalid_config(format!(
                "maximum_bytes must be at least {minimum}, got {}",
                self.maximum_bytes
            )));
        }
        Ok(())
    }
}
