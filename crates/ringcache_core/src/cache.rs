//! Cache facade.

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::header::{FileHeader, HEADER_SIZE};
use crate::reader::CacheReader;
use crate::span::encode_frame;
use crate::writer::{apply_append, plan_append};
use bytes::Bytes;
use ringcache_storage::{FileBackend, StorageBackend};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A bounded, file-backed circular message cache.
///
/// `Cache` owns the storage backend, the current header, and the read
/// cursor. Appends go to the end of the newest message; once the file
/// reaches `maximum_bytes` the writer wraps to the start of the data region
/// and evicts the oldest messages it overwrites.
///
/// # Opening a Cache
///
/// ```rust,no_run
/// use ringcache_core::Cache;
///
/// let mut cache = Cache::open_or_create("events.cache", 64 * 1024)?;
/// cache.append(b"first event")?;
/// cache.append(b"second event")?;
///
/// for message in cache.messages() {
///     println!("{:?}", message?);
/// }
///
/// cache.close()?;
/// # Ok::<(), ringcache_core::CacheError>(())
/// ```
///
/// # Read-only Caches
///
/// If the file already exists and its header records a different
/// `maximum_bytes` or overwrite policy than the configuration, the cache is
/// opened read-only. Reads use the geometry stored in the file and
/// [`append`](Cache::append) fails with [`CacheError::FileNotWritable`].
///
/// # Threading
///
/// Every operation that moves the read cursor takes `&mut self`. The cache is
/// `Send` when its backend is, and carries no locking of its own.
pub struct Cache<B: StorageBackend = FileBackend> {
    backend: B,
    header: FileHeader,
    reader: CacheReader,
    config: CacheConfig,
    writable: bool,
    path: Option<PathBuf>,
}

impl Cache<FileBackend> {
    /// Opens the cache file at `path`, creating it if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `maximum_bytes` is too small to hold a single message (`InvalidConfig`)
    /// - The existing file has a malformed header (`FileCorrupted`)
    /// - I/O errors occur
    pub fn open_or_create(path: impl AsRef<Path>, maximum_bytes: u64) -> CacheResult<Self> {
        Self::open_with_config(path, CacheConfig::new(maximum_bytes))
    }

    /// Opens or creates the cache file at `path` with a full configuration.
    ///
    /// # Errors
    ///
    /// See [`Cache::open_or_create`].
    pub fn open_with_config(path: impl AsRef<Path>, config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        let path = path.as_ref();

        let backend = if config.create_dirs {
            FileBackend::open_with_create_dirs(path)?
        } else {
            FileBackend::open(path)?
        };

        debug!("opening cache file {}", path.display());
        let mut cache = Self::with_backend(backend, config)?;
        cache.path = Some(path.to_path_buf());
        Ok(cache)
    }

    /// Opens an existing cache file, taking the configuration from its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, is empty, or has a
    /// malformed header.
    pub fn open_existing(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        let backend = FileBackend::open_existing(path)?;

        let size = backend.size()?;
        if size == 0 {
            return Err(CacheError::corrupted(0, "file has no header"));
        }
        let header = load_header(&backend, size)?;
        let config = CacheConfig::new(header.maximum_bytes)
            .overwrites_old_messages(header.overwrites_old_messages);

        debug!(
            "opened existing cache file {} (maximum_bytes {})",
            path.display(),
            header.maximum_bytes
        );
        let mut cache = Self::from_parts(backend, header, config, true);
        cache.path = Some(path.to_path_buf());
        Ok(cache)
    }
}

impl<B: StorageBackend> Cache<B> {
    /// Opens a cache on an arbitrary storage backend.
    ///
    /// An empty backend receives a fresh header. A non-empty backend must
    /// start with a valid header.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unusable configuration, `FileCorrupted`
    /// if the existing contents are malformed, and storage errors from the
    /// backend.
    pub fn with_backend(mut backend: B, config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;

        let size = backend.size()?;
        if size == 0 {
            let header = FileHeader::new(&config);
            backend.write_at(0, &header.encode())?;
            if config.sync_on_append {
                backend.sync()?;
            } else {
                backend.flush()?;
            }
            debug!(
                "created cache (maximum_bytes {}, overwrites_old_messages {})",
                config.maximum_bytes, config.overwrites_old_messages
            );
            return Ok(Self::from_parts(backend, header, config, true));
        }

        let header = load_header(&backend, size)?;
        let writable = header.is_compatible_with(&config);
        if writable {
            debug!(
                "opened cache (oldest {}, end {}, physical size {})",
                header.oldest_message_offset, header.end_of_newest_message_offset, size
            );
        } else {
            warn!(
                "cache header (maximum_bytes {}, overwrites_old_messages {}) does not match \
                 configuration (maximum_bytes {}, overwrites_old_messages {}); opening read-only",
                header.maximum_bytes,
                header.overwrites_old_messages,
                config.maximum_bytes,
                config.overwrites_old_messages
            );
        }
        Ok(Self::from_parts(backend, header, config, writable))
    }

    fn from_parts(backend: B, header: FileHeader, config: CacheConfig, writable: bool) -> Self {
        Self {
            reader: CacheReader::new(&header),
            backend,
            header,
            config,
            writable,
            path: None,
        }
    }

    /// Appends a message, evicting the oldest messages if the cache is full.
    ///
    /// The header is rewritten after the message, so a message is either
    /// fully visible to later reads or not at all.
    ///
    /// # Errors
    ///
    /// - `FileNotWritable` if the cache was opened read-only
    /// - `EmptyMessage` for an empty payload
    /// - `MessageTooLarge` if the message cannot fit even in an empty cache
    /// - `MessageLargerThanRemainingCacheSize` if the cache does not
    ///   overwrite old messages and the message does not fit
    /// - `FileCorrupted` if eviction runs into malformed frames
    pub fn append(&mut self, message: &[u8]) -> CacheResult<()> {
        if !self.writable {
            return Err(CacheError::not_writable(format!(
                "file header records maximum_bytes {} and overwrites_old_messages {}",
                self.header.maximum_bytes, self.header.overwrites_old_messages
            )));
        }

        let frame = encode_frame(message)?;
        let plan = plan_append(&self.header, &self.backend, frame.len() as u64)?;

        if plan.wraps() {
            debug!(
                "wrapping to start of data region (truncating at {:?}, discarded older lap: {})",
                plan.truncate_at, plan.discarded_older_lap
            );
        }
        if plan.evicted > 0 {
            debug!("evicted {} message(s) to fit {} bytes", plan.evicted, plan.frame_len);
        }

        apply_append(&mut self.backend, &plan, &frame, self.config.sync_on_append)?;
        self.header = plan.next_header;
        self.reader.sync_with(&self.header);
        Ok(())
    }

    /// Returns an iterator over all messages, oldest first.
    ///
    /// Each call starts a new traversal from the oldest message. The iterator
    /// yields at most one error and then ends.
    pub fn messages(&mut self) -> Messages<'_, B> {
        self.start_traversal(false)
    }

    /// Like [`messages`](Cache::messages), but stops at the first empty read
    /// instead of wrapping to the start of the data region.
    ///
    /// On a wrapped cache this yields only the older lap.
    pub fn forward_scan(&mut self) -> Messages<'_, B> {
        self.start_traversal(true)
    }

    fn start_traversal(&mut self, seek_forward_only: bool) -> Messages<'_, B> {
        self.reader.set_seek_forward_only(seek_forward_only);
        self.reader.seek_to_oldest();
        Messages {
            cache: self,
            done: false,
        }
    }

    /// Reads every message, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered during the traversal.
    pub fn read_all(&mut self) -> CacheResult<Vec<Bytes>> {
        self.messages().collect()
    }

    /// Counts the live messages without reading their payloads.
    ///
    /// # Errors
    ///
    /// Returns `FileCorrupted` if the traversal meets malformed frames.
    pub fn message_count(&mut self) -> CacheResult<usize> {
        self.reader.set_seek_forward_only(false);
        self.reader.seek_to_oldest();

        let mut count = 0;
        while !self.reader.is_at_end() {
            if self.reader.skip_to_next_message(&self.backend)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Returns `true` if the cache holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Returns `false` if the cache was opened read-only.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Returns the current header.
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Returns the configuration the cache was opened with.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the storage backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the file path, if the cache was opened by path.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Bytes occupied by live frames.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the physical size cannot be read.
    pub fn used_bytes(&self) -> CacheResult<u64> {
        let size = self.backend.size()?;
        Ok(self.header.used_bytes(size))
    }

    /// Syncs the file and releases it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the sync fails. The file is released
    /// either way.
    pub fn close(mut self) -> CacheResult<()> {
        self.backend.sync()?;
        Ok(())
    }
}

fn load_header<B>(backend: &B, size: u64) -> CacheResult<FileHeader>
where
    B: StorageBackend + ?Sized,
{
    if size < HEADER_SIZE {
        return Err(CacheError::corrupted(
            size,
            format!("file of {size} bytes is shorter than the {HEADER_SIZE}-byte header"),
        ));
    }
    let raw = backend.read_at(0, HEADER_SIZE as usize)?;
    let header = FileHeader::decode(&raw)?;
    header.validate(size)?;
    Ok(header)
}

impl<B: StorageBackend> std::fmt::Debug for Cache<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("writable", &self.writable)
            .finish_non_exhaustive()
    }
}

impl<B: StorageBackend> Drop for Cache<B> {
    fn drop(&mut self) {
        let _ = self.backend.flush();
    }
}

/// Iterator over the messages of a [`Cache`], oldest first.
///
/// Created by [`Cache::messages`] and [`Cache::forward_scan`].
pub struct Messages<'a, B: StorageBackend> {
    cache: &'a mut Cache<B>,
    done: bool,
}

impl<B: StorageBackend> Iterator for Messages<'_, B> {
    type Item = CacheResult<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cache.reader.next_message(&self.cache.backend) {
            Ok(Some(message)) => Some(Ok(message)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<B: StorageBackend> FusedIterator for Messages<'_, B> {}
