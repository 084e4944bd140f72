//! Positional I/O over a single OS file.

use crate::backend::StorageBackend;
use crate::error::{checked_end, StorageResult};
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Storage backed by one file on disk.
///
/// Offsets are absolute positions in the file. The cached size tracks the
/// largest offset written so far, or the length set by the last truncation.
///
/// # Durability
///
/// - `flush()` hands buffered writes to the OS
/// - `sync()` waits for `File::sync_all()`, covering data and metadata
///
/// # Thread Safety
///
/// This backend can be shared across threads. Every operation seeks the
/// single file handle before using it, so the handle is held under the
/// write lock even for reads.
///
/// # Example
///
/// ```no_run
/// use ringcache_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("events.cache")).unwrap();
/// backend.write_at(0, b"persistent data").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: RwLock<File>,
    size: RwLock<u64>,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// An existing file is opened for reading and writing without being
    /// truncated. A missing file is created empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Self::from_file(path, file)
    }

    /// Opens an existing file, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error (kind `NotFound` for a missing file) if the file
    /// cannot be opened.
    pub fn open_existing(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::from_file(path, file)
    }

    /// Like [`FileBackend::open`], but creates missing parent directories first.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    fn from_file(path: &Path, file: File) -> StorageResult<Self> {
        let size = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
            size: RwLock::new(size),
        })
    }

    /// Path the backend was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        checked_end(offset, len)?;
        let size = *self.size.read();
        if len == 0 || offset >= size {
            return Ok(Vec::new());
        }

        let available = (size - offset).min(len as u64);
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = Vec::with_capacity(available as usize);
        (&mut *file).take(available).read_to_end(&mut buffer)?;

        Ok(buffer)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()> {
        let end = checked_end(offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }

        let mut file = self.file.write();
        let mut size = self.size.write();

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        *size = (*size).max(end);

        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        let mut file = self.file.write();
        file.flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        let file = self.file.write();
        file.sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let file = self.file.write();
        let mut size = self.size.write();

        if new_size > *size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, *size
                ),
            )
            .into());
        }

        file.set_len(new_size)?;
        *size = new_size;

        Ok(())
    }
}
