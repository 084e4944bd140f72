//! Append planning and application.
//!
//! An append happens in two steps. [`plan_append`] reads the storage to work
//! out where the frame goes, which old frames must be evicted to make room,
//! and what the header will look like afterwards. It never writes.
//! [`apply_append`] then performs the writes in commit order:
//!
//! 1. If old frames are dropped, commit a header that already excludes them
//! 2. Truncate the file at the wrap point, if the append wraps
//! 3. Write the frame
//! 4. Rewrite the header at offset 0
//!
//! Every header write is followed by a flush, or a sync when requested. The
//! header on disk never points at bytes that a later step overwrites, so a
//! crash at any step leaves a readable ring.

use crate::error::{CacheError, CacheResult};
use crate::header::{FileHeader, HEADER_SIZE};
use crate::reader::CacheReader;
use crate::span::SPAN_WIDTH;
use ringcache_storage::StorageBackend;

/// The outcome of planning a single append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendPlan {
    /// Offset at which the frame will be written.
    pub write_offset: u64,
    /// Length of the frame in bytes.
    pub frame_len: u64,
    /// If the append wraps, the physical size to truncate the file to.
    pub truncate_at: Option<u64>,
    /// Number of old frames evicted to make room.
    pub evicted: usize,
    /// Whether the older lap past the old end was discarded as a whole.
    pub discarded_older_lap: bool,
    /// Header committed before any old frame is overwritten or truncated.
    ///
    /// It keeps the previous end and starts at the oldest surviving frame,
    /// or is empty when nothing survives. `None` when the append drops
    /// nothing.
    pub eviction_header: Option<FileHeader>,
    /// The header to commit once the frame is on disk.
    pub next_header: FileHeader,
}

impl AppendPlan {
    /// Returns `true` if the frame goes back to the start of the data region.
    #[must_use]
    pub fn wraps(&self) -> bool {
        self.truncate_at.is_some()
    }
}

/// Works out how to append a frame of `frame_len` bytes.
///
/// # Errors
///
/// - [`CacheError::MessageTooLarge`] if the frame exceeds the data region
/// - [`CacheError::MessageLargerThanRemainingCacheSize`] if the frame does
///   not fit before the end of the file and the cache does not overwrite
/// - [`CacheError::FileCorrupted`] if eviction meets inconsistent framing
pub fn plan_append<B>(header: &FileHeader, backend: &B, frame_len: u64) -> CacheResult<AppendPlan>
where
    B: StorageBackend + ?Sized,
{
    let capacity = header.capacity();
    if frame_len > capacity {
        return Err(CacheError::MessageTooLarge {
            size: frame_len,
            capacity,
        });
    }

    let old_end = header.end_of_newest_message_offset;
    let mut write = old_end;
    let mut oldest = header.oldest_message_offset;
    let mut empty = header.is_empty();
    let mut truncate_at = None;
    let mut discarded_older_lap = false;

    if write + frame_len > header.maximum_bytes {
        if !header.overwrites_old_messages {
            return Err(CacheError::MessageLargerThanRemainingCacheSize {
                size: frame_len,
                remaining: header.maximum_bytes - write,
            });
        }
        truncate_at = Some(old_end);
        write = HEADER_SIZE;
        if header.is_wrapped() {
            // Everything from `oldest` to the physical end predates the
            // frames in [HEADER_SIZE, old_end), and truncation drops it.
            discarded_older_lap = true;
            oldest = HEADER_SIZE;
        } else if empty {
            oldest = HEADER_SIZE;
        }
    }

    let mut cursor = CacheReader::new(header);
    cursor.seek_to(oldest);
    let mut evicted = 0;
    let max_steps = capacity / SPAN_WIDTH + 2;
    let mut steps = 0;
    // Inclusive upper bound: a new frame ending exactly at `oldest` would
    // leave oldest == end, which reads as empty.
    while !empty && write <= oldest && oldest <= write + frame_len {
        steps += 1;
        if steps > max_steps {
            return Err(CacheError::corrupted(
                oldest,
                "eviction did not terminate; framing is inconsistent",
            ));
        }
        if cursor.skip_to_next_message(backend)? {
            evicted += 1;
        }
        oldest = cursor.offset();
        if oldest == old_end {
            empty = true;
        }
    }

    let eviction_header = (evicted > 0 || discarded_older_lap).then(|| FileHeader {
        oldest_message_offset: if empty { old_end } else { oldest },
        ..*header
    });

    if empty {
        oldest = write;
    }

    Ok(AppendPlan {
        write_offset: write,
        frame_len,
        truncate_at,
        evicted,
        discarded_older_lap,
        eviction_header,
        next_header: FileHeader {
            oldest_message_offset: oldest,
            end_of_newest_message_offset: write + frame_len,
            ..*header
        },
    })
}

/// Writes a planned frame and commits the new header.
///
/// `frame` must be the encoded frame the plan was made for.
///
/// # Errors
///
/// Returns a storage error if any write, truncation, or flush fails. The
/// header on disk describes a readable ring after each step, so a failure
/// part way leaves either the previous messages or the previous messages
/// minus the evicted ones.
pub fn apply_append<B>(
    backend: &mut B,
    plan: &AppendPlan,
    frame: &[u8],
    sync: bool,
) -> CacheResult<()>
where
    B: StorageBackend + ?Sized,
{
    debug_assert_eq!(frame.len() as u64, plan.frame_len);

    if let Some(header) = &plan.eviction_header {
        commit_header(backend, header, sync)?;
    }
    if let Some(size) = plan.truncate_at {
        backend.truncate(size)?;
    }
    backend.write_at(plan.write_offset, frame)?;
    commit_header(backend, &plan.next_header, sync)
}

fn commit_header<B>(backend: &mut B, header: &FileHeader, sync: bool) -> CacheResult<()>
where
    B: StorageBackend + ?Sized,
{
    backend.write_at(0, &header.encode())?;
    if sync {
        backend.sync()?;
    } else {
        backend.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::span::encode_frame;
    use ringcache_storage::InMemoryBackend;

    fn fresh(maximum_bytes: u64) -> (FileHeader, InMemoryBackend) {
        let header = FileHeader::new(&CacheConfig::new(maximum_bytes));
        let backend = InMemoryBackend::with_data(header.encode().to_vec());
        (header, backend)
    }

    fn append(header: &mut FileHeader, backend: &mut InMemoryBackend, payload: &[u8]) -> AppendPlan {
        let frame = encode_frame(payload).unwrap();
        let plan = plan_append(header, backend, frame.len() as u64).unwrap();
        apply_append(backend, &plan, &frame, false).unwrap();
        *header = plan.next_header;
        plan
    }

    #[test]
    fn first_append_starts_at_data_region() {
        let (header, backend) = fresh(64);
        let plan = plan_append(&header, &backend, 14).unwrap();

        assert_eq!(plan.write_offset, HEADER_SIZE);
        assert!(!plan.wraps());
        assert_eq!(plan.evicted, 0);
        assert_eq!(plan.next_header.oldest_message_offset, HEADER_SIZE);
        assert_eq!(plan.next_header.end_of_newest_message_offset, HEADER_SIZE + 14);
    }

    #[test]
    fn planning_does_not_write() {
        let (header, backend) = fresh(64);
        let before = backend.data();
        let _ = plan_append(&header, &backend, 14).unwrap();
        assert_eq!(backend.data(), before);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let (header, backend) = fresh(64);
        let err = plan_append(&header, &backend, 33).unwrap_err();
        assert!(matches!(
            err,
            CacheError::MessageTooLarge { size: 33, capacity: 32 }
        ));
    }

    #[test]
    fn wrap_evicts_oldest_frame() {
        let (mut header, mut backend) = fresh(64);
        append(&mut header, &mut backend, b"aaaaaaaaaa");
        append(&mut header, &mut backend, b"bbbbbbbbbb");

        let plan = append(&mut header, &mut backend, b"cccccc");
        assert_eq!(plan.truncate_at, Some(60));
        assert_eq!(plan.write_offset, HEADER_SIZE);
        assert_eq!(plan.evicted, 1);
        assert_eq!(header.oldest_message_offset, 46);
        assert_eq!(header.end_of_newest_message_offset, 42);
        assert_eq!(backend.size().unwrap(), 60);
    }

    #[test]
    fn appending_into_wrapped_ring_evicts_in_order() {
        let (mut header, mut backend) = fresh(64);
        append(&mut header, &mut backend, b"aaaaaaaaaa");
        append(&mut header, &mut backend, b"bbbbbbbbbb");
        append(&mut header, &mut backend, b"cccccc");

        // Only [42, 46) is free, so a 5-byte frame overlaps bb.
        let plan = append(&mut header, &mut backend, b"d");
        assert_eq!(plan.write_offset, 42);
        assert!(!plan.wraps());
        assert_eq!(plan.evicted, 1);
        assert_eq!(header.end_of_newest_message_offset, 47);
        // bb ran to the physical end; reading from there wraps to cc.
        assert_eq!(header.oldest_message_offset, 60);
        assert_eq!(header.used_bytes(backend.size().unwrap()), 15);
    }

    #[test]
    fn frame_ending_exactly_at_oldest_evicts_it() {
        let (mut header, mut backend) = fresh(64);
        append(&mut header, &mut backend, b"aaaaaaaaaa");
        append(&mut header, &mut backend, b"bbbbbbbbbb");
        append(&mut header, &mut backend, b"cccccc");

        // A 4-byte frame at 42 ends exactly where bb starts.
        let plan = plan_append(&header, &backend, 4).unwrap();
        assert_eq!(plan.evicted, 1);
        assert_ne!(
            plan.next_header.oldest_message_offset,
            plan.next_header.end_of_newest_message_offset
        );
    }

    #[test]
    fn wrap_from_wrapped_ring_discards_older_lap() {
        let (mut header, mut backend) = fresh(64);
        append(&mut header, &mut backend, b"aaaaaaaaaa");
        append(&mut header, &mut backend, b"bbbbbbbbbb");
        append(&mut header, &mut backend, b"cccccc");
        assert!(header.is_wrapped());

        // 42 + 24 > 64: wraps again while the older lap is still live.
        let plan = append(&mut header, &mut backend, &[b'e'; 20]);
        assert!(plan.wraps());
        assert!(plan.discarded_older_lap);
        assert_eq!(plan.truncate_at, Some(42));
        assert_eq!(header.end_of_newest_message_offset, HEADER_SIZE + 24);
        // cc at [32, 42) was overwritten too, leaving only the new frame.
        assert_eq!(header.oldest_message_offset, HEADER_SIZE);
        assert_eq!(plan.evicted, 1);
    }

    #[test]
    fn frame_filling_whole_region_empties_ring_first() {
        let (mut header, mut backend) = fresh(64);
        append(&mut header, &mut backend, b"xx");
        let plan = append(&mut header, &mut backend, &[b'z'; 28]);

        assert!(plan.wraps());
        assert_eq!(plan.evicted, 1);
        assert_eq!(header.oldest_message_offset, HEADER_SIZE);
        assert_eq!(header.end_of_newest_message_offset, 64);
    }

    #[test]
    fn no_overwrite_reports_remaining_space() {
        let header = FileHeader {
            overwrites_old_messages: false,
            end_of_newest_message_offset: 60,
            ..FileHeader::new(&CacheConfig::new(64))
        };
        let backend = InMemoryBackend::with_data(vec![0; 60]);
        let err = plan_append(&header, &backend, 10).unwrap_err();
        assert!(matches!(
            err,
            CacheError::MessageLargerThanRemainingCacheSize { size: 10, remaining: 4 }
        ));
    }

    #[test]
    fn eviction_over_garbage_is_corruption() {
        let (mut header, mut backend) = fresh(64);
        append(&mut header, &mut backend, b"aaaaaaaaaa");
        append(&mut header, &mut backend, b"bbbbbbbbbb");
        // Damage the oldest span so that it claims a frame past the end.
        backend.write_at(HEADER_SIZE, &500u32.to_be_bytes()).unwrap();

        let err = plan_append(&header, &backend, 10).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn plain_append_needs_no_eviction_header() {
        let (mut header, mut backend) = fresh(64);
        let plan = append(&mut header, &mut backend, b"aaaaaaaaaa");
        assert_eq!(plan.eviction_header, None);
    }

    #[test]
    fn eviction_header_keeps_old_end_and_skips_evicted_frames() {
        let (mut header, mut backend) = fresh(64);
        append(&mut header, &mut backend, b"aaaaaaaaaa");
        append(&mut header, &mut backend, b"bbbbbbbbbb");
        append(&mut header, &mut backend, b"cccccc");

        let plan = plan_append(&header, &backend, 5).unwrap();
        let eviction = plan.eviction_header.unwrap();
        assert_eq!(eviction.end_of_newest_message_offset, 42);
        assert_eq!(eviction.oldest_message_offset, 60);

        // Committed alone, it still reads cc, which the new frame leaves alone.
        let mut reader = CacheReader::new(&eviction);
        assert_eq!(&reader.next_message(&backend).unwrap().unwrap()[..], b"cccccc");
        assert!(reader.next_message(&backend).unwrap().is_none());
    }

    #[test]
    fn eviction_header_is_empty_when_nothing_survives() {
        let (mut header, mut backend) = fresh(64);
        append(&mut header, &mut backend, b"aaaaaaaaaa");
        append(&mut header, &mut backend, b"bbbbbbbbbb");
        append(&mut header, &mut backend, b"cccccc");

        let plan = plan_append(&header, &backend, 24).unwrap();
        assert!(plan.discarded_older_lap);
        let eviction = plan.eviction_header.unwrap();
        assert!(eviction.is_empty());
        assert_eq!(eviction.end_of_newest_message_offset, 42);
        assert_eq!(plan.next_header.oldest_message_offset, HEADER_SIZE);
    }

    #[test]
    fn header_is_committed_at_offset_zero() {
        let (mut header, mut backend) = fresh(64);
        append(&mut header, &mut backend, b"hello");

        let on_disk = FileHeader::decode(&backend.read_at(0, HEADER_SIZE as usize).unwrap()).unwrap();
        assert_eq!(on_disk, header);
    }
}
