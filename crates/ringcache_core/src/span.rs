//! Message spans and frame encoding.
//!
//! ## Frame Format
//!
//! ```text
//! | span (4, big-endian) | payload (span bytes) |
//! ```
//!
//! A span of zero never describes a message. Reading zero bytes, or four
//! zero bytes, where a span is expected means the rest of the data region
//! from that point is unused.

use crate::codec::FixedWidth;
use crate::error::{CacheError, CacheResult};

/// The length prefix stored in front of every payload.
pub type MessageSpan = u32;

/// Width of the span prefix in bytes.
pub const SPAN_WIDTH: u64 = MessageSpan::STORAGE_LENGTH as u64;

/// Largest payload a single frame can describe.
pub const MAX_PAYLOAD_LEN: usize = MessageSpan::MAX as usize;

/// What was found where a span was expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextSpan {
    /// A frame whose payload is this many bytes long.
    Span(MessageSpan),
    /// Unused space: nothing was read, or the span bytes were all zero.
    EmptyRead,
    /// Fewer than [`SPAN_WIDTH`] (but more than zero) bytes were available.
    Truncated(usize),
}

impl NextSpan {
    /// Classifies the raw bytes returned by a span-width read.
    #[must_use]
    pub fn classify(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::EmptyRead;
        }
        if (raw.len() as u64) < SPAN_WIDTH {
            return Self::Truncated(raw.len());
        }
        match MessageSpan::decode(raw) {
            0 => Self::EmptyRead,
            len => Self::Span(len),
        }
    }
}

/// Returns the on-disk length of a frame carrying `payload_len` bytes.
#[must_use]
pub const fn frame_len(payload_len: u64) -> u64 {
    SPAN_WIDTH + payload_len
}

/// Prefixes `payload` with its span.
///
/// # Errors
///
/// - [`CacheError::EmptyMessage`] for an empty payload
/// - [`CacheError::MessageTooLarge`] if the length does not fit in a span
pub fn encode_frame(payload: &[u8]) -> CacheResult<Vec<u8>> {
    if payload.is_empty() {
        return Err(CacheError::EmptyMessage);
    }
    let span = MessageSpan::try_from(payload.len()).map_err(|_| CacheError::MessageTooLarge {
        size: frame_len(payload.len() as u64),
        capacity: frame_len(MAX_PAYLOAD_LEN as u64),
    })?;

    let mut frame = Vec::with_capacity(SPAN_WIDTH as usize + payload.len());
    frame.extend_from_slice(&span.encode());
    frame.extend_from_slice(payload);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_has_big_endian_prefix() {
        let frame = encode_frame(b"abc").unwrap();
        assert_eq!(frame, vec![0, 0, 0, 3, b'a', b'b', b'c']);
        assert_eq!(frame.len() as u64, frame_len(3));
    }

    #[test]
    fn empty_payload_is_rejected() {
        assert!(matches!(encode_frame(b""), Err(CacheError::EmptyMessage)));
    }

    #[test]
    fn classify_empty_and_zero_spans() {
        assert_eq!(NextSpan::classify(&[]), NextSpan::EmptyRead);
        assert_eq!(NextSpan::classify(&[0, 0, 0, 0]), NextSpan::EmptyRead);
    }

    #[test]
    fn classify_short_read() {
        assert_eq!(NextSpan::classify(&[0, 0]), NextSpan::Truncated(2));
        assert_eq!(NextSpan::classify(&[9]), NextSpan::Truncated(1));
    }

    #[test]
    fn classify_real_span() {
        assert_eq!(NextSpan::classify(&[0, 0, 1, 2]), NextSpan::Span(258));
    }
}
