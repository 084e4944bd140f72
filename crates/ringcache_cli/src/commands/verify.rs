//! Verify command implementation.

use super::CommandError;
use ringcache_core::{Cache, CacheError, SPAN_WIDTH};
use std::path::Path;

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of messages read successfully.
    pub messages_checked: usize,
    /// Bytes covered by those messages, spans included.
    pub bytes_checked: u64,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn new() -> Self {
        Self {
            messages_checked: 0,
            bytes_checked: 0,
            errors: Vec::new(),
        }
    }

    /// Returns `true` if no problem was found.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying cache at {:?}", path);
    println!();

    let result = verify(path)?;
    println!(
        "  Messages checked: {}, bytes: {}",
        result.messages_checked, result.bytes_checked
    );
    for error in &result.errors {
        println!("    ERROR: {}", error);
    }

    println!();
    if result.is_ok() {
        println!("✓ Cache verification passed");
        Ok(())
    } else {
        println!("✗ Cache verification failed");
        Err(CommandError::VerificationFailed(result.errors.len()).into())
    }
}

/// Walks every frame of the cache at `path`.
///
/// Structural problems are collected into the result. Only failures to reach
/// the file at all are returned as errors.
pub fn verify(path: &Path) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::new();

    let mut cache = match Cache::open_existing(path) {
        Ok(cache) => cache,
        Err(e @ CacheError::FileCorrupted { .. }) => {
            result.errors.push(format!("Header: {}", e));
            return Ok(result);
        }
        Err(e) => return Err(e.into()),
    };

    for message in cache.messages() {
        match message {
            Ok(payload) => {
                result.messages_checked += 1;
                result.bytes_checked += SPAN_WIDTH + payload.len() as u64;
            }
            Err(e) => result.errors.push(e.to_string()),
        }
    }

    if result.is_ok() {
        let used = cache.used_bytes()?;
        if used != result.bytes_checked {
            result.errors.push(format!(
                "Header accounts for {} live bytes but frames cover {}",
                used, result.bytes_checked
            ));
        }
        let capacity = cache.header().capacity();
        if used > capacity {
            result
                .errors
                .push(format!("Live bytes {} exceed capacity {}", used, capacity));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use tempfile::tempdir;

    #[test]
    fn healthy_cache_passes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ok.cache");
        let mut cache = Cache::open_or_create(&path, 64).unwrap();
        cache.append(b"aaaaaaaaaa").unwrap();
        cache.append(b"bbbbbbbbbb").unwrap();
        cache.append(b"cccccc").unwrap();
        cache.close().unwrap();

        let result = verify(&path).unwrap();
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.messages_checked, 2);
        assert_eq!(result.bytes_checked, 24);
    }

    #[test]
    fn cut_payload_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cut.cache");
        let mut cache = Cache::open_or_create(&path, 64).unwrap();
        cache.append(b"aaaaaaaaaa").unwrap();
        cache.append(b"bbbbbbbbbb").unwrap();
        cache.append(b"cccccc").unwrap();
        cache.close().unwrap();

        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(55)
            .unwrap();

        let result = verify(&path).unwrap();
        assert!(!result.is_ok());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn bad_header_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.cache");
        std::fs::write(&path, b"definitely not a cache file header").unwrap();

        let result = verify(&path).unwrap();
        assert!(!result.is_ok());
        assert!(result.errors[0].starts_with("Header"));
    }
}
