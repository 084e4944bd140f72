//! Inspect command implementation.

use super::CommandError;
use ringcache_core::{Cache, HEADER_SIZE};
use ringcache_storage::StorageBackend;
use serde::Serialize;
use std::path::Path;

/// Cache inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Cache file path.
    pub path: String,
    /// Format version from the header.
    pub version: u8,
    /// Configured capacity, header included.
    pub maximum_bytes: u64,
    /// Whether the cache evicts old messages when full.
    pub overwrites_old_messages: bool,
    /// Offset of the oldest message.
    pub oldest_message_offset: u64,
    /// Offset just past the newest message.
    pub end_of_newest_message_offset: u64,
    /// Whether live messages wrap past the physical end.
    pub wrapped: bool,
    /// Physical file size in bytes.
    pub file_size: u64,
    /// Bytes held by live frames.
    pub used_bytes: u64,
    /// Size of the data region.
    pub capacity: u64,
    /// Number of live messages, if the frames could be walked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
    /// Why counting failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "text" => {
            print_text_output(&result);
        }
        other => return Err(CommandError::UnsupportedFormat(other.to_string()).into()),
    }

    Ok(())
}

/// Collects header fields and usage for the cache at `path`.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let mut cache = Cache::open_existing(path)?;
    let header = *cache.header();

    let (message_count, error) = match cache.message_count() {
        Ok(count) => (Some(count), None),
        Err(e) => (None, Some(e.to_string())),
    };

    Ok(InspectResult {
        path: path.display().to_string(),
        version: header.version,
        maximum_bytes: header.maximum_bytes,
        overwrites_old_messages: header.overwrites_old_messages,
        oldest_message_offset: header.oldest_message_offset,
        end_of_newest_message_offset: header.end_of_newest_message_offset,
        wrapped: header.is_wrapped(),
        file_size: cache.backend().size()?,
        used_bytes: cache.used_bytes()?,
        capacity: header.capacity(),
        message_count,
        error,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("ringcache Inspection");
    println!("====================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Header:");
    println!("  Version:         {}", result.version);
    println!("  Maximum bytes:   {}", format_size(result.maximum_bytes));
    println!("  Overwrites old:  {}", result.overwrites_old_messages);
    println!("  Oldest offset:   {}", result.oldest_message_offset);
    println!("  End offset:      {}", result.end_of_newest_message_offset);
    println!("  Wrapped:         {}", result.wrapped);
    println!();
    println!("Storage:");
    println!("  Header size:     {} bytes", HEADER_SIZE);
    println!("  File size:       {}", format_size(result.file_size));
    println!(
        "  Used:            {} of {} ({:.1}%)",
        format_size(result.used_bytes),
        format_size(result.capacity),
        percent(result.used_bytes, result.capacity)
    );
    println!();
    match (&result.message_count, &result.error) {
        (Some(count), _) => println!("Messages: {}", count),
        (None, Some(error)) => println!("Messages: unreadable ({})", error),
        (None, None) => println!("Messages: unknown"),
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn inspect_reports_header_and_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inspect.cache");
        let mut cache = Cache::open_or_create(&path, 64).unwrap();
        cache.append(b"aaaaaaaaaa").unwrap();
        cache.append(b"bbbbbbbbbb").unwrap();
        cache.append(b"cccccc").unwrap();
        cache.close().unwrap();

        let result = inspect(&path).unwrap();
        assert_eq!(result.maximum_bytes, 64);
        assert!(result.wrapped);
        assert_eq!(result.message_count, Some(2));
        assert_eq!(result.used_bytes, 24);
        assert_eq!(result.capacity, 32);
        assert!(result.error.is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(inspect(&dir.path().join("absent.cache")).is_err());
    }

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
