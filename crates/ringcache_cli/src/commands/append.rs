//! Append command implementation.

use super::CommandError;
use ringcache_core::{Cache, CacheConfig};
use std::io::BufRead;
use std::path::Path;
use tracing::info;

/// Runs the append command.
///
/// With no `messages`, appends each non-empty line read from stdin.
pub fn run(
    path: &Path,
    max_bytes: u64,
    overwrite: bool,
    messages: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let appended = if messages.is_empty() {
        let stdin = std::io::stdin();
        let lines = stdin.lock().lines().collect::<Result<Vec<_>, _>>()?;
        append_all(path, max_bytes, overwrite, &lines)?
    } else {
        append_all(path, max_bytes, overwrite, messages)?
    };

    info!("appended {} message(s) to {}", appended, path.display());
    Ok(())
}

/// Appends every non-empty message, returning how many were written.
pub fn append_all(
    path: &Path,
    max_bytes: u64,
    overwrite: bool,
    messages: &[String],
) -> Result<usize, Box<dyn std::error::Error>> {
    let config = CacheConfig::new(max_bytes).overwrites_old_messages(overwrite);
    let mut cache = Cache::open_with_config(path, config)?;

    if !cache.is_writable() {
        let header = cache.header();
        return Err(CommandError::ReadOnly {
            path: path.display().to_string(),
            maximum_bytes: header.maximum_bytes,
            overwrites: header.overwrites_old_messages,
        }
        .into());
    }

    let mut appended = 0;
    for message in messages.iter().filter(|m| !m.is_empty()) {
        cache.append(message.as_bytes())?;
        appended += 1;
    }

    cache.close()?;
    Ok(appended)
}
