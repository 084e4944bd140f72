//! Dump command implementation.

use super::CommandError;
use ringcache_core::Cache;
use serde::Serialize;
use std::path::Path;

/// A stored message prepared for output.
#[derive(Debug, Serialize)]
pub struct MessageInfo {
    /// Position in the traversal, oldest first.
    pub index: usize,
    /// Payload length in bytes.
    pub len: usize,
    /// Payload as text, when it is valid UTF-8.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Hex-encoded payload.
    pub hex: String,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    limit: Option<usize>,
    format: &str,
    forward_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !matches!(format, "text" | "hex" | "json") {
        return Err(CommandError::UnsupportedFormat(format.to_string()).into());
    }

    let messages = read_messages(path, limit, forward_only)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&messages)?);
        }
        "hex" => {
            for message in &messages {
                println!("[{}] {}", message.index, message.hex);
            }
        }
        _ => print_text_output(&messages),
    }

    Ok(())
}

/// Reads up to `limit` messages from the cache at `path`.
pub fn read_messages(
    path: &Path,
    limit: Option<usize>,
    forward_only: bool,
) -> Result<Vec<MessageInfo>, Box<dyn std::error::Error>> {
    let mut cache = Cache::open_existing(path)?;
    let max_messages = limit.unwrap_or(usize::MAX);

    let iter = if forward_only {
        cache.forward_scan()
    } else {
        cache.messages()
    };

    let mut messages = Vec::new();
    for (index, payload) in iter.take(max_messages).enumerate() {
        let payload = payload?;
        messages.push(MessageInfo {
            index,
            len: payload.len(),
            text: std::str::from_utf8(&payload).ok().map(str::to_string),
            hex: to_hex(&payload),
        });
    }
    Ok(messages)
}

fn print_text_output(messages: &[MessageInfo]) {
    if messages.is_empty() {
        println!("(no messages)");
        return;
    }
    for message in messages {
        match &message.text {
            Some(text) => println!("[{}] ({} bytes) {}", message.index, message.len, text),
            None => println!(
                "[{}] ({} bytes, binary) {}",
                message.index, message.len, message.hex
            ),
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
