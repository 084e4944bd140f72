//! CLI command implementations.

pub mod append;
pub mod dump;
pub mod inspect;
pub mod verify;

use thiserror::Error;

/// Failures reported by commands beyond the underlying cache errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// `verify` found structural problems.
    #[error("verification failed with {0} problem(s)")]
    VerificationFailed(usize),

    /// The file header does not match the requested configuration.
    #[error("cache at {path} was created with maximum_bytes {maximum_bytes} and overwrites_old_messages {overwrites}; refusing to append")]
    ReadOnly {
        /// Cache file path.
        path: String,
        /// Capacity recorded in the header.
        maximum_bytes: u64,
        /// Overwrite policy recorded in the header.
        overwrites: bool,
    },

    /// Unknown `--format` value.
    #[error("unsupported format '{0}'")]
    UnsupportedFormat(String),
}
