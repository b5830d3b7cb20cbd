//! Scanner module for directory traversal and file checksumming.
//!
//! This module provides functionality for:
//! - Recursive directory walking that skips dot-named entries
//! - Chunked CRC32 fingerprinting of file contents
//! - Classification of per-file read failures
//! - Starting path validation and unique output path creation
//!
//! # Architecture
//!
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Streaming checksums and the disconnection check
//! - [`path_utils`]: Path validation and collision-free output names
//!
//! # Example
//!
//! ```no_run
//! use listdupes::scanner::{FileOutcome, Hasher, Walker};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! for path in Walker::new(Path::new(".")).walk() {
//!     if let FileOutcome::Checksum(sum) = hasher.checksum(&path) {
//!         println!("{:08x} {}", sum, path.display());
//!     }
//! }
//! ```

pub mod hasher;
pub mod path_utils;
pub mod walker;

use serde::{Deserialize, Serialize};

pub use hasher::{
    check_for_disconnection, fold_chunk, Checksum, Disconnection, FileOutcome, Hasher,
    DEFAULT_CHUNK_SIZE, EMPTY_CHECKSUM,
};
pub use path_utils::{
    expand_home, make_file_path_unique, starting_path_problem, OutputPaths, PathError,
};
pub use walker::Walker;

/// Category of a read failure that was recorded instead of aborting the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReadErrorKind {
    /// The file could not be opened or read due to permissions.
    Permission,
    /// The file disappeared between listing and reading.
    NotFound,
    /// Any other OS-level failure.
    Other,
}

impl ReadErrorKind {
    /// Classify an I/O error into one of the recorded categories.
    #[must_use]
    pub fn classify(error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::Permission,
            std::io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Other,
        }
    }
}

/// The message recorded for a read failure.
///
/// OS errors keep the system's wording without the ` (os error N)` tail
/// that `io::Error` appends.
#[must_use]
pub fn read_error_message(error: &std::io::Error) -> String {
    let text = error.to_string();
    if let Some(code) = error.raw_os_error() {
        if let Some(message) = text.strip_suffix(&format!(" (os error {code})")) {
            return message.to_string();
        }
    }
    text
}

impl std::fmt::Display for ReadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permission => write!(f, "permission"),
            Self::NotFound => write!(f, "not found"),
            Self::Other => write!(f, "other"),
        }
    }
}
