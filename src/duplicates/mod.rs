//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Checksumming files with resumable, always-persisted progress
//! - Grouping paths whose checksums match
//! - Summarizing the outcome with an exit code

pub mod finder;
pub mod groups;
pub mod status;

pub use finder::{
    checksum_files, search_for_dupes, CheckpointSink, ChecksumConfig, ChecksumInput,
    ChecksumResult, ChecksumState, FinderError, SearchResult,
};
pub use groups::{locate_dupes, Dupes};
pub use status::{describe, SearchStatus};
