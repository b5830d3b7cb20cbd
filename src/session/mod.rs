//! Persistent state for resumable scans.
//!
//! A scan of a large or slow tree can be split across runs:
//!
//! 1. `--archive-folder` walks the tree once and writes an **archive**, an
//!    immutable, timestamped list of every file found.
//! 2. `--read-archive` checksums the archived paths in order. Progress is
//!    written to a **cache** file that is bound to its archive by the
//!    archive's creation time. A later run with the same archive resumes
//!    where the cache left off; a cache from another archive is refused.
//!
//! # Architecture
//!
//! * [`data`]: Value types for archives, caches and checksum results.
//! * [`io`]: Reading, validating and atomically writing those files.
//! * [`path_codec`]: Path encoding that keeps non-UTF-8 names intact.

pub mod data;
pub mod io;
pub mod path_codec;

pub use data::{
    Archive, Cache, CacheBinding, CacheSnapshot, ErrorRecord, PathRecord, ReadErrors,
};
pub use io::{
    read_archive, read_cache, read_cache_prefix, remove_cache, validate_cache_binding,
    write_archive, write_cache, CachePrefix, CacheStore, SessionError,
};
