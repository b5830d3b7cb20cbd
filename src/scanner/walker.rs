//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for enumerating the files
//! beneath a starting folder. Directories are never yielded, and any entry
//! whose name starts with `.` is skipped together with everything below it.
//!
//! Two consumption modes are offered:
//!
//! - [`Walker::walk`]: a lazy, single-pass iterator of unknown length
//! - [`Walker::collect_sorted`]: a sorted, deduplicated `Vec` whose length
//!   is known up front (needed for progress totals and archives)
//!
//! Entries that vanish or become unreadable after being listed are not
//! handled here; they surface later as per-file read errors.
//!
//! # Example
//!
//! ```no_run
//! use listdupes::scanner::Walker;
//! use std::path::Path;
//!
//! let files = Walker::new(Path::new("/home/user/Downloads")).collect_sorted();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

/// Directory walker for file discovery.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Walk the directory tree lazily, yielding file paths.
    ///
    /// The root itself is exempt from the dot-name rule, so a starting
    /// folder such as `~/.backups` is still scanned. Entries are yielded in
    /// file-name order within each directory, but callers must not rely on
    /// any global ordering. Symbolic links are yielded as entries and never
    /// descended into. Unreadable directories are logged and skipped.
    pub fn walk(self) -> impl Iterator<Item = PathBuf> {
        let shutdown_flag = self.shutdown_flag;

        WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_dot_named(entry))
            .take_while(move |_| {
                let stop = shutdown_flag
                    .as_ref()
                    .is_some_and(|f| f.load(Ordering::SeqCst));
                if stop {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(|entry_result| match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        return None;
                    }
                    Some(entry.into_path())
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    log::warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    None
                }
            })
    }

    /// Walk the whole tree and return the paths sorted and deduplicated.
    #[must_use]
    pub fn collect_sorted(self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.walk().collect();
        paths.sort();
        paths.dedup();
        log::debug!("Walker collected {} files", paths.len());
        paths
    }
}

/// Check whether an entry's own name starts with a dot.
///
/// Works on the raw name, so names that aren't valid UTF-8 are judged too.
fn is_dot_named(entry: &DirEntry) -> bool {
    entry.file_name().as_encoded_bytes().starts_with(b".")
}
