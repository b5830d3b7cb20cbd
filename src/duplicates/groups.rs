//! Duplicate grouping.
//!
//! # Overview
//!
//! [`locate_dupes`] compares every checksum with every later one in path
//! order. The first path of a run of equal checksums becomes the group key
//! and the rest become its members. A path that is already a member never
//! starts a group of its own, so no path is listed twice.
//!
//! # Example
//!
//! ```
//! use listdupes::duplicates::{locate_dupes, ChecksumResult};
//! use listdupes::session::PathRecord;
//! use std::path::{Path, PathBuf};
//!
//! let result = ChecksumResult {
//!     paths_and_sums: vec![
//!         PathRecord::new(PathBuf::from("/a"), 7),
//!         PathRecord::new(PathBuf::from("/b"), 7),
//!         PathRecord::new(PathBuf::from("/c"), 9),
//!     ],
//!     ..Default::default()
//! };
//!
//! let dupes = locate_dupes(result, None);
//! assert_eq!(dupes.get(Path::new("/a")), Some(&[PathBuf::from("/b")][..]));
//! assert_eq!(dupes.duplicate_count(), 1);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::finder::ChecksumResult;
use super::status::{describe, SearchStatus};
use crate::progress::{ProgressCallback, PHASE_COMPARING};

/// Duplicate groups keyed by their first path, with the checksum result
/// they were built from.
#[derive(Debug, Clone, Default)]
pub struct Dupes {
    groups: BTreeMap<PathBuf, Vec<PathBuf>>,
    members: HashSet<PathBuf>,
    checksum_result: ChecksumResult,
}

impl Dupes {
    /// Create an empty mapping for `checksum_result`.
    #[must_use]
    pub fn new(checksum_result: ChecksumResult) -> Self {
        Self {
            groups: BTreeMap::new(),
            members: HashSet::new(),
            checksum_result,
        }
    }

    /// Members of the group keyed by `key`, creating the group if needed.
    fn group_mut(&mut self, key: &Path) -> &mut Vec<PathBuf> {
        self.groups.entry(key.to_path_buf()).or_default()
    }

    /// Record `duplicate` as a member of the group keyed by `key`.
    ///
    /// Adding a path that is already a member elsewhere is ignored.
    pub fn add(&mut self, key: &Path, duplicate: PathBuf) {
        if !self.members.insert(duplicate.clone()) {
            return;
        }
        self.group_mut(key).push(duplicate);
    }

    /// Whether `path` is a member of any group.
    #[must_use]
    pub fn is_member(&self, path: &Path) -> bool {
        self.members.contains(path)
    }

    fn sort_values(&mut self) {
        for members in self.groups.values_mut() {
            members.sort();
        }
    }

    /// Members of the group keyed by `key`.
    #[must_use]
    pub fn get(&self, key: &Path) -> Option<&[PathBuf]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Iterate over groups in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Vec<PathBuf>)> {
        self.groups.iter()
    }

    /// The key to members mapping.
    #[must_use]
    pub fn groups(&self) -> &BTreeMap<PathBuf, Vec<PathBuf>> {
        &self.groups
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of duplicates, not counting group keys.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// The checksum result the groups were built from.
    #[must_use]
    pub fn checksum_result(&self) -> &ChecksumResult {
        &self.checksum_result
    }

    /// Describe the duplicates and unread files, with an exit code.
    #[must_use]
    pub fn status(&self) -> SearchStatus {
        describe(
            self.duplicate_count(),
            self.checksum_result.os_errors.len(),
        )
    }
}

/// Group the paths of `checksum_result` that share a checksum.
///
/// Quadratic in the number of paths. `progress` receives one report per
/// path compared.
#[must_use]
pub fn locate_dupes(
    checksum_result: ChecksumResult,
    progress: Option<&dyn ProgressCallback>,
) -> Dupes {
    let records = checksum_result.paths_and_sums.clone();
    let mut dupes = Dupes::new(checksum_result);

    if let Some(callback) = progress {
        callback.on_phase_start(PHASE_COMPARING, records.len());
    }

    for (index, searched) in records.iter().enumerate() {
        if let Some(callback) = progress {
            callback.on_progress(index + 1, &searched.path.to_string_lossy());
        }
        if dupes.is_member(&searched.path) {
            continue;
        }
        for candidate in &records[index + 1..] {
            if candidate.checksum == searched.checksum {
                dupes.add(&searched.path, candidate.path.clone());
            }
        }
    }

    if let Some(callback) = progress {
        callback.on_phase_end(PHASE_COMPARING);
    }

    dupes.sort_values();
    log::debug!(
        "Found {} groups holding {} duplicates",
        dupes.len(),
        dupes.duplicate_count()
    );
    dupes
}
