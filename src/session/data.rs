//! Data structures for archives, caches and checksum results.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, FixedOffset, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::path_codec::{DecodedPath, EncodedPath};
use crate::scanner::{Checksum, ReadErrorKind};

/// A path paired with the checksum of its content.
///
/// Serialized as a two-element array: `["/path", 123456]`. A path that
/// isn't UTF-8 is written as an array of its raw units instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathRecord {
    /// Path of the checksummed file
    pub path: PathBuf,
    /// Checksum of the full content
    pub checksum: Checksum,
}

impl PathRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(path: PathBuf, checksum: Checksum) -> Self {
        Self { path, checksum }
    }
}

impl Serialize for PathRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (EncodedPath(&self.path), self.checksum).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PathRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (DecodedPath(path), checksum) =
            <(DecodedPath, Checksum)>::deserialize(deserializer)?;
        Ok(Self { path, checksum })
    }
}

/// A file that couldn't be read, with the reason and when it happened.
///
/// Serialized as `["/path", "message", "2026-10-16T09:30:00+02:00"]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErrorRecord {
    /// Path that failed
    pub path: PathBuf,
    /// Description of the failure
    pub message: String,
    /// Wall-clock time of the failure, in the local time zone
    pub time: DateTime<FixedOffset>,
}

impl ErrorRecord {
    /// Create a record stamped with the current local time.
    #[must_use]
    pub fn now(path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            time: Local::now().fixed_offset(),
        }
    }
}

impl Serialize for ErrorRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (EncodedPath(&self.path), &self.message, &self.time).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ErrorRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (DecodedPath(path), message, time) =
            <(DecodedPath, String, DateTime<FixedOffset>)>::deserialize(deserializer)?;
        Ok(Self {
            path,
            message,
            time,
        })
    }
}

/// Read failures partitioned by category.
///
/// Each category is a set, so records stay sorted and never repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadErrors {
    /// Permission failures
    #[serde(rename = "permission_errors", default)]
    pub permission: BTreeSet<ErrorRecord>,
    /// Not-found failures
    #[serde(rename = "file_not_found_errors", default)]
    pub not_found: BTreeSet<ErrorRecord>,
    /// All other failures
    #[serde(rename = "misc_errors", default)]
    pub misc: BTreeSet<ErrorRecord>,
}

impl ReadErrors {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure under its category.
    pub fn insert(&mut self, kind: ReadErrorKind, record: ErrorRecord) {
        self.category_mut(kind).insert(record);
    }

    /// Records of one category.
    #[must_use]
    pub fn category(&self, kind: ReadErrorKind) -> &BTreeSet<ErrorRecord> {
        match kind {
            ReadErrorKind::Permission => &self.permission,
            ReadErrorKind::NotFound => &self.not_found,
            ReadErrorKind::Other => &self.misc,
        }
    }

    fn category_mut(&mut self, kind: ReadErrorKind) -> &mut BTreeSet<ErrorRecord> {
        match kind {
            ReadErrorKind::Permission => &mut self.permission,
            ReadErrorKind::NotFound => &mut self.not_found,
            ReadErrorKind::Other => &mut self.misc,
        }
    }

    /// Total number of records across categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.permission.len() + self.not_found.len() + self.misc.len()
    }

    /// Whether no failures were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every record with its category.
    pub fn iter(&self) -> impl Iterator<Item = (ReadErrorKind, &ErrorRecord)> {
        self.permission
            .iter()
            .map(|r| (ReadErrorKind::Permission, r))
            .chain(self.not_found.iter().map(|r| (ReadErrorKind::NotFound, r)))
            .chain(self.misc.iter().map(|r| (ReadErrorKind::Other, r)))
    }
}

/// Convert a timestamp to fractional Unix seconds (microsecond precision).
#[must_use]
pub fn timestamp_to_secs(time: &DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / 1_000_000.0
}

/// Convert fractional Unix seconds back into a timestamp.
///
/// Returns `None` for values that are not finite or out of range.
#[must_use]
pub fn secs_to_timestamp(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}

/// An immutable snapshot of the paths found under a starting folder.
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    /// When the archive was made; doubles as its identity
    pub creation_time: DateTime<Utc>,
    /// Absolute starting folder
    pub starting_path: PathBuf,
    /// Every file found, sorted and without repeats
    pub sub_paths: Vec<PathBuf>,
}

impl Archive {
    /// Create an archive stamped with the current time.
    ///
    /// The timestamp is truncated to what the archive file can store, so an
    /// archive compares equal to itself after a save and load.
    #[must_use]
    pub fn new(starting_path: PathBuf, mut sub_paths: Vec<PathBuf>) -> Self {
        sub_paths.sort();
        sub_paths.dedup();
        let now = Utc::now();
        let creation_time = secs_to_timestamp(timestamp_to_secs(&now)).unwrap_or(now);
        Self {
            creation_time,
            starting_path,
            sub_paths,
        }
    }

    /// Describe how old the archive is at `now`, if it is over a week old.
    #[must_use]
    pub fn age_description(&self, now: DateTime<Utc>) -> Option<&'static str> {
        let age = now - self.creation_time;
        let description = if age > Duration::weeks(52) {
            "a year"
        } else if age > Duration::days(183) {
            "half a year"
        } else if age > Duration::days(31) {
            "a month"
        } else if age > Duration::days(7) {
            "a week"
        } else {
            return None;
        };
        Some(description)
    }
}

/// Identifies which archive a cache belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheBinding {
    /// Creation time of the archive the cache was made from
    pub archive_creation_time: DateTime<Utc>,
    /// Starting folder recorded in that archive
    pub archived_starting_path: PathBuf,
}

impl CacheBinding {
    /// Bind to an archive.
    #[must_use]
    pub fn for_archive(archive: &Archive) -> Self {
        Self {
            archive_creation_time: archive.creation_time,
            archived_starting_path: archive.starting_path.clone(),
        }
    }

    /// Whether this binding belongs to `archive`.
    #[must_use]
    pub fn matches(&self, archive: &Archive) -> bool {
        self.archive_creation_time == archive.creation_time
    }
}

/// Progress of a checksum run against one archive.
#[derive(Debug, Clone, PartialEq)]
pub struct Cache {
    /// The archive this progress belongs to
    pub binding: CacheBinding,
    /// Number of archive entries already processed
    pub place: usize,
    /// Failures recorded so far
    pub os_errors: ReadErrors,
    /// Checksums computed so far
    pub paths_and_sums: Vec<PathRecord>,
}

impl Cache {
    /// The archive entries that still need processing.
    #[must_use]
    pub fn remaining<'a>(&self, archive: &'a Archive) -> &'a [PathBuf] {
        let start = self.place.min(archive.sub_paths.len());
        &archive.sub_paths[start..]
    }
}

/// A borrowed view of cache contents, used for writing without copying.
#[derive(Debug, Clone, Copy)]
pub struct CacheSnapshot<'a> {
    /// The archive this progress belongs to
    pub binding: &'a CacheBinding,
    /// Number of archive entries already processed
    pub place: usize,
    /// Failures recorded so far
    pub os_errors: &'a ReadErrors,
    /// Checksums computed so far
    pub paths_and_sums: &'a [PathRecord],
}

impl CacheSnapshot<'_> {
    /// Starting folder the cache was made for.
    #[must_use]
    pub fn starting_path(&self) -> &Path {
        &self.binding.archived_starting_path
    }
}
