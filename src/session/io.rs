//! I/O operations for archives and caches.
//!
//! Archive file:
//!
//! ```json
//! {"creation_time": 1792142400.123456, "starting_path": "/home/me", "sub_paths": ["/home/me/a"]}
//! ```
//!
//! Cache file (the binding fields come first so they can be read from a
//! short prefix of the file):
//!
//! ```json
//! {"archive_creation_time": 1792142400.123456, "archived_starting_path": "/home/me",
//!  "place": 1, "os_errors": {"permission_errors": [], "file_not_found_errors": [],
//!  "misc_errors": []}, "paths_and_sums": [["/home/me/a", 2212294583]]}
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::data::{
    secs_to_timestamp, timestamp_to_secs, Archive, Cache, CacheBinding, CacheSnapshot,
    PathRecord, ReadErrors,
};
use super::path_codec::{self, DecodedPath};

/// Bytes read from the start of a cache to find its binding.
pub const CACHE_PREFIX_LEN: usize = 4096;

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The archive file is malformed.
    #[error("The file you have chosen is not a valid archive.")]
    InvalidArchive,

    /// The cache file can't be parsed.
    #[error(
        "The cache file at {} is corrupted.\n\
         Please delete it and run the archive again to start over.",
        path.display()
    )]
    CorruptedCache {
        /// Location of the cache file
        path: PathBuf,
    },

    /// The cache was made from a different archive.
    #[error(
        "The cache file is holding work which was done on another archive.\n\
         Please save that work by moving the cache file to a separate location\n\
         or simply delete the cache if you no longer need it."
    )]
    CacheMismatch {
        /// Location of the cache file
        path: PathBuf,
    },

    /// An I/O error occurred while accessing a state file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// State couldn't be serialized.
    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        /// Path being written
        path: PathBuf,
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },
}

impl SessionError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk shape of an archive, for reading.
#[derive(Debug, Deserialize)]
struct ArchiveFile {
    creation_time: f64,
    #[serde(with = "path_codec")]
    starting_path: PathBuf,
    #[serde(with = "path_codec::many")]
    sub_paths: Vec<PathBuf>,
}

/// On-disk shape of an archive, for writing.
#[derive(Debug, Serialize)]
struct ArchiveFileRef<'a> {
    creation_time: f64,
    #[serde(with = "path_codec")]
    starting_path: &'a Path,
    #[serde(with = "path_codec::many")]
    sub_paths: &'a [PathBuf],
}

/// On-disk shape of a cache, for reading.
#[derive(Debug, Deserialize)]
struct CacheFile {
    archive_creation_time: f64,
    #[serde(default, with = "path_codec")]
    archived_starting_path: PathBuf,
    place: usize,
    os_errors: ReadErrors,
    paths_and_sums: Vec<PathRecord>,
}

/// On-disk shape of a cache, for writing. Field order is significant.
#[derive(Debug, Serialize)]
struct CacheFileRef<'a> {
    archive_creation_time: f64,
    #[serde(with = "path_codec")]
    archived_starting_path: &'a Path,
    place: usize,
    os_errors: &'a ReadErrors,
    paths_and_sums: &'a [PathRecord],
}

/// Serialize `value` into a temporary file beside `path`, then move it
/// into place.
///
/// With `replace` unset the move fails if `path` already exists. Either
/// way `path` never holds a partial file and the temporary file is removed
/// on failure.
fn write_json_atomically<T: Serialize>(
    path: &Path,
    value: &T,
    replace: bool,
) -> Result<(), SessionError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let temp_file = NamedTempFile::new_in(parent).map_err(|e| SessionError::io(path, e))?;

    {
        let mut writer = BufWriter::new(temp_file.as_file());
        serde_json::to_writer(&mut writer, value).map_err(|source| SessionError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(|e| SessionError::io(path, e))?;
    }

    let persisted = if replace {
        temp_file.persist(path)
    } else {
        temp_file.persist_noclobber(path)
    };
    persisted.map_err(|e| SessionError::io(path, e.error))?;
    Ok(())
}

/// Write an archive to `path`, refusing to overwrite an existing file.
///
/// # Errors
///
/// Returns [`SessionError::Io`] if the file exists or can't be written.
pub fn write_archive(path: &Path, archive: &Archive) -> Result<(), SessionError> {
    if path.exists() {
        return Err(SessionError::io(
            path,
            std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        ));
    }

    let record = ArchiveFileRef {
        creation_time: timestamp_to_secs(&archive.creation_time),
        starting_path: &archive.starting_path,
        sub_paths: &archive.sub_paths,
    };
    write_json_atomically(path, &record, false)?;

    log::info!(
        "Archived {} paths to {}",
        archive.sub_paths.len(),
        path.display()
    );
    Ok(())
}

/// Read and validate an archive.
///
/// Any structural or type problem is reported as
/// [`SessionError::InvalidArchive`]; nothing from a bad file is trusted.
///
/// # Errors
///
/// Returns [`SessionError::Io`] if the file can't be opened.
pub fn read_archive(path: &Path) -> Result<Archive, SessionError> {
    let file = File::open(path).map_err(|e| SessionError::io(path, e))?;
    let record: ArchiveFile = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        log::debug!("Archive {} failed to parse: {}", path.display(), e);
        SessionError::InvalidArchive
    })?;

    let creation_time =
        secs_to_timestamp(record.creation_time).ok_or(SessionError::InvalidArchive)?;

    Ok(Archive {
        creation_time,
        starting_path: record.starting_path,
        sub_paths: record.sub_paths,
    })
}

/// Find `"key": <value>` in a JSON fragment and parse just the value.
fn peek_field<T: DeserializeOwned>(fragment: &str, key: &str) -> Option<T> {
    let quoted = format!("\"{key}\"");
    let after_key = &fragment[fragment.find(&quoted)? + quoted.len()..];
    let after_colon = after_key.trim_start().strip_prefix(':')?;
    serde_json::Deserializer::from_str(after_colon)
        .into_iter::<T>()
        .next()?
        .ok()
}

/// Binding fields recovered from the start of a cache file.
#[derive(Debug, Clone, PartialEq)]
pub struct CachePrefix {
    /// Creation time of the archive the cache belongs to
    pub archive_creation_time: DateTime<Utc>,
    /// Starting folder of that archive, if it fit in the prefix
    pub archived_starting_path: Option<PathBuf>,
}

/// Read only the first [`CACHE_PREFIX_LEN`] bytes of a cache and extract
/// its binding.
///
/// Returns `Ok(None)` if the prefix doesn't contain a usable timestamp.
///
/// # Errors
///
/// Returns [`SessionError::Io`] if the file can't be read.
pub fn read_cache_prefix(path: &Path) -> Result<Option<CachePrefix>, SessionError> {
    let file = File::open(path).map_err(|e| SessionError::io(path, e))?;
    let mut buffer = Vec::with_capacity(CACHE_PREFIX_LEN);
    file.take(CACHE_PREFIX_LEN as u64)
        .read_to_end(&mut buffer)
        .map_err(|e| SessionError::io(path, e))?;
    let fragment = String::from_utf8_lossy(&buffer);

    let Some(archive_creation_time) =
        peek_field::<f64>(&fragment, "archive_creation_time").and_then(secs_to_timestamp)
    else {
        return Ok(None);
    };

    Ok(Some(CachePrefix {
        archive_creation_time,
        archived_starting_path: peek_field::<DecodedPath>(&fragment, "archived_starting_path")
            .map(|p| p.0),
    }))
}

/// Check that the cache at `cache_path`, if any, belongs to `archive`.
///
/// Only a short prefix of the cache is read.
///
/// # Errors
///
/// - [`SessionError::CorruptedCache`] if no binding can be found
/// - [`SessionError::CacheMismatch`] if the cache belongs to another archive
pub fn validate_cache_binding(cache_path: &Path, archive: &Archive) -> Result<(), SessionError> {
    if !cache_path.exists() {
        return Ok(());
    }

    let prefix = read_cache_prefix(cache_path)?.ok_or_else(|| SessionError::CorruptedCache {
        path: cache_path.to_path_buf(),
    })?;

    if prefix.archive_creation_time != archive.creation_time {
        log::debug!(
            "Cache {} was made for the archive of {} (created {}), not {}",
            cache_path.display(),
            prefix
                .archived_starting_path
                .as_deref()
                .unwrap_or_else(|| Path::new("?"))
                .display(),
            prefix.archive_creation_time,
            archive.creation_time
        );
        return Err(SessionError::CacheMismatch {
            path: cache_path.to_path_buf(),
        });
    }
    Ok(())
}

/// Read a whole cache file.
///
/// # Errors
///
/// Returns [`SessionError::CorruptedCache`] if the contents don't parse.
pub fn read_cache(path: &Path) -> Result<Cache, SessionError> {
    let file = File::open(path).map_err(|e| SessionError::io(path, e))?;
    let corrupted = || SessionError::CorruptedCache {
        path: path.to_path_buf(),
    };

    let record: CacheFile = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        log::debug!("Cache {} failed to parse: {}", path.display(), e);
        corrupted()
    })?;
    let archive_creation_time =
        secs_to_timestamp(record.archive_creation_time).ok_or_else(corrupted)?;

    Ok(Cache {
        binding: CacheBinding {
            archive_creation_time,
            archived_starting_path: record.archived_starting_path,
        },
        place: record.place,
        os_errors: record.os_errors,
        paths_and_sums: record.paths_and_sums,
    })
}

/// Replace the cache at `path` with `snapshot`.
///
/// The new contents are written to a temporary file beside the cache and
/// renamed over it, so a reader never sees a half-written cache. A snapshot
/// without any checksums is not written.
///
/// # Errors
///
/// Returns [`SessionError::Io`] or [`SessionError::Serialize`] on failure.
pub fn write_cache(path: &Path, snapshot: CacheSnapshot<'_>) -> Result<(), SessionError> {
    if snapshot.paths_and_sums.is_empty() {
        log::debug!("No checksums to cache, skipping write");
        return Ok(());
    }

    let record = CacheFileRef {
        archive_creation_time: timestamp_to_secs(&snapshot.binding.archive_creation_time),
        archived_starting_path: snapshot.starting_path(),
        place: snapshot.place,
        os_errors: snapshot.os_errors,
        paths_and_sums: snapshot.paths_and_sums,
    };
    write_json_atomically(path, &record, true)?;

    log::info!(
        "Cached {} checksums (place {}) to {}",
        snapshot.paths_and_sums.len(),
        snapshot.place,
        path.display()
    );
    Ok(())
}

/// Delete a cache after its archive has been fully processed.
///
/// # Errors
///
/// Returns [`SessionError::Io`] if the file exists but can't be removed.
pub fn remove_cache(path: &Path) -> Result<(), SessionError> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::info!("Removed cache {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SessionError::io(path, e)),
    }
}

/// Where a checksum run against an archive persists its progress.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    binding: CacheBinding,
}

impl CacheStore {
    /// Create a store writing to `path` on behalf of `archive`.
    #[must_use]
    pub fn new(path: PathBuf, archive: &Archive) -> Self {
        Self {
            path,
            binding: CacheBinding::for_archive(archive),
        }
    }

    /// Write the given progress as the new cache.
    ///
    /// # Errors
    ///
    /// See [`write_cache`].
    pub fn save(
        &self,
        results: &[PathRecord],
        errors: &ReadErrors,
        place: usize,
    ) -> Result<(), SessionError> {
        write_cache(
            &self.path,
            CacheSnapshot {
                binding: &self.binding,
                place,
                os_errors: errors,
                paths_and_sums: results,
            },
        )
    }
}
