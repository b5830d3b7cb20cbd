//! Streaming CRC32 file checksums.
//!
//! # Overview
//!
//! [`Hasher`] reads a file in fixed-size chunks and folds every chunk into a
//! running CRC32. Folding continues from the previous value, so the result
//! is identical however the content is split into chunks; a 1-byte chunk
//! size and a single whole-file chunk give the same fingerprint.
//!
//! Failures are returned as data ([`FileOutcome::Failed`]) rather than as
//! errors, because a file that cannot be read must never stop a scan.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::ReadErrorKind;

/// A file fingerprint. Equal fingerprints are treated as equal content.
pub type Checksum = u32;

/// Reference chunk size (512 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 524_288;

/// The checksum of zero bytes.
pub const EMPTY_CHECKSUM: Checksum = 0;

/// Result of checksumming a single path.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was read to the end.
    Checksum(Checksum),
    /// The path turned out to be a directory; it is skipped silently.
    Directory,
    /// The file could not be read.
    Failed {
        /// Recorded category of the failure
        kind: ReadErrorKind,
        /// The underlying I/O error
        source: io::Error,
    },
}

/// Fold one more chunk into a running checksum.
///
/// `fold_chunk(fold_chunk(EMPTY_CHECKSUM, a), b)` equals the checksum of
/// `a` followed by `b`.
#[must_use]
pub fn fold_chunk(previous: Checksum, chunk: &[u8]) -> Checksum {
    let mut hasher = crc32fast::Hasher::new_with_initial(previous);
    hasher.update(chunk);
    hasher.finalize()
}

/// Chunked file hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher using [`DEFAULT_CHUNK_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a hasher that reads `chunk_size` bytes at a time (minimum 1).
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Checksum the file at `path`.
    ///
    /// The file handle is closed before this returns.
    #[must_use]
    pub fn checksum(&self, path: &Path) -> FileOutcome {
        match self.try_checksum(path) {
            Ok(Some(sum)) => FileOutcome::Checksum(sum),
            Ok(None) => FileOutcome::Directory,
            Err(e) if e.kind() == io::ErrorKind::IsADirectory => FileOutcome::Directory,
            Err(e) => FileOutcome::Failed {
                kind: ReadErrorKind::classify(&e),
                source: e,
            },
        }
    }

    /// Checksum everything `reader` yields.
    ///
    /// The first chunk seeds the checksum and each later chunk is folded in.
    /// An empty reader gives [`EMPTY_CHECKSUM`].
    pub fn checksum_reader<R: Read>(&self, mut reader: R) -> io::Result<Checksum> {
        let mut buffer = vec![0u8; self.chunk_size];
        let mut checksum: Option<Checksum> = None;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            let chunk = &buffer[..bytes_read];
            checksum = Some(match checksum {
                None => crc32fast::hash(chunk),
                Some(previous) => fold_chunk(previous, chunk),
            });
        }

        Ok(checksum.unwrap_or(EMPTY_CHECKSUM))
    }

    fn try_checksum(&self, path: &Path) -> io::Result<Option<Checksum>> {
        let file = File::open(path)?;
        if file.metadata()?.is_dir() {
            log::trace!("Skipping directory: {}", path.display());
            return Ok(None);
        }
        self.checksum_reader(file).map(Some)
    }
}

/// A not-found error explained by a missing ancestor directory.
///
/// This usually means a drive or network share was disconnected during
/// the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnection {
    /// The highest ancestor that no longer exists
    pub missing: PathBuf,
    /// The closest ancestor that still exists, if any
    pub nearest_existing: Option<PathBuf>,
}

/// Walk the ancestors of a path that could not be found.
///
/// Returns `None` when the parent directory still exists, meaning only the
/// file itself has gone. Otherwise reports the topmost missing ancestor and
/// the first existing directory above it.
#[must_use]
pub fn check_for_disconnection(path: &Path) -> Option<Disconnection> {
    let mut missing: Option<&Path> = None;

    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        if ancestor.exists() {
            return missing.map(|m| Disconnection {
                missing: m.to_path_buf(),
                nearest_existing: Some(ancestor.to_path_buf()),
            });
        }
        missing = Some(ancestor);
    }

    missing.map(|m| Disconnection {
        missing: m.to_path_buf(),
        nearest_existing: None,
    })
}
