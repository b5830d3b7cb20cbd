//! Checksum loop with guaranteed progress persistence.
//!
//! # Overview
//!
//! [`checksum_files`] reads every input path in order and collects a
//! [`PathRecord`] per readable file and an [`ErrorRecord`] per unreadable
//! one. Progress lives in a guard whose destructor hands it to the
//! [`CheckpointSink`], so the sink sees the latest state however the loop
//! is left: normal completion, Ctrl+C, a disconnected drive, or a panic.
//!
//! [`search_for_dupes`] runs the whole pipeline: checksum, group, describe.
//!
//! # Example
//!
//! ```no_run
//! use listdupes::duplicates::{search_for_dupes, ChecksumConfig, ChecksumInput};
//! use std::path::Path;
//!
//! let input = ChecksumInput::from_folder(Path::new("/home/user/Pictures"), false, None);
//! let result = search_for_dupes(input, &ChecksumConfig::default()).unwrap();
//!
//! println!("{}", result.status.description);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::groups::{locate_dupes, Dupes};
use super::status::SearchStatus;
use crate::progress::{ProgressCallback, PHASE_READING};
use crate::scanner::{
    check_for_disconnection, read_error_message, FileOutcome, Hasher, ReadErrorKind, Walker,
    DEFAULT_CHUNK_SIZE,
};
use crate::session::{
    read_cache, validate_cache_binding, Archive, CacheStore, ErrorRecord, PathRecord,
    ReadErrors, SessionError,
};

/// Errors that end a checksum run early.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The run was interrupted by the user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// A file vanished together with one of its parent folders.
    #[error(
        "A previously located file couldn't be located.{}",
        nothing_beyond(.nearest_existing.as_deref())
    )]
    Disconnected {
        /// The highest ancestor that no longer exists
        missing: PathBuf,
        /// The closest ancestor that still exists
        nearest_existing: Option<PathBuf>,
    },

    /// Progress couldn't be persisted.
    #[error(transparent)]
    Session(#[from] SessionError),
}

fn nothing_beyond(nearest_existing: Option<&Path>) -> String {
    nearest_existing
        .map(|p| format!(" Nothing beyond {} could be found.", p.display()))
        .unwrap_or_default()
}

/// Receives the accumulated progress of a checksum run.
pub trait CheckpointSink {
    /// Persist `results`, `errors` and the number of input entries consumed
    /// so far (including any consumed by earlier runs).
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if the progress can't be stored.
    fn persist(
        &self,
        results: &[PathRecord],
        errors: &ReadErrors,
        place: usize,
    ) -> Result<(), SessionError>;
}

impl CheckpointSink for CacheStore {
    fn persist(
        &self,
        results: &[PathRecord],
        errors: &ReadErrors,
        place: usize,
    ) -> Result<(), SessionError> {
        self.save(results, errors, place)
    }
}

/// Progress carried into (and out of) a checksum run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecksumState {
    /// Checksums computed so far
    pub results: Vec<PathRecord>,
    /// Read failures recorded so far
    pub errors: ReadErrors,
    /// Number of input entries consumed so far
    pub place: usize,
}

/// Final output of a checksum run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecksumResult {
    /// Checksums, sorted by path
    pub paths_and_sums: Vec<PathRecord>,
    /// Read failures by category
    pub os_errors: ReadErrors,
}

/// Configuration for a checksum run.
#[derive(Clone)]
pub struct ChecksumConfig {
    /// Bytes read per chunk.
    pub chunk_size: usize,
    /// Persist every this many files, in addition to on exit.
    pub checkpoint_interval: Option<usize>,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ChecksumConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumConfig")
            .field("chunk_size", &self.chunk_size)
            .field("checkpoint_interval", &self.checkpoint_interval)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            checkpoint_interval: None,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl ChecksumConfig {
    /// Set the chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Persist progress every `files` files (0 disables).
    #[must_use]
    pub fn with_checkpoint_interval(mut self, files: usize) -> Self {
        self.checkpoint_interval = (files > 0).then_some(files);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Everything a checksum run starts from.
pub struct ChecksumInput {
    paths: Box<dyn Iterator<Item = PathBuf>>,
    total: Option<usize>,
    prior: ChecksumState,
    sink: Option<Box<dyn CheckpointSink>>,
}

impl std::fmt::Debug for ChecksumInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumInput")
            .field("total", &self.total)
            .field("prior_place", &self.prior.place)
            .field("sink", &self.sink.as_ref().map(|_| "<sink>"))
            .finish_non_exhaustive()
    }
}

impl ChecksumInput {
    /// Checksum a known list of paths.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            total: Some(paths.len()),
            paths: Box::new(paths.into_iter()),
            prior: ChecksumState::default(),
            sink: None,
        }
    }

    /// Checksum paths produced lazily, with no total known up front.
    #[must_use]
    pub fn lazy(paths: impl Iterator<Item = PathBuf> + 'static) -> Self {
        Self {
            paths: Box::new(paths),
            total: None,
            prior: ChecksumState::default(),
            sink: None,
        }
    }

    /// Checksum the files beneath `folder`.
    ///
    /// With `materialize` the tree is walked fully first, so progress can
    /// show a total.
    #[must_use]
    pub fn from_folder(
        folder: &Path,
        materialize: bool,
        shutdown_flag: Option<Arc<AtomicBool>>,
    ) -> Self {
        let mut walker = Walker::new(folder);
        if let Some(flag) = shutdown_flag {
            walker = walker.with_shutdown_flag(flag);
        }

        if materialize {
            Self::new(walker.collect_sorted())
        } else {
            Self::lazy(walker.walk())
        }
    }

    /// Resume (or start) checksumming an archive, persisting to `cache_path`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::CacheMismatch`] if the cache belongs to another archive
    /// - [`SessionError::CorruptedCache`] if the cache can't be parsed
    pub fn from_archive(archive: &Archive, cache_path: &Path) -> Result<Self, SessionError> {
        validate_cache_binding(cache_path, archive)?;
        let store = CacheStore::new(cache_path.to_path_buf(), archive);

        if !cache_path.exists() {
            log::info!(
                "No cache at {}, starting archive from the beginning",
                cache_path.display()
            );
            return Ok(Self::new(archive.sub_paths.clone()).with_sink(Box::new(store)));
        }

        let cache = read_cache(cache_path)?;
        if !cache.binding.matches(archive) {
            return Err(SessionError::CacheMismatch {
                path: cache_path.to_path_buf(),
            });
        }

        let remaining = cache.remaining(archive).to_vec();
        log::info!(
            "Resuming archive at entry {} of {} ({} checksums cached)",
            cache.place,
            archive.sub_paths.len(),
            cache.paths_and_sums.len()
        );

        Ok(Self::new(remaining)
            .with_prior(ChecksumState {
                results: cache.paths_and_sums,
                errors: cache.os_errors,
                place: cache.place,
            })
            .with_sink(Box::new(store)))
    }

    /// Seed the run with earlier progress.
    #[must_use]
    pub fn with_prior(mut self, prior: ChecksumState) -> Self {
        self.prior = prior;
        self
    }

    /// Persist progress to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn CheckpointSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Number of paths still to read, if known.
    #[must_use]
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Progress the run starts from.
    #[must_use]
    pub fn prior(&self) -> &ChecksumState {
        &self.prior
    }
}

/// Holds a run's progress and persists it when dropped.
struct FinalizeGuard<'a> {
    state: ChecksumState,
    sink: Option<&'a dyn CheckpointSink>,
    progress: Option<&'a dyn ProgressCallback>,
    done: bool,
}

impl<'a> FinalizeGuard<'a> {
    fn new(
        state: ChecksumState,
        sink: Option<&'a dyn CheckpointSink>,
        progress: Option<&'a dyn ProgressCallback>,
    ) -> Self {
        Self {
            state,
            sink,
            progress,
            done: false,
        }
    }

    fn persist(&self) -> Result<(), SessionError> {
        match self.sink {
            Some(sink) => sink.persist(&self.state.results, &self.state.errors, self.state.place),
            None => Ok(()),
        }
    }

    fn end_phase(&self) {
        if let Some(progress) = self.progress {
            progress.on_phase_end(PHASE_READING);
        }
    }

    fn finish(mut self) -> Result<ChecksumState, SessionError> {
        self.done = true;
        self.end_phase();
        self.persist()?;
        Ok(std::mem::take(&mut self.state))
    }
}

impl Drop for FinalizeGuard<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.end_phase();
        log::debug!("Checksum run ended early at place {}", self.state.place);
        if let Err(e) = self.persist() {
            log::error!("Failed to save progress: {}", e);
        }
    }
}

/// Checksum every path in `input`, continuing from its prior progress.
///
/// Unreadable files are recorded in the returned errors and never stop the
/// run. Paths that turn out to be directories are skipped. Results are
/// sorted by path.
///
/// The input's sink, if any, receives the accumulated progress on every
/// exit path, and every `checkpoint_interval` files when configured.
///
/// # Errors
///
/// - [`FinderError::Interrupted`] if the shutdown flag was raised
/// - [`FinderError::Disconnected`] if a file's parent folder disappeared
/// - [`FinderError::Session`] if progress couldn't be persisted at the end
pub fn checksum_files(
    input: ChecksumInput,
    config: &ChecksumConfig,
) -> Result<ChecksumResult, FinderError> {
    let ChecksumInput {
        paths,
        total,
        prior,
        sink,
    } = input;
    let hasher = Hasher::with_chunk_size(config.chunk_size);
    let progress = config.progress_callback.as_deref();

    if let Some(callback) = progress {
        callback.on_phase_start(PHASE_READING, total.unwrap_or(0));
    }
    let mut guard = FinalizeGuard::new(prior, sink.as_deref(), progress);

    for (index, path) in paths.enumerate() {
        if config.is_shutdown_requested() {
            log::info!("Shutdown requested, stopping at place {}", guard.state.place);
            return Err(FinderError::Interrupted);
        }

        match hasher.checksum(&path) {
            FileOutcome::Checksum(checksum) => {
                guard.state.results.push(PathRecord::new(path.clone(), checksum));
            }
            FileOutcome::Directory => {
                log::trace!("Skipping directory {}", path.display());
            }
            FileOutcome::Failed { kind, source } => {
                if kind == ReadErrorKind::NotFound {
                    if let Some(found) = check_for_disconnection(&path) {
                        log::error!(
                            "{} is gone along with {}",
                            path.display(),
                            found.missing.display()
                        );
                        return Err(FinderError::Disconnected {
                            missing: found.missing,
                            nearest_existing: found.nearest_existing,
                        });
                    }
                }
                log::debug!("Could not read {}: {}", path.display(), source);
                let record = ErrorRecord::now(path.clone(), read_error_message(&source));
                guard.state.errors.insert(kind, record);
            }
        }
        guard.state.place += 1;

        if let Some(callback) = progress {
            callback.on_progress(index + 1, &path.to_string_lossy());
        }

        if config
            .checkpoint_interval
            .is_some_and(|interval| (index + 1) % interval == 0)
        {
            guard.persist()?;
        }
    }

    // A lazy walk stops quietly on shutdown
    if config.is_shutdown_requested() {
        log::info!("Shutdown requested, stopping at place {}", guard.state.place);
        return Err(FinderError::Interrupted);
    }

    let mut state = guard.finish()?;
    state.results.sort();
    log::info!(
        "Checksummed {} files with {} read errors",
        state.results.len(),
        state.errors.len()
    );

    Ok(ChecksumResult {
        paths_and_sums: state.results,
        os_errors: state.errors,
    })
}

/// The result of [`search_for_dupes`].
#[derive(Debug)]
pub struct SearchResult {
    /// Duplicate groups and the checksum result they came from
    pub dupes: Dupes,
    /// Summary line and exit code
    pub status: SearchStatus,
}

/// Checksum `input`, group equal checksums and describe the outcome.
///
/// # Errors
///
/// See [`checksum_files`].
pub fn search_for_dupes(
    input: ChecksumInput,
    config: &ChecksumConfig,
) -> Result<SearchResult, FinderError> {
    let checksum_result = checksum_files(input, config)?;
    let dupes = locate_dupes(checksum_result, config.progress_callback.as_deref());
    let status = dupes.status();
    Ok(SearchResult { dupes, status })
}
