use listdupes::duplicates::{
    checksum_files, search_for_dupes, ChecksumConfig, ChecksumInput, FinderError,
};
use listdupes::progress::ProgressCallback;
use listdupes::scanner::{ReadErrorKind, Walker};
use listdupes::session::{read_cache, write_archive, Archive, ReadErrors};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

/// Raises the shutdown flag once `limit` files have been read.
struct StopAfter {
    limit: usize,
    flag: Arc<AtomicBool>,
}

impl ProgressCallback for StopAfter {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, current: usize, _path: &str) {
        if current >= self.limit {
            self.flag.store(true, Ordering::SeqCst);
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

fn interrupting_config(limit: usize) -> (ChecksumConfig, Arc<AtomicBool>) {
    let flag = Arc::new(AtomicBool::new(false));
    let config = ChecksumConfig::default()
        .with_shutdown_flag(Arc::clone(&flag))
        .with_progress_callback(Arc::new(StopAfter {
            limit,
            flag: Arc::clone(&flag),
        }));
    (config, flag)
}

/// Six files in two duplicate pairs plus two singles.
fn archived_folder() -> (TempDir, Archive) {
    let dir = tempdir().unwrap();
    let files = dir.path().join("files");
    fs::create_dir(&files).unwrap();
    for (name, content) in [
        ("a", "pair one"),
        ("b", "pair one"),
        ("c", "single"),
        ("d", "pair two"),
        ("e", "pair two"),
        ("f", "another single"),
    ] {
        fs::write(files.join(name), content).unwrap();
    }
    let archive = Archive::new(files.clone(), Walker::new(&files).collect_sorted());
    (dir, archive)
}

fn cache_path(dir: &Path) -> PathBuf {
    dir.join("listdupes_cache")
}

#[test]
fn test_interrupt_saves_progress_to_cache() {
    let (dir, archive) = archived_folder();
    let cache = cache_path(dir.path());
    let (config, _) = interrupting_config(2);

    let input = ChecksumInput::from_archive(&archive, &cache).unwrap();
    let err = checksum_files(input, &config).unwrap_err();
    assert!(matches!(err, FinderError::Interrupted));

    let saved = read_cache(&cache).unwrap();
    assert_eq!(saved.place, 2);
    assert_eq!(saved.paths_and_sums.len(), 2);
    assert!(saved.binding.matches(&archive));
    assert_eq!(saved.binding.archived_starting_path, archive.starting_path);
}

/// Read errors reduced to what must match between runs.
fn error_summary(errors: &ReadErrors) -> Vec<(ReadErrorKind, PathBuf, String)> {
    errors
        .iter()
        .map(|(kind, record)| (kind, record.path.clone(), record.message.clone()))
        .collect()
}

#[test]
fn test_resume_matches_uninterrupted_run() {
    let (dir, archive) = archived_folder();
    let cache = cache_path(dir.path());

    // A path that vanished after archiving sorts first, so its error is
    // recorded before the interrupt and must survive in the cache
    let mut sub_paths = archive.sub_paths.clone();
    sub_paths.push(archive.starting_path.join("0_missing"));
    let archive = Archive::new(archive.starting_path.clone(), sub_paths);

    let (config, _) = interrupting_config(3);
    let input = ChecksumInput::from_archive(&archive, &cache).unwrap();
    assert!(checksum_files(input, &config).is_err());
    assert_eq!(read_cache(&cache).unwrap().os_errors.len(), 1);

    let resumed_input = ChecksumInput::from_archive(&archive, &cache).unwrap();
    assert_eq!(resumed_input.prior().place, 3);
    assert_eq!(resumed_input.total(), Some(4));
    let resumed = search_for_dupes(resumed_input, &ChecksumConfig::default()).unwrap();

    let fresh_input = ChecksumInput::new(archive.sub_paths.clone());
    let fresh = search_for_dupes(fresh_input, &ChecksumConfig::default()).unwrap();

    assert_eq!(resumed.dupes.groups(), fresh.dupes.groups());
    assert_eq!(
        resumed.dupes.checksum_result().paths_and_sums,
        fresh.dupes.checksum_result().paths_and_sums
    );
    let resumed_errors = error_summary(&resumed.dupes.checksum_result().os_errors);
    assert_eq!(
        resumed_errors,
        error_summary(&fresh.dupes.checksum_result().os_errors)
    );
    assert_eq!(resumed_errors.len(), 1);
    assert_eq!(resumed_errors[0].0, ReadErrorKind::NotFound);
    assert_eq!(resumed.status, fresh.status);
    assert_eq!(resumed.dupes.len(), 2);
}

#[cfg(target_os = "linux")]
#[test]
fn test_resume_keeps_names_that_are_not_utf8() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let files = dir.path().join("files");
    fs::create_dir(&files).unwrap();
    let odd = files.join(OsStr::from_bytes(b"caf\xe9.txt"));
    fs::write(&odd, "same").unwrap();
    fs::write(files.join("a.txt"), "same").unwrap();
    fs::write(files.join("b.txt"), "other").unwrap();

    let archive_path = dir.path().join("listdupes_folder_archive.json");
    let archive = Archive::new(files.clone(), Walker::new(&files).collect_sorted());
    write_archive(&archive_path, &archive).unwrap();
    let loaded = listdupes::session::read_archive(&archive_path).unwrap();
    assert_eq!(loaded.sub_paths, archive.sub_paths);

    let cache = cache_path(dir.path());
    let (config, _) = interrupting_config(2);
    let input = ChecksumInput::from_archive(&loaded, &cache).unwrap();
    assert!(checksum_files(input, &config).is_err());

    let input = ChecksumInput::from_archive(&loaded, &cache).unwrap();
    let result = search_for_dupes(input, &ChecksumConfig::default()).unwrap();

    let checked: Vec<PathBuf> = result
        .dupes
        .checksum_result()
        .paths_and_sums
        .iter()
        .map(|r| r.path.clone())
        .collect();
    assert_eq!(checked, archive.sub_paths);
    assert_eq!(
        result.dupes.groups().get(&files.join("a.txt")),
        Some(&vec![odd])
    );
}

#[test]
fn test_repeated_interrupts_make_progress() {
    let (dir, archive) = archived_folder();
    let cache = cache_path(dir.path());

    for expected_place in [1, 2, 3] {
        let (config, _) = interrupting_config(1);
        let input = ChecksumInput::from_archive(&archive, &cache).unwrap();
        assert!(checksum_files(input, &config).is_err());
        assert_eq!(read_cache(&cache).unwrap().place, expected_place);
    }
}

#[test]
fn test_completed_run_leaves_full_cache() {
    let (dir, archive) = archived_folder();
    let cache = cache_path(dir.path());

    let input = ChecksumInput::from_archive(&archive, &cache).unwrap();
    let result = checksum_files(input, &ChecksumConfig::default()).unwrap();

    let saved = read_cache(&cache).unwrap();
    assert_eq!(saved.place, archive.sub_paths.len());
    assert_eq!(saved.paths_and_sums.len(), result.paths_and_sums.len());
}

/// Records the cached place each time a file finishes.
struct CacheObserver {
    cache: PathBuf,
    seen: Mutex<Vec<usize>>,
}

impl ProgressCallback for CacheObserver {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, _current: usize, _path: &str) {
        let place = read_cache(&self.cache).map(|c| c.place).unwrap_or(0);
        self.seen.lock().unwrap().push(place);
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_checkpoint_interval_persists_mid_run() {
    let (dir, archive) = archived_folder();
    let cache = cache_path(dir.path());
    let observer = Arc::new(CacheObserver {
        cache: cache.clone(),
        seen: Mutex::new(Vec::new()),
    });
    let config = ChecksumConfig::default()
        .with_checkpoint_interval(2)
        .with_progress_callback(observer.clone());

    let input = ChecksumInput::from_archive(&archive, &cache).unwrap();
    checksum_files(input, &config).unwrap();

    assert_eq!(*observer.seen.lock().unwrap(), vec![0, 0, 2, 2, 4, 4]);
    assert_eq!(read_cache(&cache).unwrap().place, 6);
}

#[test]
fn test_disconnection_keeps_the_missing_entry_for_retry() {
    let (dir, archive) = archived_folder();
    let cache = cache_path(dir.path());
    let moved = dir.path().join("elsewhere");
    let (config, flag) = interrupting_config(2);

    let input = ChecksumInput::from_archive(&archive, &cache).unwrap();
    assert!(checksum_files(input, &config).is_err());
    flag.store(false, Ordering::SeqCst);

    // The whole folder goes away, like an unplugged drive
    fs::rename(&archive.starting_path, &moved).unwrap();
    let input = ChecksumInput::from_archive(&archive, &cache).unwrap();
    let err = checksum_files(input, &ChecksumConfig::default()).unwrap_err();
    assert!(matches!(err, FinderError::Disconnected { .. }));
    assert_eq!(read_cache(&cache).unwrap().place, 2);

    // Plugged back in, the run picks up where it stopped
    fs::rename(&moved, &archive.starting_path).unwrap();
    let input = ChecksumInput::from_archive(&archive, &cache).unwrap();
    let result = search_for_dupes(input, &ChecksumConfig::default()).unwrap();
    assert_eq!(result.dupes.checksum_result().paths_and_sums.len(), 6);
    assert!(result.dupes.checksum_result().os_errors.is_empty());
}

#[test]
fn test_archive_written_then_resumed_from_disk() {
    let (dir, archive) = archived_folder();
    let archive_path = dir.path().join("listdupes_folder_archive.json");
    write_archive(&archive_path, &archive).unwrap();
    let loaded = listdupes::session::read_archive(&archive_path).unwrap();
    let cache = cache_path(dir.path());

    let (config, _) = interrupting_config(2);
    let input = ChecksumInput::from_archive(&loaded, &cache).unwrap();
    assert!(checksum_files(input, &config).is_err());

    let reloaded = listdupes::session::read_archive(&archive_path).unwrap();
    let input = ChecksumInput::from_archive(&reloaded, &cache).unwrap();
    assert_eq!(input.prior().place, 2);
}
