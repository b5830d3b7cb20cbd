use listdupes::duplicates::{checksum_files, ChecksumConfig, ChecksumInput, FinderError};
use listdupes::error::ExitCode;
use listdupes::scanner::ReadErrorKind;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_missing_file_is_recorded_and_run_continues() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("present.txt");
    let absent = dir.path().join("absent.txt");
    fs::write(&present, "here").unwrap();

    let input = ChecksumInput::new(vec![absent.clone(), present.clone()]);
    let result = checksum_files(input, &ChecksumConfig::default()).unwrap();

    assert_eq!(result.paths_and_sums.len(), 1);
    assert_eq!(result.paths_and_sums[0].path, present);
    assert_eq!(result.os_errors.len(), 1);
    let not_found = result.os_errors.category(ReadErrorKind::NotFound);
    assert_eq!(not_found.iter().next().map(|r| r.path.clone()), Some(absent));
}

#[test]
fn test_errors_degrade_the_status() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "x").unwrap();
    fs::write(dir.path().join("b"), "x").unwrap();

    let input = ChecksumInput::new(vec![
        dir.path().join("a"),
        dir.path().join("b"),
        dir.path().join("gone-1"),
        dir.path().join("gone-2"),
    ]);
    let result =
        listdupes::duplicates::search_for_dupes(input, &ChecksumConfig::default()).unwrap();

    assert_eq!(
        result.status.description,
        "1 duplicate was found, however 2 files couldn't be read."
    );
    assert_eq!(result.status.exit_code, ExitCode::Degraded);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_recorded_as_permission_error() {
    use listdupes::duplicates::search_for_dupes;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::write(&locked, "pair").unwrap();
    fs::write(dir.path().join("one"), "pair").unwrap();
    fs::write(dir.path().join("two"), "pair").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits aren't enforced for root
    if fs::File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let input = ChecksumInput::from_folder(dir.path(), true, None);
    let result = search_for_dupes(input, &ChecksumConfig::default());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    let result = result.unwrap();

    let errors = &result.dupes.checksum_result().os_errors;
    assert_eq!(errors.len(), 1);
    let denied = errors.category(ReadErrorKind::Permission);
    let record = denied.iter().next().unwrap();
    assert_eq!(record.path, locked);
    assert!(!record.message.contains("os error"), "{}", record.message);

    assert_eq!(
        result.dupes.groups().get(&dir.path().join("one")),
        Some(&vec![dir.path().join("two")])
    );
    assert_eq!(
        result.status.description,
        "1 duplicate was found, however 1 file couldn't be read."
    );
    assert_eq!(result.status.exit_code, ExitCode::Degraded);
}

#[test]
fn test_directories_in_input_are_skipped_silently() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("file"), "data").unwrap();

    let input = ChecksumInput::new(vec![dir.path().join("file"), sub]);
    let result = checksum_files(input, &ChecksumConfig::default()).unwrap();

    assert_eq!(result.paths_and_sums.len(), 1);
    assert!(result.os_errors.is_empty());
}

#[test]
fn test_missing_parent_folder_stops_the_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("before"), "data").unwrap();
    let lost = dir.path().join("drive").join("photos").join("img.jpg");

    let input = ChecksumInput::new(vec![dir.path().join("before"), lost]);
    let err = checksum_files(input, &ChecksumConfig::default()).unwrap_err();

    match err {
        FinderError::Disconnected {
            missing,
            nearest_existing,
        } => {
            assert_eq!(missing, dir.path().join("drive"));
            assert_eq!(nearest_existing.as_deref(), Some(dir.path()));
        }
        other => panic!("Expected Disconnected, got: {:?}", other),
    }
}

#[test]
fn test_disconnection_message_names_nearest_folder() {
    let err = FinderError::Disconnected {
        missing: "/mnt/usb/photos".into(),
        nearest_existing: Some("/mnt".into()),
    };
    assert_eq!(
        err.to_string(),
        "A previously located file couldn't be located. Nothing beyond /mnt could be found."
    );
}
