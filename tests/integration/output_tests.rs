use listdupes::duplicates::{locate_dupes, ChecksumResult, Dupes};
use listdupes::output::{
    write_any_errors_to, write_any_items_to, write_any_items_to_file, CsvOutput, JsonOutput,
    OutputFormat,
};
use listdupes::scanner::ReadErrorKind;
use listdupes::session::{ErrorRecord, PathRecord, ReadErrors};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn sample_dupes() -> Dupes {
    let records = [("/p/a", 1), ("/p/b", 1), ("/p/c", 1), ("/p/d", 2), ("/p/e", 2), ("/p/f", 3)];
    locate_dupes(
        ChecksumResult {
            paths_and_sums: records
                .iter()
                .map(|(p, c)| PathRecord::new(PathBuf::from(p), *c))
                .collect(),
            ..Default::default()
        },
        None,
    )
}

#[test]
fn test_csv_layout() {
    let csv = CsvOutput::new(&sample_dupes()).to_string().unwrap();
    assert_eq!(csv, "File,Duplicates\n/p/a,/p/b\n,/p/c\n/p/d,/p/e\n");
}

#[test]
fn test_csv_without_labels() {
    let csv = CsvOutput::new(&sample_dupes())
        .with_labels(false)
        .to_string()
        .unwrap();
    assert!(csv.starts_with("/p/a,/p/b\n"));
}

#[test]
fn test_csv_quotes_awkward_paths() {
    let dupes = locate_dupes(
        ChecksumResult {
            paths_and_sums: vec![
                PathRecord::new("/p/one, two".into(), 9),
                PathRecord::new("/p/plain".into(), 9),
            ],
            ..Default::default()
        },
        None,
    );

    let csv = CsvOutput::new(&dupes).with_labels(false).to_string().unwrap();
    assert_eq!(csv, "\"/p/one, two\",/p/plain\n");
}

#[test]
fn test_json_layout() {
    let json = JsonOutput::new(&sample_dupes()).to_json().unwrap();
    assert_eq!(json, r#"{"/p/a":["/p/b","/p/c"],"/p/d":["/p/e"]}"#);
}

#[test]
fn test_stream_output_skips_empty_results() {
    let mut buffer = Vec::new();
    let written = write_any_items_to(&Dupes::default(), OutputFormat::Csv, &mut buffer, true).unwrap();
    assert!(!written);
    assert!(buffer.is_empty());
}

#[test]
fn test_output_file_never_overwrites() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("listdupes_output.csv");
    fs::write(&path, "earlier results").unwrap();

    assert!(write_any_items_to_file(&sample_dupes(), OutputFormat::Csv, &path).is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), "earlier results");
}

#[test]
fn test_unread_log_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("listdupes_unread_files_log.txt");
    let mut errors = ReadErrors::new();
    errors.insert(
        ReadErrorKind::Permission,
        ErrorRecord::now("/p/locked".into(), "Permission denied"),
    );

    assert!(write_any_errors_to(&path, &errors, false).unwrap());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "'/p/locked' raised 'Permission denied' and was not read.\n"
    );
}

#[test]
fn test_unread_log_appends_in_filter_mode() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.txt");
    let mut first = ReadErrors::new();
    first.insert(ReadErrorKind::Other, ErrorRecord::now("/one".into(), "bad"));
    let mut second = ReadErrors::new();
    second.insert(ReadErrorKind::NotFound, ErrorRecord::now("/two".into(), "gone"));

    write_any_errors_to(&path, &first, true).unwrap();
    write_any_errors_to(&path, &second, true).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("'/two' raised 'gone'"));
}

#[test]
fn test_no_log_without_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.txt");
    assert!(!write_any_errors_to(&path, &ReadErrors::new(), false).unwrap());
    assert!(!path.exists());
}
