use clap::Parser;
use listdupes::cli::Cli;
use listdupes::config::Config;
use listdupes::duplicates::FinderError;
use listdupes::error::ExitCode;
use listdupes::{run_with, Outcome};
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("listdupes").chain(args.iter().copied())).unwrap()
}

fn config_in(dir: &Path) -> Config {
    Config {
        output_dir: Some(dir.to_path_buf()),
        cache_path: Some(dir.join("listdupes_cache")),
        ..Config::default()
    }
}

fn run(args: &[&str], out: &Path, stdin: &str) -> (Outcome, String) {
    let mut stdout = Vec::new();
    let outcome = run_with(
        &cli(args),
        &config_in(out),
        Arc::new(AtomicBool::new(false)),
        stdin.as_bytes(),
        &mut stdout,
    )
    .unwrap();
    (outcome, String::from_utf8(stdout).unwrap())
}

fn folder_with_pair() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "same").unwrap();
    fs::write(dir.path().join("b.txt"), "same").unwrap();
    fs::write(dir.path().join("c.txt"), "different").unwrap();
    dir
}

#[test]
fn test_invalid_starting_paths() {
    let out = tempdir().unwrap();
    let missing = out.path().join("nowhere");
    let file = out.path().join("file.txt");
    fs::write(&file, "x").unwrap();

    let cases = [
        (vec![missing.to_str().unwrap()], "No such folder exist at that location."),
        (vec![file.to_str().unwrap()], "The starting path must be a folder."),
        (vec!["-r"], "An archive file is required."),
        (vec!["-r", missing.to_str().unwrap()], "No such file exist at that location."),
        (vec!["-r", out.path().to_str().unwrap()], "The starting path must be a file."),
    ];

    for (args, message) in cases {
        let (outcome, _) = run(&args, out.path(), "");
        assert_eq!(outcome.final_message, message, "args: {:?}", args);
        assert_eq!(outcome.exit_code, ExitCode::Degraded);
    }
}

#[test]
fn test_json_output_file() {
    let out = tempdir().unwrap();
    let src = folder_with_pair();

    let (outcome, _) = run(&["-j", src.path().to_str().unwrap()], out.path(), "");

    let path = out.path().join("listdupes_output.json");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let key = src.path().join("a.txt").display().to_string();
    assert_eq!(
        json[key.as_str()],
        serde_json::json!([src.path().join("b.txt").display().to_string()])
    );
    assert_eq!(outcome.exit_code, ExitCode::Success);
}

#[test]
fn test_no_duplicates_means_no_output_file() {
    let out = tempdir().unwrap();
    let src = tempdir().unwrap();
    fs::write(src.path().join("only"), "one").unwrap();

    let (outcome, _) = run(&[src.path().to_str().unwrap()], out.path(), "");

    assert!(!out.path().join("listdupes_output.csv").exists());
    assert_eq!(outcome.final_message, "");
    assert_eq!(outcome.summary.as_deref(), Some("No duplicates were found."));
}

#[test]
fn test_second_run_picks_a_new_output_name() {
    let out = tempdir().unwrap();
    let src = folder_with_pair();

    run(&[src.path().to_str().unwrap()], out.path(), "");
    let (outcome, _) = run(&[src.path().to_str().unwrap()], out.path(), "");

    let second = out.path().join("listdupes_output1.csv");
    assert!(second.exists());
    assert!(outcome.final_message.contains("listdupes_output1.csv"));
}

#[test]
fn test_archive_then_read_archive() {
    let out = tempdir().unwrap();
    let src = folder_with_pair();

    let (archived, _) = run(&["-a", src.path().to_str().unwrap()], out.path(), "");
    assert_eq!(archived.final_message, "The folder has been archived.");
    assert_eq!(archived.exit_code, ExitCode::Success);

    let archive = out.path().join("listdupes_folder_archive.json");
    assert!(archive.exists());

    let (outcome, _) = run(&["-r", archive.to_str().unwrap()], out.path(), "");
    assert_eq!(outcome.exit_code, ExitCode::Success);
    assert_eq!(outcome.summary.as_deref(), Some("1 duplicate was found."));
    assert!(out.path().join("listdupes_output.csv").exists());
    assert!(!out.path().join("listdupes_cache").exists());
}

#[test]
fn test_read_archive_rejects_invalid_file() {
    let out = tempdir().unwrap();
    let bogus = out.path().join("bogus.json");
    fs::write(&bogus, "{\"not\": \"an archive\"}").unwrap();

    let (outcome, _) = run(&["-r", bogus.to_str().unwrap()], out.path(), "");

    assert_eq!(
        outcome.final_message,
        "The file you have chosen is not a valid archive."
    );
    assert_eq!(outcome.exit_code, ExitCode::Degraded);
}

#[test]
fn test_read_archive_rejects_foreign_cache() {
    let out = tempdir().unwrap();
    let src = folder_with_pair();
    fs::write(
        out.path().join("listdupes_cache"),
        r#"{"archive_creation_time": 12.5, "archived_starting_path": "/x", "place": 0, "os_errors": {}, "paths_and_sums": []}"#,
    )
    .unwrap();

    run(&["-a", src.path().to_str().unwrap()], out.path(), "");
    let archive = out.path().join("listdupes_folder_archive.json");
    let (outcome, _) = run(&["-r", archive.to_str().unwrap()], out.path(), "");

    assert!(outcome
        .final_message
        .starts_with("The cache file is holding work which was done on another archive."));
    assert_eq!(outcome.exit_code, ExitCode::Degraded);
    assert!(!out.path().join("listdupes_output.csv").exists());
}

#[test]
fn test_interrupted_archive_run_keeps_cache() {
    let out = tempdir().unwrap();
    let src = folder_with_pair();
    run(&["-a", src.path().to_str().unwrap()], out.path(), "");
    let archive = out.path().join("listdupes_folder_archive.json");

    let err = run_with(
        &cli(&["-r", archive.to_str().unwrap()]),
        &config_in(out.path()),
        Arc::new(AtomicBool::new(true)),
        std::io::empty(),
        std::io::sink(),
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::Interrupted)
    ));
    assert!(!out.path().join("listdupes_output.csv").exists());
}

#[test]
fn test_filter_mode_streams_csv_with_one_label_row() {
    let out = tempdir().unwrap();
    let first = folder_with_pair();
    let second = folder_with_pair();
    let stdin = format!(
        "{}\n{}\n",
        first.path().display(),
        second.path().display()
    );

    let (outcome, stdout) = run(&["-f"], out.path(), &stdin);

    assert_eq!(outcome.exit_code, ExitCode::Success);
    assert_eq!(stdout.matches("File,Duplicates").count(), 1);
    assert_eq!(stdout.lines().count(), 3);
    assert!(!out.path().join("listdupes_output.csv").exists());
}

#[test]
fn test_filter_mode_bad_folder_gives_code_three() {
    let out = tempdir().unwrap();
    let good = folder_with_pair();
    let stdin = format!("/definitely/not/here\n{}\n", good.path().display());

    let (outcome, stdout) = run(&["-"], out.path(), &stdin);

    assert_eq!(outcome.exit_code, ExitCode::FilterIncomplete);
    assert!(stdout.contains("b.txt"));
}

#[test]
fn test_filter_mode_json_is_one_object_per_line() {
    let out = tempdir().unwrap();
    let first = folder_with_pair();
    let second = folder_with_pair();
    let stdin = format!(
        "{}\n{}\n",
        first.path().display(),
        second.path().display()
    );

    let (_, stdout) = run(&["-fj"], out.path(), &stdin);

    let objects: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(objects.len(), 2);
}
