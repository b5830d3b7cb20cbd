//! Top-level run logic shared by the binary and the integration tests.
//!
//! [`run_app`] wires process-wide concerns (logging, colors, Ctrl+C,
//! configuration) and hands over to [`run_with`], which takes its inputs
//! explicitly so it can be driven against temporary folders.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use yansi::Paint;

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{
    search_for_dupes, ChecksumConfig, ChecksumInput, FinderError, SearchResult,
};
use crate::error::ExitCode;
use crate::logging;
use crate::output::{
    write_any_errors_to, write_any_items_to, write_any_items_to_file, OutputFormat,
};
use crate::progress::Progress;
use crate::scanner::{expand_home, starting_path_problem, OutputPaths, Walker};
use crate::session::{read_archive, remove_cache, write_archive, Archive, ReadErrors};
use crate::signal;

/// How a run ended, when it ended on its own terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Line printed last (may be empty)
    pub final_message: String,
    /// Process exit code
    pub exit_code: ExitCode,
    /// Summary of the search, if one ran
    pub summary: Option<String>,
}

impl Outcome {
    fn new(final_message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            final_message: final_message.into(),
            exit_code,
            summary: None,
        }
    }

    /// A run that stopped before doing its work.
    fn early(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::Degraded)
    }
}

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns [`FinderError::Interrupted`] (inside the `anyhow::Error`) when
/// the user pressed Ctrl+C, or any unexpected failure.
pub fn run_app(cli: Cli) -> Result<Outcome> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color || !io::stderr().is_terminal() {
        yansi::disable();
    }

    let shutdown_flag = signal::install_handler()?;
    let config = Config::load();
    log::debug!("Using config: {:?}", config);

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    run_with(&cli, &config, shutdown_flag, stdin, stdout)
}

/// Run with explicit configuration and streams.
///
/// Output files go to the configured output folder. In filter mode
/// starting folders are read from `stdin` and results are streamed to
/// `stdout`; otherwise `stdout` only receives results that couldn't be
/// saved to a file.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with<R: BufRead, W: Write>(
    cli: &Cli,
    config: &Config,
    shutdown_flag: Arc<AtomicBool>,
    stdin: R,
    mut stdout: W,
) -> Result<Outcome> {
    let format = cli.output_format();
    let (output_dir, location) = config.output_dir()?;
    let paths = match OutputPaths::make(&output_dir, location, format.extension()) {
        Ok(paths) => paths,
        Err(e) => return Ok(Outcome::early(e.to_string())),
    };
    log::debug!("Output paths: {:?}", paths);

    let mut checksum_config = ChecksumConfig::default()
        .with_chunk_size(config.chunk_size)
        .with_shutdown_flag(Arc::clone(&shutdown_flag));
    if cli.progress {
        checksum_config =
            checksum_config.with_progress_callback(Arc::new(Progress::new(cli.quiet)));
    }

    if cli.is_filter_mode() {
        return run_filter(
            stdin,
            &mut stdout,
            &paths.unread_files_log,
            format,
            &checksum_config,
            cli.progress,
        );
    }

    let starting_path = cli.starting_folder.as_deref().map(expand_home);
    if let Some(problem) = starting_path_problem(starting_path.as_deref(), cli.read_archive) {
        return Ok(Outcome::early(problem));
    }
    let Some(starting_path) = starting_path else {
        return Ok(Outcome::early("A starting folder is required."));
    };

    if cli.archive_folder {
        return archive_folder(&starting_path, &paths.folder_archive, shutdown_flag, cli.progress);
    }

    let cache_path = config.cache_path()?;
    let input = if cli.read_archive {
        if let Some(interval) = config.checkpoint_interval {
            checksum_config = checksum_config.with_checkpoint_interval(interval);
        }
        match open_archive(&starting_path, &cache_path) {
            Ok(input) => input,
            Err(message) => return Ok(Outcome::early(message)),
        }
    } else {
        ChecksumInput::from_folder(&starting_path, cli.progress, Some(shutdown_flag))
    };

    let SearchResult { dupes, status } = match search_for_dupes(input, &checksum_config) {
        Ok(result) => result,
        Err(e @ FinderError::Disconnected { .. }) => return Ok(Outcome::early(e.to_string())),
        Err(e) => return Err(e.into()),
    };
    eprintln!("{}", status.description);

    write_unread_log(&paths.unread_files_log, &dupes.checksum_result().os_errors, false);

    if let Err(e) = write_any_items_to_file(&dupes, format, &paths.output_file) {
        log::error!("{}", e);
        let notice = format!(
            "An error prevented the app from saving its results.\n\
             To recover the results copy the text below into an empty\n\
             text file and give it a name that ends with .{}",
            format.extension()
        );
        eprintln!("{}", notice.magenta());
        write_any_items_to(&dupes, format, &mut stdout, true)?;
        stdout.flush()?;
        return Ok(Outcome {
            summary: Some(status.description),
            ..Outcome::early("")
        });
    }

    if cli.read_archive {
        if let Err(e) = remove_cache(&cache_path) {
            log::warn!("{}", e);
        }
    }

    let final_message = if dupes.duplicate_count() > 0 {
        format!(
            "The list of duplicates has been saved to {}.",
            paths.output_file.display()
        )
    } else {
        String::new()
    };

    Ok(Outcome {
        final_message,
        exit_code: status.exit_code,
        summary: Some(status.description),
    })
}

/// Record every file beneath `folder` in a new archive at `archive_path`.
fn archive_folder(
    folder: &Path,
    archive_path: &Path,
    shutdown_flag: Arc<AtomicBool>,
    show_work: bool,
) -> Result<Outcome> {
    if show_work {
        eprintln!("Gathering files...");
    }
    let root = folder
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", folder.display()))?;

    let sub_paths = Walker::new(&root)
        .with_shutdown_flag(Arc::clone(&shutdown_flag))
        .collect_sorted();
    if shutdown_flag.load(Ordering::SeqCst) {
        return Err(FinderError::Interrupted.into());
    }

    log::info!(
        "Archiving {} paths beneath {} to {}",
        sub_paths.len(),
        root.display(),
        archive_path.display()
    );
    write_archive(archive_path, &Archive::new(root, sub_paths))?;
    Ok(Outcome::new("The folder has been archived.", ExitCode::Success))
}

/// Load an archive and any cache bound to it.
///
/// Problems the user can fix are returned as the message to show.
fn open_archive(archive_path: &Path, cache_path: &Path) -> Result<ChecksumInput, String> {
    let archive = read_archive(archive_path).map_err(|e| e.to_string())?;

    if let Some(age) = archive.age_description(Utc::now()) {
        let notice = format!("This archive was made over {age} ago.");
        eprintln!("{}", notice.bold());
    }

    ChecksumInput::from_archive(&archive, cache_path).map_err(|e| e.to_string())
}

/// Write the unread files log, telling the user if that fails.
fn write_unread_log(path: &Path, errors: &ReadErrors, append: bool) {
    match write_any_errors_to(path, errors, append) {
        Ok(_) => {}
        Err(e) => {
            log::debug!("Failed to write {}: {}", path.display(), e);
            eprintln!("A log of the unread files couldn't be written.");
        }
    }
}

/// Check each starting folder read from `stdin`, streaming to `stdout`.
///
/// CSV labels are written once, before the first rows. Read errors from
/// every folder are appended to one log. The exit code is
/// [`ExitCode::FilterIncomplete`] if any folder didn't fully succeed.
fn run_filter<R: BufRead, W: Write>(
    stdin: R,
    stdout: &mut W,
    log_path: &Path,
    format: OutputFormat,
    config: &ChecksumConfig,
    show_work: bool,
) -> Result<Outcome> {
    if show_work {
        eprintln!("Processing input stream...");
    }

    let mut labels = true;
    let mut worst = ExitCode::Success;

    for line in stdin.lines() {
        let line = line.context("Failed to read a starting folder from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let folder: PathBuf = expand_home(Path::new(line.trim_end_matches('\r')));

        if let Some(problem) = starting_path_problem(Some(&folder), false) {
            log::warn!("Skipping {}: {}", folder.display(), problem);
            worst = worst.max(ExitCode::Degraded);
            continue;
        }

        let input = ChecksumInput::from_folder(&folder, show_work, config.shutdown_flag.clone());
        let SearchResult { dupes, status } = match search_for_dupes(input, config) {
            Ok(result) => result,
            Err(e @ FinderError::Disconnected { .. }) => {
                eprintln!("{}", e);
                worst = worst.max(ExitCode::Degraded);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        log::info!("{}: {}", folder.display(), status.description);

        if write_any_items_to(&dupes, format, &mut *stdout, labels)? {
            if format == OutputFormat::Json {
                writeln!(stdout)?;
            }
            labels = false;
        }
        stdout.flush()?;

        write_unread_log(log_path, &dupes.checksum_result().os_errors, true);
        worst = worst.max(status.exit_code);
    }

    let exit_code = if worst.is_success() {
        ExitCode::Success
    } else {
        ExitCode::FilterIncomplete
    };
    Ok(Outcome::new("", exit_code))
}
