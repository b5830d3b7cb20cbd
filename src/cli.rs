//! Command-line interface definitions for listdupes.
//!
//! # Example
//!
//! ```bash
//! # Check a folder, writing listdupes_output.csv to the home folder
//! listdupes ~/Pictures
//!
//! # Archive a large folder now, check it later (resumable)
//! listdupes -a /mnt/backup
//! listdupes -rp ~/listdupes_folder_archive.json
//!
//! # Act as a filter, one starting folder per line on stdin
//! find ~ -maxdepth 1 -type d | listdupes -f > dupes.csv
//! ```

use clap::Parser;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Check a folder and its subfolders for duplicate files.
///
/// Every file is compared by content except folders and anything whose
/// name starts with a period. The list of duplicates is written to
/// listdupes_output.csv in the home folder.
#[derive(Debug, Parser)]
#[command(name = "listdupes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The folder to check, or an archive file with -r (use - for stdin)
    #[arg(value_name = "STARTING_FOLDER")]
    pub starting_folder: Option<PathBuf>,

    /// Save the folder's file list to an archive, then exit
    #[arg(short, long, conflicts_with = "read_archive")]
    pub archive_folder: bool,

    /// Check the files listed in an archive, resuming any earlier work
    #[arg(short, long)]
    pub read_archive: bool,

    /// Take starting folders from stdin and stream results to stdout
    #[arg(short, long, conflicts_with_all = ["archive_folder", "read_archive"])]
    pub filter: bool,

    /// Write the output as JSON instead of CSV
    #[arg(short, long)]
    pub json: bool,

    /// Show the progress of the checks
    #[arg(short, long)]
    pub progress: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Whether starting folders come from stdin.
    #[must_use]
    pub fn is_filter_mode(&self) -> bool {
        self.filter || self.starting_folder.as_deref() == Some(Path::new("-"))
    }

    /// Selected output format.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Csv
        }
    }
}
