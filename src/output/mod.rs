//! Output formatters for search results.
//!
//! This module provides the two output formats for duplicate groups:
//! - CSV for spreadsheet import
//! - JSON for automation and scripting
//!
//! plus the plain-text log of unread files.
//!
//! Nothing is written when no group has a member, and files are always
//! created exclusively so earlier results are never overwritten.
//!
//! # Example
//!
//! ```no_run
//! use listdupes::duplicates::{search_for_dupes, ChecksumConfig, ChecksumInput};
//! use listdupes::output::{write_any_items_to, OutputFormat};
//! use std::path::Path;
//!
//! let input = ChecksumInput::from_folder(Path::new("."), false, None);
//! let result = search_for_dupes(input, &ChecksumConfig::default()).unwrap();
//!
//! write_any_items_to(&result.dupes, OutputFormat::Json, std::io::stdout(), true).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod unread_log;

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::Dupes;

// Re-export main types
pub use self::csv::{CsvOutput, CsvOutputError};
pub use self::json::{JsonOutput, JsonOutputError};
pub use self::unread_log::{write_any_errors_to, write_errors_to};

/// Output format for the list of duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// A JSON object
    Json,
}

impl OutputFormat {
    /// File extension for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// Errors that can occur while writing results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The output file couldn't be created.
    #[error("Could not create {path}: {source}")]
    Create {
        /// Path of the output file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// CSV writing failed.
    #[error(transparent)]
    Csv(#[from] CsvOutputError),

    /// JSON writing failed.
    #[error(transparent)]
    Json(#[from] JsonOutputError),
}

/// Write the groups of `dupes` to `writer`, if any group has a member.
///
/// `labels` controls the CSV label row and is ignored for JSON. Returns
/// whether anything was written.
///
/// # Errors
///
/// Returns an [`OutputError`] if writing fails.
pub fn write_any_items_to<W: Write>(
    dupes: &Dupes,
    format: OutputFormat,
    mut writer: W,
    labels: bool,
) -> Result<bool, OutputError> {
    if dupes.duplicate_count() == 0 {
        return Ok(false);
    }

    match format {
        OutputFormat::Csv => CsvOutput::new(dupes).with_labels(labels).write_to(writer)?,
        OutputFormat::Json => JsonOutput::new(dupes).write_to(&mut writer)?,
    }
    Ok(true)
}

/// Create `path` exclusively and write the groups of `dupes` to it.
///
/// No file is created when there is nothing to write.
///
/// # Errors
///
/// Returns an [`OutputError`] if the file exists or writing fails.
pub fn write_any_items_to_file(
    dupes: &Dupes,
    format: OutputFormat,
    path: &Path,
) -> Result<bool, OutputError> {
    if dupes.duplicate_count() == 0 {
        return Ok(false);
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })?;
    let written = write_any_items_to(dupes, format, BufWriter::new(file), true)?;
    log::info!("Wrote {} groups to {}", dupes.len(), path.display());
    Ok(written)
}
