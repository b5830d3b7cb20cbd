//! Path validation and collision-free output names.
//!
//! Output files are never overwritten. When `listdupes_output.csv` already
//! exists the next free name among `listdupes_output1.csv`,
//! `listdupes_output2.csv`, ... is used, giving up after
//! [`MAX_UNIQUE_ATTEMPTS`] tries.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Number of numeric suffixes tried before giving up on a unique name.
pub const MAX_UNIQUE_ATTEMPTS: u32 = 255;

/// Errors raised while choosing output file names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Every candidate name for an output file is taken.
    #[error("Your {location} has a lot of {description}s. Clean up to proceed.")]
    Exhausted {
        /// What the file is for, e.g. "output file"
        description: String,
        /// Human name of the destination folder
        location: String,
    },
}

/// Return `path` if it is free, otherwise the first free `stemN.ext` sibling.
///
/// Returns `None` when all [`MAX_UNIQUE_ATTEMPTS`] candidates exist.
#[must_use]
pub fn make_file_path_unique(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        return Some(path.to_path_buf());
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..=MAX_UNIQUE_ATTEMPTS)
        .map(|suffix| parent.join(format!("{stem}{suffix}{extension}")))
        .find(|candidate| !candidate.exists())
}

/// The files a run may create, each with a name nothing else is using.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// CSV or JSON list of duplicates
    pub output_file: PathBuf,
    /// Plain-text log of files that couldn't be read
    pub unread_files_log: PathBuf,
    /// JSON archive written by `--archive-folder`
    pub folder_archive: PathBuf,
}

impl OutputPaths {
    /// Pick unique names for every output file inside `dir`.
    ///
    /// `location` names the folder in error messages ("home folder").
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Exhausted`] naming the first kind of file whose
    /// names have run out.
    pub fn make(dir: &Path, location: &str, output_extension: &str) -> Result<Self, PathError> {
        let unique = |file_name: String, description: &str| {
            make_file_path_unique(&dir.join(file_name)).ok_or_else(|| PathError::Exhausted {
                description: description.to_string(),
                location: location.to_string(),
            })
        };

        Ok(Self {
            output_file: unique(format!("listdupes_output.{output_extension}"), "output file")?,
            unread_files_log: unique(
                "listdupes_unread_files_log.txt".to_string(),
                "unread files log",
            )?,
            folder_archive: unique(
                "listdupes_folder_archive.json".to_string(),
                "folder archive",
            )?,
        })
    }
}

/// Describe why a starting path can't be used, or `None` if it is fine.
///
/// In archive mode the path must be an existing file, otherwise it must
/// be an existing folder.
#[must_use]
pub fn starting_path_problem(path: Option<&Path>, read_archive: bool) -> Option<&'static str> {
    let problem = match (path, read_archive) {
        (None, true) => "An archive file is required.",
        (Some(p), true) if !p.exists() => "No such file exist at that location.",
        (Some(p), true) if p.is_dir() => "The starting path must be a file.",
        (None, false) => "A starting folder is required.",
        (Some(p), false) if !p.exists() => "No such folder exist at that location.",
        (Some(p), false) if !p.is_dir() => "The starting path must be a folder.",
        _ => return None,
    };
    Some(problem)
}

/// Expand a leading `~` to the user's home folder.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}
