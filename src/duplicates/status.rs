//! Human-readable summary of a search.

use crate::error::ExitCode;

/// Outcome of a search: a one-line description and the exit code it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStatus {
    /// Summary line shown to the user
    pub description: String,
    /// [`ExitCode::Success`] unless files couldn't be read
    pub exit_code: ExitCode,
}

/// Summarize `duplicates` found and `unread` files skipped.
///
/// ```
/// use listdupes::duplicates::describe;
///
/// assert_eq!(describe(0, 0).description, "No duplicates were found.");
/// assert_eq!(describe(2, 0).description, "2 duplicates were found.");
/// assert_eq!(
///     describe(1, 3).description,
///     "1 duplicate was found, however 3 files couldn't be read."
/// );
/// ```
#[must_use]
pub fn describe(duplicates: usize, unread: usize) -> SearchStatus {
    let found = match duplicates {
        0 => "No duplicates were found".to_string(),
        1 => "1 duplicate was found".to_string(),
        n => format!("{n} duplicates were found"),
    };

    if unread == 0 {
        return SearchStatus {
            description: format!("{found}."),
            exit_code: ExitCode::Success,
        };
    }

    let files = if unread == 1 { "file" } else { "files" };
    SearchStatus {
        description: format!("{found}, however {unread} {files} couldn't be read."),
        exit_code: ExitCode::Degraded,
    }
}
