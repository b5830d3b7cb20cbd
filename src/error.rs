//! Exit codes.

use serde::Serialize;

/// Exit codes for the listdupes application.
///
/// - 0: Success (with or without duplicates)
/// - 1: Degraded (files couldn't be read, or an early exit on an error)
/// - 3: Filter incomplete (a folder read from stdin did not fully succeed)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ExitCode {
    /// The run completed without any read errors.
    Success = 0,
    /// The run completed with read errors, or stopped early on an error.
    Degraded = 1,
    /// At least one folder in filter mode returned a non-zero code.
    FilterIncomplete = 3,
    /// The run was interrupted by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "LD000",
            Self::Degraded => "LD001",
            Self::FilterIncomplete => "LD003",
            Self::Interrupted => "LD130",
        }
    }

    /// Whether this code reports full success.
    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}
