//! JSON output formatter.
//!
//! The mapping is written as a single object from each group key to the
//! list of its members:
//!
//! ```json
//! {"/photos/a.jpg": ["/backup/a.jpg", "/old/a.jpg"]}
//! ```

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::duplicates::Dupes;

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct JsonOutput {
    /// Group key to members
    pub groups: BTreeMap<String, Vec<String>>,
}

impl JsonOutput {
    /// Create a new JSON output from duplicate groups.
    #[must_use]
    pub fn new(dupes: &Dupes) -> Self {
        Self {
            groups: dupes
                .iter()
                .map(|(key, members)| {
                    (
                        key.to_string_lossy().into_owned(),
                        members
                            .iter()
                            .map(|m| m.to_string_lossy().into_owned())
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        serde_json::to_writer(&mut *writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
