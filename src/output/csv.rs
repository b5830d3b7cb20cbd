//! CSV output formatter.
//!
//! Each group is written as a row holding its key and first member,
//! followed by one row per further member with an empty first column:
//!
//! ```text
//! File,Duplicates
//! /photos/a.jpg,/backup/a.jpg
//! ,/old/a.jpg
//! /notes/b.txt,/notes/b copy.txt
//! ```

use std::io;

use thiserror::Error;

use crate::duplicates::Dupes;

/// Column labels written above the first row.
pub const DEFAULT_LABELS: [&str; 2] = ["File", "Duplicates"];

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    dupes: &'a Dupes,
    labels: bool,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter with the label row.
    #[must_use]
    pub fn new(dupes: &'a Dupes) -> Self {
        Self {
            dupes,
            labels: true,
        }
    }

    /// Include or omit the label row.
    #[must_use]
    pub fn with_labels(mut self, labels: bool) -> Self {
        self.labels = labels;
        self
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        if self.labels {
            csv_writer.write_record(DEFAULT_LABELS)?;
        }

        for (key, members) in self.dupes.iter() {
            let key = key.to_string_lossy();
            for (index, member) in members.iter().enumerate() {
                let first_column: &str = if index == 0 { &key } else { "" };
                let member = member.to_string_lossy();
                csv_writer.write_record([first_column, &*member])?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
