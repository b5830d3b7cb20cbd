//! Plain-text log of files that couldn't be read.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::session::ReadErrors;

/// Write one line per record to `writer`.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_errors_to<W: Write>(writer: &mut W, errors: &ReadErrors) -> io::Result<()> {
    for (_, record) in errors.iter() {
        writeln!(
            writer,
            "'{}' raised '{}' and was not read.",
            record.path.display(),
            record.message
        )?;
    }
    Ok(())
}

/// Write `errors` to the log at `path`, if there are any.
///
/// The file is created exclusively unless `append` is set, in which case
/// lines are added to an existing log. Returns whether anything was written.
///
/// # Errors
///
/// Returns an I/O error if the file can't be opened or written.
pub fn write_any_errors_to(path: &Path, errors: &ReadErrors, append: bool) -> io::Result<bool> {
    if errors.is_empty() {
        return Ok(false);
    }

    let mut options = OpenOptions::new();
    if append {
        options.append(true).create(true);
    } else {
        options.write(true).create_new(true);
    }
    let mut writer = BufWriter::new(options.open(path)?);
    write_errors_to(&mut writer, errors)?;
    writer.flush()?;

    log::info!("Logged {} unread files to {}", errors.len(), path.display());
    Ok(true)
}
