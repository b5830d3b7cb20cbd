//! listdupes - resumable duplicate file finder
//!
//! Files are compared by a CRC32 checksum of their contents. Large or slow
//! folders can be archived first and checked later from the archive; the
//! check saves its progress to a cache and resumes where it left off.

pub mod app;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod session;
pub mod signal;

pub use app::{run_app, run_with, Outcome};
