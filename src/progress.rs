//! Progress reporting utilities using indicatif.
//!
//! The engine never draws anything itself. It reports through
//! [`ProgressCallback`], and [`Progress`] renders those reports on stderr as
//! "Reading file N of M" and "Comparing file N of M".

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Phase name used while checksumming files.
pub const PHASE_READING: &str = "reading";

/// Phase name used while comparing checksums.
pub const PHASE_COMPARING: &str = "comparing";

/// Progress callback for the search phases.
///
/// Implement this trait to receive progress updates during a search.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_READING`] or [`PHASE_COMPARING`])
    /// * `total` - Number of items to process, or 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes, including when it is cut short.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter drawing a single bar on stderr.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use listdupes::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn counter_style(verb: &str) -> ProgressStyle {
        ProgressStyle::with_template(&format!("{verb} file {{pos}} of {{len}}. {{wide_msg}}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn spinner_style(verb: &str) -> ProgressStyle {
        ProgressStyle::with_template(&format!("{{spinner}} {verb} file {{pos}}. {{wide_msg}}"))
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let verb = match phase {
            PHASE_READING => "Reading",
            PHASE_COMPARING => "Comparing",
            other => other,
        };

        let pb = if total > 0 {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(Self::counter_style(verb));
            pb
        } else {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style(verb));
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        };
        pb.set_draw_target(ProgressDrawTarget::stderr());

        if let Ok(mut slot) = self.bar.lock() {
            if let Some(previous) = slot.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        if let Ok(slot) = self.bar.lock() {
            if let Some(ref pb) = *slot {
                pb.set_position(current as u64);
                pb.set_message(truncate_path(path, 40));
            }
        }
    }

    fn on_phase_end(&self, _phase: &str) {
        if self.quiet {
            return;
        }
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(pb) = slot.take() {
                pb.set_message("");
                pb.finish();
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
