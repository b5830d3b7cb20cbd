//! Ctrl+C handling.
//!
//! Ctrl+C does not kill the process. It raises a shared flag that the
//! walker and the checksum loop poll between files. The loop then saves its
//! progress and returns `FinderError::Interrupted`, which `main` turns into
//! exit code 130.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// The flag raised by the process-wide hook, once it is registered.
static SHUTDOWN_FLAG: Mutex<Option<Arc<AtomicBool>>> = Mutex::new(None);

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The operating system refused the hook, or another one is registered.
    #[error("Failed to install the Ctrl+C handler: {0}")]
    Install(#[from] ctrlc::Error),
}

/// Register the Ctrl+C hook and return the flag it raises.
///
/// The hook is registered once per process. Later calls lower the flag and
/// return the same one, so a process can run several searches in turn.
///
/// # Errors
///
/// Returns [`SignalError::Install`] if the hook can't be registered.
pub fn install_handler() -> Result<Arc<AtomicBool>, SignalError> {
    let mut installed = SHUTDOWN_FLAG
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(flag) = installed.as_ref() {
        flag.store(false, Ordering::SeqCst);
        return Ok(Arc::clone(flag));
    }

    let flag = Arc::new(AtomicBool::new(false));
    let raised_by_hook = Arc::clone(&flag);
    ctrlc::set_handler(move || {
        raised_by_hook.store(true, Ordering::SeqCst);
        log::info!("Interrupt received, stopping after the current file");
    })?;

    *installed = Some(Arc::clone(&flag));
    Ok(flag)
}
