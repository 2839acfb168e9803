//! Exit code logic for the image-downloader process.
//!
//! Single responsibility: map a finished run to the process exit outcome.

use crate::ProcessExit;

/// Determines the process exit outcome from the final result count and
/// whether a requested archive export failed.
pub(crate) fn determine_exit_outcome(images: usize, export_failed: bool) -> ProcessExit {
    if export_failed || images == 0 {
        ProcessExit::Failure
    } else {
        ProcessExit::Success
    }
}
