//! Exit code logic for the quicktube process.

use crate::ProcessExit;

/// Maps job counts to the process exit outcome; any failure is a failure.
pub(crate) fn determine_exit_outcome(failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    }
}
