//! Shared runtime context built after CLI and config handling.

use indicatif::ProgressBar;
use quicktube_core::config::AppConfig;
use quicktube_core::settings::Settings;

/// Resolved configuration plus terminal capabilities for command handlers.
pub(crate) struct AppContext {
    pub(crate) config: AppConfig,
    pub(crate) settings: Settings,
    pub(crate) quiet: bool,
    pub(crate) interactive: bool,
    pub(crate) use_progress_bar: bool,
}

impl AppContext {
    /// A progress bar drawn to stderr, or a hidden one when output is not a terminal.
    pub(crate) fn progress_bar(&self) -> ProgressBar {
        if self.use_progress_bar {
            ProgressBar::new(100)
        } else {
            ProgressBar::hidden()
        }
    }
}
