//! quicktube: download YouTube videos and channels through yt-dlp.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;
mod commands;
mod failure;
mod search;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Everything requested succeeded.
    Success,
    /// At least one job or command failed.
    Failure,
    /// Bad configuration or a refused non-interactive run.
    Usage,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Usage => 2,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_quicktube().await {
        Ok(exit) => ExitCode::from(exit.code()),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(ProcessExit::Failure.code())
        }
    }
}
