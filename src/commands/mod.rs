//! CLI command handlers.

mod analysis;
mod channel;
mod convert;
mod download;
mod history;
mod probe;
mod session;
mod settings;
mod sweep;

pub(crate) use analysis::run_analysis_command;
pub(crate) use channel::run_channel_command;
pub(crate) use convert::run_convert_command;
pub(crate) use download::run_download_command;
pub(crate) use history::run_history_command;
pub(crate) use probe::run_probe_command;
pub(crate) use settings::{run_settings_set_command, run_settings_show_command};
pub(crate) use sweep::run_sweep_command;
