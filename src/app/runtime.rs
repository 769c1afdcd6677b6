use std::io::{self, IsTerminal};

use anyhow::Result;
use quicktube_core::settings::Settings;
use tracing::{debug, info};

use crate::ProcessExit;
use crate::app::{command_dispatcher, config_runtime, context, terminal};
use crate::app_config::load_default_file_config;

pub(crate) async fn run_quicktube() -> Result<ProcessExit> {
    let (cli, cli_sources) = config_runtime::parse_cli_with_sources();

    let loaded = match load_default_file_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return Ok(ProcessExit::Usage);
        }
    };
    let file_config = loaded.config.as_ref();

    let verbosity = config_runtime::resolve_verbosity(&cli, &cli_sources, file_config);
    let default_level = config_runtime::resolve_default_log_level(&verbosity);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    let no_color = terminal::is_no_color_requested(cli.no_color);
    terminal::init_tracing(default_level, force_cli_log_level, no_color);

    if loaded.loaded_from_file()
        && let Some(path) = &loaded.path
    {
        debug!(path = %path.display(), "config file loaded");
    }

    let config = match config_runtime::build_app_config(file_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return Ok(ProcessExit::Usage);
        }
    };
    let settings = Settings::load(&config.settings_path());
    info!(temp_dir = %config.temp_dir.display(), "quicktube starting");

    let mut ctx = context::AppContext {
        config,
        settings,
        quiet: verbosity.quiet,
        interactive: io::stdin().is_terminal(),
        use_progress_bar: terminal::should_use_progress_bar(
            io::stderr().is_terminal(),
            verbosity.quiet,
            terminal::is_dumb_terminal(),
        ),
    };

    command_dispatcher::dispatch(&mut ctx, &cli.command).await
}
