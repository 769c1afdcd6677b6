//! CLI command routing: runs the handler for the parsed subcommand.

use anyhow::Result;

use crate::app::context::AppContext;
use crate::cli::{Command, SettingsCommand};
use crate::{ProcessExit, commands};

/// Runs `command` and returns the exit outcome it produced.
pub(crate) async fn dispatch(ctx: &mut AppContext, command: &Command) -> Result<ProcessExit> {
    match command {
        Command::Download(args) => commands::run_download_command(ctx, args).await,
        Command::Channel(args) => commands::run_channel_command(ctx, args).await,
        Command::Sweep(args) => commands::run_sweep_command(ctx, args),
        Command::History(args) => commands::run_history_command(ctx, args),
        Command::Probe(args) => commands::run_probe_command(ctx, args).await,
        Command::Convert(args) => commands::run_convert_command(ctx, args).await,
        Command::Settings { command } => match command {
            SettingsCommand::Show => commands::run_settings_show_command(ctx),
            SettingsCommand::Set { key, value } => {
                commands::run_settings_set_command(ctx, key, value)
            }
        },
        Command::Analysis(args) => commands::run_analysis_command(ctx, args),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::dispatch;
    use crate::ProcessExit;
    use crate::app::context::AppContext;
    use crate::cli::Cli;
    use clap::Parser;
    use quicktube_core::config::AppConfig;
    use quicktube_core::settings::Settings;
    use tempfile::TempDir;

    fn context(root: &TempDir) -> AppContext {
        AppContext {
            config: AppConfig::with_root(root.path()),
            settings: Settings::default(),
            quiet: true,
            interactive: false,
            use_progress_bar: false,
        }
    }

    #[tokio::test]
    async fn test_dispatch_settings_set_persists() {
        let root = TempDir::new().unwrap();
        let mut ctx = context(&root);
        let cli = Cli::parse_from(["quicktube", "settings", "set", "auto_convert", "true"]);

        let exit = dispatch(&mut ctx, &cli.command).await.unwrap();
        assert_eq!(exit, ProcessExit::Success);
        assert!(Settings::load(&ctx.config.settings_path()).auto_convert);
    }

    #[tokio::test]
    async fn test_dispatch_settings_set_rejects_unknown_key() {
        let root = TempDir::new().unwrap();
        let mut ctx = context(&root);
        let cli = Cli::parse_from(["quicktube", "settings", "set", "speed", "fast"]);
        assert!(dispatch(&mut ctx, &cli.command).await.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_sweep_on_missing_temp_dir_succeeds() {
        let root = TempDir::new().unwrap();
        let mut ctx = context(&root);
        let cli = Cli::parse_from(["quicktube", "sweep"]);
        let exit = dispatch(&mut ctx, &cli.command).await.unwrap();
        assert_eq!(exit, ProcessExit::Success);
    }
}
