//! Merging CLI flags, the config file and built-in defaults.

use anyhow::{Context, Result};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use quicktube_core::config::AppConfig;

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::{Cli, MediaArgs};

/// Which global flags the user typed, as opposed to clap defaults.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
    pub(crate) debug: bool,
}

/// Effective log verbosity after the config file is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Verbosity {
    pub(crate) verbose: u8,
    pub(crate) quiet: bool,
    pub(crate) debug: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Cli, CliValueSources) {
    let command = Cli::command();
    let matches = command.get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let sources = CliValueSources {
        verbose: is_commandline_value(&matches, "verbose"),
        quiet: is_commandline_value(&matches, "quiet"),
        debug: is_commandline_value(&matches, "debug"),
    };
    (cli, sources)
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// CLI verbosity flags win; otherwise the config file's `verbosity` applies.
pub(crate) fn resolve_verbosity(
    cli: &Cli,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Verbosity {
    let from_cli = Verbosity {
        verbose: cli.verbose,
        quiet: cli.quiet,
        debug: cli.debug,
    };
    if should_force_cli_log_level(cli_sources) {
        return from_cli;
    }
    match file_config.and_then(|cfg| cfg.verbosity) {
        Some(VerbositySetting::Default) | None => from_cli,
        Some(VerbositySetting::Verbose) => Verbosity {
            verbose: 1,
            ..Verbosity::default()
        },
        Some(VerbositySetting::Quiet) => Verbosity {
            quiet: true,
            ..Verbosity::default()
        },
        Some(VerbositySetting::Debug) => Verbosity {
            debug: true,
            ..Verbosity::default()
        },
    }
}

pub(crate) fn resolve_default_log_level(verbosity: &Verbosity) -> &'static str {
    if verbosity.quiet {
        "error"
    } else if verbosity.debug {
        "trace"
    } else {
        match verbosity.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet || cli_sources.debug
}

/// Built-in defaults overlaid with the config file.
pub(crate) fn build_app_config(file_config: Option<&FileConfig>) -> Result<AppConfig> {
    let mut config = AppConfig::from_env().context("Cannot determine the data directory")?;
    let Some(file) = file_config else {
        return Ok(config);
    };

    if let Some(data_dir) = &file.data_dir {
        let download_dir = config.download_dir.clone();
        config = AppConfig::with_root(data_dir);
        config.download_dir = download_dir;
    }
    if let Some(temp_dir) = &file.temp_dir {
        config.temp_dir.clone_from(temp_dir);
    }
    if let Some(download_dir) = &file.download_dir {
        config.download_dir.clone_from(download_dir);
    }
    if let Some(path) = &file.ytdlp_path {
        config.ytdlp_path.clone_from(path);
    }
    if let Some(path) = &file.ffprobe_path {
        config.ffprobe_path.clone_from(path);
    }
    if let Some(path) = &file.ffmpeg_path {
        config.ffmpeg_path.clone_from(path);
    }
    if let Some(hours) = file.stale_after_hours {
        config.set_stale_after_hours(hours)?;
    }
    config.set_cookies(file.cookies_file.clone(), file.cookies_from_browser.clone())?;
    Ok(config)
}

/// `--cookies`/`--cookies-from-browser` replace whatever the file configured.
pub(crate) fn apply_cookie_flags(config: &mut AppConfig, media: &MediaArgs) -> Result<()> {
    if media.cookies.is_some() || media.cookies_from_browser.is_some() {
        config.set_cookies(media.cookies.clone(), media.cookies_from_browser.clone())?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use quicktube_core::ytdlp::CookieSource;
    use std::path::PathBuf;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_file_verbosity_applies_without_cli_flags() {
        let file = FileConfig {
            verbosity: Some(VerbositySetting::Quiet),
            ..FileConfig::default()
        };
        let resolved = resolve_verbosity(
            &cli(&["quicktube", "sweep"]),
            &CliValueSources::default(),
            Some(&file),
        );
        assert!(resolved.quiet);
        assert_eq!(resolve_default_log_level(&resolved), "error");
    }

    #[test]
    fn test_cli_verbosity_beats_file() {
        let file = FileConfig {
            verbosity: Some(VerbositySetting::Quiet),
            ..FileConfig::default()
        };
        let sources = CliValueSources {
            verbose: true,
            ..CliValueSources::default()
        };
        let resolved = resolve_verbosity(&cli(&["quicktube", "-v", "sweep"]), &sources, Some(&file));
        assert!(!resolved.quiet);
        assert_eq!(resolve_default_log_level(&resolved), "debug");
        assert!(should_force_cli_log_level(&sources));
    }

    #[test]
    fn test_log_levels() {
        let level = |verbose, quiet, debug| {
            resolve_default_log_level(&Verbosity {
                verbose,
                quiet,
                debug,
            })
        };
        assert_eq!(level(0, false, false), "info");
        assert_eq!(level(2, false, false), "trace");
        assert_eq!(level(0, false, true), "trace");
        assert_eq!(level(3, true, false), "error");
    }

    #[test]
    fn test_cookie_flags_override_file() {
        let mut config = AppConfig::with_root(&PathBuf::from("/data"));
        config.cookies = CookieSource::Browser("chrome".to_string());
        let media = MediaArgs {
            cookies: Some(PathBuf::from("/tmp/cookies.txt")),
            ..MediaArgs::default()
        };
        apply_cookie_flags(&mut config, &media).unwrap();
        assert_eq!(config.cookies, CookieSource::File(PathBuf::from("/tmp/cookies.txt")));

        apply_cookie_flags(&mut config, &MediaArgs::default()).unwrap();
        assert_eq!(config.cookies, CookieSource::File(PathBuf::from("/tmp/cookies.txt")));
    }
}
