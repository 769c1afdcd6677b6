//! Engine, progress UI and sweeper wiring shared by `download` and `channel`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use indicatif::ProgressBar;
use quicktube_core::download::{DownloadEngine, DownloadError, JobReport, channel};
use quicktube_core::job::JobRegistry;
use quicktube_core::reconcile::{ConflictChoice, ConflictResolver, FixedChoice, ReconciliationDecision};
use quicktube_core::sweeper::CleanupSweeper;
use quicktube_core::temp_store::TempStore;
use quicktube_core::ytdlp::{ClipSection, DownloadOptions};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::context::AppContext;
use crate::app::progress_ui::spawn_progress_ui;
use crate::app::prompt::PromptResolver;
use crate::cli::MediaArgs;
use crate::failure::{auth_suggestion, classify_failure};

/// A running download session; call [`Session::finish`] to flush the UI.
pub(crate) struct Session {
    pub(crate) engine: DownloadEngine,
    pub(crate) bar: ProgressBar,
    ui: JoinHandle<()>,
}

impl Session {
    /// Sweeps stale temp files, then builds the engine and UI consumer.
    pub(crate) fn start(ctx: &AppContext, media: &MediaArgs) -> Self {
        let registry = Arc::new(JobRegistry::new());
        sweep_on_start(ctx, &registry);

        let bar = ctx.progress_bar();
        let (tx, rx) = channel();
        let ui = spawn_progress_ui(bar.clone(), rx);

        let resolver: Arc<dyn ConflictResolver> = match media.on_conflict.fixed_choice() {
            Some(choice) => Arc::new(FixedChoice(choice)),
            None if ctx.interactive => Arc::new(PromptResolver::new(bar.clone())),
            None => {
                warn!("stdin is not a terminal; existing files will be kept (use --on-conflict)");
                Arc::new(FixedChoice(ConflictChoice::Skip))
            }
        };

        let engine = DownloadEngine::new(ctx.config.clone(), registry, resolver)
            .with_updates(tx)
            .with_post_processing(ctx.settings.check_compatibility, ctx.settings.auto_convert);
        Self { engine, bar, ui }
    }

    /// Drops the engine (closing the update channel) and waits for the UI.
    pub(crate) async fn finish(self) {
        let Self { engine, bar, ui } = self;
        drop(engine);
        if let Err(e) = ui.await {
            debug!(error = %e, "progress UI task ended abnormally");
        }
        bar.finish_and_clear();
    }
}

fn sweep_on_start(ctx: &AppContext, registry: &Arc<JobRegistry>) {
    let sweeper = CleanupSweeper::new(TempStore::new(&ctx.config.temp_dir), Arc::clone(registry))
        .with_threshold(ctx.config.stale_after);
    if let Err(e) = sweeper.sweep() {
        warn!(error = %e, "startup sweep of the temp folder failed");
    }
}

/// Saved settings overlaid with command-line flags.
pub(crate) fn download_options(
    ctx: &AppContext,
    media: &MediaArgs,
    section: Option<ClipSection>,
) -> DownloadOptions {
    let mut options = ctx.settings.download_options();
    if let Some(quality) = media.quality {
        options.quality = quality;
    }
    if let Some(format) = media.format {
        options.format = format;
    }
    options.audio_only |= media.audio_only;
    options.section = section;
    options.cookies = ctx.config.cookies.clone();
    options
}

/// `--dest`, then the saved download folder, then the configured default.
pub(crate) fn destination(ctx: &AppContext, media: &MediaArgs) -> PathBuf {
    media
        .dest
        .clone()
        .or_else(|| ctx.settings.download_folder.clone())
        .unwrap_or_else(|| ctx.config.download_dir.clone())
}

pub(crate) fn print_report(bar: &ProgressBar, report: &JobReport) {
    let title = report.title.as_deref().unwrap_or(&report.url);
    let line = match (&report.decision, &report.final_path) {
        (ReconciliationDecision::Skip, _) | (_, None) => {
            format!("skipped  {title} (already in destination)")
        }
        (decision, Some(path)) => format!("saved    {} ({decision})", path.display()),
    };
    bar.suspend(|| println!("{line}"));

    if let Some(info) = &report.compatibility
        && info.needs_conversion()
    {
        let hint = match &report.converted {
            Some(converted) => format!("         converted copy: {}", converted.display()),
            None => format!(
                "         {} playback compatibility; try `quicktube convert`",
                info.compatibility
            ),
        };
        bar.suspend(|| println!("{hint}"));
    }
}

pub(crate) fn print_failure(bar: &ProgressBar, url: &str, error: &DownloadError) {
    let message = error.to_string();
    let descriptor = classify_failure(&message);
    let fix = auth_suggestion(&message).unwrap_or(descriptor.fix);
    let detail = message
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with("Suggestion:"))
        .map(|line| format!("   {}", line.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    bar.suspend(|| {
        eprintln!(
            "{} [{}] {}: {}\n{}\n   {}\n   Fix: {}",
            descriptor.category.icon(),
            descriptor.category.label(),
            descriptor.what,
            url,
            detail,
            descriptor.why,
            fix
        );
    });
}

/// Confirmation on stdin; end of input counts as "no".
pub(crate) async fn confirm(bar: &ProgressBar, question: String) -> Result<bool> {
    let bar = bar.clone();
    let answer = tokio::task::spawn_blocking(move || {
        bar.suspend(|| {
            use std::io::{BufRead, Write};
            eprint!("{question} [y/N] ");
            let _ = std::io::stderr().flush();
            let mut line = String::new();
            match std::io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => false,
                Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            }
        })
    })
    .await?;
    Ok(answer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use quicktube_core::config::AppConfig;
    use quicktube_core::settings::Settings;
    use quicktube_core::ytdlp::{CookieSource, OutputFormat, Quality};

    fn ctx() -> AppContext {
        let mut config = AppConfig::with_root(&PathBuf::from("/data"));
        config.cookies = CookieSource::Browser("firefox".to_string());
        let settings = Settings {
            video_quality: Quality::MaxHeight(720),
            download_folder: Some(PathBuf::from("/saved")),
            ..Settings::default()
        };
        AppContext {
            config,
            settings,
            quiet: false,
            interactive: false,
            use_progress_bar: false,
        }
    }

    #[test]
    fn test_download_options_overlay_flags_on_settings() {
        let ctx = ctx();
        let options = download_options(&ctx, &MediaArgs::default(), None);
        assert_eq!(options.quality, Quality::MaxHeight(720));
        assert_eq!(options.cookies, CookieSource::Browser("firefox".to_string()));

        let media = MediaArgs {
            quality: Some(Quality::Best),
            format: Some(OutputFormat::Mkv),
            audio_only: true,
            ..MediaArgs::default()
        };
        let options = download_options(&ctx, &media, None);
        assert_eq!(options.quality, Quality::Best);
        assert_eq!(options.format, OutputFormat::Mkv);
        assert!(options.audio_only);
    }

    #[test]
    fn test_destination_priority() {
        let mut ctx = ctx();
        let flagged = MediaArgs {
            dest: Some(PathBuf::from("/flag")),
            ..MediaArgs::default()
        };
        assert_eq!(destination(&ctx, &flagged), PathBuf::from("/flag"));
        assert_eq!(destination(&ctx, &MediaArgs::default()), PathBuf::from("/saved"));
        ctx.settings.download_folder = None;
        assert_eq!(
            destination(&ctx, &MediaArgs::default()),
            PathBuf::from("/data/downloads")
        );
    }
}
