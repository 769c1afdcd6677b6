//! `quicktube channel`: every video of a channel.

use anyhow::Result;
use quicktube_core::sweeper::CleanupSweeper;
use quicktube_core::temp_store::TempStore;
use tracing::{info, warn};

use crate::ProcessExit;
use crate::app::config_runtime::apply_cookie_flags;
use crate::app::context::AppContext;
use crate::app::exit_handler::determine_exit_outcome;
use crate::cli::ChannelArgs;

use super::session::{Session, confirm, destination, download_options, print_failure, print_report};

/// How often stale temp files are swept during a long channel download.
const SWEEP_PERIOD: std::time::Duration = std::time::Duration::from_secs(60 * 60);

pub(crate) async fn run_channel_command(
    ctx: &mut AppContext,
    args: &ChannelArgs,
) -> Result<ProcessExit> {
    apply_cookie_flags(&mut ctx.config, &args.media)?;
    if !args.yes && !ctx.interactive {
        eprintln!("Refusing to download a whole channel without a terminal; pass --yes to confirm.");
        return Ok(ProcessExit::Usage);
    }

    let options = download_options(ctx, &args.media, None);
    let dest = destination(ctx, &args.media);
    let session = Session::start(ctx, &args.media);

    let entries = match session.engine.list_channel(&args.url, &options.cookies).await {
        Ok(entries) => entries,
        Err(e) => {
            print_failure(&session.bar, &args.url, &e);
            session.finish().await;
            return Ok(ProcessExit::Failure);
        }
    };

    let folder = entries
        .first()
        .map(|entry| dest.join(entry.folder_name()))
        .unwrap_or_else(|| dest.clone());
    if !args.yes {
        let question = format!(
            "Download {} videos into {}?",
            entries.len(),
            folder.display()
        );
        if !confirm(&session.bar, question).await? {
            session.finish().await;
            println!("Cancelled.");
            return Ok(ProcessExit::Success);
        }
    }

    let sweeper = CleanupSweeper::new(
        TempStore::new(&ctx.config.temp_dir),
        std::sync::Arc::clone(session.engine.registry()),
    )
    .with_threshold(ctx.config.stale_after)
    .spawn_periodic(SWEEP_PERIOD);

    let report = session.engine.download_entries(&entries, &dest, &options).await;
    sweeper.stop().await;

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            print_failure(&session.bar, &args.url, &e);
            session.finish().await;
            return Ok(ProcessExit::Failure);
        }
    };
    for job in &report.completed {
        print_report(&session.bar, job);
    }
    for (url, error) in &report.failed {
        print_failure(&session.bar, url, error);
    }
    session.finish().await;

    if report.failed.is_empty() {
        info!(total = report.total(), "channel complete");
    } else {
        warn!(failed = report.failed.len(), total = report.total(), "channel finished with failures");
    }
    if !ctx.quiet {
        println!(
            "\n{} of {} videos downloaded into {}",
            report.completed.len(),
            report.total(),
            folder.display()
        );
    }
    Ok(determine_exit_outcome(report.failed.len()))
}
