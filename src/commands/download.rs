//! `quicktube download`: one or more video URLs.

use anyhow::Result;
use tracing::info;

use crate::ProcessExit;
use crate::app::config_runtime::apply_cookie_flags;
use crate::app::context::AppContext;
use crate::app::exit_handler::determine_exit_outcome;
use crate::cli::DownloadArgs;

use super::session::{Session, destination, download_options, print_failure, print_report};

pub(crate) async fn run_download_command(
    ctx: &mut AppContext,
    args: &DownloadArgs,
) -> Result<ProcessExit> {
    apply_cookie_flags(&mut ctx.config, &args.media)?;
    let options = download_options(ctx, &args.media, args.section.clone());
    let dest = destination(ctx, &args.media);
    info!(count = args.urls.len(), dest = %dest.display(), "starting downloads");

    let session = Session::start(ctx, &args.media);
    let results = session
        .engine
        .download_batch(&args.urls, &dest, &options)
        .await;

    let mut failed = 0;
    for (url, result) in &results {
        match result {
            Ok(report) => print_report(&session.bar, report),
            Err(e) => {
                failed += 1;
                print_failure(&session.bar, url, e);
            }
        }
    }
    session.finish().await;

    if results.len() > 1 && !ctx.quiet {
        println!(
            "\n{} downloaded, {} failed",
            results.len() - failed,
            failed
        );
    }
    Ok(determine_exit_outcome(failed))
}
