//! `quicktube sweep`: delete stale temp files now.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use quicktube_core::job::JobRegistry;
use quicktube_core::sweeper::CleanupSweeper;
use quicktube_core::temp_store::TempStore;

use crate::ProcessExit;
use crate::app::context::AppContext;
use crate::cli::SweepArgs;

pub(crate) fn run_sweep_command(ctx: &AppContext, args: &SweepArgs) -> Result<ProcessExit> {
    let threshold = args
        .max_age_hours
        .map_or(ctx.config.stale_after, |hours| Duration::from_secs(hours * 3600));
    let sweeper = CleanupSweeper::new(
        TempStore::new(&ctx.config.temp_dir),
        Arc::new(JobRegistry::new()),
    )
    .with_threshold(threshold);

    let report = sweeper
        .sweep()
        .with_context(|| format!("Cannot sweep {}", ctx.config.temp_dir.display()))?;

    if !ctx.quiet {
        for path in &report.deleted {
            println!("deleted  {}", path.display());
        }
        println!(
            "{} stale file(s) removed from {} (older than {}h)",
            report.deleted.len(),
            ctx.config.temp_dir.display(),
            threshold.as_secs() / 3600
        );
    }
    for path in &report.failed {
        eprintln!("could not delete {}", path.display());
    }
    Ok(if report.failed.is_empty() {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    })
}
