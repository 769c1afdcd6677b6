//! `quicktube convert`: re-encode a file for wider playback.

use anyhow::{Context, Result, bail};
use quicktube_core::codec::{ConversionPlan, convert, default_output_path, probe};
use tracing::warn;

use crate::ProcessExit;
use crate::app::context::AppContext;
use crate::app::progress_ui::to_position;
use crate::cli::ConvertArgs;

pub(crate) async fn run_convert_command(ctx: &AppContext, args: &ConvertArgs) -> Result<ProcessExit> {
    if !args.file.is_file() {
        bail!("{} is not a file", args.file.display());
    }
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.file));
    let plan = ConversionPlan {
        video: args.video,
        audio: !args.keep_audio,
    };

    let duration = match probe(&ctx.config.ffprobe_path, &args.file).await {
        Ok(info) => info.duration,
        Err(e) => {
            warn!(error = %e, "could not read duration; progress will not be shown");
            0.0
        }
    };

    let bar = ctx.progress_bar();
    bar.set_message(format!("converting {}", args.file.display()));
    convert(
        &ctx.config.ffmpeg_path,
        &args.file,
        &output,
        plan,
        duration,
        |progress| {
            if let Some(percent) = progress.percent {
                bar.set_position(to_position(percent));
            }
        },
    )
    .await
    .with_context(|| format!("Cannot convert {}", args.file.display()))?;
    bar.finish_and_clear();

    println!("saved    {}", output.display());
    Ok(ProcessExit::Success)
}
