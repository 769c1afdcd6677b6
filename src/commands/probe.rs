//! `quicktube probe`: playback compatibility of a file or folder.

use anyhow::{Context, Result, bail};
use quicktube_core::codec::{CompatibilitySummary, MediaInfo, batch_analyze, probe};

use crate::ProcessExit;
use crate::app::context::AppContext;
use crate::cli::ProbeArgs;

pub(crate) async fn run_probe_command(ctx: &AppContext, args: &ProbeArgs) -> Result<ProcessExit> {
    let ffprobe = &ctx.config.ffprobe_path;
    if args.path.is_dir() {
        let infos = batch_analyze(ffprobe, &args.path).await;
        print_summary(&CompatibilitySummary::from_infos(&infos));
        return Ok(ProcessExit::Success);
    }
    if !args.path.is_file() {
        bail!("{} is not a file or folder", args.path.display());
    }

    let info = probe(ffprobe, &args.path)
        .await
        .with_context(|| format!("Cannot analyze {}", args.path.display()))?;
    print_info(&info);
    Ok(ProcessExit::Success)
}

fn print_info(info: &MediaInfo) {
    println!("{}", info.path.display());
    println!("  container      {}", info.container);
    println!(
        "  video          {} {} {} @ {:.2} fps",
        info.video_codec,
        info.video_profile,
        info.resolution(),
        info.frame_rate
    );
    println!(
        "  audio          {} {} Hz, {} ch",
        info.audio_codec, info.sample_rate, info.channels
    );
    println!("  duration       {:.1}s", info.duration);
    println!("  compatibility  {}", info.compatibility);
    for issue in &info.issues {
        println!("    - {issue}");
    }
    if info.needs_conversion() {
        println!("  run `quicktube convert` to make a more compatible copy");
    }
}

fn print_summary(summary: &CompatibilitySummary) {
    println!("{} video file(s) analyzed", summary.total);
    for (level, count) in &summary.by_compatibility {
        println!("  {level:<10} {count}");
    }
    if !summary.by_video_codec.is_empty() {
        let codecs: Vec<String> = summary
            .by_video_codec
            .iter()
            .map(|(codec, count)| format!("{codec} {count}"))
            .collect();
        println!("video codecs: {}", codecs.join(", "));
    }
    if !summary.by_audio_codec.is_empty() {
        let codecs: Vec<String> = summary
            .by_audio_codec
            .iter()
            .map(|(codec, count)| format!("{codec} {count}"))
            .collect();
        println!("audio codecs: {}", codecs.join(", "));
    }
    if summary.needs_conversion() > 0 {
        println!("{} file(s) need conversion:", summary.needs_conversion());
        for path in &summary.files_needing_conversion {
            println!("  {}", path.display());
        }
    }
}
