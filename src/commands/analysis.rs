//! `quicktube analysis`: cached scene detections for a video.

use anyhow::Result;
use quicktube_core::analysis::{
    AnalysisCache, ClipParams, filter_by_keywords, merge_detections_into_clips,
};

use crate::ProcessExit;
use crate::app::context::AppContext;
use crate::cli::AnalysisArgs;

pub(crate) fn run_analysis_command(ctx: &AppContext, args: &AnalysisArgs) -> Result<ProcessExit> {
    let cache = AnalysisCache::load(&ctx.config.analysis_cache_path());
    let Some(record) = cache.lookup(&args.url) else {
        println!("No analysis cached for {}", args.url);
        return Ok(ProcessExit::Failure);
    };

    let title = if record.video_title.is_empty() {
        &record.video_url
    } else {
        &record.video_title
    };
    println!("{title} (analyzed {})", record.analyzed_date);

    let detections = filter_by_keywords(&record.detections, &args.keywords);
    if detections.is_empty() {
        println!("No matching detections.");
        return Ok(ProcessExit::Success);
    }

    if args.clips {
        for clip in merge_detections_into_clips(&detections, ClipParams::default()) {
            println!(
                "{} - {}  {:<24} {:.0}%  ({} detections)",
                clip.start_str,
                clip.end_str,
                clip.primary_action,
                clip.confidence * 100.0,
                clip.detection_count
            );
        }
    } else {
        for detection in &detections {
            println!(
                "{:>8}  {:<24} {:.0}%",
                detection.timestamp_str, detection.action_class, detection.confidence * 100.0
            );
        }
    }
    Ok(ProcessExit::Success)
}
