//! `quicktube history`: recent downloads, optionally searched.

use anyhow::Result;
use chrono::{Local, TimeZone};
use quicktube_core::history::{History, HistoryEntry};
use tracing::debug;

use crate::ProcessExit;
use crate::app::context::AppContext;
use crate::cli::HistoryArgs;
use crate::search::search_history;

pub(crate) fn run_history_command(ctx: &AppContext, args: &HistoryArgs) -> Result<ProcessExit> {
    let history = History::load(&ctx.config.history_path());

    let entries: Vec<HistoryEntry> = match args.search.as_deref() {
        Some(query) => search_history(query, history.entries())
            .into_iter()
            .map(|hit| {
                debug!(
                    title = %hit.entry.title,
                    matched = ?hit.matched,
                    closeness = hit.closeness,
                    "history match"
                );
                hit.entry.clone()
            })
            .collect(),
        None => history.entries().to_vec(),
    };

    if entries.is_empty() {
        if args.search.is_some() {
            println!("No matching downloads.");
        } else {
            println!("No downloads recorded yet.");
        }
        return Ok(ProcessExit::Success);
    }
    for entry in entries.iter().take(args.limit) {
        println!("{}  {}", format_timestamp(entry.timestamp), entry.title);
        println!("                  {}", entry.url);
        if !entry.filename.is_empty() {
            println!("                  {}", entry.filename);
        }
    }
    Ok(ProcessExit::Success)
}

fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map_or_else(|| "unknown         ".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}
