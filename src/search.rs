//! Finding past downloads by title, file name or video id.
//!
//! Every query word has to show up in the entry's title or file name, either
//! as part of a word or as a close misspelling of one. A query that is a
//! video id finds that video directly. The same video reached through
//! different URL forms is listed once, as its newest entry.

use std::collections::HashSet;
use std::path::Path;

use quicktube_core::history::HistoryEntry;
use quicktube_core::source::extract_video_id;

/// Jaro-Winkler score at which a query word counts as a misspelled title word.
const TYPO_SIMILARITY: f64 = 0.9;

/// Query words shorter than this only match literally.
const MIN_TYPO_LEN: usize = 4;

/// Why an entry matched; later variants rank higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HistoryMatch {
    /// Every query word found, at least one only as a misspelling.
    Approximate,
    /// Every query word found inside a title or file name word.
    Words,
    /// The query is the entry's video id.
    VideoId,
}

/// A history entry that matched a query.
#[derive(Debug, Clone)]
pub struct HistoryHit<'a> {
    pub entry: &'a HistoryEntry,
    pub matched: HistoryMatch,
    /// Mean similarity of the query words to their best word; 1.0 when literal.
    pub closeness: f64,
}

/// Matching entries, best first; ties go to the most recent download.
pub fn search_history<'a>(query: &str, entries: &'a [HistoryEntry]) -> Vec<HistoryHit<'a>> {
    let query = query.trim();
    let words = words_of(query);
    if words.is_empty() {
        return Vec::new();
    }

    let mut newest_first: Vec<&HistoryEntry> = entries.iter().collect();
    newest_first.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut videos = HashSet::new();
    let mut hits: Vec<HistoryHit<'a>> = newest_first
        .into_iter()
        .filter(|entry| videos.insert(extract_video_id(&entry.url)))
        .filter_map(|entry| match_entry(query, &words, entry))
        .collect();

    hits.sort_by(|a, b| {
        b.matched
            .cmp(&a.matched)
            .then_with(|| b.closeness.total_cmp(&a.closeness))
            .then_with(|| b.entry.timestamp.cmp(&a.entry.timestamp))
    });
    hits
}

fn match_entry<'a>(query: &str, words: &[String], entry: &'a HistoryEntry) -> Option<HistoryHit<'a>> {
    if extract_video_id(&entry.url) == query {
        return Some(HistoryHit {
            entry,
            matched: HistoryMatch::VideoId,
            closeness: 1.0,
        });
    }

    let mut known = words_of(&entry.title);
    if let Some(stem) = Path::new(&entry.filename).file_stem() {
        known.extend(words_of(&stem.to_string_lossy()));
    }

    let mut total = 0.0;
    for word in words {
        total += word_score(word, &known)?;
    }
    #[allow(clippy::cast_precision_loss)]
    let closeness = total / words.len() as f64;
    let matched = if closeness < 1.0 {
        HistoryMatch::Approximate
    } else {
        HistoryMatch::Words
    };
    Some(HistoryHit {
        entry,
        matched,
        closeness,
    })
}

/// 1.0 when `word` is inside a known word, the best typo similarity otherwise.
fn word_score(word: &str, known: &[String]) -> Option<f64> {
    if known.iter().any(|candidate| candidate.contains(word)) {
        return Some(1.0);
    }
    if word.chars().count() < MIN_TYPO_LEN {
        return None;
    }
    known
        .iter()
        .map(|candidate| strsim::jaro_winkler(word, candidate))
        .filter(|score| *score >= TYPO_SIMILARITY)
        .max_by(f64::total_cmp)
}

fn words_of(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}
