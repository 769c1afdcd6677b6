//! Turning raw action detections into watchable clips.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// One action detected at a point in a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Seconds into the video.
    pub timestamp: f64,
    #[serde(default)]
    pub timestamp_str: String,
    pub action_class: String,
    /// 0..=1.
    pub confidence: f64,
    #[serde(default)]
    pub class_id: u32,
}

/// A span of video covering one or more nearby detections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clip {
    pub start_time: f64,
    pub end_time: f64,
    pub start_str: String,
    pub end_str: String,
    pub duration: f64,
    /// Distinct actions in the clip, sorted.
    pub action_classes: Vec<String>,
    pub primary_action: String,
    /// Highest confidence among merged detections.
    pub confidence: f64,
    pub detection_count: usize,
}

/// Tuning for [`merge_detections_into_clips`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipParams {
    /// Clips shorter than this are widened evenly on both sides.
    pub min_duration: f64,
    /// Detections at most this far apart share a clip.
    pub merge_gap: f64,
    /// Added before the first and after the last detection.
    pub padding: f64,
}

impl Default for ClipParams {
    fn default() -> Self {
        Self {
            min_duration: 5.0,
            merge_gap: 3.0,
            padding: 2.0,
        }
    }
}

/// Groups detections no more than `merge_gap` apart and pads each group
/// into a clip. Start times never go below zero.
///
/// The primary action is the most frequent class in the group; ties go to
/// the class with the highest single confidence.
#[must_use]
pub fn merge_detections_into_clips(detections: &[Detection], params: ClipParams) -> Vec<Clip> {
    let mut sorted: Vec<&Detection> = detections.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut groups: Vec<Vec<&Detection>> = Vec::new();
    for detection in sorted {
        match groups.last_mut() {
            Some(group)
                if group
                    .last()
                    .is_some_and(|last| detection.timestamp - last.timestamp <= params.merge_gap) =>
            {
                group.push(detection);
            }
            _ => groups.push(vec![detection]),
        }
    }

    groups
        .into_iter()
        .filter_map(|group| build_clip(&group, params))
        .collect()
}

fn build_clip(group: &[&Detection], params: ClipParams) -> Option<Clip> {
    let first = group.first()?;
    let last = group.last()?;

    let mut start = (first.timestamp - params.padding).max(0.0);
    let mut end = last.timestamp + params.padding;
    let duration = end - start;
    if duration < params.min_duration {
        let extra = (params.min_duration - duration) / 2.0;
        start = (start - extra).max(0.0);
        end += extra;
    }

    let mut counts: HashMap<&str, (usize, f64)> = HashMap::new();
    for detection in group {
        let entry = counts
            .entry(detection.action_class.as_str())
            .or_insert((0, f64::MIN));
        entry.0 += 1;
        entry.1 = entry.1.max(detection.confidence);
    }
    let primary_action = counts
        .iter()
        .max_by(|(a_name, (a_count, a_conf)), (b_name, (b_count, b_conf))| {
            a_count
                .cmp(b_count)
                .then_with(|| a_conf.total_cmp(b_conf))
                .then_with(|| b_name.cmp(a_name))
        })
        .map(|(name, _)| (*name).to_string())?;

    let action_classes: BTreeSet<&str> = group.iter().map(|d| d.action_class.as_str()).collect();
    let confidence = group
        .iter()
        .map(|d| d.confidence)
        .fold(f64::MIN, f64::max);

    Some(Clip {
        start_time: round_tenth(start),
        end_time: round_tenth(end),
        start_str: seconds_to_timestamp(start),
        end_str: seconds_to_timestamp(end),
        duration: round_tenth(end - start),
        action_classes: action_classes.into_iter().map(str::to_string).collect(),
        primary_action,
        confidence,
        detection_count: group.len(),
    })
}

/// Keeps detections whose class contains a keyword (or is contained in one),
/// case-insensitively. Blank keyword lists keep everything.
#[must_use]
pub fn filter_by_keywords(detections: &[Detection], keywords: &[String]) -> Vec<Detection> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return detections.to_vec();
    }
    detections
        .iter()
        .filter(|d| {
            let action = d.action_class.to_lowercase();
            keywords
                .iter()
                .any(|k| action.contains(k.as_str()) || k.contains(action.as_str()))
        })
        .cloned()
        .collect()
}

/// `MM:SS`, or `HH:MM:SS` from one hour on. Fractions are truncated.
#[must_use]
pub fn seconds_to_timestamp(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(timestamp: f64, action: &str, confidence: f64) -> Detection {
        Detection {
            timestamp,
            timestamp_str: seconds_to_timestamp(timestamp),
            action_class: action.to_string(),
            confidence,
            class_id: 0,
        }
    }

    #[test]
    fn test_nearby_detections_merge() {
        let detections = vec![
            det(10.0, "skydiving", 0.9),
            det(12.0, "skydiving", 0.7),
            det(14.5, "parasailing", 0.95),
            det(40.0, "surfing water", 0.6),
        ];
        let clips = merge_detections_into_clips(&detections, ClipParams::default());
        assert_eq!(clips.len(), 2);

        let first = &clips[0];
        assert!((first.start_time - 8.0).abs() < f64::EPSILON);
        assert!((first.end_time - 16.5).abs() < f64::EPSILON);
        assert_eq!(first.detection_count, 3);
        assert_eq!(first.primary_action, "skydiving");
        assert!((first.confidence - 0.95).abs() < f64::EPSILON);
        assert_eq!(first.action_classes, vec!["parasailing", "skydiving"]);
        assert_eq!(first.start_str, "00:08");
    }

    #[test]
    fn test_short_clip_widened_to_min_duration() {
        // Single detection: 4s of padding, widened by 0.5s on each side.
        let clips = merge_detections_into_clips(&[det(30.0, "vault", 0.5)], ClipParams::default());
        assert!((clips[0].start_time - 27.5).abs() < f64::EPSILON);
        assert!((clips[0].end_time - 32.5).abs() < f64::EPSILON);
        assert!((clips[0].duration - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_start_clamped_at_zero() {
        let clips = merge_detections_into_clips(&[det(0.5, "vault", 0.5)], ClipParams::default());
        assert!(clips[0].start_time.abs() < f64::EPSILON);
    }

    #[test]
    fn test_primary_action_tie_breaks_on_confidence() {
        let detections = vec![det(1.0, "a", 0.4), det(2.0, "b", 0.9)];
        let clips = merge_detections_into_clips(&detections, ClipParams::default());
        assert_eq!(clips[0].primary_action, "b");
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_detections_into_clips(&[], ClipParams::default()).is_empty());
    }

    #[test]
    fn test_filter_by_keywords() {
        let detections = vec![
            det(1.0, "Rock Climbing", 0.5),
            det(2.0, "ice climbing", 0.5),
            det(3.0, "surfing water", 0.5),
        ];
        let kept = filter_by_keywords(&detections, &["climbing".to_string()]);
        assert_eq!(kept.len(), 2);
        let kept = filter_by_keywords(&detections, &["  ".to_string()]);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_seconds_to_timestamp() {
        assert_eq!(seconds_to_timestamp(0.0), "00:00");
        assert_eq!(seconds_to_timestamp(83.9), "01:23");
        assert_eq!(seconds_to_timestamp(3725.0), "01:02:05");
    }
}
