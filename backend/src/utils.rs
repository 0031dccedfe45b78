use crate::models::VideoKind;
use std::collections::HashSet;

/// Anything up to this many seconds counts as a short.
pub const SHORT_MAX_SECONDS: u64 = 90;

/// Decide whether a video is a short or a regular upload.
///
/// A `#short`/`#shorts` marker in the title wins outright. Otherwise the
/// ISO8601 duration decides; without a duration the video belongs to
/// neither category.
pub fn classify_video(title: &str, duration: Option<&str>) -> Option<VideoKind> {
    let title_lower = title.to_lowercase();
    if title_lower.contains("#shorts") || title_lower.contains("#short") {
        return Some(VideoKind::Short);
    }

    let duration = duration?;
    if duration_is_short(duration) {
        Some(VideoKind::Short)
    } else {
        Some(VideoKind::Video)
    }
}

/// Only hours, minutes and seconds are considered; any hour component means long.
fn duration_is_short(duration: &str) -> bool {
    if duration.contains('H') {
        return false;
    }
    let minutes = number_before(duration, 'M').unwrap_or(0);
    let seconds = number_before(duration, 'S').unwrap_or(0);
    minutes.saturating_mul(60).saturating_add(seconds) <= SHORT_MAX_SECONDS
}

/// First run of digits directly followed by `unit`, e.g. `15` for `'M'` in `PT15M33S`.
fn number_before(duration: &str, unit: char) -> Option<u64> {
    let bytes = duration.as_bytes();
    for (idx, ch) in duration.char_indices() {
        if ch != unit {
            continue;
        }
        let start = bytes[..idx]
            .iter()
            .rposition(|b| !b.is_ascii_digit())
            .map(|p| p + 1)
            .unwrap_or(0);
        if start < idx {
            return Some(duration[start..idx].parse().unwrap_or(u64::MAX));
        }
    }
    None
}

/// Ids in `fetched` that are not in `existing`, in fetched order, without repeats.
pub fn new_video_ids(fetched: &[String], existing: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = existing.iter().map(String::as_str).collect();
    fetched
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Case-insensitive substring match over title and description.
pub fn matches_search(title: &str, description: &str, search: &str) -> bool {
    let needle = search.to_lowercase();
    title.to_lowercase().contains(&needle) || description.to_lowercase().contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn ninety_seconds_is_still_short() {
        assert_eq!(classify_video("clip", Some("PT1M30S")), Some(VideoKind::Short));
        assert_eq!(classify_video("clip", Some("PT1M31S")), Some(VideoKind::Video));
    }

    #[test]
    fn hours_always_mean_long() {
        assert_eq!(classify_video("stream", Some("PT2H")), Some(VideoKind::Video));
        assert_eq!(classify_video("stream", Some("PT1H0M5S")), Some(VideoKind::Video));
    }

    #[test]
    fn title_marker_wins_over_duration() {
        assert_eq!(
            classify_video("Best goal #Shorts", Some("PT12M")),
            Some(VideoKind::Short)
        );
        assert_eq!(classify_video("quick one #short", None), Some(VideoKind::Short));
    }

    #[test]
    fn missing_duration_is_unclassified() {
        assert_eq!(classify_video("no duration", None), None);
    }

    #[test]
    fn seconds_or_minutes_alone() {
        assert_eq!(classify_video("a", Some("PT45S")), Some(VideoKind::Short));
        assert_eq!(classify_video("b", Some("PT2M")), Some(VideoKind::Video));
        assert_eq!(classify_video("c", Some("PT15M33S")), Some(VideoKind::Video));
        assert_eq!(classify_video("d", Some("P0D")), Some(VideoKind::Short));
    }

    #[test]
    fn new_ids_keep_fetched_order() {
        let fetched = ids(&["v9", "v1", "v7", "v2", "v8"]);
        let existing = ids(&["v1", "v2", "v3"]);
        assert_eq!(new_video_ids(&fetched, &existing), ids(&["v9", "v7", "v8"]));
    }

    #[test]
    fn new_ids_never_contain_existing_or_duplicates() {
        let fetched = ids(&["a", "b", "a", "c"]);
        let existing = ids(&["c"]);
        let fresh = new_video_ids(&fetched, &existing);
        assert_eq!(fresh, ids(&["a", "b"]));
        assert!(fresh.iter().all(|id| !existing.contains(id)));
    }

    #[test]
    fn new_ids_empty_when_everything_known() {
        let fetched = ids(&["v1", "v2"]);
        assert!(new_video_ids(&fetched, &fetched).is_empty());
    }

    #[test]
    fn search_ignores_case() {
        assert!(matches_search("Derby Highlights", "", "derby"));
        assert!(matches_search("Vlog", "Behind the SCENES", "scenes"));
        assert!(!matches_search("Vlog", "", "derby"));
    }
}
