use std::cmp::Ordering;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::util;

/// Timestamp appended after the last similar timecode so that the final run is always closed.
///
/// No real timecode can reach it.
pub const SENTINEL: f64 = f64::MAX;

#[derive(Deserialize)]
struct RawTimeRange {
    start: f64,
    end: f64,
}

impl From<RawTimeRange> for TimeRange {
    fn from(raw: RawTimeRange) -> Self {
        TimeRange::new(raw.start, raw.end)
    }
}

/// A span of time, in seconds, relative to the start of a media file.
///
/// Ranges are plain values: adjusting a boundary produces a new range rather than
/// mutating the existing one. `end` is never less than `start`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTimeRange")]
pub struct TimeRange {
    start: f64,
    end: f64,
}

impl TimeRange {
    /// Constructs a new range. An `end` before `start` is clamped to `start`.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Returns a copy of this range with a new start. The end is kept unless it would
    /// precede the new start.
    pub fn with_start(&self, start: f64) -> Self {
        Self::new(start, self.end)
    }

    /// Returns a copy of this range with a new end, clamped to the start.
    pub fn with_end(&self, end: f64) -> Self {
        Self::new(self.start, end)
    }

    /// Returns true if the two ranges share at least one instant (boundaries included).
    pub fn intersects(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Orders two ranges by duration.
    pub fn cmp_duration(&self, other: &TimeRange) -> Ordering {
        self.duration().total_cmp(&other.duration())
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", util::format_span(self.start, self.end))
    }
}

/// Returns the longest range, preferring the earliest one on ties.
pub fn longest(ranges: impl IntoIterator<Item = TimeRange>) -> Option<TimeRange> {
    ranges.into_iter().fold(None, |best, range| match best {
        Some(best) if best.cmp_duration(&range) != Ordering::Less => Some(best),
        _ => Some(range),
    })
}

/// Finds the longest contiguous range in a list of timecodes.
///
/// Timecodes are sorted, then adjacent timecodes that are at most `max_gap` seconds apart
/// are merged into runs. The longest run is returned, or `None` if `times` is empty (or
/// only holds the [SENTINEL]).
pub fn find_contiguous(mut times: Vec<f64>, max_gap: f64) -> Option<TimeRange> {
    if times.is_empty() {
        return None;
    }

    times.sort_by(f64::total_cmp);

    let mut runs = Vec::new();
    let mut current = TimeRange::new(times[0], times[0]);

    for pair in times.windows(2) {
        let (time, next) = (pair[0], pair[1]);

        if next - time <= max_gap {
            current = current.with_end(next);
            continue;
        }

        runs.push(current);
        current = TimeRange::new(next, next);
    }

    // Without a sentinel, the last run is still open at this point.
    if current.start() < SENTINEL {
        runs.push(current);
    }

    longest(runs)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_small_range() {
        let times = vec![1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 100.0, 100.5, 101.0, 101.5];
        let actual = find_contiguous(times, 3.25);
        assert_eq!(actual, Some(TimeRange::new(1.0, 4.0)));
    }

    #[test]
    fn test_large_range() {
        let times = vec![
            1.0, 1.5, 2.0, //
            2.8, 2.9, 2.995, 3.0, 3.01, 3.02, 3.4, 3.45, 3.48, 3.7, 3.77, 3.78, 3.781, 3.782,
            3.789, 3.85, //
            4.5, 5.3122, 5.3123, 5.3124, 5.3125, 5.3126, 5.3127, 5.3128, //
            55.0, 55.5, 55.6, 55.7,
        ];
        let actual = find_contiguous(times, 3.25);
        assert_eq!(actual, Some(TimeRange::new(1.0, 5.3128)));
    }

    #[test]
    fn test_longest_run_is_selected() {
        let times = vec![0.0, 1.0, 2.0, 50.0, 51.0, 52.0, 53.0, 54.0, 55.0, 56.0];
        let actual = find_contiguous(times, 1.5);
        assert_eq!(actual, Some(TimeRange::new(50.0, 56.0)));
    }

    #[test]
    fn test_longest_run_with_sentinel() {
        let times = vec![56.0, 0.0, 1.0, 2.0, 50.0, 51.0, 52.0, 53.0, 54.0, 55.0, SENTINEL];
        let actual = find_contiguous(times, 1.5);
        assert_eq!(actual, Some(TimeRange::new(50.0, 56.0)));
    }

    #[test]
    fn test_empty_and_sentinel_only() {
        assert_eq!(find_contiguous(Vec::new(), 3.5), None);
        assert_eq!(find_contiguous(vec![SENTINEL], 3.5), None);
    }

    #[test]
    fn test_single_timecode() {
        let actual = find_contiguous(vec![12.8, SENTINEL], 3.5);
        assert_eq!(actual, Some(TimeRange::new(12.8, 12.8)));
    }

    #[test]
    fn test_ties_prefer_earliest() {
        let times = vec![10.0, 11.0, 40.0, 41.0];
        let actual = find_contiguous(times, 2.0);
        assert_eq!(actual, Some(TimeRange::new(10.0, 11.0)));
    }

    #[test]
    fn test_time_range() {
        let range = TimeRange::new(10.0, 25.5);
        assert_eq!(range.duration(), 15.5);
        assert_eq!(range.with_start(0.0), TimeRange::new(0.0, 25.5));
        assert_eq!(range.with_end(5.0), TimeRange::new(10.0, 10.0));
        assert_eq!(range, TimeRange::new(10.0, 25.5));

        assert!(range.intersects(&TimeRange::new(25.5, 30.0)));
        assert!(range.intersects(&TimeRange::new(0.0, 100.0)));
        assert!(!range.intersects(&TimeRange::new(26.0, 30.0)));

        insta::assert_snapshot!(range.to_string(), @"[00:10s-00:25s]");
    }

    #[test]
    fn test_deserialize_clamps_end() {
        let range: TimeRange = serde_json::from_str(r#"{"start": 8.0, "end": 3.0}"#).unwrap();
        assert_eq!(range, TimeRange::new(8.0, 8.0));
    }
}
