pub(crate) mod comparator;
mod data;
mod index;
mod scanner;
mod season;
mod shift;
mod silence;

pub use comparator::Comparator;
pub use data::{Fingerprint, Fingerprinted};
pub use index::{IndexCache, InvertedIndex};
pub use scanner::{scan_similarity, SimilarTimes};
pub use season::SeasonResult;
pub use shift::find_shift_candidates;
pub use silence::refine_end;

/// Seconds of audio covered by one fingerprint point.
///
/// This value is fixed by Chromaprint and must not be changed.
pub const SAMPLES_TO_SECONDS: f64 = 0.128;

/// Default maximum number of differing bits between two points that are considered similar.
///
/// The value of a point difference ranges from 0 (exact match) to 32 (no match). The default
/// requires roughly 81% of the bits to match.
pub const DEFAULT_MAX_POINT_DIFFERENCES: u32 = 6;

/// Default point value tolerance used when looking for shift candidates.
///
/// Each point in the left fingerprint is looked up in the right fingerprint's index with up
/// to this much added or subtracted from its value.
pub const DEFAULT_INVERTED_INDEX_SHIFT: u32 = 2;

/// Upper bound for the point value tolerance.
pub const MAX_INVERTED_INDEX_SHIFT: u32 = 1024;

/// Default maximum gap (seconds) between two similar timecodes of the same run.
pub const DEFAULT_MAX_TIME_SKIP: f64 = 3.5;

/// Upper bound for the maximum gap (seconds) between two timecodes of the same run.
///
/// Must stay well below the scanner's end-of-data sentinel so the sentinel always closes the
/// last run.
pub const MAX_TIME_SKIP_LIMIT: f64 = 300.0;

/// Default minimum segment duration (seconds).
///
/// A match will only be considered if it runs for at least this long.
pub const DEFAULT_MIN_DURATION: f64 = 15.0;

/// Default maximum introduction duration (seconds).
///
/// Longer matches are treated as false positives, e.g. two episodes that are nearly identical.
pub const DEFAULT_MAX_INTRO_DURATION: f64 = 120.0;

/// Default maximum credits duration (seconds).
pub const DEFAULT_MAX_CREDITS_DURATION: f64 = 300.0;

/// Default minimum duration (seconds) of a silence interval used to adjust a segment's end.
pub const DEFAULT_SILENCE_MIN_DURATION: f64 = 0.33;

/// Default length (seconds) of the window before a segment's end searched for silence.
pub const DEFAULT_SILENCE_SEARCH_WINDOW: f64 = 15.0;

/// Default start snapping threshold (seconds).
///
/// Segments that start this close to the start of an episode are moved to the very start.
pub const DEFAULT_START_SNAP_THRESHOLD: f64 = 5.0;

/// Default duration (seconds) from which the end of a run is trimmed by two merge gaps.
pub const DEFAULT_LONG_RUN_THRESHOLD: f64 = 90.0;

/// Default duration (seconds) from which the end of a run is trimmed by one merge gap.
pub const DEFAULT_MEDIUM_RUN_THRESHOLD: f64 = 30.0;

/// Converts a point index into a timecode (seconds).
#[inline]
pub(crate) fn to_timecode(index: usize) -> f64 {
    index as f64 * SAMPLES_TO_SECONDS
}
