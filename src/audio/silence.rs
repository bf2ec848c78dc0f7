use super::Comparator;
use crate::{Segment, TimeRange};

/// Moves the end of a segment to the start of a nearby silence interval.
///
/// `silence` must be in chronological order. The first interval that intersects the last
/// `window` seconds of the segment, lasts at least `min_duration` seconds and does not start
/// before the segment becomes the new end. Otherwise, the segment is returned unchanged.
pub fn refine_end(
    segment: &Segment,
    silence: &[TimeRange],
    window: f64,
    min_duration: f64,
) -> Segment {
    if !segment.is_valid() {
        return segment.clone();
    }

    let tail = TimeRange::new(segment.end - window, segment.end);

    for range in silence {
        if !tail.intersects(range)
            || range.duration() < min_duration
            || range.start() < segment.start
        {
            continue;
        }

        tracing::trace!(
            "{}: moving end from {:.3} to {:.3} (silence {})",
            segment.episode_id,
            segment.end,
            range.start(),
            range
        );
        return segment.with_end(range.start());
    }

    segment.clone()
}

impl Comparator {
    /// Applies [refine_end] using this comparator's silence settings.
    pub fn refine_end(&self, segment: &Segment, silence: &[TimeRange]) -> Segment {
        refine_end(
            segment,
            silence,
            self.config().silence_search_window,
            self.config().silence_min_duration,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn segment(start: f64, end: f64) -> Segment {
        Segment::new("e1".into(), TimeRange::new(start, end))
    }

    #[test]
    fn test_moves_to_first_qualifying_silence() {
        let silence = [
            // Before the window.
            TimeRange::new(10.0, 12.0),
            // Too short.
            TimeRange::new(80.0, 80.2),
            TimeRange::new(82.5, 83.5),
            TimeRange::new(86.0, 88.0),
        ];

        let refined = Comparator::default().refine_end(&segment(0.0, 90.0), &silence);
        assert_eq!(refined, segment(0.0, 82.5));
    }

    #[test]
    fn test_silence_overlapping_end() {
        let silence = [TimeRange::new(89.0, 91.0)];
        let refined = Comparator::default().refine_end(&segment(0.0, 90.0), &silence);
        assert_eq!(refined.end, 89.0);
    }

    #[test]
    fn test_silence_before_start_is_ignored() {
        // Intersects the window but starts before the segment does.
        let silence = [TimeRange::new(19.0, 22.0)];
        let original = segment(20.0, 30.0);
        let refined = Comparator::default().refine_end(&original, &silence);
        assert_eq!(refined, original);
    }

    #[test]
    fn test_no_silence() {
        let original = segment(0.0, 45.0);
        assert_eq!(Comparator::default().refine_end(&original, &[]), original);

        let invalid = Segment::invalid("e1".into());
        let silence = [TimeRange::new(0.0, 5.0)];
        assert_eq!(Comparator::default().refine_end(&invalid, &silence), invalid);
    }

    #[test]
    fn test_end_stays_within_segment() {
        let silence: Vec<TimeRange> = (0..200)
            .map(|i| {
                let start = i as f64 * 0.7;
                TimeRange::new(start, start + 0.1 + (i % 5) as f64 * 0.2)
            })
            .collect();

        for (start, end) in [(0.0, 20.0), (30.0, 40.0), (50.0, 120.0), (100.0, 101.0)] {
            let original = segment(start, end);
            for i in 0..silence.len() {
                let refined = refine_end(&original, &silence[i..], 15.0, 0.33);
                assert!(refined.end >= original.start);
                assert!(refined.end <= original.end);
                assert_eq!(refined.start, original.start);
            }
        }
    }
}
