use crate::range::SENTINEL;

/// Timecodes at which two fingerprints were found similar for a single shift.
///
/// Both lists have the same length: `lhs[i]` and `rhs[i]` are the two sides of the same
/// aligned pair of points. Each list ends with the [SENTINEL].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimilarTimes {
    pub lhs: Vec<f64>,
    pub rhs: Vec<f64>,
}

/// Walks both fingerprints in lock-step using the given `shift` and flags the timecodes of
/// every aligned pair of points that differ by at most `max_differences` bits.
///
/// A positive shift means that the content appears `shift` points later in `rhs` than in
/// `lhs`.
pub fn scan_similarity(
    lhs: &[u32],
    rhs: &[u32],
    shift: isize,
    max_differences: u32,
) -> SimilarTimes {
    let (lhs_offset, rhs_offset) = if shift < 0 {
        (shift.unsigned_abs(), 0)
    } else {
        (0, shift.unsigned_abs())
    };

    // Number of aligned positions in the overlapping region.
    let overlap = lhs
        .len()
        .saturating_sub(lhs_offset)
        .min(rhs.len().saturating_sub(rhs_offset));

    let mut times = SimilarTimes::default();

    for i in 0..overlap {
        let (lhs_position, rhs_position) = (i + lhs_offset, i + rhs_offset);
        let diff = lhs[lhs_position] ^ rhs[rhs_position];

        if diff.count_ones() > max_differences {
            continue;
        }

        times.lhs.push(super::to_timecode(lhs_position));
        times.rhs.push(super::to_timecode(rhs_position));
    }

    times.lhs.push(SENTINEL);
    times.rhs.push(SENTINEL);

    times
}
