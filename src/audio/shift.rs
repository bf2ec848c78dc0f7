use std::collections::BTreeSet;

use super::InvertedIndex;

/// Finds the shifts (in points) worth testing when aligning two fingerprints.
///
/// For every point value `v` in the left index, the right index is searched for
/// `v - tolerance..=v + tolerance` (wrapping). Every hit proposes the shift
/// `right_index - left_index`. Only shifts backed by at least one such collision are
/// returned, in ascending order.
pub fn find_shift_candidates(
    lhs: &InvertedIndex,
    rhs: &InvertedIndex,
    tolerance: u32,
) -> BTreeSet<isize> {
    let tolerance = i64::from(tolerance);
    let mut shifts = BTreeSet::new();

    for (point, lhs_idx) in lhs.iter() {
        for i in -tolerance..=tolerance {
            let candidate = (i64::from(point) + i) as u32;
            if let Some(rhs_idx) = rhs.get(candidate) {
                shifts.insert(rhs_idx as isize - lhs_idx as isize);
            }
        }
    }

    shifts
}
