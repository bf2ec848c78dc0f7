use std::collections::{BTreeMap, VecDeque};

use super::{Comparator, Fingerprinted};
use crate::{EpisodeId, Segment};

/// Best segment found for each episode of one season.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeasonResult {
    pub segments: BTreeMap<EpisodeId, Segment>,
    /// Episodes without a segment, in input order.
    pub unresolved: Vec<EpisodeId>,
}

impl SeasonResult {
    /// Records `segment` if it is the first one for its episode or strictly longer than the
    /// one recorded so far. Returns true if the segment was kept.
    pub fn record(&mut self, segment: Segment) -> bool {
        match self.segments.get(&segment.episode_id) {
            Some(existing) if segment.duration() <= existing.duration() => false,
            _ => {
                self.segments.insert(segment.episode_id.clone(), segment);
                true
            }
        }
    }
}

impl Comparator {
    fn is_acceptable(&self, segment: &Segment) -> bool {
        segment.is_valid() && segment.duration() <= self.limits().max_duration(self.mode())
    }

    /// Finds a shared segment for every episode of a season.
    ///
    /// Episodes are processed as a queue: the first episode is removed and compared against
    /// the remaining ones in order until one comparison yields acceptable segments on both
    /// sides. Segments longer than the mode's maximum duration are treated as false positives.
    /// Typical seasons need a linear number of comparisons; the worst case (no matches at all)
    /// is quadratic.
    pub fn aggregate_season<F: Fingerprinted>(&self, episodes: &[F]) -> SeasonResult {
        let span = tracing::span!(
            tracing::Level::TRACE,
            "aggregate_season",
            episodes = episodes.len()
        );
        let _enter = span.enter();

        let mut result = SeasonResult::default();
        let mut queue: VecDeque<&F> = episodes.iter().collect();

        while let Some(current) = queue.pop_front() {
            let mut matched = false;

            for partner in &queue {
                let (current_segment, partner_segment) = self.align_pair(current, *partner);

                if !self.is_acceptable(&current_segment) || !self.is_acceptable(&partner_segment) {
                    tracing::trace!(
                        current = %current_segment,
                        partner = %partner_segment,
                        "ignoring comparison result"
                    );
                    continue;
                }

                result.record(current_segment);
                result.record(partner_segment);
                matched = true;
                break;
            }

            if !matched {
                tracing::debug!(
                    "no acceptable match for {} among {} remaining episodes",
                    current.episode_id(),
                    queue.len()
                );
            }
        }

        result.unresolved = episodes
            .iter()
            .map(|e| e.episode_id())
            .filter(|id| !result.segments.contains_key(*id))
            .cloned()
            .collect();

        tracing::debug!(
            found = result.segments.len(),
            unresolved = result.unresolved.len(),
            "finished season aggregation"
        );

        result
    }
}
