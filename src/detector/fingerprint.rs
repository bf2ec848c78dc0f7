use std::sync::Arc;

use super::{collect_unresolved, Detector, DetectorKind, Episode};
use crate::audio::{Comparator, IndexCache, SeasonResult};
use crate::{AnalysisMode, Config, Result, Segment, TimeRange};

/// Silence up to this many seconds past a segment's end is considered when refining it.
const SILENCE_LOOKAHEAD: f64 = 2.0;

/// Finds segments shared by the episodes of a season by aligning their audio fingerprints.
///
/// Inverted indexes are cached by episode id, so a detector serves one season at a time.
#[derive(Debug)]
pub struct FingerprintDetector {
    comparator: Comparator,
}

impl FingerprintDetector {
    pub fn new(config: &Config, mode: AnalysisMode) -> Result<Self> {
        Ok(Self {
            comparator: Comparator::new(config)?.with_mode(mode),
        })
    }

    pub fn from_comparator(comparator: Comparator) -> Self {
        Self { comparator }
    }

    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    pub fn cache(&self) -> Option<&Arc<IndexCache>> {
        self.comparator.cache()
    }

    /// Converts a segment found in an episode's fingerprint to media file time and, for
    /// introductions, moves its end to a nearby silence.
    fn finalize(&self, episode: &Episode, segment: &Segment) -> Segment {
        let segment = segment.offset_by(episode.fingerprint_start);
        if self.comparator.mode() != AnalysisMode::Introduction {
            return segment;
        }

        let limit = segment.end.trunc() + SILENCE_LOOKAHEAD;
        let silence: Vec<TimeRange> = episode
            .silence
            .iter()
            .take_while(|s| s.start() <= limit)
            .copied()
            .collect();

        self.comparator.refine_end(&segment, &silence)
    }
}

impl Detector for FingerprintDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Fingerprint
    }

    fn detect(&self, episodes: &[&Episode]) -> SeasonResult {
        let mut result = SeasonResult::default();

        if episodes.len() < 2 {
            tracing::debug!(
                "not enough episodes to compare fingerprints ({})",
                episodes.len()
            );
            collect_unresolved(&mut result, episodes);
            return result;
        }

        let found = self.comparator.aggregate_season(episodes);

        for episode in episodes {
            if let Some(segment) = found.segments.get(&episode.id) {
                let segment = self.finalize(episode, segment);
                tracing::debug!("{}: {}", episode.display_name(), segment);
                result.record(segment);
            }
        }

        collect_unresolved(&mut result, episodes);
        result
    }

    /// Drops the cached inverted indexes of `episodes`.
    fn evict(&self, episodes: &[Episode]) {
        if let Some(cache) = self.cache() {
            for episode in episodes {
                cache.evict(&episode.id);
            }
        }
    }
}
