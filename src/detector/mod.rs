//! Strategies for finding segments, and the chain that combines them.
//!
//! Each [Detector] looks at a group of episodes from the same season and returns the
//! segments it is confident about. The [DetectorChain] runs detectors from cheapest to most
//! expensive, handing each one only the episodes that are still unresolved.

mod blackframe;
mod chapter;
mod episode;
mod fingerprint;

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub use blackframe::BlackFrameDetector;
pub use chapter::ChapterDetector;
pub use episode::{BlackFrame, BlackFrameSource, Chapter, Episode, Season};
pub use fingerprint::FingerprintDetector;

use crate::audio::SeasonResult;
use crate::{AnalysisMode, Config, EpisodeId, Result, Segment};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Chapter,
    Fingerprint,
    BlackFrame,
}

impl Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chapter => write!(f, "chapter"),
            Self::Fingerprint => write!(f, "fingerprint"),
            Self::BlackFrame => write!(f, "black frame"),
        }
    }
}

pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    /// Searches `episodes` for segments. Every episode without a segment in the result must be
    /// listed as unresolved.
    fn detect(&self, episodes: &[&Episode]) -> SeasonResult;

    /// Releases any state kept for `episodes` once their season is done.
    fn evict(&self, _episodes: &[Episode]) {}
}

/// Combined result of a [DetectorChain] for one season.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub segments: BTreeMap<EpisodeId, Segment>,
    /// The detector that found each segment.
    pub detected_by: BTreeMap<EpisodeId, DetectorKind>,
    /// Episodes no detector found a segment for, in input order.
    pub unresolved: Vec<EpisodeId>,
}

/// Runs a list of detectors in order, removing resolved episodes between them.
pub struct DetectorChain {
    mode: AnalysisMode,
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorChain {
    pub fn new(mode: AnalysisMode) -> Self {
        Self {
            mode,
            detectors: Vec::new(),
        }
    }

    /// Builds the default chain for `mode`: chapters, then fingerprints, then (for credits
    /// only) black frames.
    pub fn for_mode(config: &Config, mode: AnalysisMode) -> Result<Self> {
        let mut chain = Self::new(mode)
            .with_detector(ChapterDetector::new(config, mode)?)
            .with_detector(FingerprintDetector::new(config, mode)?);

        if mode == AnalysisMode::Credits {
            chain = chain.with_detector(BlackFrameDetector::new(config)?);
        }

        Ok(chain)
    }

    /// Returns a new [DetectorChain] that runs `detector` after the current ones.
    pub fn with_detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn kinds(&self) -> Vec<DetectorKind> {
        self.detectors.iter().map(|d| d.kind()).collect()
    }

    pub fn detect(&self, episodes: &[Episode]) -> Detection {
        let mut detection = Detection::default();
        let mut remaining: Vec<&Episode> = episodes.iter().collect();

        for detector in &self.detectors {
            if remaining.is_empty() {
                break;
            }

            let kind = detector.kind();
            let result = detector.detect(&remaining);

            tracing::debug!(
                "{} detector resolved {} of {} episodes",
                kind,
                result.segments.len(),
                remaining.len()
            );

            for (id, segment) in result.segments {
                detection.detected_by.insert(id.clone(), kind);
                detection.segments.insert(id, segment);
            }

            remaining.retain(|e| !detection.segments.contains_key(&e.id));
        }

        detection.unresolved = remaining.into_iter().map(|e| e.id.clone()).collect();
        detection
    }

    pub fn evict(&self, episodes: &[Episode]) {
        for detector in &self.detectors {
            detector.evict(episodes);
        }
    }
}

/// Lists every episode without a segment in `result` as unresolved, in input order.
fn collect_unresolved(result: &mut SeasonResult, episodes: &[&Episode]) {
    result.unresolved = episodes
        .iter()
        .filter(|e| !result.segments.contains_key(&e.id))
        .map(|e| e.id.clone())
        .collect();
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::TimeRange;

    /// Resolves a fixed set of episodes.
    struct Fixed {
        kind: DetectorKind,
        resolves: Vec<&'static str>,
    }

    impl Detector for Fixed {
        fn kind(&self) -> DetectorKind {
            self.kind
        }

        fn detect(&self, episodes: &[&Episode]) -> SeasonResult {
            let mut result = SeasonResult::default();
            for episode in episodes {
                if self.resolves.iter().any(|id| *id == episode.id.as_str()) {
                    result.record(Segment::new(
                        episode.id.clone(),
                        TimeRange::new(0.0, 30.0),
                    ));
                }
            }
            collect_unresolved(&mut result, episodes);
            result
        }
    }

    #[test]
    fn test_chain_fallback() {
        let episodes: Vec<Episode> = ["e1", "e2", "e3", "e4"]
            .into_iter()
            .map(|id| Episode::new(id, 1200.0))
            .collect();

        let chain = DetectorChain::new(AnalysisMode::Introduction)
            .with_detector(Fixed {
                kind: DetectorKind::Chapter,
                resolves: vec!["e2"],
            })
            .with_detector(Fixed {
                kind: DetectorKind::Fingerprint,
                // e2 was already resolved and must not be handed to this detector.
                resolves: vec!["e1", "e2"],
            });

        let detection = chain.detect(&episodes);

        assert_eq!(detection.segments.len(), 2);
        assert_eq!(
            detection.detected_by[&EpisodeId::from("e1")],
            DetectorKind::Fingerprint
        );
        assert_eq!(
            detection.detected_by[&EpisodeId::from("e2")],
            DetectorKind::Chapter
        );
        assert_eq!(
            detection.unresolved,
            vec![EpisodeId::from("e3"), EpisodeId::from("e4")]
        );
    }

    #[test]
    fn test_default_chains() {
        let config = Config::default();

        let chain = DetectorChain::for_mode(&config, AnalysisMode::Introduction).unwrap();
        assert_eq!(
            chain.kinds(),
            vec![DetectorKind::Chapter, DetectorKind::Fingerprint]
        );

        let chain = DetectorChain::for_mode(&config, AnalysisMode::Credits).unwrap();
        assert_eq!(
            chain.kinds(),
            vec![
                DetectorKind::Chapter,
                DetectorKind::Fingerprint,
                DetectorKind::BlackFrame
            ]
        );
    }

    #[test]
    fn test_empty_chain() {
        let episodes = vec![Episode::new("e1", 1200.0)];
        let detection = DetectorChain::new(AnalysisMode::Credits).detect(&episodes);
        assert!(detection.segments.is_empty());
        assert_eq!(detection.unresolved, vec![EpisodeId::from("e1")]);
    }
}
