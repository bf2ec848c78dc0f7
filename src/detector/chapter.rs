use regex::Regex;

use super::{collect_unresolved, Chapter, Detector, DetectorKind, Episode};
use crate::audio::SeasonResult;
use crate::config::SegmentLimits;
use crate::{AnalysisMode, Config, Result, Segment, TimeRange};

/// Finds segments from chapter names, e.g. a chapter called "Opening".
#[derive(Debug)]
pub struct ChapterDetector {
    mode: AnalysisMode,
    pattern: Regex,
    limits: SegmentLimits,
}

impl ChapterDetector {
    pub fn new(config: &Config, mode: AnalysisMode) -> Result<Self> {
        config.limits.validate()?;
        Ok(Self {
            mode,
            pattern: Regex::new(config.chapter.pattern(mode))?,
            limits: config.limits.clone(),
        })
    }

    /// Returns the first chapter whose name matches and whose duration is within limits.
    ///
    /// A chapter lasts until the next one starts. For credits, a virtual chapter at the end of
    /// the episode closes the last chapter.
    pub fn find_matching_chapter(&self, episode: &Episode) -> Option<Segment> {
        let end = Chapter::new("", episode.duration);
        let mut chapters: Vec<&Chapter> = episode.chapters.iter().collect();
        if self.mode == AnalysisMode::Credits {
            chapters.push(&end);
        }

        let max_duration = self.limits.max_duration(self.mode);

        for pair in chapters.windows(2) {
            let (current, next) = (pair[0], pair[1]);
            if current.name.trim().is_empty() {
                continue;
            }

            let range = TimeRange::new(current.start, next.start);
            if range.duration() < self.limits.min_duration || range.duration() > max_duration {
                tracing::trace!(
                    "{}: chapter {:?} {}: ignoring (invalid duration)",
                    episode.display_name(),
                    current.name,
                    range
                );
                continue;
            }

            if !self.pattern.is_match(&current.name) {
                tracing::trace!(
                    "{}: chapter {:?} {}: ignoring (name does not match)",
                    episode.display_name(),
                    current.name,
                    range
                );
                continue;
            }

            tracing::trace!(
                "{}: chapter {:?} {}: okay",
                episode.display_name(),
                current.name,
                range
            );
            return Some(Segment::new(episode.id.clone(), range));
        }

        None
    }
}

impl Detector for ChapterDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Chapter
    }

    fn detect(&self, episodes: &[&Episode]) -> SeasonResult {
        let mut result = SeasonResult::default();
        for episode in episodes {
            if let Some(segment) = self.find_matching_chapter(episode) {
                result.record(segment);
            }
        }
        collect_unresolved(&mut result, episodes);
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::ChapterConfig;
    use crate::{EpisodeId, Error};

    fn episode(name: &str, mode: AnalysisMode) -> Episode {
        let intro = match mode {
            AnalysisMode::Introduction => name,
            AnalysisMode::Credits => "Introduction",
        };
        let credits = match mode {
            AnalysisMode::Introduction => "Credits",
            AnalysisMode::Credits => name,
        };

        Episode::new("e1", 2000.0).with_chapters(vec![
            Chapter::new("Cold Open", 0.0),
            Chapter::new(intro, 60.0),
            Chapter::new("Main Episode", 90.0),
            Chapter::new(credits, 1890.0),
        ])
    }

    fn find(name: &str, mode: AnalysisMode) -> Option<Segment> {
        ChapterDetector::new(&Config::default(), mode)
            .unwrap()
            .find_matching_chapter(&episode(name, mode))
    }

    #[test]
    fn test_introduction_names() {
        for name in ["Opening", "OP", "Intro", "Intro Start", "Introduction"] {
            let segment = find(name, AnalysisMode::Introduction).unwrap();
            assert_eq!(segment.range(), TimeRange::new(60.0, 90.0), "{}", name);
        }
    }

    #[test]
    fn test_credits_names() {
        for name in [
            "End Credits",
            "Ending",
            "Credit start",
            "Closing Credits",
            "Credits",
        ] {
            let segment = find(name, AnalysisMode::Credits).unwrap();
            assert_eq!(segment.range(), TimeRange::new(1890.0, 2000.0), "{}", name);
        }
    }

    #[test]
    fn test_no_match() {
        assert!(find("Recap", AnalysisMode::Introduction).is_none());
        assert!(find("Opinions", AnalysisMode::Introduction).is_none());
        assert!(find("Preview", AnalysisMode::Credits).is_none());
    }

    #[test]
    fn test_last_chapter_only_closed_for_credits() {
        let episode = Episode::new("e1", 2000.0).with_chapters(vec![
            Chapter::new("Main Episode", 0.0),
            Chapter::new("Intro", 1950.0),
        ]);
        let detector = ChapterDetector::new(&Config::default(), AnalysisMode::Introduction).unwrap();
        assert!(detector.find_matching_chapter(&episode).is_none());
    }

    #[test]
    fn test_blank_and_out_of_limits_chapters() {
        let episode = Episode::new("e1", 1500.0).with_chapters(vec![
            Chapter::new("  ", 0.0),
            // Too short.
            Chapter::new("OP", 30.0),
            // Too long.
            Chapter::new("Intro", 40.0),
            Chapter::new("Opening", 200.0),
            Chapter::new("Part A", 250.0),
        ]);
        let detector = ChapterDetector::new(&Config::default(), AnalysisMode::Introduction).unwrap();
        let segment = detector.find_matching_chapter(&episode).unwrap();
        assert_eq!(segment.range(), TimeRange::new(200.0, 250.0));
    }

    #[test]
    fn test_detect() {
        let episodes = vec![
            episode("Opening", AnalysisMode::Introduction),
            Episode::new("e2", 1300.0),
        ];
        let refs: Vec<&Episode> = episodes.iter().collect();

        let detector = ChapterDetector::new(&Config::default(), AnalysisMode::Introduction).unwrap();
        let result = detector.detect(&refs);

        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.unresolved, vec![EpisodeId::from("e2")]);
    }

    #[test]
    fn test_invalid_pattern() {
        let mut config = Config::default();
        config.chapter = ChapterConfig {
            intro_pattern: "(Intro".to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            ChapterDetector::new(&config, AnalysisMode::Introduction),
            Err(Error::InvalidPattern(_))
        ));
        // The credits pattern is still fine.
        assert!(ChapterDetector::new(&config, AnalysisMode::Credits).is_ok());
    }
}
