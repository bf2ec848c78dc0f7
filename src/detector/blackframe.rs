use super::{collect_unresolved, BlackFrameSource, Detector, DetectorKind, Episode};
use crate::audio::SeasonResult;
use crate::config::BlackFrameConfig;
use crate::{Config, Result, Segment, TimeRange};

/// Finds end credits shown over a black background.
///
/// Rather than scanning the whole end of an episode, the detector bisects it: a short window
/// is sampled in the middle of the bracket that contains the first black frame, and the
/// bracket shrinks towards the start if black frames were found and towards the end if not.
#[derive(Debug)]
pub struct BlackFrameDetector {
    config: BlackFrameConfig,
}

impl BlackFrameDetector {
    pub fn new(config: &Config) -> Result<Self> {
        config.black_frame.validate()?;
        Ok(Self {
            config: config.black_frame.clone(),
        })
    }

    /// Searches the end of `episode` for the first black frame of the credits, using `source`
    /// to look for black frames.
    pub fn find_credits(
        &self,
        episode: &Episode,
        source: &impl BlackFrameSource,
    ) -> Option<Segment> {
        let duration = episode.duration;

        // Offsets from the end of the episode.
        let mut start = self.config.search_window;
        let mut end = 0.0;
        let mut first_frame = 0.0;

        while start - end > self.config.max_error {
            let midpoint = (start + end) / 2.0;
            let scan_time = duration - midpoint;
            let window = TimeRange::new(scan_time, scan_time + self.config.scan_length);

            let frames = source.black_frames(window, self.config.minimum_percentage);
            tracing::trace!(
                "{}: bisect [{:.3}, {:.3}], window {}, {} black frames",
                episode.display_name(),
                start,
                end,
                window,
                frames.len()
            );

            match frames.first() {
                None => start = midpoint,
                Some(frame) => {
                    end = midpoint;
                    first_frame = frame.time;
                }
            }
        }

        if first_frame > 0.0 {
            Some(Segment::new(
                episode.id.clone(),
                TimeRange::new(first_frame, duration),
            ))
        } else {
            None
        }
    }
}

impl Detector for BlackFrameDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::BlackFrame
    }

    fn detect(&self, episodes: &[&Episode]) -> SeasonResult {
        let mut result = SeasonResult::default();
        for episode in episodes {
            if let Some(segment) = self.find_credits(episode, *episode) {
                result.record(segment);
            }
        }
        collect_unresolved(&mut result, episodes);
        result
    }
}
