use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::range::TimeRange;
use crate::util;

/// Opaque identifier of a single episode.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(String);

impl EpisodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EpisodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EpisodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of shared segment being searched for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Opening sequence near the start of each episode.
    #[default]
    Introduction,
    /// End credits near the end of each episode.
    Credits,
}

impl Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Introduction => f.write_str("introduction"),
            AnalysisMode::Credits => f.write_str("credits"),
        }
    }
}

/// A shared segment (introduction or credits) detected in one episode.
///
/// All times are in seconds from the start of the media file. A segment is only
/// [valid](Segment::is_valid) if it ends after both zero and its own start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub episode_id: EpisodeId,
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(episode_id: EpisodeId, range: TimeRange) -> Self {
        Self {
            episode_id,
            start: range.start(),
            end: range.end(),
        }
    }

    /// Constructs the "no match" segment for an episode.
    pub fn invalid(episode_id: EpisodeId) -> Self {
        Self {
            episode_id,
            start: 0.0,
            end: 0.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.end > 0.0 && self.end > self.start
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    /// Returns a copy of this segment with a new end.
    pub fn with_end(&self, end: f64) -> Self {
        Self {
            episode_id: self.episode_id.clone(),
            start: self.start,
            end,
        }
    }

    /// Returns a copy of this segment with both boundaries moved by `offset` seconds.
    pub fn offset_by(&self, offset: f64) -> Self {
        Self {
            episode_id: self.episode_id.clone(),
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(
                f,
                "{}: {}",
                self.episode_id,
                util::format_span(self.start, self.end)
            )
        } else {
            write!(f, "{}: N/A", self.episode_id)
        }
    }
}
