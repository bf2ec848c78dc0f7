use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::{Fingerprint, Fingerprinted};
use crate::{EpisodeId, Result, TimeRange};

/// A named chapter marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default)]
    pub name: String,
    /// Chapter start (seconds).
    pub start: f64,
}

impl Chapter {
    pub fn new(name: impl Into<String>, start: f64) -> Self {
        Self {
            name: name.into(),
            start,
        }
    }
}

/// A video frame that is at least partially black.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlackFrame {
    /// Percentage of the frame that is black.
    pub percentage: u32,
    /// Time (seconds) at which the frame is shown.
    pub time: f64,
}

impl BlackFrame {
    pub fn new(percentage: u32, time: f64) -> Self {
        Self { percentage, time }
    }
}

/// Source of black frames for a single episode.
///
/// The black frame detector only asks for short windows near the end of an episode, so an
/// implementation backed by a video decoder only has to decode those.
pub trait BlackFrameSource {
    /// Returns the frames in `range` that are at least `minimum_percentage` black, in
    /// chronological order. Frame times are relative to the start of the episode.
    fn black_frames(&self, range: TimeRange, minimum_percentage: u32) -> Vec<BlackFrame>;
}

/// Everything known about one episode before analysis.
///
/// Fingerprints, silence intervals and black frames are produced by external tools. Any of
/// them may be missing, in which case the detectors that need them leave the episode alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    #[serde(default)]
    pub name: String,
    /// Duration (seconds) of the media file.
    #[serde(default)]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fingerprint: Vec<u32>,
    /// Fingerprint file to load when `fingerprint` is empty. Relative paths are resolved
    /// against the directory of the season file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_path: Option<PathBuf>,
    /// Time (seconds) at which the fingerprinted region starts.
    #[serde(default)]
    pub fingerprint_start: f64,
    /// Silence intervals, in chronological order.
    #[serde(default)]
    pub silence: Vec<TimeRange>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    /// Black frames, in chronological order.
    #[serde(default)]
    pub black_frames: Vec<BlackFrame>,
}

impl Episode {
    pub fn new(id: impl Into<EpisodeId>, duration: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            duration,
            fingerprint: Vec::new(),
            fingerprint_path: None,
            fingerprint_start: 0.0,
            silence: Vec::new(),
            chapters: Vec::new(),
            black_frames: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<Vec<u32>>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn with_fingerprint_start(mut self, fingerprint_start: f64) -> Self {
        self.fingerprint_start = fingerprint_start;
        self
    }

    pub fn with_silence(mut self, silence: impl Into<Vec<TimeRange>>) -> Self {
        self.silence = silence.into();
        self
    }

    pub fn with_chapters(mut self, chapters: impl Into<Vec<Chapter>>) -> Self {
        self.chapters = chapters.into();
        self
    }

    pub fn with_black_frames(mut self, black_frames: impl Into<Vec<BlackFrame>>) -> Self {
        self.black_frames = black_frames.into();
        self
    }

    /// Name used in log messages.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }

    /// Loads the fingerprint from `fingerprint_path` if no points are present yet.
    fn load_fingerprint(&mut self, base: &Path) -> Result<()> {
        let path = match &self.fingerprint_path {
            Some(path) if self.fingerprint.is_empty() => base.join(path),
            _ => return Ok(()),
        };

        let data = Fingerprint::from_path(&path)?;
        if data.episode_id != self.id {
            tracing::warn!(
                "fingerprint at {} belongs to {}, not {}",
                path.display(),
                data.episode_id,
                self.id
            );
        }
        self.fingerprint = data.points;

        Ok(())
    }
}

impl Fingerprinted for Episode {
    fn episode_id(&self) -> &EpisodeId {
        &self.id
    }

    fn points(&self) -> &[u32] {
        &self.fingerprint
    }
}

impl BlackFrameSource for Episode {
    fn black_frames(&self, range: TimeRange, minimum_percentage: u32) -> Vec<BlackFrame> {
        self.black_frames
            .iter()
            .filter(|f| f.percentage >= minimum_percentage)
            .filter(|f| f.time >= range.start() && f.time <= range.end())
            .copied()
            .collect()
    }
}

/// The episodes of one season of a series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Season {
    #[serde(default)]
    pub series: String,
    /// Season number. Season 0 holds specials.
    #[serde(default)]
    pub number: u32,
    pub episodes: Vec<Episode>,
}

impl Season {
    pub fn new(series: impl Into<String>, number: u32, episodes: Vec<Episode>) -> Self {
        Self {
            series: series.into(),
            number,
            episodes,
        }
    }

    /// Loads a season from a JSON file, along with any fingerprint files it references.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = std::io::BufReader::new(std::fs::File::open(path)?);
        let mut season: Self = serde_json::from_reader(f)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for episode in &mut season.episodes {
            episode.load_fingerprint(base)?;
        }

        Ok(season)
    }

    pub fn is_specials(&self) -> bool {
        self.number == 0
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} season {}", self.series, self.number)
    }
}
