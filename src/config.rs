use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio;
use crate::{AnalysisMode, Error, Result};

/// Default regular expression used to find introduction chapters.
pub const DEFAULT_INTRO_PATTERN: &str = r"(^|\s)(Intro|Introduction|OP|Opening)(\s|$)";

/// Default regular expression used to find end credits chapters.
pub const DEFAULT_CREDITS_PATTERN: &str = r"(^|\s)(Credits?|ED|Ending|Outro)(\s|$)";

/// Default percentage of a frame that must be black for it to count as a black frame.
pub const DEFAULT_BLACK_FRAME_MINIMUM_PERCENTAGE: u32 = 85;

/// Default number of threads used to analyze seasons.
pub const DEFAULT_MAX_PARALLELISM: usize = 2;

fn ensure(condition: bool, field: &'static str, reason: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidConfig {
            field,
            reason: reason.to_owned(),
        })
    }
}

fn ensure_non_negative(value: f64, field: &'static str) -> Result<()> {
    ensure(
        value.is_finite() && value >= 0.0,
        field,
        "must be a non-negative number",
    )
}

fn ensure_positive(value: f64, field: &'static str) -> Result<()> {
    ensure(
        value.is_finite() && value > 0.0,
        field,
        "must be a positive number",
    )
}

/// Top-level analysis configuration.
///
/// Every field has a default, so a configuration file only needs to list the values it
/// overrides. Call [Config::validate] (or construct a component, which does it for you)
/// before running any analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub limits: SegmentLimits,
    pub fingerprint: FingerprintConfig,
    pub chapter: ChapterConfig,
    pub black_frame: BlackFrameConfig,
    /// Analyze specials (season 0).
    pub analyze_season_zero: bool,
    /// Maximum number of seasons analyzed concurrently.
    pub max_parallelism: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Default::default(),
            fingerprint: Default::default(),
            chapter: Default::default(),
            black_frame: Default::default(),
            analyze_season_zero: false,
            max_parallelism: DEFAULT_MAX_PARALLELISM,
        }
    }
}

impl Config {
    /// Loads a configuration from a JSON file and validates it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = std::fs::File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(f))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a new [Config] with the provided `limits`.
    pub fn with_limits(mut self, limits: SegmentLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns a new [Config] with the provided `fingerprint` settings.
    pub fn with_fingerprint(mut self, fingerprint: FingerprintConfig) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Returns a new [Config] with the provided `max_parallelism`.
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism;
        self
    }

    /// Returns a new [Config] with `analyze_season_zero` set to the provided value.
    pub fn with_analyze_season_zero(mut self, analyze_season_zero: bool) -> Self {
        self.analyze_season_zero = analyze_season_zero;
        self
    }

    /// Checks that all values are consistent with each other.
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        self.fingerprint.validate()?;
        self.chapter.validate()?;
        self.black_frame.validate()?;
        ensure(
            self.max_parallelism > 0,
            "max_parallelism",
            "must be at least 1",
        )
    }
}

/// Duration limits shared by all detectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentLimits {
    /// Minimum segment duration (seconds).
    pub min_duration: f64,
    /// Maximum introduction duration (seconds).
    pub max_intro_duration: f64,
    /// Maximum credits duration (seconds).
    pub max_credits_duration: f64,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            min_duration: audio::DEFAULT_MIN_DURATION,
            max_intro_duration: audio::DEFAULT_MAX_INTRO_DURATION,
            max_credits_duration: audio::DEFAULT_MAX_CREDITS_DURATION,
        }
    }
}

impl SegmentLimits {
    /// Returns a new [SegmentLimits] with the provided `min_duration`.
    pub fn with_min_duration(mut self, min_duration: f64) -> Self {
        self.min_duration = min_duration;
        self
    }

    /// Returns a new [SegmentLimits] with the provided `max_intro_duration`.
    pub fn with_max_intro_duration(mut self, max_intro_duration: f64) -> Self {
        self.max_intro_duration = max_intro_duration;
        self
    }

    /// Returns a new [SegmentLimits] with the provided `max_credits_duration`.
    pub fn with_max_credits_duration(mut self, max_credits_duration: f64) -> Self {
        self.max_credits_duration = max_credits_duration;
        self
    }

    /// Maximum accepted segment duration for the given mode.
    pub fn max_duration(&self, mode: AnalysisMode) -> f64 {
        match mode {
            AnalysisMode::Introduction => self.max_intro_duration,
            AnalysisMode::Credits => self.max_credits_duration,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_non_negative(self.min_duration, "min_duration")?;
        ensure_positive(self.max_intro_duration, "max_intro_duration")?;
        ensure_positive(self.max_credits_duration, "max_credits_duration")?;
        ensure(
            self.max_intro_duration > self.min_duration,
            "max_intro_duration",
            "must be greater than min_duration",
        )?;
        ensure(
            self.max_credits_duration > self.min_duration,
            "max_credits_duration",
            "must be greater than min_duration",
        )
    }
}

/// Settings for the fingerprint alignment engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Maximum number of differing bits (out of 32) for two points to be similar.
    pub max_point_differences: u32,
    /// Point value tolerance used when looking for shift candidates.
    pub inverted_index_shift: u32,
    /// Maximum gap (seconds) between similar timecodes of the same run.
    pub max_time_skip: f64,
    /// Minimum duration (seconds) of a silence interval used to adjust a segment's end.
    pub silence_min_duration: f64,
    /// Length (seconds) of the window before a segment's end that is searched for silence.
    pub silence_search_window: f64,
    /// Segments starting within this many seconds of the episode start are moved to 0.
    pub start_snap_threshold: f64,
    /// Runs at least this long (seconds) have their end trimmed by two merge gaps.
    pub long_run_threshold: f64,
    /// Runs at least this long (seconds) have their end trimmed by one merge gap.
    pub medium_run_threshold: f64,
    /// Reuse inverted indexes across comparisons of the same episode.
    pub cache_indexes: bool,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            max_point_differences: audio::DEFAULT_MAX_POINT_DIFFERENCES,
            inverted_index_shift: audio::DEFAULT_INVERTED_INDEX_SHIFT,
            max_time_skip: audio::DEFAULT_MAX_TIME_SKIP,
            silence_min_duration: audio::DEFAULT_SILENCE_MIN_DURATION,
            silence_search_window: audio::DEFAULT_SILENCE_SEARCH_WINDOW,
            start_snap_threshold: audio::DEFAULT_START_SNAP_THRESHOLD,
            long_run_threshold: audio::DEFAULT_LONG_RUN_THRESHOLD,
            medium_run_threshold: audio::DEFAULT_MEDIUM_RUN_THRESHOLD,
            cache_indexes: true,
        }
    }
}

impl FingerprintConfig {
    /// Returns a new [FingerprintConfig] with the provided `max_point_differences`.
    pub fn with_max_point_differences(mut self, max_point_differences: u32) -> Self {
        self.max_point_differences = max_point_differences;
        self
    }

    /// Returns a new [FingerprintConfig] with the provided `inverted_index_shift`.
    pub fn with_inverted_index_shift(mut self, inverted_index_shift: u32) -> Self {
        self.inverted_index_shift = inverted_index_shift;
        self
    }

    /// Returns a new [FingerprintConfig] with the provided `max_time_skip`.
    pub fn with_max_time_skip(mut self, max_time_skip: f64) -> Self {
        self.max_time_skip = max_time_skip;
        self
    }

    /// Returns a new [FingerprintConfig] with the provided `silence_min_duration`.
    pub fn with_silence_min_duration(mut self, silence_min_duration: f64) -> Self {
        self.silence_min_duration = silence_min_duration;
        self
    }

    /// Returns a new [FingerprintConfig] with the provided `start_snap_threshold`.
    pub fn with_start_snap_threshold(mut self, start_snap_threshold: f64) -> Self {
        self.start_snap_threshold = start_snap_threshold;
        self
    }

    /// Returns a new [FingerprintConfig] with `cache_indexes` set to the provided value.
    pub fn with_cache_indexes(mut self, cache_indexes: bool) -> Self {
        self.cache_indexes = cache_indexes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure(
            self.max_point_differences <= 32,
            "max_point_differences",
            "cannot be larger than 32",
        )?;
        ensure(
            self.inverted_index_shift <= audio::MAX_INVERTED_INDEX_SHIFT,
            "inverted_index_shift",
            &format!("cannot be larger than {}", audio::MAX_INVERTED_INDEX_SHIFT),
        )?;
        ensure_positive(self.max_time_skip, "max_time_skip")?;
        ensure(
            self.max_time_skip <= audio::MAX_TIME_SKIP_LIMIT,
            "max_time_skip",
            &format!("cannot be larger than {} seconds", audio::MAX_TIME_SKIP_LIMIT),
        )?;
        ensure_non_negative(self.silence_min_duration, "silence_min_duration")?;
        ensure_positive(self.silence_search_window, "silence_search_window")?;
        ensure_non_negative(self.start_snap_threshold, "start_snap_threshold")?;
        ensure_non_negative(self.medium_run_threshold, "medium_run_threshold")?;
        ensure_non_negative(self.long_run_threshold, "long_run_threshold")?;
        ensure(
            self.long_run_threshold >= self.medium_run_threshold,
            "long_run_threshold",
            "cannot be smaller than medium_run_threshold",
        )
    }
}

/// Chapter name patterns used by the chapter detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterConfig {
    pub intro_pattern: String,
    pub credits_pattern: String,
}

impl Default for ChapterConfig {
    fn default() -> Self {
        Self {
            intro_pattern: DEFAULT_INTRO_PATTERN.to_owned(),
            credits_pattern: DEFAULT_CREDITS_PATTERN.to_owned(),
        }
    }
}

impl ChapterConfig {
    pub fn pattern(&self, mode: AnalysisMode) -> &str {
        match mode {
            AnalysisMode::Introduction => &self.intro_pattern,
            AnalysisMode::Credits => &self.credits_pattern,
        }
    }

    pub fn validate(&self) -> Result<()> {
        regex::Regex::new(&self.intro_pattern)?;
        regex::Regex::new(&self.credits_pattern)?;
        Ok(())
    }
}

/// Settings for the black frame credits detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackFrameConfig {
    /// Percentage of a frame that must be black.
    pub minimum_percentage: u32,
    /// Length (seconds) of the end of the episode that is searched.
    pub search_window: f64,
    /// The search stops once the first black frame is known to within this many seconds.
    pub max_error: f64,
    /// Length (seconds) of each scanned window.
    pub scan_length: f64,
}

impl Default for BlackFrameConfig {
    fn default() -> Self {
        Self {
            minimum_percentage: DEFAULT_BLACK_FRAME_MINIMUM_PERCENTAGE,
            search_window: 240.0,
            max_error: 4.0,
            scan_length: 2.0,
        }
    }
}

impl BlackFrameConfig {
    pub fn validate(&self) -> Result<()> {
        ensure(
            self.minimum_percentage <= 100,
            "minimum_percentage",
            "cannot be larger than 100",
        )?;
        ensure_positive(self.search_window, "search_window")?;
        ensure_positive(self.max_error, "max_error")?;
        ensure_positive(self.scan_length, "scan_length")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_partial_file() {
        let config: Config = serde_json::from_str(
            r#"{"fingerprint": {"max_time_skip": 2.0}, "limits": {"min_duration": 20}}"#,
        )
        .unwrap();
        assert_eq!(config.fingerprint.max_time_skip, 2.0);
        assert_eq!(
            config.fingerprint.max_point_differences,
            audio::DEFAULT_MAX_POINT_DIFFERENCES
        );
        assert_eq!(config.limits.min_duration, 20.0);
        assert_eq!(config.max_parallelism, DEFAULT_MAX_PARALLELISM);
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_values() {
        let config = Config::default()
            .with_fingerprint(FingerprintConfig::default().with_max_point_differences(33));
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig {
                field: "max_point_differences",
                ..
            })
        ));

        let config = Config::default()
            .with_fingerprint(FingerprintConfig::default().with_max_time_skip(0.0));
        assert!(config.validate().is_err());

        let config = Config::default()
            .with_fingerprint(FingerprintConfig::default().with_max_time_skip(f64::NAN));
        assert!(config.validate().is_err());

        for max_time_skip in [f64::MAX, f64::INFINITY, audio::MAX_TIME_SKIP_LIMIT + 1.0] {
            let config = Config::default()
                .with_fingerprint(FingerprintConfig::default().with_max_time_skip(max_time_skip));
            assert!(matches!(
                config.validate(),
                Err(Error::InvalidConfig {
                    field: "max_time_skip",
                    ..
                })
            ));
        }
        let config = Config::default().with_fingerprint(
            FingerprintConfig::default().with_max_time_skip(audio::MAX_TIME_SKIP_LIMIT),
        );
        assert!(config.validate().is_ok());

        let config =
            Config::default().with_limits(SegmentLimits::default().with_min_duration(-1.0));
        assert!(config.validate().is_err());

        let config =
            Config::default().with_limits(SegmentLimits::default().with_max_intro_duration(10.0));
        assert!(config.validate().is_err());

        let config = Config::default().with_max_parallelism(0);
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chapter.intro_pattern = "(unclosed".to_owned();
        assert!(matches!(config.validate(), Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn test_max_duration() {
        let limits = SegmentLimits::default();
        assert_eq!(limits.max_duration(AnalysisMode::Introduction), 120.0);
        assert_eq!(limits.max_duration(AnalysisMode::Credits), 300.0);
    }
}
