#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::detector::{Detection, DetectorChain, Season};
use crate::{AnalysisMode, Config, Result};

/// Outcome of analyzing one season.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonReport {
    pub series: String,
    pub number: u32,
    pub mode: AnalysisMode,
    pub detection: Detection,
}

/// Runs a [DetectorChain] over many seasons.
///
/// Every season gets its own chain, so per-season state such as the fingerprint index cache is
/// never shared between seasons that are analyzed at the same time.
pub struct Runner {
    config: Config,
    mode: AnalysisMode,
    threading: bool,
}

impl Runner {
    /// Constructs a [Runner] for `mode`, failing if the configuration is inconsistent.
    pub fn new(config: Config, mode: AnalysisMode) -> Result<Self> {
        config.validate()?;
        // Fail before any season is analyzed if the chain cannot be built.
        DetectorChain::for_mode(&config, mode)?;
        Ok(Self {
            config,
            mode,
            threading: true,
        })
    }

    /// Returns a new [Runner] that analyzes seasons in parallel if `threading` is set and the
    /// `rayon` feature is enabled.
    pub fn with_threading(mut self, threading: bool) -> Self {
        self.threading = threading;
        self
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn should_analyze(&self, season: &Season) -> bool {
        if season.episodes.is_empty() {
            tracing::debug!("{}: no episodes", season);
            return false;
        }
        if season.is_specials() && !self.config.analyze_season_zero {
            tracing::debug!("{}: skipping specials", season);
            return false;
        }
        true
    }

    /// Analyzes a single season with a fresh [DetectorChain] and drops its state afterwards.
    pub fn analyze_season(&self, season: &Season) -> Result<SeasonReport> {
        let span = tracing::span!(
            tracing::Level::TRACE,
            "analyze_season",
            series = %season.series,
            number = season.number
        );
        let _enter = span.enter();

        tracing::info!(
            "Analyzing {} files from {} ({})",
            season.episodes.len(),
            season,
            self.mode()
        );

        let chain = DetectorChain::for_mode(&self.config, self.mode)?;
        let detection = chain.detect(&season.episodes);
        chain.evict(&season.episodes);

        tracing::info!(
            "{}: found {} segments, {} episodes unresolved",
            season,
            detection.segments.len(),
            detection.unresolved.len()
        );

        Ok(SeasonReport {
            series: season.series.clone(),
            number: season.number,
            mode: self.mode,
            detection,
        })
    }

    /// Analyzes every season that should be analyzed. Reports are returned in input order;
    /// skipped seasons have no report.
    pub fn run(&self, seasons: &[Season]) -> Result<Vec<SeasonReport>> {
        let seasons: Vec<&Season> = seasons.iter().filter(|s| self.should_analyze(s)).collect();
        let mut reports = Vec::new();

        if cfg!(feature = "rayon") && self.threading {
            // Analyze up to max_parallelism seasons at the same time.
            #[cfg(feature = "rayon")]
            {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.max_parallelism)
                    .build()?;
                reports = pool.install(|| {
                    seasons
                        .par_iter()
                        .map(|season| self.analyze_season(season))
                        .collect::<Result<Vec<_>>>()
                })?;
            }
        } else {
            for season in seasons {
                reports.push(self.analyze_season(season)?);
            }
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::audio::comparator::test::noise;
    use crate::audio::to_timecode;
    use crate::detector::{Chapter, DetectorKind, Episode};
    use crate::{EpisodeId, Error, TimeRange};

    fn season(series: &str, number: u32) -> Season {
        let intro = noise(60 + number, 250);
        Season::new(
            series,
            number,
            vec![
                Episode::new("e1", 1300.0)
                    .with_fingerprint([intro.clone(), noise(70 + number, 300)].concat()),
                Episode::new("e2", 1300.0)
                    .with_fingerprint([intro, noise(80 + number, 300)].concat()),
                Episode::new("e3", 1300.0).with_chapters(vec![
                    Chapter::new("Recap", 0.0),
                    Chapter::new("Opening", 30.0),
                    Chapter::new("Part A", 100.0),
                ]),
            ],
        )
    }

    fn runner(config: Config, threading: bool) -> Runner {
        Runner::new(config, AnalysisMode::Introduction)
            .unwrap()
            .with_threading(threading)
    }

    #[test]
    fn test_run() {
        let seasons = vec![season("Show", 1), season("Show", 2)];

        let sequential = runner(Config::default(), false).run(&seasons).unwrap();
        let threaded = runner(Config::default(), true).run(&seasons).unwrap();
        assert_eq!(threaded, sequential);

        assert_eq!(sequential.len(), 2);
        assert_eq!(sequential[0].number, 1);
        assert_eq!(sequential[1].number, 2);

        for report in &sequential {
            let detection = &report.detection;
            assert_eq!(detection.segments.len(), 3);
            assert!(detection.unresolved.is_empty());
            assert_eq!(
                detection.detected_by[&EpisodeId::from("e3")],
                DetectorKind::Chapter
            );
            assert_eq!(
                detection.detected_by[&EpisodeId::from("e1")],
                DetectorKind::Fingerprint
            );
            assert_eq!(
                detection.segments[&EpisodeId::from("e3")].range(),
                TimeRange::new(30.0, 100.0)
            );
        }
    }

    /// Seasons whose episodes share ids but not content. In season `n` the intro of e1 starts
    /// after `40 * n` points of noise.
    fn colliding_seasons(count: u32) -> Vec<Season> {
        (1..=count)
            .map(|n| {
                let intro = noise(100 + n, 250);
                let lead = noise(200 + n, 40 * n as usize);
                Season::new(
                    "Show",
                    n,
                    vec![
                        Episode::new("e1", 1300.0)
                            .with_fingerprint([lead, intro.clone(), noise(300 + n, 300)].concat()),
                        Episode::new("e2", 1300.0)
                            .with_fingerprint([intro, noise(400 + n, 300)].concat()),
                    ],
                )
            })
            .collect()
    }

    #[test]
    fn test_colliding_episode_ids() {
        let seasons = colliding_seasons(8);
        let config = Config::default().with_max_parallelism(4);

        let sequential = runner(config.clone(), false).run(&seasons).unwrap();
        assert_eq!(sequential.len(), 8);

        for (n, report) in (1..).zip(&sequential) {
            let segments = &report.detection.segments;
            assert_eq!(segments.len(), 2, "season {}", n);
            assert_eq!(
                segments[&EpisodeId::from("e1")].start,
                to_timecode(40 * n),
                "season {}",
                n
            );
            assert_eq!(segments[&EpisodeId::from("e2")].start, 0.0, "season {}", n);
        }

        // Threaded runs must never see another season's fingerprints.
        for _ in 0..5 {
            let threaded = runner(config.clone(), true).run(&seasons).unwrap();
            assert_eq!(threaded, sequential);
        }
    }

    #[test]
    fn test_specials() {
        let seasons = vec![season("Show", 0), season("Show", 1)];

        let runner = Runner::new(Config::default(), AnalysisMode::Introduction).unwrap();
        let reports = runner.run(&seasons).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].number, 1);

        let config = Config::default().with_analyze_season_zero(true);
        let runner = Runner::new(config, AnalysisMode::Introduction).unwrap();
        assert_eq!(runner.run(&seasons).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_season_is_skipped() {
        let seasons = vec![Season::new("Show", 1, Vec::new())];
        let runner = Runner::new(Config::default(), AnalysisMode::Credits).unwrap();
        assert!(runner.run(&seasons).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config() {
        let config = Config::default().with_max_parallelism(0);
        assert!(matches!(
            Runner::new(config, AnalysisMode::Introduction),
            Err(Error::InvalidConfig {
                field: "max_parallelism",
                ..
            })
        ));
    }
}
