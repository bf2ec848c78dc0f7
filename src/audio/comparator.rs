use std::fmt::Display;
use std::sync::Arc;

use super::{find_shift_candidates, scan_similarity, Fingerprinted, IndexCache, InvertedIndex};
use crate::config::{FingerprintConfig, SegmentLimits};
use crate::range::{self, TimeRange};
use crate::{AnalysisMode, Config, Result, Segment};

/// The best shared run found at one shift.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Candidate {
    shift: isize,
    lhs: TimeRange,
    rhs: TimeRange,
}

impl Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "shift: {}, lhs: {}, rhs: {}, duration: {:.3}",
            self.shift,
            self.lhs,
            self.rhs,
            self.lhs.duration()
        )
    }
}

/// Aligns episode fingerprints to find the segments they share.
///
/// A comparator is built from a validated [Config] and is cheap to share between threads.
/// By default it keeps an [IndexCache] so that each episode's inverted index is built once
/// per season, no matter how many comparisons the episode takes part in.
#[derive(Debug)]
pub struct Comparator {
    limits: SegmentLimits,
    config: FingerprintConfig,
    mode: AnalysisMode,
    cache: Option<Arc<IndexCache>>,
}

impl Default for Comparator {
    fn default() -> Self {
        Self {
            limits: Default::default(),
            config: Default::default(),
            mode: AnalysisMode::Introduction,
            cache: Some(Arc::new(IndexCache::new())),
        }
    }
}

impl Comparator {
    /// Constructs a [Comparator] from a configuration, failing if the configuration is
    /// inconsistent.
    pub fn new(config: &Config) -> Result<Self> {
        config.limits.validate()?;
        config.fingerprint.validate()?;

        let cache = config
            .fingerprint
            .cache_indexes
            .then(|| Arc::new(IndexCache::new()));

        Ok(Self {
            limits: config.limits.clone(),
            config: config.fingerprint.clone(),
            mode: AnalysisMode::Introduction,
            cache,
        })
    }

    /// Returns a new [Comparator] with the provided `mode`.
    pub fn with_mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns a new [Comparator] that shares the provided `cache`.
    pub fn with_cache(mut self, cache: Arc<IndexCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn limits(&self) -> &SegmentLimits {
        &self.limits
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&Arc<IndexCache>> {
        self.cache.as_ref()
    }

    fn index(&self, fingerprint: &impl Fingerprinted) -> Arc<InvertedIndex> {
        match &self.cache {
            Some(cache) => cache.get_or_build(fingerprint.episode_id(), fingerprint.points()),
            None => Arc::new(InvertedIndex::from_points(fingerprint.points())),
        }
    }

    /// Finds the longest run of similar points shared by both fingerprints at `shift`.
    ///
    /// Runs shorter than the minimum duration are rejected.
    fn shared_run(&self, lhs: &[u32], rhs: &[u32], shift: isize) -> Option<Candidate> {
        let times = scan_similarity(lhs, rhs, shift, self.config.max_point_differences);

        let lhs_run = range::find_contiguous(times.lhs, self.config.max_time_skip)?;
        if lhs_run.duration() < self.limits.min_duration {
            return None;
        }

        let rhs_run = range::find_contiguous(times.rhs, self.config.max_time_skip)?;
        if rhs_run.duration() < self.limits.min_duration {
            return None;
        }

        Some(Candidate {
            shift,
            lhs: lhs_run,
            rhs: rhs_run,
        })
    }

    /// Moves the start of a run to 0 if it starts close enough to the start of the episode.
    pub fn snap_start(&self, run: TimeRange) -> TimeRange {
        if run.start() <= self.config.start_snap_threshold {
            run.with_start(0.0)
        } else {
            run
        }
    }

    /// Amount (seconds) to pull in the end of a run that was detected with `duration`.
    fn trim_amount(&self, duration: f64) -> f64 {
        if duration >= self.config.long_run_threshold {
            2.0 * self.config.max_time_skip
        } else if duration >= self.config.medium_run_threshold {
            self.config.max_time_skip
        } else {
            0.0
        }
    }

    /// Pulls the end of a run inwards so that as little content as possible is skipped.
    ///
    /// The amount depends on the duration of the run as it was detected.
    pub fn trim_end(&self, run: TimeRange) -> TimeRange {
        run.with_end(run.end() - self.trim_amount(run.duration()))
    }

    /// Turns the best candidate into one segment per episode.
    ///
    /// Both sides are trimmed by the same amount, chosen from the lhs run.
    fn to_segments(
        &self,
        lhs: &impl Fingerprinted,
        rhs: &impl Fingerprinted,
        best: &Candidate,
    ) -> (Segment, Segment) {
        let trim = self.trim_amount(best.lhs.duration());
        let segment = |fingerprint: &dyn Fingerprinted, run: TimeRange| {
            let trimmed = run.with_end(run.end() - trim);
            Segment::new(fingerprint.episode_id().clone(), self.snap_start(trimmed))
        };
        (segment(lhs, best.lhs), segment(rhs, best.rhs))
    }

    /// Searches two episodes for a shared segment.
    ///
    /// Returns one segment per episode. If either fingerprint is empty or nothing long enough
    /// is shared, both segments are invalid.
    pub fn align_pair<L, R>(&self, lhs: &L, rhs: &R) -> (Segment, Segment)
    where
        L: Fingerprinted,
        R: Fingerprinted,
    {
        let span = tracing::span!(
            tracing::Level::TRACE,
            "align_pair",
            lhs = %lhs.episode_id(),
            rhs = %rhs.episode_id()
        );
        let _enter = span.enter();

        let no_match = || {
            (
                Segment::invalid(lhs.episode_id().clone()),
                Segment::invalid(rhs.episode_id().clone()),
            )
        };

        if lhs.points().is_empty() || rhs.points().is_empty() {
            tracing::warn!(
                lhs_points = lhs.points().len(),
                rhs_points = rhs.points().len(),
                "skipping comparison of {} and {}: empty fingerprint",
                lhs.episode_id(),
                rhs.episode_id(),
            );
            return no_match();
        }

        let (lhs_index, rhs_index) = (self.index(lhs), self.index(rhs));
        let shifts =
            find_shift_candidates(&lhs_index, &rhs_index, self.config.inverted_index_shift);

        tracing::trace!(num_shifts = shifts.len(), "found shift candidates");

        // Keep the first candidate with the longest run.
        let mut best: Option<Candidate> = None;
        for shift in shifts {
            let candidate = match self.shared_run(lhs.points(), rhs.points(), shift) {
                Some(c) => c,
                None => continue,
            };
            tracing::trace!("candidate: {}", candidate);
            match best {
                Some(b) if b.lhs.cmp_duration(&candidate.lhs).is_ge() => (),
                _ => best = Some(candidate),
            }
        }

        match best {
            Some(best) => {
                tracing::debug!(
                    "found shared segment between {} and {}: {}",
                    lhs.episode_id(),
                    rhs.episode_id(),
                    best
                );
                self.to_segments(lhs, rhs, &best)
            }
            None => {
                tracing::debug!(
                    "unable to find a shared segment between {} and {}",
                    lhs.episode_id(),
                    rhs.episode_id()
                );
                no_match()
            }
        }
    }
}
