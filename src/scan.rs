//! Linear scan of a candidate list against one key image.

use crate::config::RunConfig;
use crate::image::normalize::Normalizer;
use crate::matchlog::MatchLogger;
use crate::metric::{KeyImage, MetricEngine, Score};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{TexSearchError, TexSearchResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// What happened to one candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// Not a readable image; skipped.
    Skipped,
    /// Decoded, but the metric could not be computed; counts as no match.
    Failed,
    /// Scored; `matched` records whether a log line was written.
    Scored { score: Score, matched: bool },
}

/// Totals for one scan. Workers report theirs to the parent as JSON.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Candidates attempted, including skipped ones.
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub matched: usize,
    pub elapsed: Duration,
}

impl ScanSummary {
    /// Adds another worker's totals to this one.
    pub fn merge(&mut self, other: &ScanSummary) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.matched += other.matched;
        self.elapsed = self.elapsed.max(other.elapsed);
    }
}

/// Scans candidates against a key normalized once at construction.
pub struct ScanDriver {
    normalizer: Normalizer,
    engine: MetricEngine,
    key: KeyImage,
    logger: MatchLogger,
}

impl ScanDriver {
    /// Normalizes the key image; an unreadable key is fatal for the run.
    pub fn new(config: &RunConfig) -> TexSearchResult<Self> {
        let normalizer = config.tuning.normalizer();
        let engine = MetricEngine::new(
            config.mode,
            config.tuning.thresholds,
            config.tuning.orb.clone(),
        )
        .with_parallel(config.tuning.parallel);
        let key_image = normalizer.normalize(&config.key_path)?;
        let key = engine.prepare_key(&config.key_path, key_image);
        let key_display = key.path().display().to_string();
        trace_event!(
            "key_ready",
            key = key_display.as_str(),
            features = key.features().map_or(0, |f| f.len())
        );
        Ok(Self {
            normalizer,
            engine,
            key,
            logger: MatchLogger::new(&config.log_path),
        })
    }

    /// Scans `candidates` in order. Only log write failures abort the scan.
    pub fn scan(&self, candidates: &[PathBuf]) -> TexSearchResult<ScanSummary> {
        let _span = trace_span!(
            "scan",
            mode = self.engine.mode().as_str(),
            candidates = candidates.len()
        ).entered();
        let start = Instant::now();
        let mut summary = ScanSummary::default();

        for path in candidates {
            summary.processed += 1;
            match self.scan_one(path)? {
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Scored { matched: true, .. } => summary.matched += 1,
                Outcome::Scored { .. } => {}
            }
        }

        summary.elapsed = start.elapsed();
        trace_event!(
            "scan_finished",
            processed = summary.processed,
            matched = summary.matched,
            skipped = summary.skipped,
            elapsed_s = summary.elapsed.as_secs_f64(),
        );
        Ok(summary)
    }

    /// Normalizes, scores and (if matched) logs a single candidate.
    pub fn scan_one(&self, path: &Path) -> TexSearchResult<Outcome> {
        let candidate_display = path.display().to_string();
        let image = match self.normalizer.normalize(path) {
            Ok(image) => image,
            Err(TexSearchError::UnreadableInput { reason, .. }) => {
                trace_event!(
                    "candidate_skipped",
                    candidate = candidate_display.as_str(),
                    reason = reason.as_str()
                );
                return Ok(Outcome::Skipped);
            }
            Err(err) => return Err(err),
        };

        let score = match self.engine.score(&self.key, &image) {
            Ok(score) => score,
            Err(err) => {
                let reason = err.to_string();
                trace_warn!(
                    "metric_failed",
                    candidate = candidate_display.as_str(),
                    reason = reason.as_str()
                );
                return Ok(Outcome::Failed);
            }
        };

        let matched = self.engine.is_match(score);
        let score_text = score.to_string();
        trace_event!(
            "candidate_scored",
            candidate = candidate_display.as_str(),
            score = score_text.as_str(),
            matched = matched
        );
        if matched {
            self.logger.record(path, score)?;
        }
        Ok(Outcome::Scored { score, matched })
    }
}

/// Runs one scan over the candidates carried by `config`.
pub fn run_worker(config: &RunConfig) -> TexSearchResult<ScanSummary> {
    ScanDriver::new(config)?.scan(&config.candidates)
}

/// Lists the direct children of `dir` that are files, sorted by name.
pub fn list_candidates(dir: &Path) -> TexSearchResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| TexSearchError::ListDirectory {
            path: dir.to_path_buf(),
            reason: err.to_string(),
        })?;
        if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
