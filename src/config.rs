//! Run configuration.
//!
//! A [`RunConfig`] is built once, before any worker starts, and never
//! mutated. Workers receive their own copy (JSON on stdin) with only the
//! candidate list replaced by their chunk.

use crate::image::normalize::{Normalizer, CANONICAL_SIZE};
use crate::keypoint::OrbConfig;
use crate::metric::{SearchMode, Thresholds};
use crate::partition::WorkerCount;
use crate::util::{TexSearchError, TexSearchResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tunable constants, loadable from a JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Side length every image is resized to.
    pub canonical_size: u32,
    pub thresholds: Thresholds,
    pub orb: OrbConfig,
    /// Data parallelism inside the metrics; needs the `rayon` feature.
    pub parallel: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            canonical_size: CANONICAL_SIZE,
            thresholds: Thresholds::default(),
            orb: OrbConfig::default(),
            parallel: false,
        }
    }
}

impl Tuning {
    /// Parses tuning JSON; missing fields take their defaults.
    pub fn from_json(text: &str) -> TexSearchResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.canonical_size)
    }
}

/// Option words that follow the candidate directory on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: SearchMode,
    pub verbose: bool,
    pub workers: WorkerCount,
    /// Words that were not recognized and therefore ignored.
    pub ignored: Vec<String>,
}

impl RunOptions {
    /// Parses `compare`, `highlowres`, `-v` and `threading=N` in any order.
    ///
    /// Exactly one mode word is required. `threading=N` must name 2, 3 or 4;
    /// leaving it out scans in a single process.
    pub fn parse<S: AsRef<str>>(words: &[S]) -> TexSearchResult<Self> {
        let mut compare = false;
        let mut highlowres = false;
        let mut verbose = false;
        let mut workers = WorkerCount::SINGLE;
        let mut ignored = Vec::new();

        for word in words.iter().map(AsRef::as_ref) {
            if let Some(value) = word.strip_prefix("threading=") {
                let count: usize = value
                    .trim()
                    .parse()
                    .map_err(|_| TexSearchError::InvalidThreadCount(value.to_string()))?;
                if count == 0 {
                    return Err(TexSearchError::ThreadCountOutOfRange(0));
                }
                workers = WorkerCount::new(count)?;
                continue;
            }
            match word {
                "-v" => verbose = true,
                "compare" => compare = true,
                "highlowres" => highlowres = true,
                other => ignored.push(other.to_string()),
            }
        }

        let mode = match (compare, highlowres) {
            (true, true) => return Err(TexSearchError::ConflictingModes),
            (true, false) => SearchMode::Compare,
            (false, true) => SearchMode::HighLowRes,
            (false, false) => return Err(TexSearchError::MissingMode),
        };

        Ok(Self {
            mode,
            verbose,
            workers,
            ignored,
        })
    }
}

/// Everything a scan needs, fixed for the lifetime of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub mode: SearchMode,
    pub verbose: bool,
    pub workers: WorkerCount,
    pub key_path: PathBuf,
    pub candidate_dir: PathBuf,
    pub log_path: PathBuf,
    /// Candidates this process scans: the full list, or one worker's chunk.
    pub candidates: Vec<PathBuf>,
    #[serde(default)]
    pub tuning: Tuning,
}

impl RunConfig {
    /// Validates the inputs and assembles a configuration with an empty
    /// candidate list.
    pub fn new(
        key_path: impl Into<PathBuf>,
        candidate_dir: impl Into<PathBuf>,
        options: &RunOptions,
        log_path: impl Into<PathBuf>,
        tuning: Tuning,
    ) -> TexSearchResult<Self> {
        let key_path = key_path.into();
        if !key_path.is_file() {
            return Err(TexSearchError::MissingKeyImage(key_path));
        }
        let candidate_dir = candidate_dir.into();
        if !candidate_dir.is_dir() {
            return Err(TexSearchError::InvalidDirectory(candidate_dir));
        }
        Ok(Self {
            mode: options.mode,
            verbose: options.verbose,
            workers: options.workers,
            key_path,
            candidate_dir,
            log_path: log_path.into(),
            candidates: Vec::new(),
            tuning,
        })
    }

    /// Returns a copy scanning `candidates` instead of the current list.
    pub fn with_candidates(&self, candidates: &[PathBuf]) -> Self {
        Self {
            candidates: candidates.to_vec(),
            ..self.clone()
        }
    }

    pub fn to_json(&self) -> TexSearchResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> TexSearchResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Resolves a relative key path against `cwd`.
pub fn resolve_against(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::{RunConfig, RunOptions, Tuning};
    use crate::metric::SearchMode;
    use crate::util::TexSearchError;
    use std::path::PathBuf;

    #[test]
    fn options_in_any_order() {
        let opts = RunOptions::parse(&["threading=3", "-v", "highlowres"]).unwrap();
        assert_eq!(opts.mode, SearchMode::HighLowRes);
        assert!(opts.verbose);
        assert_eq!(opts.workers.get(), 3);

        let opts = RunOptions::parse(&["compare", "extra"]).unwrap();
        assert_eq!(opts.mode, SearchMode::Compare);
        assert!(!opts.verbose);
        assert!(!opts.workers.is_pooled());
        assert_eq!(opts.ignored, vec!["extra".to_string()]);
    }

    #[test]
    fn mode_errors() {
        assert!(matches!(
            RunOptions::parse(&["-v"]),
            Err(TexSearchError::MissingMode)
        ));
        assert!(matches!(
            RunOptions::parse(&["compare", "highlowres"]),
            Err(TexSearchError::ConflictingModes)
        ));
    }

    #[test]
    fn thread_count_errors() {
        assert!(matches!(
            RunOptions::parse(&["compare", "threading=two"]),
            Err(TexSearchError::InvalidThreadCount(v)) if v == "two"
        ));
        for bad in ["threading=1", "threading=5", "threading=0"] {
            let err = RunOptions::parse(&["compare", bad]).unwrap_err();
            assert!(matches!(err, TexSearchError::ThreadCountOutOfRange(_)));
        }
    }

    #[test]
    fn config_validates_paths() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("key.png");
        std::fs::write(&key, b"x").unwrap();
        let opts = RunOptions::parse(&["highlowres"]).unwrap();

        let missing = dir.path().join("missing.png");
        assert!(matches!(
            RunConfig::new(&missing, dir.path(), &opts, "log.txt", Tuning::default()),
            Err(TexSearchError::MissingKeyImage(p)) if p == missing
        ));
        assert!(matches!(
            RunConfig::new(&key, &key, &opts, "log.txt", Tuning::default()),
            Err(TexSearchError::InvalidDirectory(_))
        ));
        assert!(RunConfig::new(&key, dir.path(), &opts, "log.txt", Tuning::default()).is_ok());
    }

    #[test]
    fn worker_copy_only_replaces_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("key.png");
        std::fs::write(&key, b"x").unwrap();
        let opts = RunOptions::parse(&["compare", "threading=2"]).unwrap();
        let mut cfg =
            RunConfig::new(&key, dir.path(), &opts, "run_matches.txt", Tuning::default()).unwrap();
        cfg.candidates = vec![PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")];

        let chunk = cfg.with_candidates(&cfg.candidates[1..]);
        assert_eq!(chunk.candidates, vec![PathBuf::from("b"), PathBuf::from("c")]);
        assert_eq!(chunk.log_path, cfg.log_path);
        assert_eq!(chunk.key_path, cfg.key_path);

        let json = chunk.to_json().unwrap();
        assert_eq!(RunConfig::from_json(&json).unwrap(), chunk);
    }

    #[test]
    fn tuning_fills_missing_fields() {
        let tuning = Tuning::from_json(r#"{"thresholds": {"max_mse": 250.0}}"#).unwrap();
        assert_eq!(tuning.thresholds.max_mse, 250.0);
        assert_eq!(tuning.thresholds.min_correspondences, 400);
        assert_eq!(tuning.canonical_size, 1024);
        assert!(!tuning.parallel);
    }
}
