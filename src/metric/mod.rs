//! Similarity metrics and match thresholds.
//!
//! A run uses exactly one [`SearchMode`]:
//! - [`SearchMode::HighLowRes`] scores with pixel MSE (lower is closer) and
//!   matches when the score is below [`Thresholds::max_mse`].
//! - [`SearchMode::Compare`] scores with the number of cross-checked keypoint
//!   correspondences (higher is closer) and matches when the count exceeds
//!   [`Thresholds::min_correspondences`].

pub mod mse;

use crate::image::normalize::NormalizedImage;
use crate::keypoint::{CrossCheckMatcher, Features, OrbConfig, OrbExtractor};
use crate::util::{TexSearchError, TexSearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use mse::mse;
#[cfg(feature = "rayon")]
pub use mse::mse_par;

/// Default MSE cut-off for duplicate detection.
pub const DEFAULT_MAX_MSE: f64 = 1000.0;

/// Default correspondence cut-off for structural similarity.
pub const DEFAULT_MIN_CORRESPONDENCES: usize = 400;

/// Which similarity notion a run searches for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Structural similarity via keypoint correspondences.
    Compare,
    /// The same image at another resolution, via MSE.
    HighLowRes,
}

impl SearchMode {
    /// The option word that selects this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            SearchMode::Compare => "compare",
            SearchMode::HighLowRes => "highlowres",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = TexSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compare" => Ok(SearchMode::Compare),
            "highlowres" => Ok(SearchMode::HighLowRes),
            _ => Err(TexSearchError::MissingMode),
        }
    }
}

/// Similarity between the key and one candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Score {
    Mse(f64),
    Correspondences(usize),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Mse(value) => write!(f, "{value}"),
            Score::Correspondences(count) => write!(f, "ORB matches:{count}"),
        }
    }
}

/// Decision thresholds for both modes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// MSE strictly below this value is a match.
    pub max_mse: f64,
    /// A correspondence count strictly above this value is a match.
    pub min_correspondences: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_mse: DEFAULT_MAX_MSE,
            min_correspondences: DEFAULT_MIN_CORRESPONDENCES,
        }
    }
}

impl Thresholds {
    /// Returns true when `score` crosses the threshold of its own kind.
    pub fn accepts(&self, score: Score) -> bool {
        match score {
            Score::Mse(value) => value < self.max_mse,
            Score::Correspondences(count) => count > self.min_correspondences,
        }
    }
}

/// The reference image, normalized once and reused for every candidate.
pub struct KeyImage {
    path: PathBuf,
    image: NormalizedImage,
    features: Option<Features>,
}

impl KeyImage {
    /// Path the key was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalized key pixels.
    pub fn image(&self) -> &NormalizedImage {
        &self.image
    }

    /// Key features; only present in [`SearchMode::Compare`].
    pub fn features(&self) -> Option<&Features> {
        self.features.as_ref()
    }
}

/// Scores candidates against a key under one mode.
pub struct MetricEngine {
    mode: SearchMode,
    thresholds: Thresholds,
    extractor: OrbExtractor,
    matcher: CrossCheckMatcher,
}

impl MetricEngine {
    /// Builds an engine for `mode`; the ORB extractor is built either way.
    pub fn new(mode: SearchMode, thresholds: Thresholds, orb: OrbConfig) -> Self {
        let matcher = CrossCheckMatcher::new(orb.max_distance);
        Self {
            mode,
            thresholds,
            extractor: OrbExtractor::new(orb),
            matcher,
        }
    }

    /// Enables row/descriptor parallelism (only with the `rayon` feature).
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.matcher.parallel = parallel;
        self
    }

    /// Mode every candidate is scored under.
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Thresholds applied by [`MetricEngine::is_match`].
    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Wraps the normalized key, extracting its features once when the mode
    /// needs them.
    pub fn prepare_key(&self, path: impl Into<PathBuf>, image: NormalizedImage) -> KeyImage {
        let features = match self.mode {
            SearchMode::Compare => Some(self.extractor.extract(&image)),
            SearchMode::HighLowRes => None,
        };
        KeyImage {
            path: path.into(),
            image,
            features,
        }
    }

    /// Scores one normalized candidate against the key.
    ///
    /// Errors here are per-candidate: the caller treats them as "no match".
    pub fn score(&self, key: &KeyImage, candidate: &NormalizedImage) -> TexSearchResult<Score> {
        match self.mode {
            SearchMode::HighLowRes => self.score_mse(key, candidate),
            SearchMode::Compare => self.score_keypoints(key, candidate),
        }
    }

    /// Returns true when `score` passes the configured threshold.
    pub fn is_match(&self, score: Score) -> bool {
        self.thresholds.accepts(score)
    }

    fn score_mse(&self, key: &KeyImage, candidate: &NormalizedImage) -> TexSearchResult<Score> {
        #[cfg(feature = "rayon")]
        if self.matcher.parallel {
            return mse::mse_par(key.image.view(), candidate.view()).map(Score::Mse);
        }
        mse::mse(key.image.view(), candidate.view()).map(Score::Mse)
    }

    fn score_keypoints(
        &self,
        key: &KeyImage,
        candidate: &NormalizedImage,
    ) -> TexSearchResult<Score> {
        let needed = self.extractor.config().min_keypoints.max(1);
        let key_features = match &key.features {
            Some(features) => features,
            None => {
                return Err(TexSearchError::TooFewKeypoints { found: 0, needed });
            }
        };
        if key_features.len() < needed {
            return Err(TexSearchError::TooFewKeypoints {
                found: key_features.len(),
                needed,
            });
        }

        let cand_features = self.extractor.extract(candidate);
        if cand_features.len() < needed {
            return Err(TexSearchError::TooFewKeypoints {
                found: cand_features.len(),
                needed,
            });
        }

        let matches = self
            .matcher
            .match_descriptors(key_features.descriptors(), cand_features.descriptors());
        Ok(Score::Correspondences(matches.len()))
    }
}
