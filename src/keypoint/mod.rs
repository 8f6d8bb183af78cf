//! ORB-style local features: FAST corners on a scale pyramid, intensity
//! centroid orientation and steered BRIEF descriptors.
//!
//! [`OrbExtractor`] turns a normalized image into [`Features`];
//! [`CrossCheckMatcher`] counts mutual nearest-neighbor correspondences
//! between two feature sets.

pub mod brief;
pub mod detect;
pub mod matcher;
mod select;

pub use brief::{BriefPattern, Descriptor};
pub use matcher::{Correspondence, CrossCheckMatcher};

use crate::image::{ImagePyramid, OwnedImage};
use detect::{detect_level, level_budgets, orientation, ORIENTATION_RADIUS};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};

/// Parameters of the keypoint pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    /// Maximum keypoints per image, split across pyramid levels.
    pub max_features: usize,
    /// Number of pyramid levels (each half the previous size).
    pub levels: usize,
    /// Chebyshev radius for corner non-maximum suppression.
    pub nms_radius: usize,
    /// Gaussian sigma applied before descriptor sampling.
    pub blur_sigma: f32,
    /// Optional Hamming cutoff on top of cross-check. Mutual pairs farther
    /// apart than this many bits are dropped; `None` keeps every mutual pair.
    pub max_distance: Option<u32>,
    /// Fewer keypoints than this on either side fails the comparison.
    pub min_keypoints: usize,
    /// Seed of the BRIEF test pattern.
    pub pattern_seed: u64,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            max_features: 2000,
            levels: 3,
            nms_radius: 3,
            blur_sigma: 2.0,
            max_distance: None,
            min_keypoints: 1,
            pattern_seed: 0x7E75_EA2C,
        }
    }
}

/// Keypoint position in base-level pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

/// Keypoints and their descriptors, index-aligned.
#[derive(Clone, Debug, Default)]
pub struct Features {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Extracts [`Features`] with a fixed configuration and test pattern.
#[derive(Clone, Debug)]
pub struct OrbExtractor {
    config: OrbConfig,
    pattern: BriefPattern,
}

impl OrbExtractor {
    pub fn new(config: OrbConfig) -> Self {
        let pattern = BriefPattern::generate(config.pattern_seed);
        Self { config, pattern }
    }

    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    /// Detects, orients and describes keypoints on every pyramid level.
    pub fn extract(&self, image: &OwnedImage) -> Features {
        let cfg = &self.config;
        let border = (ORIENTATION_RADIUS as usize).max(BriefPattern::reach()) + 1;
        let pyramid = ImagePyramid::build(image, cfg.levels, 2 * border + 1);
        let budgets = level_budgets(cfg.max_features, pyramid.levels().len());

        let mut features = Features::default();
        for (idx, (level, budget)) in pyramid.levels().iter().zip(budgets).enumerate() {
            let peaks = detect_level(level, cfg.fast_threshold, cfg.nms_radius, border, budget);
            if peaks.is_empty() {
                continue;
            }

            let smoothed = match OwnedImage::from_gray_image(gaussian_blur_f32(
                &level.to_gray_image(),
                cfg.blur_sigma.max(0.1),
            )) {
                Ok(img) => img,
                Err(_) => continue,
            };
            let scale = ImagePyramid::scale(idx);

            for peak in peaks {
                let angle = orientation(level.view(), peak.x, peak.y);
                let Some(desc) = self.pattern.describe(smoothed.view(), peak.x, peak.y, angle)
                else {
                    continue;
                };
                features.keypoints.push(Keypoint {
                    x: peak.x as f32 * scale,
                    y: peak.y as f32 * scale,
                });
                features.descriptors.push(desc);
            }
        }
        features
    }
}

#[cfg(test)]
mod tests {
    use super::{OrbConfig, OrbExtractor};
    use crate::image::OwnedImage;

    fn blocks(size: usize) -> OwnedImage {
        let mut data = vec![30u8; size * size];
        for (i, (x0, y0, w, v)) in [(40, 40, 50, 220), (120, 60, 30, 160), (70, 130, 60, 250)]
            .into_iter()
            .enumerate()
        {
            for y in y0..y0 + w + i * 5 {
                for x in x0..x0 + w {
                    data[y * size + x] = v;
                }
            }
        }
        OwnedImage::new(data, size, size).unwrap()
    }

    #[test]
    fn flat_image_has_no_features() {
        let img = OwnedImage::new(vec![128; 200 * 200], 200, 200).unwrap();
        let features = OrbExtractor::new(OrbConfig::default()).extract(&img);
        assert!(features.is_empty());
    }

    #[test]
    fn features_are_aligned_and_bounded() {
        let cfg = OrbConfig {
            max_features: 20,
            ..OrbConfig::default()
        };
        let img = blocks(200);
        let features = OrbExtractor::new(cfg).extract(&img);
        assert!(!features.is_empty());
        assert!(features.len() <= 20);
        assert_eq!(features.keypoints().len(), features.descriptors().len());
        for kp in features.keypoints() {
            assert!(kp.x >= 0.0 && kp.x < 200.0 && kp.y >= 0.0 && kp.y < 200.0);
        }
    }

    #[test]
    fn default_matching_keeps_every_mutual_pair() {
        let cfg = OrbConfig::default();
        assert_eq!(cfg.max_distance, None);
        let json = serde_json::to_value(&cfg).unwrap();
        assert!(json["max_distance"].is_null());
        let parsed: OrbConfig = serde_json::from_str(r#"{"max_distance": 48}"#).unwrap();
        assert_eq!(parsed.max_distance, Some(48));
    }

    #[test]
    fn extraction_is_deterministic() {
        let img = blocks(200);
        let extractor = OrbExtractor::new(OrbConfig::default());
        let a = extractor.extract(&img);
        let b = extractor.extract(&img);
        assert_eq!(a.descriptors(), b.descriptors());
        assert_eq!(a.keypoints(), b.keypoints());
    }
}
