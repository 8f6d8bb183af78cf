//! Steered BRIEF descriptors.
//!
//! A descriptor is 256 binary intensity comparisons between point pairs
//! sampled inside a 27x27 patch. The pattern is rotated by the keypoint
//! orientation before sampling, which makes the descriptor rotation
//! invariant. Bit `i` is set when the first point of pair `i` is darker than
//! the second.

use crate::image::ImageView;
use crate::util::math::rotate_offset;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of bytes in a descriptor.
pub const DESCRIPTOR_BYTES: usize = 32;

/// Number of point-pair tests in a descriptor.
pub const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;

/// Largest unrotated sample offset on either axis.
pub const PATCH_HALF: i32 = 13;

/// 256-bit binary descriptor.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// Seeded point-pair pattern shared by every descriptor of a run.
#[derive(Clone, Debug)]
pub struct BriefPattern {
    pairs: Vec<[(i32, i32); 2]>,
}

impl BriefPattern {
    /// Draws the pattern from a seeded generator.
    ///
    /// Equal seeds give equal patterns, so key and candidate descriptors
    /// computed in different worker processes stay comparable.
    pub fn generate(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
        while pairs.len() < DESCRIPTOR_BITS {
            let a = (
                rng.random_range(-PATCH_HALF..=PATCH_HALF),
                rng.random_range(-PATCH_HALF..=PATCH_HALF),
            );
            let b = (
                rng.random_range(-PATCH_HALF..=PATCH_HALF),
                rng.random_range(-PATCH_HALF..=PATCH_HALF),
            );
            if a != b {
                pairs.push([a, b]);
            }
        }
        Self { pairs }
    }

    /// Radius that bounds every sample after any rotation.
    pub fn reach() -> usize {
        (f64::from(PATCH_HALF) * std::f64::consts::SQRT_2).ceil() as usize
    }

    /// Computes the descriptor for a keypoint at `(x, y)` with orientation
    /// `angle` (radians) on a smoothed image.
    ///
    /// Returns `None` when a rotated sample falls outside the image.
    pub fn describe(
        &self,
        smoothed: ImageView<'_, u8>,
        x: usize,
        y: usize,
        angle: f32,
    ) -> Option<Descriptor> {
        let (sin_a, cos_a) = angle.sin_cos();
        let sample = |offset: (i32, i32)| -> Option<u8> {
            let (dx, dy) = rotate_offset(offset.0, offset.1, sin_a, cos_a);
            let sx = usize::try_from(x as i64 + i64::from(dx)).ok()?;
            let sy = usize::try_from(y as i64 + i64::from(dy)).ok()?;
            smoothed.get(sx, sy).copied()
        };

        let mut desc = [0u8; DESCRIPTOR_BYTES];
        for (bit, [a, b]) in self.pairs.iter().enumerate() {
            if sample(*a)? < sample(*b)? {
                desc[bit / 8] |= 1 << (bit % 8);
            }
        }
        Some(desc)
    }
}
