//! Mean squared error over equal-size grayscale images.
//!
//! Squared differences are accumulated exactly in `u64`, so the result does
//! not depend on argument order or on how rows are split across threads.

use crate::image::ImageView;
use crate::util::math::row_sq_diff;
use crate::util::{TexSearchError, TexSearchResult};

fn check_dims(a: &ImageView<'_, u8>, b: &ImageView<'_, u8>) -> TexSearchResult<()> {
    if a.dims() != b.dims() {
        return Err(TexSearchError::DimensionMismatch {
            left: a.dims(),
            right: b.dims(),
        });
    }
    Ok(())
}

/// Mean of squared per-pixel differences. Lower is more similar.
pub fn mse(a: ImageView<'_, u8>, b: ImageView<'_, u8>) -> TexSearchResult<f64> {
    check_dims(&a, &b)?;
    let sum: u64 = a.rows().zip(b.rows()).map(|(ra, rb)| row_sq_diff(ra, rb)).sum();
    Ok(sum as f64 / (a.width() * a.height()) as f64)
}

/// Row-parallel [`mse`].
#[cfg(feature = "rayon")]
pub fn mse_par(a: ImageView<'_, u8>, b: ImageView<'_, u8>) -> TexSearchResult<f64> {
    use rayon::prelude::*;

    check_dims(&a, &b)?;
    let sum: u64 = (0..a.height())
        .into_par_iter()
        .map(|y| match (a.row(y), b.row(y)) {
            (Some(ra), Some(rb)) => row_sq_diff(ra, rb),
            _ => 0,
        })
        .sum();
    Ok(sum as f64 / (a.width() * a.height()) as f64)
}
