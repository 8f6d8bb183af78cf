//! Small numeric helpers shared by the metrics.

/// Counts differing bits between two equal-length byte strings.
#[inline]
pub(crate) fn hamming(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Rotates an integer offset by a precomputed `(sin, cos)` pair and rounds
/// to the nearest pixel.
#[inline]
pub(crate) fn rotate_offset(dx: i32, dy: i32, sin_a: f32, cos_a: f32) -> (i32, i32) {
    let x = dx as f32;
    let y = dy as f32;
    let rx = cos_a * x - sin_a * y;
    let ry = sin_a * x + cos_a * y;
    (rx.round() as i32, ry.round() as i32)
}

/// Sum of squared differences between two equal-length rows.
#[inline]
pub(crate) fn row_sq_diff(a: &[u8], b: &[u8]) -> u64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = i32::from(x) - i32::from(y);
            (d * d) as u64
        })
        .sum()
}
