//! FAST corner detection over a scale pyramid with intensity-centroid
//! orientation.

use crate::image::{ImageView, OwnedImage};
use crate::keypoint::select::{nms_grid, strongest, Peak};
use imageproc::corners::corners_fast9;

/// Radius of the disc used for the intensity centroid.
pub const ORIENTATION_RADIUS: i32 = 15;

/// Detects up to `budget` corners on one level, keeping only those at least
/// `border` pixels away from every edge.
pub(crate) fn detect_level(
    level: &OwnedImage,
    threshold: u8,
    nms_radius: usize,
    border: usize,
    budget: usize,
) -> Vec<Peak> {
    if budget == 0 || level.width() <= 2 * border || level.height() <= 2 * border {
        return Vec::new();
    }

    let max_x = level.width() - border;
    let max_y = level.height() - border;
    let peaks: Vec<Peak> = corners_fast9(&level.to_gray_image(), threshold)
        .into_iter()
        .map(|c| Peak {
            x: c.x as usize,
            y: c.y as usize,
            score: c.score,
        })
        .filter(|p| p.x >= border && p.y >= border && p.x < max_x && p.y < max_y)
        .collect();

    let kept = nms_grid(&peaks, level.width(), level.height(), nms_radius);
    strongest(kept, budget)
}

/// Orientation (radians) of the intensity centroid around `(x, y)`.
///
/// The caller guarantees the disc lies inside the image.
pub(crate) fn orientation(view: ImageView<'_, u8>, x: usize, y: usize) -> f32 {
    let r = ORIENTATION_RADIUS;
    let mut m10 = 0i64;
    let mut m01 = 0i64;
    for dy in -r..=r {
        let Some(row) = view.row((y as i64 + i64::from(dy)) as usize) else {
            continue;
        };
        let span = ((r * r - dy * dy) as f32).sqrt() as i32;
        for dx in -span..=span {
            let Some(&v) = row.get((x as i64 + i64::from(dx)) as usize) else {
                continue;
            };
            m10 += i64::from(dx) * i64::from(v);
            m01 += i64::from(dy) * i64::from(v);
        }
    }
    (m01 as f32).atan2(m10 as f32)
}

/// Splits `total` features across `levels`, proportional to each level's
/// area (a quarter of the previous one).
pub(crate) fn level_budgets(total: usize, levels: usize) -> Vec<usize> {
    if levels == 0 {
        return Vec::new();
    }
    let weights: Vec<f64> = (0..levels).map(|l| 0.25f64.powi(l as i32)).collect();
    let sum: f64 = weights.iter().sum();
    let mut budgets: Vec<usize> = weights
        .iter()
        .map(|w| (total as f64 * w / sum).floor() as usize)
        .collect();
    let assigned: usize = budgets.iter().sum();
    budgets[0] += total - assigned;
    budgets
}
