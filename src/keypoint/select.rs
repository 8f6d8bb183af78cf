//! Corner ranking and non-maximum suppression.

use std::cmp::Ordering;

/// Corner response on one pyramid level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Peak {
    pub x: usize,
    pub y: usize,
    pub score: f32,
}

fn peak_cmp_desc(a: &Peak, b: &Peak) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sorts peaks by descending score with deterministic tie-breaking.
pub(crate) fn sort_peaks_desc(peaks: &mut [Peak]) {
    peaks.sort_by(peak_cmp_desc);
}

/// Keeps the `k` strongest peaks, sorted descending.
pub(crate) fn strongest(mut peaks: Vec<Peak>, k: usize) -> Vec<Peak> {
    sort_peaks_desc(&mut peaks);
    peaks.truncate(k);
    peaks
}

/// Grid non-maximum suppression using Chebyshev distance.
///
/// A peak survives when no other peak within `radius` ranks above it under
/// the same ordering as [`sort_peaks_desc`]. Runs against a dense index map
/// so the cost is linear in the peak count for a fixed radius.
pub(crate) fn nms_grid(peaks: &[Peak], width: usize, height: usize, radius: usize) -> Vec<Peak> {
    if radius == 0 || peaks.is_empty() {
        return peaks.to_vec();
    }

    let mut slot = vec![u32::MAX; width * height];
    for (idx, peak) in peaks.iter().enumerate() {
        if peak.x < width && peak.y < height {
            slot[peak.y * width + peak.x] = idx as u32;
        }
    }

    peaks
        .iter()
        .filter(|peak| {
            let y0 = peak.y.saturating_sub(radius);
            let y1 = (peak.y + radius).min(height - 1);
            let x0 = peak.x.saturating_sub(radius);
            let x1 = (peak.x + radius).min(width - 1);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let other = slot[y * width + x];
                    if other == u32::MAX || (x == peak.x && y == peak.y) {
                        continue;
                    }
                    if peak_cmp_desc(&peaks[other as usize], peak) == Ordering::Less {
                        return false;
                    }
                }
            }
            true
        })
        .copied()
        .collect()
}
