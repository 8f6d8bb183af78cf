//! Owned grayscale buffers and the scale pyramid used by keypoint detection.
//!
//! Each level halves the previous one with a 2x2 box filter and integer
//! rounding: `dst = ((a + b + c + d) + 2) / 4`. An odd trailing row or column
//! is dropped.

use crate::image::ImageView;
use crate::util::{TexSearchError, TexSearchResult};

/// Owned contiguous grayscale image buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps a row-major buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> TexSearchResult<Self> {
        if width == 0 || height == 0 {
            return Err(TexSearchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(TexSearchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(TexSearchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(TexSearchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixels with no padding.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Copies the buffer into an `image::GrayImage` for `imageproc` calls.
    pub fn to_gray_image(&self) -> image::GrayImage {
        image::GrayImage::from_raw(self.width as u32, self.height as u32, self.data.clone())
            .unwrap_or_else(|| image::GrayImage::new(self.width as u32, self.height as u32))
    }

    /// Takes ownership of an `image::GrayImage` buffer.
    pub fn from_gray_image(img: image::GrayImage) -> TexSearchResult<Self> {
        let width = img.width() as usize;
        let height = img.height() as usize;
        Self::new(img.into_raw(), width, height)
    }

    fn downsample(&self) -> Option<OwnedImage> {
        let dst_width = self.width / 2;
        let dst_height = self.height / 2;
        if dst_width == 0 || dst_height == 0 {
            return None;
        }
        let mut dst = Vec::with_capacity(dst_width * dst_height);
        for pair in self.data.chunks_exact(self.width * 2).take(dst_height) {
            let (top, bottom) = pair.split_at(self.width);
            for x in 0..dst_width {
                let sum = u16::from(top[2 * x])
                    + u16::from(top[2 * x + 1])
                    + u16::from(bottom[2 * x])
                    + u16::from(bottom[2 * x + 1]);
                dst.push(((sum + 2) / 4) as u8);
            }
        }
        Some(OwnedImage {
            data: dst,
            width: dst_width,
            height: dst_height,
        })
    }
}

/// Scale pyramid; level `i` is `2^i` times smaller than the base.
pub struct ImagePyramid {
    levels: Vec<OwnedImage>,
}

impl ImagePyramid {
    /// Builds up to `max_levels` levels (at least the base).
    ///
    /// Construction stops early once a level would be smaller than
    /// `min_side` pixels on either axis.
    pub fn build(base: &OwnedImage, max_levels: usize, min_side: usize) -> Self {
        let max_levels = max_levels.max(1);
        let mut levels = vec![base.clone()];
        while levels.len() < max_levels {
            let Some(next) = levels.last().and_then(OwnedImage::downsample) else {
                break;
            };
            if next.width < min_side || next.height < min_side {
                break;
            }
            levels.push(next);
        }
        Self { levels }
    }

    /// Returns all pyramid levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[OwnedImage] {
        &self.levels
    }

    /// Factor mapping level `index` coordinates back to the base level.
    pub fn scale(index: usize) -> f32 {
        (1u32 << index.min(31)) as f32
    }
}
