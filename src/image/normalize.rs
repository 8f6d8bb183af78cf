//! Decoding and canonicalization of key and candidate images.
//!
//! Every image is decoded with the `image` crate, stretched to a fixed square
//! resolution regardless of its aspect ratio, and reduced to 8-bit luma. The
//! stretch distorts non-square sources; metrics only need the key and the
//! candidate to share one resolution.

use crate::image::OwnedImage;
use crate::util::{TexSearchError, TexSearchResult};
use image::imageops::FilterType;
use image::ImageReader;
use std::path::Path;

/// Default canonical side length in pixels.
pub const CANONICAL_SIZE: u32 = 1024;

/// A decoded, resized, single-channel image ready for a metric.
pub type NormalizedImage = OwnedImage;

/// Loads images at one fixed canonical resolution.
#[derive(Clone, Copy, Debug)]
pub struct Normalizer {
    size: u32,
    filter: FilterType,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(CANONICAL_SIZE)
    }
}

impl Normalizer {
    /// Creates a normalizer producing `size x size` images.
    pub fn new(size: u32) -> Self {
        Self {
            size: size.max(1),
            filter: FilterType::Triangle,
        }
    }

    /// Decodes `path` and returns its canonical grayscale form.
    ///
    /// Missing files, permission failures and undecodable contents all map to
    /// [`TexSearchError::UnreadableInput`].
    pub fn normalize<P: AsRef<Path>>(&self, path: P) -> TexSearchResult<NormalizedImage> {
        let path = path.as_ref();
        let unreadable = |reason: String| TexSearchError::UnreadableInput {
            path: path.to_path_buf(),
            reason,
        };

        let img = ImageReader::open(path)
            .map_err(|err| unreadable(err.to_string()))?
            .with_guessed_format()
            .map_err(|err| unreadable(err.to_string()))?
            .decode()
            .map_err(|err| unreadable(err.to_string()))?;

        let gray = img
            .resize_exact(self.size, self.size, self.filter)
            .to_luma8();
        OwnedImage::from_gray_image(gray)
    }
}

/// Normalizes `path` at the default canonical resolution.
pub fn normalize<P: AsRef<Path>>(path: P) -> TexSearchResult<NormalizedImage> {
    Normalizer::default().normalize(path)
}

#[cfg(test)]
mod tests {
    use super::Normalizer;
    use crate::util::TexSearchError;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn rgb_input_becomes_square_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::from_pixel(40, 10, Rgb([200, 200, 200]))
            .save(&path)
            .unwrap();

        let norm = Normalizer::new(16).normalize(&path).unwrap();
        assert_eq!((norm.width(), norm.height()), (16, 16));
        assert!(norm.data().iter().all(|&v| v == 200));
    }

    #[test]
    fn extension_is_not_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("real.png");
        GrayImage::from_pixel(8, 8, Luma([77])).save(&png).unwrap();
        let disguised = dir.path().join("real.dat");
        std::fs::copy(&png, &disguised).unwrap();

        let norm = Normalizer::new(8).normalize(&disguised).unwrap();
        assert_eq!(norm.data()[0], 77);
    }

    #[test]
    fn missing_and_garbage_files_are_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");
        assert!(matches!(
            Normalizer::default().normalize(&missing),
            Err(TexSearchError::UnreadableInput { .. })
        ));

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, b"not an image").unwrap();
        assert!(matches!(
            Normalizer::default().normalize(&text),
            Err(TexSearchError::UnreadableInput { .. })
        ));

        assert!(matches!(
            Normalizer::default().normalize(dir.path()),
            Err(TexSearchError::UnreadableInput { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn permission_denied_is_unreadable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.png");
        GrayImage::from_pixel(8, 8, Luma([10])).save(&path).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores file modes; nothing to check there.
        if std::fs::File::open(&path).is_ok() {
            return;
        }
        let result = Normalizer::new(8).normalize(&path);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(matches!(result, Err(TexSearchError::UnreadableInput { .. })));
    }
}
