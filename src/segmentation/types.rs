use crate::error::{Result, SkinToneError, Stage};
use image::{GenericImageView, GrayImage, ImageBuffer, Rgb};
use serde::Serialize;
use std::fmt;

/// Three 8-bit channels per pixel, interpreted by context (HSV or YCrCb)
pub type ChannelGrid = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Binary grid: 255 where a pixel survived adaptive thresholding, 0 otherwise
pub type ForegroundMask = GrayImage;

/// Binary grid: 255 where a pixel matched the skin heuristic, 0 otherwise
pub type SkinIndicatorGrid = GrayImage;

/// Grid dimensions shared by every stage of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of<I: GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Fail with a conversion error unless `image` has exactly these dimensions
    pub fn check<I: GenericImageView>(&self, stage: Stage, image: &I) -> Result<()> {
        let actual = Self::of(image);
        if actual != *self {
            return Err(SkinToneError::conversion(stage, self, actual));
        }
        Ok(())
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_rejects_mismatch() {
        let dims = Dimensions::new(4, 3);
        assert!(dims.check(Stage::Threshold, &GrayImage::new(4, 3)).is_ok());

        let err = dims
            .check(Stage::Threshold, &GrayImage::new(3, 4))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "[threshold] shape mismatch: expected 4x3, got 3x4"
        );
    }
}
