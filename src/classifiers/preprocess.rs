use crate::error::{Result, SkinToneError, Stage};
use image::{imageops, RgbImage};
use ndarray::Array4;

/// Side length of the square input the skin-type and acne models expect
pub const CLASSIFIER_INPUT_SIZE: u32 = 224;

/// Preprocessor for converting RGB images to classifier input tensors
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(CLASSIFIER_INPUT_SIZE, CLASSIFIER_INPUT_SIZE)
    }
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    /// Returns (width, height)
    pub fn input_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Preprocess an RGB image into a normalized NHWC tensor
    ///
    /// Steps:
    /// 1. Resize to target dimensions (nearest neighbour)
    /// 2. Convert to float and normalize to [0, 1]
    /// 3. Add the batch dimension
    ///
    /// Returns: Array4<f32> with shape [1, height, width, 3]
    pub fn preprocess(&self, image: &RgbImage) -> Result<Array4<f32>> {
        let _span = tracing::debug_span!("classifier_preprocess").entered();

        let resized = if image.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Nearest,
            )
        } else {
            image.clone()
        };

        // RgbImage storage is already row-major HWC
        let data: Vec<f32> = resized
            .as_raw()
            .iter()
            .map(|&v| f32::from(v) / 255.0)
            .collect();

        let shape = (1, self.target_height as usize, self.target_width as usize, 3);
        Array4::from_shape_vec(shape, data).map_err(|e| {
            SkinToneError::conversion(Stage::Convert, format!("tensor {:?}", shape), e)
        })
    }
}
