use super::threshold::ThresholdOutput;
use super::types::{Dimensions, SkinIndicatorGrid};
use crate::color::ColorRepresentations;
use crate::error::{Result, SkinToneError, Stage};
use image::GrayImage;
use rayon::prelude::*;
use std::ops::RangeInclusive;

pub const HUE_MAX: u8 = 170;
pub const CR_RANGE: RangeInclusive<u8> = 140..=170;
pub const CB_RANGE: RangeInclusive<u8> = 90..=120;

/// Indicator value for a matched pixel
pub const SKIN: u8 = 255;

/// Empirical skin rule, all bounds inclusive
pub fn is_skin(hue: u8, cr: u8, cb: u8) -> bool {
    hue <= HUE_MAX && CR_RANGE.contains(&cr) && CB_RANGE.contains(&cb)
}

/// Per-pixel skin classification of a background-masked grid
#[derive(Debug, Clone)]
pub struct Classification {
    /// Representations re-derived from the masked grid
    pub colors: ColorRepresentations,
    pub indicator: SkinIndicatorGrid,
}

impl Classification {
    pub fn skin_pixels(&self) -> usize {
        self.indicator.as_raw().iter().filter(|&&v| v == SKIN).count()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SkinPixelClassifier;

impl SkinPixelClassifier {
    pub fn classify(&self, threshold: &ThresholdOutput) -> Result<Classification> {
        let _span = tracing::debug_span!("classify").entered();

        let colors = ColorRepresentations::derive(&threshold.masked)?;
        let dims = Dimensions::of(&threshold.masked);
        dims.check(Stage::Classify, &colors.hsv)?;
        dims.check(Stage::Classify, &colors.ycrcb)?;
        dims.check(Stage::Classify, &threshold.mask)?;

        let indicator: Vec<u8> = colors
            .hsv
            .as_raw()
            .par_chunks_exact(3)
            .zip(colors.ycrcb.as_raw().par_chunks_exact(3))
            .zip(threshold.mask.as_raw().par_iter())
            .map(|((hsv, ycrcb), &foreground)| {
                if foreground != 0 && is_skin(hsv[0], ycrcb[1], ycrcb[2]) {
                    SKIN
                } else {
                    0
                }
            })
            .collect();

        let indicator = GrayImage::from_raw(dims.width, dims.height, indicator).ok_or_else(|| {
            SkinToneError::conversion(Stage::Classify, dims, "short indicator buffer")
        })?;

        let classification = Classification { colors, indicator };
        tracing::debug!(
            "Skin candidates: {} of {} pixels",
            classification.skin_pixels(),
            dims.pixel_count()
        );
        Ok(classification)
    }
}
