//! Adaptive background removal
//!
//! Plain Otsu misplaces the cut when the background dominates the histogram
//! (a near-black backdrop, say), so the final threshold blends the Otsu level
//! with the histogram peak and the direction flips for near-white backgrounds.

use super::types::{Dimensions, ForegroundMask};
use crate::color::ColorRepresentations;
use crate::error::{Result, SkinToneError, Stage};
use image::{GrayImage, RgbImage};
use rayon::prelude::*;
use serde::Serialize;

pub type Histogram = [u32; 256];

/// Peak at or below this level means a dark-dominant histogram
pub const DARK_PEAK_LIMIT: u8 = 10;
/// Peak at or above this level means a light-dominant histogram
pub const LIGHT_PEAK_LIMIT: u8 = 220;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThresholdDirection {
    /// Keep pixels brighter than the threshold
    Binary,
    /// Keep pixels at or below the threshold
    Inverse,
}

impl ThresholdDirection {
    pub fn for_peak(t_max: u8) -> Self {
        if t_max < LIGHT_PEAK_LIMIT {
            ThresholdDirection::Binary
        } else {
            ThresholdDirection::Inverse
        }
    }

    pub fn keeps(&self, value: u8, threshold: u8) -> bool {
        match self {
            ThresholdDirection::Binary => value > threshold,
            ThresholdDirection::Inverse => value <= threshold,
        }
    }
}

/// Levels that went into the final threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdDecision {
    pub t_max: u8,
    pub t_otsu: u8,
    pub t_final: u8,
    pub direction: ThresholdDirection,
}

impl ThresholdDecision {
    pub fn from_histogram(histogram: &Histogram) -> Self {
        let t_max = histogram_peak(histogram);
        let t_otsu = otsu_threshold(histogram);
        Self {
            t_max,
            t_otsu,
            t_final: blend_threshold(t_max, t_otsu),
            direction: ThresholdDirection::for_peak(t_max),
        }
    }
}

pub fn histogram(gray: &GrayImage) -> Histogram {
    let mut histogram = [0u32; 256];
    for &value in gray.as_raw() {
        histogram[value as usize] += 1;
    }
    histogram
}

/// Lowest grey level with the highest count
pub fn histogram_peak(histogram: &Histogram) -> u8 {
    let mut peak = 0usize;
    for (level, &count) in histogram.iter().enumerate() {
        if count > histogram[peak] {
            peak = level;
        }
    }
    peak as u8
}

/// Otsu level: the lowest `t` maximising between-class variance, where the
/// lower class holds every level `<= t`. A single-level histogram yields 0.
pub fn otsu_threshold(histogram: &Histogram) -> u8 {
    let total: u64 = histogram.iter().map(|&c| u64::from(c)).sum();
    if total == 0 {
        return 0;
    }
    let total = total as f64;

    let global_mean: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * f64::from(count))
        .sum::<f64>()
        / total;

    let mut weight_low = 0.0f64;
    let mut sum_low = 0.0f64;
    let mut best_variance = 0.0f64;
    let mut best_level = 0usize;

    for (level, &count) in histogram.iter().enumerate() {
        let p = f64::from(count) / total;
        weight_low += p;
        sum_low += level as f64 * p;
        let weight_high = 1.0 - weight_low;

        if weight_low.min(weight_high) < f64::from(f32::EPSILON)
            || weight_low.max(weight_high) > 1.0 - f64::from(f32::EPSILON)
        {
            continue;
        }

        let mean_low = sum_low / weight_low;
        let mean_high = (global_mean - weight_low * mean_low) / weight_high;
        let variance = weight_low * weight_high * (mean_low - mean_high).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_level = level;
        }
    }

    best_level as u8
}

/// `round((Tmax + Totsu) / 2)` above the dark-peak limit, `round((Tmax + Totsu) / 4)`
/// otherwise. Rounding is half-to-even.
pub fn blend_threshold(t_max: u8, t_otsu: u8) -> u8 {
    let sum = f64::from(t_max) + f64::from(t_otsu);
    let divisor = if t_max > DARK_PEAK_LIMIT { 2.0 } else { 4.0 };
    (sum / divisor).round_ties_even() as u8
}

pub fn foreground_mask(gray: &GrayImage, decision: &ThresholdDecision) -> Result<ForegroundMask> {
    let (width, height) = gray.dimensions();
    let mask: Vec<u8> = gray
        .as_raw()
        .par_iter()
        .map(|&value| {
            if decision.direction.keeps(value, decision.t_final) {
                255
            } else {
                0
            }
        })
        .collect();

    GrayImage::from_raw(width, height, mask).ok_or_else(|| {
        SkinToneError::conversion(Stage::Threshold, Dimensions::of(gray), "short mask buffer")
    })
}

/// Copy of `image` with every pixel outside `mask` set to black
pub fn apply_mask(image: &RgbImage, mask: &GrayImage) -> Result<RgbImage> {
    let dims = Dimensions::of(image);
    dims.check(Stage::Threshold, mask)?;

    let mut out = vec![0u8; image.as_raw().len()];
    out.par_chunks_exact_mut(3)
        .zip(image.as_raw().par_chunks_exact(3))
        .zip(mask.as_raw().par_iter())
        .for_each(|((dst, src), &keep)| {
            if keep != 0 {
                dst.copy_from_slice(src);
            }
        });

    RgbImage::from_raw(dims.width, dims.height, out)
        .ok_or_else(|| SkinToneError::conversion(Stage::Threshold, dims, "short color buffer"))
}

/// Result of background removal
#[derive(Debug, Clone)]
pub struct ThresholdOutput {
    pub decision: ThresholdDecision,
    pub mask: ForegroundMask,
    /// Color grid with background pixels zeroed
    pub masked: RgbImage,
}

impl ThresholdOutput {
    pub fn foreground_pixels(&self) -> usize {
        self.mask.as_raw().iter().filter(|&&v| v != 0).count()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AdaptiveThresholder;

impl AdaptiveThresholder {
    pub fn apply(
        &self,
        image: &RgbImage,
        colors: &ColorRepresentations,
    ) -> Result<ThresholdOutput> {
        let _span = tracing::debug_span!("threshold").entered();

        let dims = Dimensions::of(image);
        dims.check(Stage::Threshold, &colors.grayscale)?;

        let decision = ThresholdDecision::from_histogram(&histogram(&colors.grayscale));
        tracing::debug!(
            "Threshold: Tmax={}, Totsu={}, Tfinal={}, direction={:?}",
            decision.t_max,
            decision.t_otsu,
            decision.t_final,
            decision.direction
        );

        let mask = foreground_mask(&colors.grayscale, &decision)?;
        let masked = apply_mask(image, &mask)?;

        let output = ThresholdOutput {
            decision,
            mask,
            masked,
        };
        tracing::debug!(
            "Foreground: {} of {} pixels",
            output.foreground_pixels(),
            dims.pixel_count()
        );
        Ok(output)
    }
}
