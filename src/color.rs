//! Grayscale, HSV and YCrCb derivation from the canonical color grid
//!
//! All conversions use the 8-bit conventions the skin heuristic was tuned
//! against: hue is stored as degrees / 2 (`0..180`), saturation and value span
//! `0..=255`, and chroma channels are offset by 128. Channels are addressed by
//! name (`R`, `G`, `B`) so the input's storage order cannot silently change
//! the result.
//!
//! Every function writes into a freshly allocated buffer; the source grid is
//! only ever read.

use crate::error::{Result, SkinToneError, Stage};
use crate::segmentation::{ChannelGrid, Dimensions};
use image::{GrayImage, ImageBuffer, Pixel, RgbImage};
use rayon::prelude::*;

/// Derived color representations of one pixel grid
#[derive(Debug, Clone)]
pub struct ColorRepresentations {
    pub grayscale: GrayImage,
    /// Channels: H, S, V
    pub hsv: ChannelGrid,
    /// Channels: Y, Cr, Cb
    pub ycrcb: ChannelGrid,
}

impl ColorRepresentations {
    pub fn derive(image: &RgbImage) -> Result<Self> {
        let _span = tracing::debug_span!("color_conversion").entered();

        Ok(Self {
            grayscale: to_grayscale(image)?,
            hsv: to_hsv(image)?,
            ycrcb: to_ycrcb(image)?,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.grayscale)
    }
}

fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

pub fn gray_value(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(f32::from);
    to_u8(luma(r, g, b))
}

pub fn hsv_value(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = f32::from(max - min);

    let saturation = if max == 0 {
        0
    } else {
        to_u8(diff * 255.0 / f32::from(max))
    };

    let hue = if diff == 0.0 {
        0
    } else {
        let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
        let mut degrees = if max == rgb[0] {
            60.0 * (g - b) / diff
        } else if max == rgb[1] {
            120.0 + 60.0 * (b - r) / diff
        } else {
            240.0 + 60.0 * (r - g) / diff
        };
        if degrees < 0.0 {
            degrees += 360.0;
        }
        // 359.x degrees rounds up to 180, which is the same angle as 0
        to_u8(degrees / 2.0) % 180
    };

    [hue, saturation, max]
}

pub fn ycrcb_value(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(f32::from);
    let y = luma(r, g, b);
    let cr = (r - y) * 0.713 + 128.0;
    let cb = (b - y) * 0.564 + 128.0;
    [to_u8(y), to_u8(cr), to_u8(cb)]
}

/// Apply `convert` to every pixel in parallel, writing `N` channels per pixel
fn map_pixels<P, F, const N: usize>(image: &RgbImage, convert: F) -> Result<ImageBuffer<P, Vec<u8>>>
where
    P: Pixel<Subpixel = u8>,
    F: Fn([u8; 3]) -> [u8; N] + Sync,
{
    let (width, height) = image.dimensions();
    let mut out = vec![0u8; width as usize * height as usize * N];

    out.par_chunks_exact_mut(N)
        .zip(image.as_raw().par_chunks_exact(3))
        .for_each(|(dst, src)| dst.copy_from_slice(&convert([src[0], src[1], src[2]])));

    let len = out.len();
    ImageBuffer::from_raw(width, height, out).ok_or_else(|| {
        SkinToneError::conversion(
            Stage::Convert,
            format!("{} channel buffer for {}x{}", N, width, height),
            format!("{} bytes", len),
        )
    })
}

pub fn to_grayscale(image: &RgbImage) -> Result<GrayImage> {
    map_pixels(image, |rgb| [gray_value(rgb)])
}

pub fn to_hsv(image: &RgbImage) -> Result<ChannelGrid> {
    map_pixels(image, hsv_value)
}

pub fn to_ycrcb(image: &RgbImage) -> Result<ChannelGrid> {
    map_pixels(image, ycrcb_value)
}
