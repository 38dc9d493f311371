mod source;

pub use source::{FileSource, MemorySource};

use crate::error::{Result, Stage};
use crate::segmentation::Dimensions;
use image::{imageops, RgbImage};

/// Trait for image sources
pub trait ImageSource {
    /// Decode the source into an RGB grid at its native resolution
    fn read_image(&self) -> Result<RgbImage>;

    /// Name used in logs and error messages
    fn name(&self) -> String;
}

/// Read `source` and resample it to `dims`
///
/// Bilinear resampling; inputs already at `dims` are passed through untouched.
pub fn load_canonical<S: ImageSource + ?Sized>(source: &S, dims: Dimensions) -> Result<RgbImage> {
    let _span = tracing::debug_span!("load").entered();

    let image = source.read_image()?;
    tracing::debug!(
        "Read {} at {}, canonical {}",
        source.name(),
        Dimensions::of(&image),
        dims
    );

    to_canonical(image, dims)
}

/// Resample an already decoded grid to `dims`
pub fn to_canonical(image: RgbImage, dims: Dimensions) -> Result<RgbImage> {
    let image = if Dimensions::of(&image) != dims {
        imageops::resize(&image, dims.width, dims.height, imageops::FilterType::Triangle)
    } else {
        image
    };

    dims.check(Stage::Load, &image)?;
    Ok(image)
}
