//! # skintone
//!
//! Dominant skin color extraction from a single photograph.
//!
//! The pipeline resamples the input to a canonical grid, removes the
//! background with an adaptive Otsu/histogram-peak threshold, flags
//! skin-candidate pixels with a fixed HSV/YCrCb rule, clusters the remaining
//! pixels with seeded k-means and returns the centroid of the cluster richest
//! in skin candidates as `(hue, Cr, Cb)` together with a full-resolution mask.
//!
//! ## Example
//!
//! ```rust,no_run
//! use skintone::{detect_dominant_skin_color, PipelineConfig};
//!
//! let result = detect_dominant_skin_color("selfie.jpg", &PipelineConfig::default())?;
//! println!("hue={} Cr={} Cb={}", result.color.hue, result.color.cr, result.color.cb);
//! # Ok::<(), skintone::SkinToneError>(())
//! ```

pub mod capture;
pub mod classifiers;
pub mod clustering;
pub mod color;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod segmentation;

pub use clustering::SkinColor;
pub use config::PipelineConfig;
pub use error::{Result, SkinToneError, Stage};
pub use pipeline::{
    detect_dominant_skin_color, detect_dominant_skin_color_from_memory, PipelineDiagnostics,
    SkinColorResult, SkinPipeline,
};
