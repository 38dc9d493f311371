//! Sequential skin-color pipeline: load, convert, threshold, classify,
//! tabulate, cluster.
//!
//! Each stage consumes only the previous stage's output and allocates its own
//! buffers, so a `SkinPipeline` can be shared across threads and invoked
//! concurrently without locking.

use crate::capture::{self, FileSource, ImageSource, MemorySource};
use crate::clustering::{DominantClusterSelector, FeatureTableBuilder, SkinColor, FEATURE_COUNT};
use crate::color::ColorRepresentations;
use crate::config::PipelineConfig;
use crate::error::{Result, Stage};
use crate::segmentation::{
    apply_mask, AdaptiveThresholder, Dimensions, SkinPixelClassifier, ThresholdDecision,
};
use image::{GrayImage, RgbImage};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// Numbers useful for diagnosing heuristic misfires
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineDiagnostics {
    pub dimensions: Dimensions,
    pub threshold: ThresholdDecision,
    pub foreground_pixels: usize,
    pub skin_candidates: usize,
    pub included_pixels: usize,
    pub excluded_pixels: usize,
    pub cluster_index: usize,
    pub centroids: Vec<[f64; FEATURE_COUNT]>,
    pub inertia: f64,
    pub restart: usize,
    pub elapsed_ms: f64,
}

/// Terminal output of one invocation
#[derive(Debug, Clone)]
pub struct SkinColorResult {
    /// Dominant skin color as (hue, Cr, Cb)
    pub color: SkinColor,
    /// 255 over pixels of the skin cluster, 0 elsewhere
    pub mask: GrayImage,
    /// The canonical grid the mask refers to
    pub canonical: RgbImage,
    pub diagnostics: PipelineDiagnostics,
}

impl SkinColorResult {
    /// Canonical image with everything outside the skin mask blacked out
    pub fn segmented(&self) -> Result<RgbImage> {
        apply_mask(&self.canonical, &self.mask)
    }

    pub fn skin_pixels(&self) -> usize {
        self.mask.as_raw().iter().filter(|&&v| v != 0).count()
    }
}

#[derive(Debug, Clone)]
pub struct SkinPipeline {
    config: PipelineConfig,
    thresholder: AdaptiveThresholder,
    classifier: SkinPixelClassifier,
    features: FeatureTableBuilder,
    selector: DominantClusterSelector,
}

impl SkinPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            selector: DominantClusterSelector::new(&config),
            config,
            thresholder: AdaptiveThresholder,
            classifier: SkinPixelClassifier,
            features: FeatureTableBuilder,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline on any image source
    pub fn run<S: ImageSource + ?Sized>(&self, source: &S) -> Result<SkinColorResult> {
        let image = capture::load_canonical(source, self.config.dimensions())?;
        self.run_canonical(image)
    }

    /// Run the pipeline on an already decoded image, resampling it first if needed
    pub fn run_image(&self, image: RgbImage) -> Result<SkinColorResult> {
        let image = capture::to_canonical(image, self.config.dimensions())?;
        self.run_canonical(image)
    }

    fn run_canonical(&self, image: RgbImage) -> Result<SkinColorResult> {
        let _span = tracing::debug_span!("skin_pipeline").entered();
        let start = Instant::now();

        let dims = self.config.dimensions();
        dims.check(Stage::Load, &image)?;

        let colors = ColorRepresentations::derive(&image)?;
        dims.check(Stage::Convert, &colors.grayscale)?;

        let threshold = self.thresholder.apply(&image, &colors)?;
        let classification = self.classifier.classify(&threshold)?;
        let table = self.features.build(&classification)?;
        let selection = self.selector.select(&table)?;
        dims.check(Stage::Reconstruct, &selection.mask)?;

        let diagnostics = PipelineDiagnostics {
            dimensions: dims,
            threshold: threshold.decision,
            foreground_pixels: threshold.foreground_pixels(),
            skin_candidates: classification.skin_pixels(),
            included_pixels: table.included().len(),
            excluded_pixels: table.excluded().len(),
            cluster_index: selection.cluster.index,
            centroids: selection
                .model
                .centroids
                .rows()
                .into_iter()
                .map(|row| [row[0], row[1], row[2], row[3]])
                .collect(),
            inertia: selection.model.inertia,
            restart: selection.model.restart,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };

        tracing::info!(
            "Skin color: hue={:.2}, Cr={:.2}, Cb={:.2} ({} included pixels, {:.1}ms)",
            selection.color.hue,
            selection.color.cr,
            selection.color.cb,
            diagnostics.included_pixels,
            diagnostics.elapsed_ms
        );

        Ok(SkinColorResult {
            color: selection.color,
            mask: selection.mask,
            canonical: image,
            diagnostics,
        })
    }
}

/// Detect the dominant skin color of the image at `path`
///
/// # Errors
///
/// Returns `SkinToneError` if:
/// - The image cannot be read or decoded
/// - No candidate skin pixels survive thresholding
/// - Clustering yields no usable centroids
/// - Any stage produces a grid of the wrong shape
pub fn detect_dominant_skin_color<P: AsRef<Path>>(
    path: P,
    config: &PipelineConfig,
) -> Result<SkinColorResult> {
    SkinPipeline::new(config.clone())?.run(&FileSource::new(path))
}

/// Detect the dominant skin color of an encoded image held in memory
pub fn detect_dominant_skin_color_from_memory(
    bytes: &[u8],
    config: &PipelineConfig,
) -> Result<SkinColorResult> {
    SkinPipeline::new(config.clone())?.run(&MemorySource::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkinToneError;
    use image::Rgb;

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            width: 20,
            height: 16,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PipelineConfig {
            width: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            SkinPipeline::new(config),
            Err(SkinToneError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_small_grid_patch() {
        let pipeline = SkinPipeline::new(small_config()).unwrap();
        let image = RgbImage::from_fn(20, 16, |x, y| {
            if (5..15).contains(&x) && (4..12).contains(&y) {
                Rgb([220, 160, 130])
            } else {
                Rgb([0, 0, 0])
            }
        });

        let result = pipeline.run_image(image).unwrap();
        assert_eq!(result.color.to_array(), [10.0, 160.0, 103.0]);
        assert_eq!(result.skin_pixels(), 80);
        assert_eq!(result.diagnostics.included_pixels, 80);
        assert_eq!(result.diagnostics.excluded_pixels, 240);

        let segmented = result.segmented().unwrap();
        assert_eq!(segmented.get_pixel(6, 5), &Rgb([220, 160, 130]));
        assert_eq!(segmented.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_run_image_resamples_to_canonical() {
        let pipeline = SkinPipeline::new(small_config()).unwrap();
        let image = RgbImage::from_pixel(7, 9, Rgb([0, 0, 0]));
        // Black input survives resampling as black, and black is never skin
        let err = pipeline.run_image(image).unwrap_err();
        assert!(matches!(err, SkinToneError::EmptyRegion { total_pixels: 320 }));
    }
}
