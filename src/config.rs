//! Pipeline configuration

use crate::error::{Result, SkinToneError};
use crate::segmentation::Dimensions;

/// Canonical grid width every input is resampled to
pub const CANONICAL_WIDTH: u32 = 375;
/// Canonical grid height every input is resampled to
pub const CANONICAL_HEIGHT: u32 = 500;
/// Number of clusters the feature table is partitioned into
pub const CLUSTER_COUNT: usize = 3;
/// Historical clustering seed
pub const DEFAULT_SEED: u64 = 42;

/// Tunables for a single pipeline invocation
///
/// The seed is the only state that makes runs reproducible; everything else
/// is allocated fresh per call.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Canonical width in pixels
    pub width: u32,
    /// Canonical height in pixels
    pub height: u32,
    /// Independent k-means restarts, lowest inertia wins
    pub restarts: usize,
    /// Upper bound on Lloyd iterations per restart
    pub max_iterations: usize,
    /// Relative centroid-shift tolerance for convergence
    pub tolerance: f64,
    /// Seed for clustering initialisation
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            width: CANONICAL_WIDTH,
            height: CANONICAL_HEIGHT,
            restarts: 10,
            max_iterations: 100,
            tolerance: 1e-4,
            seed: DEFAULT_SEED,
        }
    }
}

impl PipelineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(SkinToneError::invalid_parameter("width", self.width));
        }
        if self.height == 0 {
            return Err(SkinToneError::invalid_parameter("height", self.height));
        }
        if self.restarts == 0 {
            return Err(SkinToneError::invalid_parameter("restarts", self.restarts));
        }
        if self.max_iterations == 0 {
            return Err(SkinToneError::invalid_parameter(
                "max_iterations",
                self.max_iterations,
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(SkinToneError::invalid_parameter("tolerance", self.tolerance));
        }
        Ok(())
    }
}
