use super::OutputSink;
use anyhow::{Context, Result};
use skintone::SkinColorResult;
use std::path::{Path, PathBuf};

/// Writes the skin mask and the segmented image as files for inspection
///
/// The format follows each path's extension.
pub struct DebugImageWriter {
    mask_path: Option<PathBuf>,
    segment_path: Option<PathBuf>,
}

impl DebugImageWriter {
    pub fn new(mask_path: Option<PathBuf>, segment_path: Option<PathBuf>) -> Self {
        Self {
            mask_path,
            segment_path,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mask_path.is_none() && self.segment_path.is_none()
    }
}

fn announce(kind: &str, path: &Path) {
    tracing::info!("Wrote {} to {}", kind, path.display());
}

impl OutputSink for DebugImageWriter {
    fn write_result(&mut self, result: &SkinColorResult) -> Result<()> {
        if let Some(path) = &self.mask_path {
            result
                .mask
                .save(path)
                .with_context(|| format!("Failed to write mask to {}", path.display()))?;
            announce("mask", path);
        }

        if let Some(path) = &self.segment_path {
            let segmented = result
                .segmented()
                .context("Failed to apply skin mask")?;
            segmented
                .save(path)
                .with_context(|| format!("Failed to write segmented image to {}", path.display()))?;
            announce("segmented image", path);
        }

        Ok(())
    }
}
