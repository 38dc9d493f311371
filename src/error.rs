//! Error types for the skin color pipeline

use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SkinToneError>;

/// Pipeline stage an error originated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Convert,
    Threshold,
    Classify,
    Features,
    Cluster,
    Reconstruct,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Convert => "convert",
            Stage::Threshold => "threshold",
            Stage::Classify => "classify",
            Stage::Features => "features",
            Stage::Cluster => "cluster",
            Stage::Reconstruct => "reconstruct",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SkinToneError {
    /// Input could not be read or decoded
    #[error("[load] failed to read image {source_name}: {source}")]
    ImageRead {
        source_name: String,
        #[source]
        source: image::ImageError,
    },

    /// No candidate pixels survived thresholding
    #[error("[features] no candidate skin pixels remain out of {total_pixels}")]
    EmptyRegion { total_pixels: usize },

    /// Clustering produced nothing usable
    #[error("[cluster] clustering failed: {reason}")]
    Clustering { reason: String },

    /// Channel or shape mismatch between stages
    #[error("[{stage}] shape mismatch: expected {expected}, got {actual}")]
    Conversion {
        stage: Stage,
        expected: String,
        actual: String,
    },

    /// Rejected configuration value
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// External score model failed at the classifier boundary
    #[error("{model} model failed: {message}")]
    Model { model: String, message: String },
}

impl SkinToneError {
    pub fn image_read(source_name: impl Into<String>, source: image::ImageError) -> Self {
        Self::ImageRead {
            source_name: source_name.into(),
            source,
        }
    }

    pub fn conversion(
        stage: Stage,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::Conversion {
            stage,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn clustering(reason: impl Into<String>) -> Self {
        Self::Clustering {
            reason: reason.into(),
        }
    }

    pub fn invalid_parameter(parameter: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Stage the failure is attributed to, if it came from the pipeline
    pub fn stage(&self) -> Option<Stage> {
        match self {
            SkinToneError::ImageRead { .. } => Some(Stage::Load),
            SkinToneError::EmptyRegion { .. } => Some(Stage::Features),
            SkinToneError::Clustering { .. } => Some(Stage::Cluster),
            SkinToneError::Conversion { stage, .. } => Some(*stage),
            SkinToneError::InvalidParameter { .. } | SkinToneError::Model { .. } => None,
        }
    }

    /// True when the caller supplied something unusable, false for internal failures
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            SkinToneError::ImageRead { .. }
                | SkinToneError::EmptyRegion { .. }
                | SkinToneError::InvalidParameter { .. }
        )
    }

    /// Message suitable for returning to an end user
    pub fn user_message(&self) -> String {
        match self {
            SkinToneError::ImageRead { .. } => {
                "Could not read the image. Please check the file format and try again.".to_string()
            }
            SkinToneError::EmptyRegion { .. } => {
                "No skin could be found in the image. Please use a well-lit photo with visible skin."
                    .to_string()
            }
            SkinToneError::InvalidParameter { parameter, value } => {
                format!("Invalid value {value} for {parameter}.")
            }
            _ => "Skin analysis failed. Please try again with a different image.".to_string(),
        }
    }
}
