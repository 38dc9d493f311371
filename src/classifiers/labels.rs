use super::preprocess::Preprocessor;
use crate::error::{Result, SkinToneError};
use image::RgbImage;
use ndarray::Array4;
use serde::Serialize;
use std::fmt;

/// Trait for the external image classifiers
/// Allows swapping between different backends without touching the label decoding
pub trait ScoreModel {
    /// Score a preprocessed `[1, height, width, 3]` tensor
    ///
    /// # Returns
    /// * One score per class, or a single score for binary models
    fn scores(&mut self, input: &Array4<f32>) -> Result<Vec<f32>>;

    /// Get the model's expected input dimensions
    ///
    /// Returns (width, height)
    fn input_size(&self) -> (u32, u32) {
        Preprocessor::default().input_size()
    }
}

/// Discrete class decoded from a model's score vector
pub trait ClassLabel: Copy + Sized + 'static {
    /// Classes in model output order
    const LABELS: &'static [Self];
    /// Model name used in error messages
    const MODEL: &'static str;

    /// Multi-output models pick the first maximum; single-output models use the
    /// rounded score as the class index.
    fn from_scores(scores: &[f32]) -> Result<Self> {
        let index = match scores {
            [] => {
                return Err(SkinToneError::Model {
                    model: Self::MODEL.to_string(),
                    message: "empty score vector".to_string(),
                })
            }
            [single] => {
                let rounded = single.round();
                if !(0.0..Self::LABELS.len() as f32).contains(&rounded) {
                    return Err(SkinToneError::Model {
                        model: Self::MODEL.to_string(),
                        message: format!("score {single} has no class"),
                    });
                }
                rounded as usize
            }
            _ => {
                let mut best = 0;
                for (i, &score) in scores.iter().enumerate() {
                    if score > scores[best] {
                        best = i;
                    }
                }
                best
            }
        };

        Self::LABELS.get(index).copied().ok_or_else(|| SkinToneError::Model {
            model: Self::MODEL.to_string(),
            message: format!(
                "{} scores for {} classes",
                scores.len(),
                Self::LABELS.len()
            ),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkinType {
    Dry,
    Normal,
    Oil,
}

impl ClassLabel for SkinType {
    const LABELS: &'static [Self] = &[SkinType::Dry, SkinType::Normal, SkinType::Oil];
    const MODEL: &'static str = "skin type";
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AcneSeverity {
    Low,
    Moderate,
    Severe,
}

impl ClassLabel for AcneSeverity {
    const LABELS: &'static [Self] = &[
        AcneSeverity::Low,
        AcneSeverity::Moderate,
        AcneSeverity::Severe,
    ];
    const MODEL: &'static str = "acne";
}

impl fmt::Display for AcneSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Preprocess `image` for `model`, score it and decode the class
pub fn predict<L, M>(model: &mut M, image: &RgbImage) -> Result<L>
where
    L: ClassLabel,
    M: ScoreModel + ?Sized,
{
    let (width, height) = model.input_size();
    let input = Preprocessor::new(width, height).preprocess(image)?;
    let scores = model.scores(&input)?;
    tracing::debug!("{} scores: {:?}", L::MODEL, scores);
    L::from_scores(&scores)
}
