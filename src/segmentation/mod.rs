mod classify;
mod threshold;
pub mod types;

pub use classify::{is_skin, Classification, SkinPixelClassifier, SKIN};
pub use threshold::{
    apply_mask, blend_threshold, histogram, histogram_peak, otsu_threshold, AdaptiveThresholder,
    Histogram, ThresholdDecision, ThresholdDirection, ThresholdOutput,
};
pub use types::{ChannelGrid, Dimensions, ForegroundMask, SkinIndicatorGrid};
