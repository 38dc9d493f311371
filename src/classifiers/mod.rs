//! Boundary to the downstream classifiers
//!
//! The skin-type and acne models are black boxes behind [`ScoreModel`]; this
//! module owns the tensor they consume and the decoding of what they return.
//! The dominant skin color itself feeds [`ToneLookup`].

mod labels;
mod preprocess;
mod tone;

pub use labels::{predict, AcneSeverity, ClassLabel, ScoreModel, SkinType};
pub use preprocess::{Preprocessor, CLASSIFIER_INPUT_SIZE};
pub use tone::{NearestTone, ToneBucket, ToneLookup, ToneReference};
