//! Feature extraction and unsupervised selection of the skin cluster

mod dominant;
mod features;
pub mod kmeans;

pub use dominant::{
    reconstruct_mask, select_dominant, DominantCluster, DominantClusterSelector, Selection,
    SkinColor,
};
pub use features::{
    FeatureTable, FeatureTableBuilder, PixelFeatureRecord, FEATURE_COUNT, INDICATOR_COLUMN,
};
pub use kmeans::{KMeansConfig, KMeansModel};
