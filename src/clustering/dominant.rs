use super::features::{FeatureTable, FEATURE_COUNT, INDICATOR_COLUMN};
use super::kmeans::{self, KMeansConfig, KMeansModel};
use crate::config::{PipelineConfig, CLUSTER_COUNT};
use crate::error::{Result, SkinToneError, Stage};
use crate::segmentation::SKIN;
use image::GrayImage;
use ndarray::Array2;
use serde::Serialize;

/// Representative skin color: the dominant centroid without its indicator
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkinColor {
    pub hue: f64,
    pub cr: f64,
    pub cb: f64,
}

impl SkinColor {
    pub fn to_array(&self) -> [f64; 3] {
        [self.hue, self.cr, self.cb]
    }
}

/// Centroid chosen as the skin cluster
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DominantCluster {
    pub index: usize,
    pub centroid: [f64; FEATURE_COUNT],
}

impl DominantCluster {
    pub fn color(&self) -> SkinColor {
        let [hue, cr, cb, _] = self.centroid;
        SkinColor { hue, cr, cb }
    }
}

/// Centroid with the largest indicator value; ties go to the lowest index
pub fn select_dominant(centroids: &Array2<f64>) -> Result<DominantCluster> {
    if centroids.nrows() == 0 {
        return Err(SkinToneError::clustering("clustering produced zero centroids"));
    }
    if centroids.ncols() != FEATURE_COUNT {
        return Err(SkinToneError::conversion(
            Stage::Cluster,
            format!("{} centroid columns", FEATURE_COUNT),
            centroids.ncols(),
        ));
    }

    let mut index = 0;
    for (c, row) in centroids.rows().into_iter().enumerate() {
        if row[INDICATOR_COLUMN] > centroids[[index, INDICATOR_COLUMN]] {
            index = c;
        }
    }

    let row = centroids.row(index);
    Ok(DominantCluster {
        index,
        centroid: [row[0], row[1], row[2], row[3]],
    })
}

/// Full-resolution mask: included pixels in `selected` become 255, everything
/// else (excluded pixels included) 0
pub fn reconstruct_mask(
    table: &FeatureTable,
    labels: &[usize],
    selected: usize,
) -> Result<GrayImage> {
    let dims = table.dimensions();
    if labels.len() != table.included().len() {
        return Err(SkinToneError::conversion(
            Stage::Reconstruct,
            format!("{} labels", table.included().len()),
            labels.len(),
        ));
    }
    let covered = table.included().len() + table.excluded().len();
    if covered != dims.pixel_count() {
        return Err(SkinToneError::conversion(
            Stage::Reconstruct,
            dims,
            format!("{covered} pixels"),
        ));
    }

    let mut labels = labels.iter();
    let mut mask = Vec::with_capacity(dims.pixel_count());
    for (position, record) in table.reassemble().into_iter().enumerate() {
        if record.index != position {
            return Err(SkinToneError::conversion(
                Stage::Reconstruct,
                format!("pixel index {position}"),
                record.index,
            ));
        }
        if !record.is_included() {
            mask.push(0);
            continue;
        }
        let label = labels.next().ok_or_else(|| {
            SkinToneError::conversion(Stage::Reconstruct, "one label per included pixel", position)
        })?;
        mask.push(if *label == selected { SKIN } else { 0 });
    }

    GrayImage::from_raw(dims.width, dims.height, mask)
        .ok_or_else(|| SkinToneError::conversion(Stage::Reconstruct, dims, "short mask buffer"))
}

/// Outcome of clustering the feature table
#[derive(Debug, Clone)]
pub struct Selection {
    pub color: SkinColor,
    pub cluster: DominantCluster,
    pub mask: GrayImage,
    pub model: KMeansModel,
}

#[derive(Debug, Clone)]
pub struct DominantClusterSelector {
    kmeans: KMeansConfig,
}

impl DominantClusterSelector {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            kmeans: KMeansConfig {
                clusters: CLUSTER_COUNT,
                restarts: config.restarts,
                max_iterations: config.max_iterations,
                tolerance: config.tolerance,
                seed: config.seed,
            },
        }
    }

    pub fn select(&self, table: &FeatureTable) -> Result<Selection> {
        let _span = tracing::debug_span!("dominant_cluster").entered();

        if table.included().is_empty() {
            return Err(SkinToneError::EmptyRegion {
                total_pixels: table.dimensions().pixel_count(),
            });
        }

        let data = table.matrix()?;
        let model = kmeans::fit(&data, &self.kmeans)?;
        let cluster = select_dominant(&model.centroids)?;
        tracing::debug!(
            "Selected cluster {} of {} (restart {}, inertia {:.3}): {:?}",
            cluster.index,
            model.cluster_count(),
            model.restart,
            model.inertia,
            cluster.centroid
        );

        let mask = reconstruct_mask(table, &model.labels, cluster.index)?;
        Ok(Selection {
            color: cluster.color(),
            cluster,
            mask,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::features::PixelFeatureRecord;
    use crate::segmentation::Dimensions;
    use ndarray::array;

    #[test]
    fn test_highest_indicator_wins() {
        let centroids = array![
            [90.0, 120.0, 160.0, 0.0],
            [10.0, 155.0, 100.0, 240.0],
            [30.0, 140.0, 110.0, 12.0]
        ];
        let dominant = select_dominant(&centroids).unwrap();
        assert_eq!(dominant.index, 1);
        assert_eq!(
            dominant.color(),
            SkinColor {
                hue: 10.0,
                cr: 155.0,
                cb: 100.0
            }
        );
    }

    #[test]
    fn test_indicator_ties_take_lowest_index() {
        let centroids = array![
            [90.0, 120.0, 160.0, 0.0],
            [10.0, 155.0, 100.0, 255.0],
            [12.0, 150.0, 105.0, 255.0]
        ];
        assert_eq!(select_dominant(&centroids).unwrap().index, 1);
    }

    #[test]
    fn test_zero_centroids_is_clustering_error() {
        let centroids = Array2::<f64>::zeros((0, FEATURE_COUNT));
        assert!(matches!(
            select_dominant(&centroids),
            Err(SkinToneError::Clustering { .. })
        ));
    }

    fn table(hues: &[u8]) -> FeatureTable {
        let records = hues
            .iter()
            .enumerate()
            .map(|(index, &hue)| PixelFeatureRecord {
                hue,
                cr: 150,
                cb: 100,
                indicator: if hue == 10 { 255 } else { 0 },
                index,
            })
            .collect();
        FeatureTable::from_records(Dimensions::new(hues.len() as u32, 1), records).unwrap()
    }

    #[test]
    fn test_mask_zeroes_excluded_and_unselected_pixels() {
        let table = table(&[0, 10, 90, 0, 10]);
        // included: indices 1, 2, 4
        let mask = reconstruct_mask(&table, &[2, 0, 2], 2).unwrap();
        assert_eq!(mask.as_raw(), &vec![0u8, 255, 0, 0, 255]);

        assert!(reconstruct_mask(&table, &[2, 0], 2).is_err());
    }

    #[test]
    fn test_mask_requires_row_major_records() {
        let records = vec![
            PixelFeatureRecord {
                hue: 10,
                cr: 150,
                cb: 100,
                indicator: 255,
                index: 1,
            },
            PixelFeatureRecord {
                hue: 10,
                cr: 150,
                cb: 100,
                indicator: 255,
                index: 0,
            },
        ];
        let table = FeatureTable::from_records(Dimensions::new(2, 1), records).unwrap();
        let err = reconstruct_mask(&table, &[0, 0], 0).unwrap_err();
        assert!(matches!(
            err,
            SkinToneError::Conversion {
                stage: Stage::Reconstruct,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_region_fails_before_clustering() {
        let selector = DominantClusterSelector::new(&PipelineConfig::default());
        let err = selector.select(&table(&[0, 0, 0, 0])).unwrap_err();
        assert!(matches!(err, SkinToneError::EmptyRegion { total_pixels: 4 }));
    }

    #[test]
    fn test_selects_skin_records() {
        let hues: Vec<u8> = (0..40).map(|i| if i % 4 == 0 { 90 } else { 10 }).collect();
        let selection = DominantClusterSelector::new(&PipelineConfig::default())
            .select(&table(&hues))
            .unwrap();

        assert_eq!(selection.color.to_array(), [10.0, 150.0, 100.0]);
        for (i, &value) in selection.mask.as_raw().iter().enumerate() {
            assert_eq!(value == 255, hues[i] == 10, "pixel {i}");
        }
    }
}
