use crate::error::{Result, SkinToneError, Stage};
use crate::segmentation::{Classification, Dimensions};
use ndarray::Array2;
use rayon::prelude::*;

/// Columns: hue, Cr, Cb, indicator
pub const FEATURE_COUNT: usize = 4;
pub const INDICATOR_COLUMN: usize = 3;

/// Clustering features of one pixel plus its row-major position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFeatureRecord {
    pub hue: u8,
    pub cr: u8,
    pub cb: u8,
    pub indicator: u8,
    pub index: usize,
}

impl PixelFeatureRecord {
    pub fn features(&self) -> [f32; FEATURE_COUNT] {
        [self.hue, self.cr, self.cb, self.indicator].map(f32::from)
    }

    /// Zero hue carries no color information (masked background included)
    pub fn is_included(&self) -> bool {
        self.hue != 0
    }
}

/// Every pixel of a grid split into clustering input and excluded pixels,
/// each side kept in row-major order
#[derive(Debug, Clone)]
pub struct FeatureTable {
    dims: Dimensions,
    included: Vec<PixelFeatureRecord>,
    excluded: Vec<PixelFeatureRecord>,
}

impl FeatureTable {
    pub fn from_records(dims: Dimensions, records: Vec<PixelFeatureRecord>) -> Result<Self> {
        if records.len() != dims.pixel_count() {
            return Err(SkinToneError::conversion(
                Stage::Features,
                format!("{} records for {}", dims.pixel_count(), dims),
                records.len(),
            ));
        }
        let (included, excluded) = records.into_iter().partition(PixelFeatureRecord::is_included);
        Ok(Self {
            dims,
            included,
            excluded,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn included(&self) -> &[PixelFeatureRecord] {
        &self.included
    }

    pub fn excluded(&self) -> &[PixelFeatureRecord] {
        &self.excluded
    }

    /// Included records as an `n x 4` matrix, row order matching [`Self::included`]
    pub fn matrix(&self) -> Result<Array2<f32>> {
        let flat: Vec<f32> = self.included.iter().flat_map(|r| r.features()).collect();
        Array2::from_shape_vec((self.included.len(), FEATURE_COUNT), flat)
            .map_err(|e| SkinToneError::conversion(Stage::Features, "n x 4 feature matrix", e))
    }

    /// Both partitions merged back into original row-major order
    pub fn reassemble(&self) -> Vec<PixelFeatureRecord> {
        let mut merged = Vec::with_capacity(self.included.len() + self.excluded.len());
        let mut included = self.included.iter().peekable();
        let mut excluded = self.excluded.iter().peekable();

        loop {
            let next = match (included.peek(), excluded.peek()) {
                (Some(a), Some(b)) if a.index < b.index => included.next(),
                (Some(_), Some(_)) => excluded.next(),
                (Some(_), None) => included.next(),
                (None, Some(_)) => excluded.next(),
                (None, None) => break,
            };
            merged.extend(next.copied());
        }
        merged
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureTableBuilder;

impl FeatureTableBuilder {
    pub fn build(&self, classification: &Classification) -> Result<FeatureTable> {
        let _span = tracing::debug_span!("features").entered();

        let dims = classification.colors.dimensions();
        dims.check(Stage::Features, &classification.colors.hsv)?;
        dims.check(Stage::Features, &classification.colors.ycrcb)?;
        dims.check(Stage::Features, &classification.indicator)?;

        let records: Vec<PixelFeatureRecord> = classification
            .colors
            .hsv
            .as_raw()
            .par_chunks_exact(3)
            .zip(classification.colors.ycrcb.as_raw().par_chunks_exact(3))
            .zip(classification.indicator.as_raw().par_iter())
            .enumerate()
            .map(|(index, ((hsv, ycrcb), &indicator))| PixelFeatureRecord {
                hue: hsv[0],
                cr: ycrcb[1],
                cb: ycrcb[2],
                indicator,
                index,
            })
            .collect();

        let table = FeatureTable::from_records(dims, records)?;
        tracing::debug!(
            "Feature table: {} included, {} excluded",
            table.included().len(),
            table.excluded().len()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, hue: u8, indicator: u8) -> PixelFeatureRecord {
        PixelFeatureRecord {
            hue,
            cr: 150,
            cb: 100,
            indicator,
            index,
        }
    }

    #[test]
    fn test_partition_and_reassemble_restore_order() {
        let records = vec![
            record(0, 0, 0),
            record(1, 10, 255),
            record(2, 0, 0),
            record(3, 0, 0),
            record(4, 90, 0),
            record(5, 11, 255),
        ];
        let table = FeatureTable::from_records(Dimensions::new(3, 2), records.clone()).unwrap();

        let included: Vec<usize> = table.included().iter().map(|r| r.index).collect();
        let excluded: Vec<usize> = table.excluded().iter().map(|r| r.index).collect();
        assert_eq!(included, vec![1, 4, 5]);
        assert_eq!(excluded, vec![0, 2, 3]);
        assert_eq!(table.reassemble(), records);
    }

    #[test]
    fn test_matrix_rows_follow_included_records() {
        let records = vec![record(0, 0, 0), record(1, 10, 255), record(2, 90, 0)];
        let table = FeatureTable::from_records(Dimensions::new(3, 1), records).unwrap();
        let matrix = table.matrix().unwrap();

        assert_eq!(matrix.shape(), &[2, FEATURE_COUNT]);
        assert_eq!(matrix.row(0).to_vec(), vec![10.0, 150.0, 100.0, 255.0]);
        assert_eq!(matrix[[1, 0]], 90.0);
        assert_eq!(matrix[[1, INDICATOR_COLUMN]], 0.0);
    }

    #[test]
    fn test_record_count_must_match_grid() {
        let err =
            FeatureTable::from_records(Dimensions::new(2, 2), vec![record(0, 5, 0)]).unwrap_err();
        assert!(matches!(
            err,
            SkinToneError::Conversion {
                stage: Stage::Features,
                ..
            }
        ));
    }
}
