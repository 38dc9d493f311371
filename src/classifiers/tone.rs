//! Skin-tone lookup for the dominant skin color
//!
//! A tone is the label of the nearest reference color in `(hue, Cr, Cb)`
//! space. Reference rows are plain JSON records, e.g.
//! `[{"hue": 10.0, "cr": 150.0, "cb": 110.0, "tone": 2}, ...]`.

use crate::clustering::SkinColor;
use crate::error::{Result, SkinToneError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const MODEL: &str = "skin tone";

fn model_error(message: impl Into<String>) -> SkinToneError {
    SkinToneError::Model {
        model: MODEL.to_string(),
        message: message.into(),
    }
}

/// One labelled reference color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneReference {
    pub hue: f64,
    pub cr: f64,
    pub cb: f64,
    pub tone: u8,
}

impl ToneReference {
    fn squared_distance(&self, color: &SkinColor) -> f64 {
        let [hue, cr, cb] = color.to_array();
        (self.hue - hue).powi(2) + (self.cr - cr).powi(2) + (self.cb - cb).powi(2)
    }
}

/// Trait for tone lookups
/// Allows swapping the reference table for another backend
pub trait ToneLookup {
    /// Numeric tone for a dominant skin color
    fn tone(&self, color: &SkinColor) -> Result<u8>;
}

/// Nearest-neighbour lookup over labelled reference colors
#[derive(Debug, Clone)]
pub struct NearestTone {
    references: Vec<ToneReference>,
}

impl NearestTone {
    pub fn new(references: Vec<ToneReference>) -> Result<Self> {
        if references.is_empty() {
            return Err(model_error("no reference colors"));
        }
        Ok(Self { references })
    }

    /// Parse a JSON array of reference rows
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let references: Vec<ToneReference> = serde_json::from_reader(reader)
            .map_err(|e| model_error(format!("invalid reference table: {e}")))?;
        Self::new(references)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| model_error(format!("cannot open {}: {e}", path.display())))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn references(&self) -> &[ToneReference] {
        &self.references
    }
}

impl ToneLookup for NearestTone {
    /// Ties go to the earliest reference row
    fn tone(&self, color: &SkinColor) -> Result<u8> {
        let mut best = &self.references[0];
        let mut best_distance = best.squared_distance(color);
        for reference in &self.references[1..] {
            let distance = reference.squared_distance(color);
            if distance < best_distance {
                best = reference;
                best_distance = distance;
            }
        }

        if !best_distance.is_finite() {
            return Err(model_error(format!("no finite distance to {:?}", color)));
        }
        tracing::debug!("Nearest reference {:?} at distance {:.3}", best, best_distance.sqrt());
        Ok(best.tone)
    }
}

/// Coarse tone range used for product matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToneBucket {
    FairToLight,
    LightToMedium,
    MediumToDark,
}

impl ToneBucket {
    pub fn from_tone(tone: u8) -> Self {
        match tone {
            0..=2 => ToneBucket::FairToLight,
            3 => ToneBucket::LightToMedium,
            _ => ToneBucket::MediumToDark,
        }
    }
}

impl fmt::Display for ToneBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToneBucket::FairToLight => "fair to light",
            ToneBucket::LightToMedium => "light to medium",
            ToneBucket::MediumToDark => "medium to dark",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(hue: f64, cr: f64, cb: f64, tone: u8) -> ToneReference {
        ToneReference { hue, cr, cb, tone }
    }

    fn color(hue: f64, cr: f64, cb: f64) -> SkinColor {
        SkinColor { hue, cr, cb }
    }

    #[test]
    fn test_nearest_reference_wins() {
        let lookup = NearestTone::new(vec![
            reference(8.0, 140.0, 120.0, 1),
            reference(10.0, 160.0, 103.0, 4),
            reference(14.0, 170.0, 95.0, 6),
        ])
        .unwrap();

        assert_eq!(lookup.tone(&color(10.0, 158.0, 104.0)).unwrap(), 4);
        assert_eq!(lookup.tone(&color(15.0, 171.0, 90.0)).unwrap(), 6);
        assert_eq!(lookup.tone(&color(0.0, 130.0, 130.0)).unwrap(), 1);
    }

    #[test]
    fn test_equidistant_references_take_earliest_row() {
        let lookup = NearestTone::new(vec![
            reference(10.0, 150.0, 100.0, 5),
            reference(10.0, 160.0, 100.0, 2),
            reference(10.0, 150.0, 100.0, 3),
        ])
        .unwrap();

        // 5 away from the first two rows
        assert_eq!(lookup.tone(&color(10.0, 155.0, 100.0)).unwrap(), 5);
        // duplicate rows: the first one wins
        assert_eq!(lookup.tone(&color(10.0, 150.0, 100.0)).unwrap(), 5);
    }

    #[test]
    fn test_reference_table_from_json() {
        let json = r#"[
            {"hue": 9.0, "cr": 150.0, "cb": 110.0, "tone": 2},
            {"hue": 12.0, "cr": 165.0, "cb": 98.0, "tone": 5}
        ]"#;
        let lookup = NearestTone::from_reader(json.as_bytes()).unwrap();

        assert_eq!(lookup.references().len(), 2);
        assert_eq!(lookup.tone(&color(12.0, 163.0, 99.0)).unwrap(), 5);
    }

    #[test]
    fn test_bad_reference_tables_are_model_errors() {
        assert!(matches!(
            NearestTone::new(Vec::new()),
            Err(SkinToneError::Model { .. })
        ));
        assert!(matches!(
            NearestTone::from_reader("[]".as_bytes()),
            Err(SkinToneError::Model { .. })
        ));
        assert!(matches!(
            NearestTone::from_reader(r#"[{"hue": 1.0}]"#.as_bytes()),
            Err(SkinToneError::Model { .. })
        ));
        let missing = std::env::temp_dir().join("skintone-no-such-table.json");
        assert!(NearestTone::open(missing).is_err());
    }

    #[test]
    fn test_bucket_edges() {
        assert_eq!(ToneBucket::from_tone(0), ToneBucket::FairToLight);
        assert_eq!(ToneBucket::from_tone(1), ToneBucket::FairToLight);
        assert_eq!(ToneBucket::from_tone(2), ToneBucket::FairToLight);
        assert_eq!(ToneBucket::from_tone(3), ToneBucket::LightToMedium);
        assert_eq!(ToneBucket::from_tone(4), ToneBucket::MediumToDark);
        assert_eq!(ToneBucket::from_tone(6), ToneBucket::MediumToDark);
        assert_eq!(ToneBucket::from_tone(3).to_string(), "light to medium");
    }
}
