use super::OutputSink;
use anyhow::{Context, Result};
use serde::Serialize;
use skintone::classifiers::{ToneBucket, ToneLookup};
use skintone::{PipelineDiagnostics, SkinColor, SkinColorResult};
use std::io::Write;

#[derive(Serialize)]
struct ToneReport {
    tone: u8,
    bucket: ToneBucket,
}

#[derive(Serialize)]
struct Report<'a> {
    color: &'a SkinColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    tone: Option<ToneReport>,
    skin_pixels: usize,
    diagnostics: &'a PipelineDiagnostics,
}

/// Prints the color as `hue Cr Cb`, or a JSON report with diagnostics
pub struct ReportPrinter<W: Write> {
    writer: W,
    json: bool,
    tones: Option<Box<dyn ToneLookup>>,
}

impl<W: Write> ReportPrinter<W> {
    pub fn new(writer: W, json: bool) -> Self {
        Self {
            writer,
            json,
            tones: None,
        }
    }

    /// Also report the tone of the dominant color
    pub fn with_tone_lookup(mut self, tones: Box<dyn ToneLookup>) -> Self {
        self.tones = Some(tones);
        self
    }

    fn tone(&self, color: &SkinColor) -> Result<Option<ToneReport>> {
        let Some(tones) = &self.tones else {
            return Ok(None);
        };
        let tone = tones.tone(color).context("Failed to look up skin tone")?;
        Ok(Some(ToneReport {
            tone,
            bucket: ToneBucket::from_tone(tone),
        }))
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for ReportPrinter<W> {
    fn write_result(&mut self, result: &SkinColorResult) -> Result<()> {
        let tone = self.tone(&result.color)?;
        if self.json {
            let report = Report {
                color: &result.color,
                tone,
                skin_pixels: result.skin_pixels(),
                diagnostics: &result.diagnostics,
            };
            serde_json::to_writer_pretty(&mut self.writer, &report)
                .context("Failed to serialize report")?;
            writeln!(self.writer)?;
        } else {
            let color = &result.color;
            write!(self.writer, "{:.2} {:.2} {:.2}", color.hue, color.cr, color.cb)
                .context("Failed to write color")?;
            if let Some(tone) = tone {
                write!(self.writer, " {} ({})", tone.tone, tone.bucket)?;
            }
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::patch_result;
    use skintone::classifiers::{NearestTone, ToneReference};

    fn tone_table() -> Box<dyn ToneLookup> {
        let references = vec![
            ToneReference {
                hue: 8.0,
                cr: 145.0,
                cb: 115.0,
                tone: 2,
            },
            ToneReference {
                hue: 10.0,
                cr: 158.0,
                cb: 104.0,
                tone: 4,
            },
        ];
        Box::new(NearestTone::new(references).unwrap())
    }

    #[test]
    fn test_plain_output() {
        let mut printer = ReportPrinter::new(Vec::new(), false);
        printer.write_result(&patch_result()).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(text, "10.00 160.00 103.00\n");
    }

    #[test]
    fn test_json_output() {
        let mut printer = ReportPrinter::new(Vec::new(), true);
        printer.write_result(&patch_result()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&printer.into_inner()).unwrap();

        assert_eq!(value["color"]["hue"], 10.0);
        assert_eq!(value["color"]["cr"], 160.0);
        assert_eq!(value["skin_pixels"], 36);
        assert_eq!(value["diagnostics"]["threshold"]["direction"], "Binary");
        assert_eq!(value["diagnostics"]["dimensions"]["width"], 12);
    }

    #[test]
    fn test_tone_is_reported() {
        let mut printer = ReportPrinter::new(Vec::new(), false).with_tone_lookup(tone_table());
        printer.write_result(&patch_result()).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(text, "10.00 160.00 103.00 4 (medium to dark)\n");

        let mut printer = ReportPrinter::new(Vec::new(), true).with_tone_lookup(tone_table());
        printer.write_result(&patch_result()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&printer.into_inner()).unwrap();
        assert_eq!(value["tone"]["tone"], 4);
        assert_eq!(value["tone"]["bucket"], "MediumToDark");
    }
}
