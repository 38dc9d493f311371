mod files;
mod report;

pub use files::DebugImageWriter;
pub use report::ReportPrinter;

use anyhow::Result;
use skintone::SkinColorResult;

/// Trait for result destinations
pub trait OutputSink {
    /// Emit one pipeline result
    fn write_result(&mut self, result: &SkinColorResult) -> Result<()>;
}
