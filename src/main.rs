mod output;

use anyhow::{Context, Result};
use clap::Parser;
use output::{DebugImageWriter, OutputSink, ReportPrinter};
use skintone::capture::FileSource;
use skintone::classifiers::NearestTone;
use skintone::config::{CANONICAL_HEIGHT, CANONICAL_WIDTH, DEFAULT_SEED};
use skintone::{PipelineConfig, SkinPipeline};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Image to analyze
    image: PathBuf,

    /// Canonical grid width
    #[arg(long, default_value_t = CANONICAL_WIDTH)]
    width: u32,

    /// Canonical grid height
    #[arg(long, default_value_t = CANONICAL_HEIGHT)]
    height: u32,

    /// Clustering seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Independent k-means restarts
    #[arg(long, default_value_t = 10)]
    restarts: usize,

    /// Maximum k-means iterations per restart
    #[arg(long, default_value_t = 100)]
    max_iterations: usize,

    /// Write the skin mask to this path
    #[arg(long)]
    mask_output: Option<PathBuf>,

    /// Write the canonical image with non-skin pixels blacked out to this path
    #[arg(long)]
    segment_output: Option<PathBuf>,

    /// JSON table of labelled (hue, Cr, Cb) reference colors for tone lookup
    #[arg(long)]
    tone_reference: Option<PathBuf>,

    /// Print a JSON report with diagnostics instead of the bare color
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            width: self.width,
            height: self.height,
            restarts: self.restarts,
            max_iterations: self.max_iterations,
            seed: self.seed,
            ..PipelineConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = args.pipeline_config();
    tracing::info!("Analyzing {}", args.image.display());
    tracing::info!("Canonical grid: {}", config.dimensions());
    tracing::debug!(
        "Clustering: seed={}, restarts={}, max_iterations={}",
        config.seed,
        config.restarts,
        config.max_iterations
    );

    let pipeline = SkinPipeline::new(config).context("Invalid pipeline configuration")?;

    let result = match pipeline.run(&FileSource::new(&args.image)) {
        Ok(result) => result,
        Err(err) => {
            tracing::error!("{}", err.user_message());
            return Err(err).with_context(|| format!("Failed to analyze {}", args.image.display()));
        }
    };

    let mut sinks: Vec<Box<dyn OutputSink>> = Vec::new();
    let writer = DebugImageWriter::new(args.mask_output.clone(), args.segment_output.clone());
    if !writer.is_empty() {
        sinks.push(Box::new(writer));
    }
    let mut printer = ReportPrinter::new(std::io::stdout().lock(), args.json);
    if let Some(path) = &args.tone_reference {
        let tones = NearestTone::open(path)
            .with_context(|| format!("Failed to load tone references from {}", path.display()))?;
        tracing::debug!("Loaded {} tone references", tones.references().len());
        printer = printer.with_tone_lookup(Box::new(tones));
    }
    sinks.push(Box::new(printer));

    for sink in &mut sinks {
        sink.write_result(&result).context("Failed to write output")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_onto_config() {
        let args = Args::parse_from(["skintone", "face.jpg", "--seed", "7", "--restarts", "3"]);
        let config = args.pipeline_config();

        assert_eq!(config.seed, 7);
        assert_eq!(config.restarts, 3);
        assert_eq!(config.dimensions(), PipelineConfig::default().dimensions());
        assert!(!args.json);
        assert!(args.tone_reference.is_none());

        let args = Args::parse_from(["skintone", "face.jpg", "--tone-reference", "tones.json"]);
        assert_eq!(args.tone_reference, Some(PathBuf::from("tones.json")));
    }
}
