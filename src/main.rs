use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use nuclear_grade_features_lib::config::Config;
use nuclear_grade_features_lib::image_io::{load_binary_mask, load_image, load_label_map};
use nuclear_grade_features_lib::output::{write_feature_csv, write_feature_json};
use nuclear_grade_features_lib::pipeline::compute_nuclear_features;

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Nuclear grade features - morphometry, arrangement and texture of segmented nuclei"
)]
struct Args {
    /// Path to the tissue image
    #[clap(short, long)]
    image: PathBuf,

    /// Path to the region label image (0 = background)
    #[clap(short, long)]
    labels: PathBuf,

    /// Treat the label image as a binary mask and split it into connected regions
    #[clap(long)]
    mask: bool,

    /// Path to output directory
    #[clap(short, long, default_value = "output")]
    output: PathBuf,

    /// Path to configuration file; defaults are used when omitted
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Minimum region area in pixels (overwrites config)
    #[clap(long)]
    min_area: Option<usize>,

    /// Also write the feature vector as JSON
    #[clap(long)]
    json: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(min_area) = args.min_area {
        config.min_region_area = min_area;
    }

    config.validate()?;

    let start_time = Instant::now();

    let input = load_image(&args.image)
        .with_context(|| format!("Failed to load image {}", args.image.display()))?;
    let loaded = if args.mask {
        load_binary_mask(&args.labels)
    } else {
        load_label_map(&args.labels)
    };
    let regions =
        loaded.with_context(|| format!("Failed to load labels {}", args.labels.display()))?;

    log::info!(
        "Processing {} ({} candidate regions)",
        input.path.display(),
        regions.len()
    );

    let features = compute_nuclear_features(&regions, &input.image, &config)
        .with_context(|| format!("Feature extraction failed for {}", input.filename))?;

    let csv_path = write_feature_csv(&args.output, &input.filename, &features)?;
    log::info!("Appended {} features to {}", features.len(), csv_path.display());

    if args.json {
        let json_path = write_feature_json(&args.output, &input.filename, &features)?;
        log::info!("Wrote {}", json_path.display());
    }

    log::info!("Processing completed in {:.2} seconds", start_time.elapsed().as_secs_f64());

    Ok(())
}
