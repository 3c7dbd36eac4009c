use thiserror::Error;
use std::io;
use std::path::PathBuf;

/// Error types for nuclear feature extraction
#[derive(Error, Debug)]
pub enum NucleiFeatureError {
    #[error("Region set size {regions:?} does not match image size {image:?} (height, width)")]
    SizeMismatch {
        regions: (u32, u32),
        image: (u32, u32),
    },

    #[error("No regions with an area of at least {min_area} pixels")]
    NoRegions { min_area: usize },

    #[error("Invalid label map: {0}")]
    InvalidLabelMap(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV output error: {0}")]
    CsvOutput(#[from] csv::Error),

    #[error("Invalid input path: {0}")]
    InvalidPath(PathBuf),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, NucleiFeatureError>;
