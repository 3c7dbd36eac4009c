// src/lib.rs - Library interface for nuclear grade feature extraction

pub mod color;
pub mod config;
pub mod errors;
pub mod feature_extraction;
pub mod gabor;
pub mod geometry;
pub mod haralick;
pub mod image_io;
pub mod image_utils;
pub mod morphology;
pub mod output;
pub mod pipeline;
pub mod regions;
pub mod shape_analysis;
pub mod spatial;
pub mod statistics;
pub mod triangulation;

// Re-export commonly used types and functions
pub use config::{Config, FilterBankConfig, HaralickConfig};
pub use errors::{NucleiFeatureError, Result};
pub use image_io::{load_binary_mask, load_image, load_label_map, InputImage};
pub use pipeline::{compute_nuclear_features, feature_labels, FeatureVector};
pub use regions::{filter_regions, Region, RegionSet};

// Re-export the per-stage extractors
pub use feature_extraction::{extract_region_measurements, Quantity, RegionMeasurement};
pub use gabor::{apply_filter_bank, FilterBankSummary};
pub use haralick::{haralick_features, HaralickFeatures};
pub use shape_analysis::{analyze_region_shape, RegionShape};
pub use spatial::{calculate_alignedness, calculate_crowdedness, SpatialTopology};
pub use statistics::{distribution_parameters, DisorderMeasure, DistributionSummary};
