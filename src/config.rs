// src/config.rs - Feature extraction parameters, loadable from TOML

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{NucleiFeatureError, Result};
use crate::regions::DEFAULT_MIN_REGION_AREA;
use crate::statistics::DisorderMeasure;

/// Configuration for nuclear feature extraction
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Regions smaller than this many pixels are discarded as fragments
    #[serde(default = "default_min_region_area")]
    pub min_region_area: usize,

    #[serde(default = "default_parallel")]
    pub use_parallel: bool,

    #[serde(default)]
    pub filter_bank: FilterBankConfig,

    #[serde(default)]
    pub haralick: HaralickConfig,

    #[serde(default)]
    pub disorder: DisorderMeasure,
}

/// Gabor filter bank layout
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FilterBankConfig {
    /// Carrier wavelengths in pixels
    #[serde(default = "default_wavelengths")]
    pub wavelengths: Vec<f64>,

    /// Carrier orientations in degrees
    #[serde(default = "default_orientations")]
    pub orientations_deg: Vec<f64>,

    /// Half-magnitude frequency bandwidth in octaves
    #[serde(default = "default_bandwidth")]
    pub spatial_frequency_bandwidth: f64,

    /// Envelope width ratio across/along the carrier
    #[serde(default = "default_aspect_ratio")]
    pub spatial_aspect_ratio: f64,
}

/// Co-occurrence matrix parameters
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct HaralickConfig {
    #[serde(default = "default_gray_levels")]
    pub gray_levels: usize,

    /// Pixel offset between co-occurring pairs
    #[serde(default = "default_distance")]
    pub distance: usize,
}

fn default_min_region_area() -> usize {
    DEFAULT_MIN_REGION_AREA
}

fn default_parallel() -> bool {
    true
}

fn default_wavelengths() -> Vec<f64> {
    (1..=8).map(|k| 4.0 * k as f64).collect()
}

fn default_orientations() -> Vec<f64> {
    (0..10).map(|k| 18.0 * k as f64).collect()
}

fn default_bandwidth() -> f64 {
    1.0
}

fn default_aspect_ratio() -> f64 {
    0.5
}

fn default_gray_levels() -> usize {
    256
}

fn default_distance() -> usize {
    1
}

impl Default for FilterBankConfig {
    fn default() -> Self {
        Self {
            wavelengths: default_wavelengths(),
            orientations_deg: default_orientations(),
            spatial_frequency_bandwidth: default_bandwidth(),
            spatial_aspect_ratio: default_aspect_ratio(),
        }
    }
}

impl Default for HaralickConfig {
    fn default() -> Self {
        Self {
            gray_levels: default_gray_levels(),
            distance: default_distance(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_region_area: default_min_region_area(),
            use_parallel: default_parallel(),
            filter_bank: FilterBankConfig::default(),
            haralick: HaralickConfig::default(),
            disorder: DisorderMeasure::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            NucleiFeatureError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            NucleiFeatureError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.min_region_area == 0 {
            return Err(NucleiFeatureError::Config(
                "min_region_area must be >= 1".to_string(),
            ));
        }

        let bank = &self.filter_bank;
        if bank.wavelengths.is_empty() || bank.orientations_deg.is_empty() {
            return Err(NucleiFeatureError::Config(
                "filter_bank needs at least one wavelength and one orientation".to_string(),
            ));
        }

        if bank.wavelengths.iter().any(|&w| !(w >= 2.0) || !w.is_finite()) {
            return Err(NucleiFeatureError::Config(
                "filter_bank wavelengths must be finite and >= 2.0".to_string(),
            ));
        }

        if bank.orientations_deg.iter().any(|o| !o.is_finite()) {
            return Err(NucleiFeatureError::Config(
                "filter_bank orientations must be finite".to_string(),
            ));
        }

        if !(bank.spatial_frequency_bandwidth > 0.0) {
            return Err(NucleiFeatureError::Config(
                "spatial_frequency_bandwidth must be > 0.0".to_string(),
            ));
        }

        if !(bank.spatial_aspect_ratio > 0.0) {
            return Err(NucleiFeatureError::Config(
                "spatial_aspect_ratio must be > 0.0".to_string(),
            ));
        }

        if self.haralick.gray_levels < 2 {
            return Err(NucleiFeatureError::Config(
                "haralick gray_levels must be >= 2".to_string(),
            ));
        }

        if self.haralick.distance == 0 {
            return Err(NucleiFeatureError::Config(
                "haralick distance must be >= 1".to_string(),
            ));
        }

        if let DisorderMeasure::HistogramEntropy { bins } = self.disorder {
            if bins < 2 {
                return Err(NucleiFeatureError::Config(
                    "disorder histogram bins must be >= 2".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            NucleiFeatureError::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content)?;

        Ok(())
    }
}
