// src/pipeline.rs - Region partition + image -> labeled nuclear feature vector

use image::{DynamicImage, GenericImageView};
use serde::Serialize;

use crate::config::Config;
use crate::errors::{NucleiFeatureError, Result};
use crate::feature_extraction::{extract_region_measurements, Quantity};
use crate::gabor::{apply_filter_bank, FilterBankSummary};
use crate::haralick::{haralick_features, HARALICK_LABELS};
use crate::image_utils::{ChannelPlanes, GrayPlane};
use crate::regions::{filter_regions, RegionSet};
use crate::statistics::{distribution_parameters, STATISTIC_NAMES};

/// Ordered feature values with matching labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub values: Vec<f64>,
    pub labels: Vec<String>,
}

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// (label, value) pairs in output order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.labels.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    /// Value for a label, if present
    pub fn get(&self, label: &str) -> Option<f64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i])
    }
}

/// Labels of the feature vector produced under `config`, independent of any input
pub fn feature_labels(config: &Config) -> Vec<String> {
    let mut labels: Vec<String> = Quantity::ALL
        .iter()
        .flat_map(|q| STATISTIC_NAMES.iter().map(move |s| format!("{}_{}", q.label(), s)))
        .collect();

    labels.extend(FilterBankSummary::labels(&config.filter_bank.wavelengths));
    labels.extend(HARALICK_LABELS.iter().map(|l| l.to_string()));
    labels
}

/// Compute the nuclear feature vector of one image.
///
/// `regions` must cover the same (height, width) as `image`. Regions below
/// `config.min_region_area` are discarded; failing if none remain.
pub fn compute_nuclear_features(
    regions: &RegionSet,
    image: &DynamicImage,
    config: &Config,
) -> Result<FeatureVector> {
    config.validate()?;

    // Step 1: Inputs must describe the same pixel grid
    let (width, height) = image.dimensions();
    if regions.image_size() != (height, width) {
        return Err(NucleiFeatureError::SizeMismatch {
            regions: regions.image_size(),
            image: (height, width),
        });
    }

    // Step 2: Drop fragments
    let retained = filter_regions(regions, config.min_region_area)?;
    log::info!(
        "Retained {} of {} regions (min area {})",
        retained.len(),
        regions.len(),
        config.min_region_area
    );

    // Step 3: Per-region measurements and spatial topology
    let planes = ChannelPlanes::from_image(image);
    let population = extract_region_measurements(&retained, &planes, config);
    log::debug!(
        "Measured {} regions, {} triangulation edges",
        population.records.len(),
        population.edge_distances.raw.len()
    );

    // Step 4: Distribution summaries, one block per quantity
    let mut values = Vec::with_capacity(Quantity::ALL.len() * STATISTIC_NAMES.len());
    for quantity in Quantity::ALL {
        let summary = distribution_parameters(quantity.values(&population), config.disorder);
        values.extend(summary.to_array());
    }

    // Step 5: Filter bank over the gray projection
    let gray = GrayPlane::from_image(image);
    let responses = apply_filter_bank(&gray, &config.filter_bank, config.use_parallel);
    let filter_summary =
        FilterBankSummary::from_responses(&config.filter_bank.wavelengths, &responses);
    log::debug!("Applied {} Gabor filters", responses.len());
    values.extend(filter_summary.values());

    // Step 6: Co-occurrence texture
    let texture = haralick_features(&gray, &config.haralick);
    values.extend(texture.to_array());

    // Step 7: Assemble
    let labels = feature_labels(config);
    debug_assert_eq!(values.len(), labels.len());
    log::info!("Assembled {} features", values.len());

    Ok(FeatureVector { values, labels })
}
