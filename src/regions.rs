// src/regions.rs - Labeled region partition and minimum-area region filter

use std::collections::BTreeMap;

use image::{GrayImage, ImageBuffer, Luma};

use crate::errors::{NucleiFeatureError, Result};

/// Minimum pixel area for a region to take part in feature computation
pub const DEFAULT_MIN_REGION_AREA: usize = 9;

/// One candidate nucleus: its label and the pixels it covers as (x, y)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub label: u32,
    pub pixels: Vec<(u32, u32)>,
}

impl Region {
    /// Pixel count
    pub fn area(&self) -> usize {
        self.pixels.len()
    }
}

/// Label partition of an image into candidate nucleus regions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSet {
    height: u32,
    width: u32,
    regions: Vec<Region>,
}

impl RegionSet {
    /// Build directly from regions; used by callers that already hold pixel lists.
    /// Every pixel must lie inside the image and belong to at most one region.
    pub fn new(height: u32, width: u32, regions: Vec<Region>) -> Result<Self> {
        let mut covered = vec![false; width as usize * height as usize];
        for region in &regions {
            for &(x, y) in &region.pixels {
                if x >= width || y >= height {
                    return Err(NucleiFeatureError::InvalidLabelMap(format!(
                        "region {} has pixel ({}, {}) outside the {}x{} image",
                        region.label, x, y, width, height
                    )));
                }
                let idx = y as usize * width as usize + x as usize;
                if covered[idx] {
                    return Err(NucleiFeatureError::InvalidLabelMap(format!(
                        "pixel ({}, {}) is claimed twice, last by region {}",
                        x, y, region.label
                    )));
                }
                covered[idx] = true;
            }
        }

        Ok(Self { height, width, regions })
    }

    /// Build from a row-major label map. Label 0 is background, every other
    /// label becomes one region. Regions are ordered by ascending label.
    pub fn from_label_map(width: u32, height: u32, labels: &[u32]) -> Result<Self> {
        let expected = width as usize * height as usize;
        if labels.len() != expected {
            return Err(NucleiFeatureError::InvalidLabelMap(format!(
                "expected {} labels for a {}x{} image, got {}",
                expected,
                width,
                height,
                labels.len()
            )));
        }

        let mut by_label: BTreeMap<u32, Vec<(u32, u32)>> = BTreeMap::new();
        for (idx, &label) in labels.iter().enumerate() {
            if label == 0 {
                continue;
            }
            let x = (idx % width as usize) as u32;
            let y = (idx / width as usize) as u32;
            by_label.entry(label).or_default().push((x, y));
        }

        let regions = by_label
            .into_iter()
            .map(|(label, pixels)| Region { label, pixels })
            .collect();

        Ok(Self { height, width, regions })
    }

    /// Build from an 8-bit label image
    pub fn from_luma8(labels: &GrayImage) -> Result<Self> {
        let (width, height) = labels.dimensions();
        let raw: Vec<u32> = labels.pixels().map(|p| p[0] as u32).collect();
        Self::from_label_map(width, height, &raw)
    }

    /// Build from a 16-bit label image
    pub fn from_luma16(labels: &ImageBuffer<Luma<u16>, Vec<u16>>) -> Result<Self> {
        let (width, height) = labels.dimensions();
        let raw: Vec<u32> = labels.pixels().map(|p| p[0] as u32).collect();
        Self::from_label_map(width, height, &raw)
    }

    /// Build from a 32-bit label image such as a connected-component labelling
    pub fn from_luma32(labels: &ImageBuffer<Luma<u32>, Vec<u32>>) -> Result<Self> {
        let (width, height) = labels.dimensions();
        Self::from_label_map(width, height, labels.as_raw())
    }

    /// Reference image size as (height, width)
    pub fn image_size(&self) -> (u32, u32) {
        (self.height, self.width)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Drop regions smaller than `min_area` pixels.
///
/// Retained regions keep their original order and are addressed 0..K-1 by
/// every later stage. Fails with `NoRegions` when nothing survives.
pub fn filter_regions(regions: &RegionSet, min_area: usize) -> Result<RegionSet> {
    let retained: Vec<Region> = regions
        .regions
        .iter()
        .filter(|region| region.area() >= min_area)
        .cloned()
        .collect();

    log::debug!(
        "Region filter: kept {} of {} regions (min area {})",
        retained.len(),
        regions.len(),
        min_area
    );

    if retained.is_empty() {
        return Err(NucleiFeatureError::NoRegions { min_area });
    }

    Ok(RegionSet {
        height: regions.height,
        width: regions.width,
        regions: retained,
    })
}
