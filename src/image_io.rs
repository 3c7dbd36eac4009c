use std::path::{Path, PathBuf};

use image::{DynamicImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::errors::{NucleiFeatureError, Result};
use crate::regions::RegionSet;

/// Represents an input image with its metadata
pub struct InputImage {
    pub image: DynamicImage,
    pub path: PathBuf,
    pub filename: String,
}

/// Load an image, keeping its native channel layout and sample depth
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<InputImage> {
    let path = path.as_ref();

    // Get filename without extension
    let filename = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| NucleiFeatureError::InvalidPath(path.to_path_buf()))?
        .to_string();

    let image = image::open(path)?;

    Ok(InputImage {
        image,
        path: path.to_path_buf(),
        filename,
    })
}

/// Load a label image (8- or 16-bit grayscale, 0 = background) as a region partition
pub fn load_label_map<P: AsRef<Path>>(path: P) -> Result<RegionSet> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(NucleiFeatureError::InvalidPath(path.to_path_buf()));
    }

    match image::open(path)? {
        DynamicImage::ImageLuma8(labels) => RegionSet::from_luma8(&labels),
        DynamicImage::ImageLuma16(labels) => RegionSet::from_luma16(&labels),
        other => Err(NucleiFeatureError::InvalidLabelMap(format!(
            "{} has color type {:?}, expected 8- or 16-bit grayscale",
            path.display(),
            other.color()
        ))),
    }
}

/// Load a binary mask (any non-zero pixel is foreground) and split it into
/// 8-connected regions
pub fn load_binary_mask<P: AsRef<Path>>(path: P) -> Result<RegionSet> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(NucleiFeatureError::InvalidPath(path.to_path_buf()));
    }

    let mask = image::open(path)?.to_luma8();
    label_binary_mask(&mask)
}

/// Label the 8-connected foreground components of a mask
pub fn label_binary_mask(mask: &image::GrayImage) -> Result<RegionSet> {
    let mut binary = mask.clone();
    for pixel in binary.pixels_mut() {
        if pixel[0] != 0 {
            pixel[0] = 255;
        }
    }

    let labels = connected_components(&binary, Connectivity::Eight, Luma([0u8]));
    RegionSet::from_luma32(&labels)
}
