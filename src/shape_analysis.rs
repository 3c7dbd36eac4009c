// src/shape_analysis.rs - Per-region morphometry of candidate nuclei

use nalgebra::Point2;
use rayon::prelude::*;
use std::f64::consts::PI;

use crate::morphology::{
    calculate_perimeter, ellipse_axes_and_orientation, pixel_corner_hull_area, second_moments,
    trace_region_boundary, RegionMask,
};
use crate::regions::Region;

/// Shape descriptors of one region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionShape {
    pub centroid: Point2<f64>,
    pub area: f64,
    pub major_axis_length: f64,
    pub minor_axis_length: f64,
    pub equiv_diameter: f64,
    /// Major-axis angle from the horizontal in degrees, (-90, 90]
    pub orientation_deg: f64,
    /// Axis angle in radians folded into [0, pi)
    pub orientation: f64,
    pub perimeter: f64,
    pub solidity: f64,
    /// (major - minor) / minor; absent for a zero minor axis
    pub eccentricity: Option<f64>,
    /// 4 pi area / perimeter^2; absent for a zero perimeter
    pub compactness: Option<f64>,
}

/// Linear flattening ratio of the fitted ellipse
pub fn calculate_eccentricity(major_axis_length: f64, minor_axis_length: f64) -> Option<f64> {
    if minor_axis_length == 0.0 {
        return None;
    }
    Some((major_axis_length - minor_axis_length) / minor_axis_length)
}

/// Map a raw orientation in degrees to a polarity-free axis angle in [0, pi)
pub fn normalize_orientation(orientation_deg: f64) -> f64 {
    let radians = orientation_deg * PI / 180.0;
    if radians < 0.0 {
        radians + PI
    } else {
        radians
    }
}

/// Calculate compactness (4π * Area / Perimeter²)
/// 1.0 for a perfect circle, lower for irregular boundaries
pub fn calculate_compactness(area: f64, perimeter: f64) -> Option<f64> {
    if perimeter <= 0.0 {
        return None;
    }
    Some(4.0 * PI * area / (perimeter * perimeter))
}

/// Diameter of the circle with the same area
pub fn calculate_equiv_diameter(area: f64) -> f64 {
    (4.0 * area / PI).sqrt()
}

/// Compute all shape descriptors for a region. `None` for an empty region.
pub fn analyze_region_shape(region: &Region) -> Option<RegionShape> {
    let moments = second_moments(&region.pixels)?;
    let area = region.area() as f64;

    let (major_axis_length, minor_axis_length, orientation_deg) =
        ellipse_axes_and_orientation(&moments);

    let mask = RegionMask::from_pixels(&region.pixels);
    let boundary = trace_region_boundary(&mask);
    let perimeter = calculate_perimeter(&boundary);

    let hull_area = pixel_corner_hull_area(&region.pixels);
    let solidity = if hull_area > 0.0 { area / hull_area } else { 1.0 };

    Some(RegionShape {
        centroid: moments.centroid,
        area,
        major_axis_length,
        minor_axis_length,
        equiv_diameter: calculate_equiv_diameter(area),
        orientation_deg,
        orientation: normalize_orientation(orientation_deg),
        perimeter,
        solidity,
        eccentricity: calculate_eccentricity(major_axis_length, minor_axis_length),
        compactness: calculate_compactness(area, perimeter),
    })
}

/// Shape descriptors for every region, in region order
pub fn analyze_region_shapes(regions: &[Region], parallel: bool) -> Vec<Option<RegionShape>> {
    if parallel {
        regions.par_iter().map(analyze_region_shape).collect()
    } else {
        regions.iter().map(analyze_region_shape).collect()
    }
}
