// src/feature_extraction.rs - Per-region measurement records and their summarized quantities

use nalgebra::Point2;

use crate::color::{calculate_region_colors, ColorStats};
use crate::config::Config;
use crate::image_utils::ChannelPlanes;
use crate::regions::RegionSet;
use crate::shape_analysis::{analyze_region_shapes, RegionShape};
use crate::spatial::{EdgeDistances, SpatialTopology};

/// Everything measured for one retained region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMeasurement {
    /// Label of the region in the input partition
    pub label: u32,
    pub centroid: Point2<f64>,
    pub area: f64,
    pub major_axis_length: f64,
    pub minor_axis_length: f64,
    pub equiv_diameter: f64,
    pub eccentricity: Option<f64>,
    /// Axis angle in radians, [0, pi)
    pub orientation: f64,
    pub perimeter: f64,
    pub solidity: f64,
    pub compactness: Option<f64>,
    pub crowdedness: Option<f64>,
    pub alignedness: Option<f64>,
    pub color: ColorStats,
}

/// Records of all retained regions plus the population-level edge distances
#[derive(Debug, Clone)]
pub struct PopulationMeasurements {
    pub records: Vec<RegionMeasurement>,
    pub edge_distances: EdgeDistances,
}

/// Measure every region of an already filtered region set
pub fn extract_region_measurements(
    regions: &RegionSet,
    planes: &ChannelPlanes,
    config: &Config,
) -> PopulationMeasurements {
    let parallel = config.use_parallel;

    let measured: Vec<(u32, RegionShape, ColorStats)> = regions
        .regions()
        .iter()
        .zip(analyze_region_shapes(regions.regions(), parallel))
        .zip(calculate_region_colors(planes, regions.regions(), parallel))
        .filter_map(|((region, shape), color)| match shape {
            Some(shape) => Some((region.label, shape, color)),
            None => {
                log::warn!("Region {} has no pixels, skipping", region.label);
                None
            }
        })
        .collect();

    let shapes: Vec<RegionShape> = measured.iter().map(|(_, shape, _)| shape.clone()).collect();
    let topology = SpatialTopology::analyze(&shapes);

    let records = measured
        .into_iter()
        .enumerate()
        .map(|(i, (label, shape, color))| RegionMeasurement {
            label,
            centroid: shape.centroid,
            area: shape.area,
            major_axis_length: shape.major_axis_length,
            minor_axis_length: shape.minor_axis_length,
            equiv_diameter: shape.equiv_diameter,
            eccentricity: shape.eccentricity,
            orientation: shape.orientation,
            perimeter: shape.perimeter,
            solidity: shape.solidity,
            compactness: shape.compactness,
            crowdedness: topology.crowdedness[i],
            alignedness: topology.alignedness[i],
            color,
        })
        .collect();

    PopulationMeasurements {
        records,
        edge_distances: topology.edge_distances,
    }
}

/// The measured quantities summarized in the feature vector, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Area,
    MajorAxis,
    EquivDiameter,
    Eccentricity,
    Solidity,
    Compactness,
    Crowdedness,
    Alignedness,
    EdgeDistance,
    EdgeDistanceByMajorAxis,
    EdgeDistanceByDiameter,
    MeanRed,
    MeanGreen,
    MeanBlue,
    StdRed,
    StdGreen,
    StdBlue,
    MeanGray,
    StdGray,
}

impl Quantity {
    pub const ALL: [Quantity; 19] = [
        Quantity::Area,
        Quantity::MajorAxis,
        Quantity::EquivDiameter,
        Quantity::Eccentricity,
        Quantity::Solidity,
        Quantity::Compactness,
        Quantity::Crowdedness,
        Quantity::Alignedness,
        Quantity::EdgeDistance,
        Quantity::EdgeDistanceByMajorAxis,
        Quantity::EdgeDistanceByDiameter,
        Quantity::MeanRed,
        Quantity::MeanGreen,
        Quantity::MeanBlue,
        Quantity::StdRed,
        Quantity::StdGreen,
        Quantity::StdBlue,
        Quantity::MeanGray,
        Quantity::StdGray,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Quantity::Area => "Area",
            Quantity::MajorAxis => "MajorAxis",
            Quantity::EquivDiameter => "EquivDiameter",
            Quantity::Eccentricity => "Eccentricity",
            Quantity::Solidity => "Solidity",
            Quantity::Compactness => "Compactness",
            Quantity::Crowdedness => "Crowdedness",
            Quantity::Alignedness => "Alignedness",
            Quantity::EdgeDistance => "EdgeDist",
            Quantity::EdgeDistanceByMajorAxis => "EdgeDistNormMajor",
            Quantity::EdgeDistanceByDiameter => "EdgeDistNormDiam",
            Quantity::MeanRed => "MeanR",
            Quantity::MeanGreen => "MeanG",
            Quantity::MeanBlue => "MeanB",
            Quantity::StdRed => "StdR",
            Quantity::StdGreen => "StdG",
            Quantity::StdBlue => "StdB",
            Quantity::MeanGray => "MeanGray",
            Quantity::StdGray => "StdGray",
        }
    }

    /// Project the population onto this quantity. Edge distances are one
    /// value per triangulation edge; everything else one value per region.
    pub fn values(&self, population: &PopulationMeasurements) -> Vec<Option<f64>> {
        let edges = &population.edge_distances;
        match self {
            Quantity::EdgeDistance => return edges.raw.iter().copied().map(Some).collect(),
            Quantity::EdgeDistanceByMajorAxis => return edges.by_major_axis.clone(),
            Quantity::EdgeDistanceByDiameter => return edges.by_equiv_diameter.clone(),
            _ => {}
        }

        population
            .records
            .iter()
            .map(|r| match self {
                Quantity::Area => Some(r.area),
                Quantity::MajorAxis => Some(r.major_axis_length),
                Quantity::EquivDiameter => Some(r.equiv_diameter),
                Quantity::Eccentricity => r.eccentricity,
                Quantity::Solidity => Some(r.solidity),
                Quantity::Compactness => r.compactness,
                Quantity::Crowdedness => r.crowdedness,
                Quantity::Alignedness => r.alignedness,
                Quantity::MeanRed => r.color.channel_mean[0],
                Quantity::MeanGreen => r.color.channel_mean[1],
                Quantity::MeanBlue => r.color.channel_mean[2],
                Quantity::StdRed => r.color.channel_std[0],
                Quantity::StdGreen => r.color.channel_std[1],
                Quantity::StdBlue => r.color.channel_std[2],
                Quantity::MeanGray => r.color.gray_mean,
                Quantity::StdGray => r.color.gray_std,
                Quantity::EdgeDistance
                | Quantity::EdgeDistanceByMajorAxis
                | Quantity::EdgeDistanceByDiameter => None,
            })
            .collect()
    }
}
