// src/spatial.rs - Crowdedness, alignedness and inter-nucleus distances from the tessellation

use nalgebra::Point2;

use crate::geometry::convex_hull_area;
use crate::shape_analysis::RegionShape;
use crate::statistics::mean;
use crate::triangulation::{Triangulation, VoronoiCell, VoronoiCells};

/// Minimum number of finite Voronoi vertices for any cell area to be meaningful
pub const MIN_VORONOI_VERTICES: usize = 3;

/// Area of each region divided by the area of its Voronoi cell.
///
/// Absent for unbounded cells, for degenerate (zero-area) cells, and for
/// every region when the tessellation has fewer than three finite vertices.
pub fn calculate_crowdedness(areas: &[f64], voronoi: &VoronoiCells) -> Vec<Option<f64>> {
    if voronoi.vertex_count() < MIN_VORONOI_VERTICES {
        return vec![None; areas.len()];
    }

    areas
        .iter()
        .zip(voronoi.cells())
        .map(|(&area, cell)| match cell {
            VoronoiCell::Unbounded => None,
            VoronoiCell::Bounded(vertices) => {
                let cell_area = convex_hull_area(vertices);
                if cell_area > 0.0 {
                    Some(area / cell_area)
                } else {
                    None
                }
            }
        })
        .collect()
}

/// Weight in [0, 1) of a nucleus' directional signal; 0 for a round nucleus
fn elongation_weight(eccentricity: f64) -> f64 {
    eccentricity / (1.0 + eccentricity)
}

/// Orientation agreement of a nucleus with its neighbors.
///
/// Each neighbor contributes `w(e_j) * cos(2 (theta - theta_j))`, so parallel
/// axes score +1 and perpendicular axes -1 regardless of axis polarity; the
/// mean contribution is scaled by the target's own weight `w(e)`, with
/// `w(e) = e / (1 + e)`. The score lies in (-1, 1), higher meaning more
/// coherent local orientation. Neighbors with non-finite values are skipped;
/// absent if the target is non-finite or no neighbor remains.
pub fn calculate_alignedness(target: (f64, f64), neighbors: &[(f64, f64)]) -> Option<f64> {
    let (eccentricity, orientation) = target;
    if !eccentricity.is_finite() || !orientation.is_finite() {
        return None;
    }

    let contributions: Vec<f64> = neighbors
        .iter()
        .filter(|(e, theta)| e.is_finite() && theta.is_finite())
        .map(|&(e, theta)| elongation_weight(e) * (2.0 * (orientation - theta)).cos())
        .collect();

    if contributions.is_empty() {
        return None;
    }

    Some(elongation_weight(eccentricity) * mean(&contributions))
}

/// Alignedness of every region against its triangulation neighbors.
/// Absent for regions with zero neighbors or an undefined eccentricity.
pub fn calculate_region_alignedness(
    eccentricities: &[Option<f64>],
    orientations: &[f64],
    neighbors: &[Vec<usize>],
) -> Vec<Option<f64>> {
    neighbors
        .iter()
        .enumerate()
        .map(|(i, adjacent)| {
            if adjacent.is_empty() {
                return None;
            }
            let eccentricity = eccentricities[i]?;
            let paired: Vec<(f64, f64)> = adjacent
                .iter()
                .map(|&j| (eccentricities[j].unwrap_or(f64::NAN), orientations[j]))
                .collect();
            calculate_alignedness((eccentricity, orientations[i]), &paired)
        })
        .collect()
}

/// Lengths of triangulation edges, raw and normalized by nucleus size
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeDistances {
    pub raw: Vec<f64>,
    /// Raw distance over the population mean major-axis length
    pub by_major_axis: Vec<Option<f64>>,
    /// Raw distance over the population mean equivalent diameter
    pub by_equiv_diameter: Vec<Option<f64>>,
}

/// Edge lengths between centroids for every triangulation edge
pub fn calculate_edge_distances(
    centroids: &[Point2<f64>],
    edges: &[(usize, usize)],
    major_axis_lengths: &[f64],
    equiv_diameters: &[f64],
) -> EdgeDistances {
    let raw: Vec<f64> = edges
        .iter()
        .map(|&(u, v)| nalgebra::distance(&centroids[u], &centroids[v]))
        .collect();

    let normalize = |scale_values: &[f64]| -> Vec<Option<f64>> {
        let defined: Vec<f64> = scale_values.iter().copied().filter(|v| v.is_finite()).collect();
        let scale = mean(&defined);
        raw.iter()
            .map(|&d| {
                if scale.is_finite() && scale != 0.0 {
                    Some(d / scale)
                } else {
                    None
                }
            })
            .collect()
    };

    EdgeDistances {
        by_major_axis: normalize(major_axis_lengths),
        by_equiv_diameter: normalize(equiv_diameters),
        raw,
    }
}

/// Spatial arrangement features of all retained regions
#[derive(Debug, Clone)]
pub struct SpatialTopology {
    pub edges: Vec<(usize, usize)>,
    pub neighbors: Vec<Vec<usize>>,
    pub crowdedness: Vec<Option<f64>>,
    pub alignedness: Vec<Option<f64>>,
    pub edge_distances: EdgeDistances,
}

impl SpatialTopology {
    /// Tessellate the region centroids and derive the spatial features
    pub fn analyze(shapes: &[RegionShape]) -> Self {
        let centroids: Vec<Point2<f64>> = shapes.iter().map(|s| s.centroid).collect();

        let triangulation = Triangulation::build(&centroids);
        let voronoi = VoronoiCells::from_triangulation(&triangulation);
        let edges = triangulation.edges();
        let neighbors = triangulation.neighbors();

        log::debug!(
            "Tessellation: {} centroids, {} triangles, {} edges, {} Voronoi vertices",
            centroids.len(),
            triangulation.triangles().len(),
            edges.len(),
            voronoi.vertex_count()
        );

        let areas: Vec<f64> = shapes.iter().map(|s| s.area).collect();
        let crowdedness = calculate_crowdedness(&areas, &voronoi);

        let eccentricities: Vec<Option<f64>> = shapes.iter().map(|s| s.eccentricity).collect();
        let orientations: Vec<f64> = shapes.iter().map(|s| s.orientation).collect();
        let alignedness = calculate_region_alignedness(&eccentricities, &orientations, &neighbors);

        let major_axes: Vec<f64> = shapes.iter().map(|s| s.major_axis_length).collect();
        let diameters: Vec<f64> = shapes.iter().map(|s| s.equiv_diameter).collect();
        let edge_distances = calculate_edge_distances(&centroids, &edges, &major_axes, &diameters);

        Self {
            edges,
            neighbors,
            crowdedness,
            alignedness,
            edge_distances,
        }
    }
}
