// src/morphology.rs - Region masks, boundary tracing and second-moment ellipse fitting

use nalgebra::Point2;

use crate::geometry::convex_hull_area;

/// Direction vectors for Moore-Neighbor contour tracing (clockwise with y pointing down)
static MOORE_NEIGHBORHOOD: [(i64, i64); 8] = [
    (1, 0),   // right
    (1, 1),   // down-right
    (0, 1),   // down
    (-1, 1),  // down-left
    (-1, 0),  // left
    (-1, -1), // up-left
    (0, -1),  // up
    (1, -1),  // up-right
];

/// Index of the "left" entry in `MOORE_NEIGHBORHOOD`
const LEFT: usize = 4;

/// Binary mask of a single region over its bounding box, padded by one pixel
#[derive(Debug, Clone)]
pub struct RegionMask {
    origin_x: i64,
    origin_y: i64,
    width: i64,
    height: i64,
    data: Vec<bool>,
}

impl RegionMask {
    /// Build the mask from (x, y) pixel coordinates
    pub fn from_pixels(pixels: &[(u32, u32)]) -> Self {
        if pixels.is_empty() {
            return Self { origin_x: 0, origin_y: 0, width: 0, height: 0, data: Vec::new() };
        }

        let min_x = pixels.iter().map(|p| p.0).min().unwrap_or(0) as i64;
        let max_x = pixels.iter().map(|p| p.0).max().unwrap_or(0) as i64;
        let min_y = pixels.iter().map(|p| p.1).min().unwrap_or(0) as i64;
        let max_y = pixels.iter().map(|p| p.1).max().unwrap_or(0) as i64;

        let origin_x = min_x - 1;
        let origin_y = min_y - 1;
        let width = max_x - min_x + 3;
        let height = max_y - min_y + 3;

        let mut data = vec![false; (width * height) as usize];
        for &(x, y) in pixels {
            let lx = x as i64 - origin_x;
            let ly = y as i64 - origin_y;
            data[(ly * width + lx) as usize] = true;
        }

        Self { origin_x, origin_y, width, height, data }
    }

    /// Whether the image pixel (x, y) belongs to the region
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        let lx = x - self.origin_x;
        let ly = y - self.origin_y;
        if lx < 0 || ly < 0 || lx >= self.width || ly >= self.height {
            return false;
        }
        self.data[(ly * self.width + lx) as usize]
    }

    /// First region pixel in raster order (top-most row, then left-most)
    fn first_pixel(&self) -> Option<(i64, i64)> {
        self.data.iter().position(|&set| set).map(|idx| {
            let idx = idx as i64;
            (idx % self.width + self.origin_x, idx / self.width + self.origin_y)
        })
    }

    fn pixel_count(&self) -> usize {
        self.data.iter().filter(|&&set| set).count()
    }
}

/// Trace the outer boundary of a region with Moore-Neighbor tracing.
///
/// Returns boundary pixels in image coordinates. For regions of more than one
/// pixel the loop is closed: the last entry repeats the first. Tracing stops
/// once the start pixel is about to be left along the same step as the first
/// move (Jacob's stopping criterion), so pinch points are traversed twice.
pub fn trace_region_boundary(mask: &RegionMask) -> Vec<(i64, i64)> {
    let start = match mask.first_pixel() {
        Some(point) => point,
        None => return Vec::new(),
    };

    let mut boundary = vec![start];
    let mut current = start;
    // Pixel left of the raster-first pixel is always background
    let mut backtrack_idx = LEFT;

    let max_steps = 8 * mask.pixel_count() + 16;

    for _ in 0..max_steps {
        let mut found = None;

        // Search clockwise starting just after the backtrack direction
        for i in 1..=8 {
            let idx = (backtrack_idx + i) % 8;
            let (dx, dy) = MOORE_NEIGHBORHOOD[idx];
            let candidate = (current.0 + dx, current.1 + dy);
            if mask.contains(candidate.0, candidate.1) {
                found = Some((candidate, idx));
                break;
            }
        }

        // Isolated pixel
        let (next, idx) = match found {
            Some(step) => step,
            None => break,
        };

        if current == start && boundary.len() > 2 && next == boundary[1] {
            break;
        }

        // The neighbor examined just before `next` becomes the new backtrack point
        let (bx, by) = MOORE_NEIGHBORHOOD[(idx + 7) % 8];
        let backtrack = (current.0 + bx, current.1 + by);
        let delta = (backtrack.0 - next.0, backtrack.1 - next.1);
        backtrack_idx = MOORE_NEIGHBORHOOD
            .iter()
            .position(|&d| d == delta)
            .unwrap_or(LEFT);

        boundary.push(next);
        current = next;
    }

    boundary
}

/// Length of a traced boundary: unit steps count 1, diagonal steps sqrt(2)
pub fn calculate_perimeter(boundary: &[(i64, i64)]) -> f64 {
    boundary
        .windows(2)
        .map(|w| {
            let dx = (w[1].0 - w[0].0) as f64;
            let dy = (w[1].1 - w[0].1) as f64;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

/// Area of the convex hull of a region, treating every pixel as a unit square
pub fn pixel_corner_hull_area(pixels: &[(u32, u32)]) -> f64 {
    let corners: Vec<Point2<f64>> = pixels
        .iter()
        .flat_map(|&(x, y)| {
            let (x, y) = (x as f64, y as f64);
            [
                Point2::new(x - 0.5, y - 0.5),
                Point2::new(x + 0.5, y - 0.5),
                Point2::new(x + 0.5, y + 0.5),
                Point2::new(x - 0.5, y + 0.5),
            ]
        })
        .collect();

    convex_hull_area(&corners)
}

/// Normalized second central moments of a region, y axis pointing up.
/// Each pixel contributes the variance of a unit square (1/12) on both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralMoments {
    pub centroid: Point2<f64>,
    pub uxx: f64,
    pub uyy: f64,
    pub uxy: f64,
}

/// Centroid and second central moments of a pixel set
pub fn second_moments(pixels: &[(u32, u32)]) -> Option<CentralMoments> {
    if pixels.is_empty() {
        return None;
    }

    let n = pixels.len() as f64;
    let x_bar = pixels.iter().map(|p| p.0 as f64).sum::<f64>() / n;
    let y_bar = pixels.iter().map(|p| p.1 as f64).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(px, py) in pixels {
        let x = px as f64 - x_bar;
        // Image rows grow downward
        let y = -(py as f64 - y_bar);
        sxx += x * x;
        syy += y * y;
        sxy += x * y;
    }

    Some(CentralMoments {
        centroid: Point2::new(x_bar, y_bar),
        uxx: sxx / n + 1.0 / 12.0,
        uyy: syy / n + 1.0 / 12.0,
        uxy: sxy / n,
    })
}

/// Major and minor axis lengths and orientation (degrees, counter-clockwise
/// from the horizontal, in (-90, 90]) of the ellipse with the same
/// normalized second central moments.
pub fn ellipse_axes_and_orientation(moments: &CentralMoments) -> (f64, f64, f64) {
    let CentralMoments { uxx, uyy, uxy, .. } = *moments;

    let common = ((uxx - uyy).powi(2) + 4.0 * uxy * uxy).sqrt();
    let major = 2.0 * std::f64::consts::SQRT_2 * (uxx + uyy + common).sqrt();
    let minor = 2.0 * std::f64::consts::SQRT_2 * (uxx + uyy - common).max(0.0).sqrt();

    let (num, den) = if uyy > uxx {
        (uyy - uxx + common, 2.0 * uxy)
    } else {
        (2.0 * uxy, uxx - uyy + common)
    };

    let orientation = if num == 0.0 && den == 0.0 {
        0.0
    } else if den == 0.0 {
        // Vertical major axis; also guards against a -0.0 denominator
        90.0
    } else {
        (num / den).atan().to_degrees()
    };

    (major, minor, orientation)
}
