// src/geometry.rs - Planar geometry helpers shared by morphometry and tessellation

use nalgebra::Point2;

/// Tolerance below which a doubled triangle area counts as collinear
const COLLINEAR_EPSILON: f64 = 1e-10;

/// Convex hull of a point set (Andrew's monotone chain).
/// Returns hull vertices in counter-clockwise order without repeating the first.
pub fn convex_hull(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut sorted: Vec<Point2<f64>> = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        while lower.len() >= 2
            && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point2<f64>> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        while upper.len() >= 2
            && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    // Last point of each chain is the first point of the other
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Area of a simple polygon (shoelace formula)
pub fn polygon_area(polygon: &[Point2<f64>]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }

    let n = polygon.len();
    let twice_area: f64 = (0..n)
        .map(|i| {
            let a = &polygon[i];
            let b = &polygon[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();

    twice_area.abs() / 2.0
}

/// Area of the convex hull of a point set
pub fn convex_hull_area(points: &[Point2<f64>]) -> f64 {
    polygon_area(&convex_hull(points))
}

/// Circumcenter of a triangle, `None` if the vertices are collinear
pub fn circumcenter(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> Option<Point2<f64>> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < COLLINEAR_EPSILON {
        return None;
    }

    let a_sq = a.x * a.x + a.y * a.y;
    let b_sq = b.x * b.x + b.y * b.y;
    let c_sq = c.x * c.x + c.y * c.y;

    let ux = (a_sq * (b.y - c.y) + b_sq * (c.y - a.y) + c_sq * (a.y - b.y)) / d;
    let uy = (a_sq * (c.x - b.x) + b_sq * (a.x - c.x) + c_sq * (b.x - a.x)) / d;

    Some(Point2::new(ux, uy))
}

/// Twice the signed area of triangle (o, a, b); positive for a counter-clockwise turn
#[inline]
pub fn cross(o: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}
