// src/triangulation.rs - Delaunay triangulation and Voronoi cells over nucleus centroids
//
// Sweep-line insertion in (x, y) order builds a triangulation of the full convex
// hull; Lawson edge flips then make it Delaunay. Voronoi cells are read off as
// the dual (triangle circumcenters around each point).

use std::collections::{BTreeSet, HashMap};

use nalgebra::Point2;

use crate::geometry::{circumcenter, cross};

/// Relative tolerance for orientation and in-circle decisions
const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Delaunay triangulation of a planar point set
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<Point2<f64>>,
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// Triangulate `points`. Exact duplicates are left out of the
    /// triangulation; fewer than three distinct points or a collinear set
    /// produce no triangles.
    pub fn build(points: &[Point2<f64>]) -> Self {
        Self {
            points: points.to_vec(),
            triangles: delaunay_triangles(points),
        }
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Unique undirected edges (u, v) with u < v, sorted
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = BTreeSet::new();
        for tri in &self.triangles {
            for k in 0..3 {
                edges.insert(normalize_edge(tri[k], tri[(k + 1) % 3]));
            }
        }
        edges.into_iter().collect()
    }

    /// Sorted neighbor lists: points sharing a triangulation edge
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut neighbors = vec![Vec::new(); self.points.len()];
        for (u, v) in self.edges() {
            neighbors[u].push(v);
            neighbors[v].push(u);
        }
        for list in &mut neighbors {
            list.sort_unstable();
        }
        neighbors
    }

    /// Per point: true when the point is on the triangulation boundary or
    /// not part of any triangle, i.e. its Voronoi cell is unbounded
    pub fn boundary_points(&self) -> Vec<bool> {
        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
        let mut in_triangle = vec![false; self.points.len()];

        for tri in &self.triangles {
            for k in 0..3 {
                in_triangle[tri[k]] = true;
                *edge_count.entry(normalize_edge(tri[k], tri[(k + 1) % 3])).or_insert(0) += 1;
            }
        }

        let mut boundary: Vec<bool> = in_triangle.iter().map(|&inside| !inside).collect();
        for ((a, b), count) in edge_count {
            if count == 1 {
                boundary[a] = true;
                boundary[b] = true;
            }
        }
        boundary
    }
}

/// Voronoi cell of one generator point
#[derive(Debug, Clone, PartialEq)]
pub enum VoronoiCell {
    /// All cell vertices are finite
    Bounded(Vec<Point2<f64>>),
    /// At least one cell vertex lies at infinity
    Unbounded,
}

/// Voronoi tessellation derived from a Delaunay triangulation
#[derive(Debug, Clone)]
pub struct VoronoiCells {
    cells: Vec<VoronoiCell>,
    vertex_count: usize,
}

impl VoronoiCells {
    pub fn from_triangulation(triangulation: &Triangulation) -> Self {
        let points = triangulation.points();
        let triangles = triangulation.triangles();

        let vertices: Vec<Option<Point2<f64>>> = triangles
            .iter()
            .map(|tri| circumcenter(&points[tri[0]], &points[tri[1]], &points[tri[2]]))
            .collect();

        let mut cell_vertices: Vec<Vec<Point2<f64>>> = vec![Vec::new(); points.len()];
        for (tri, vertex) in triangles.iter().zip(&vertices) {
            if let Some(v) = vertex {
                for &p in tri {
                    cell_vertices[p].push(*v);
                }
            }
        }

        let boundary = triangulation.boundary_points();
        let cells = cell_vertices
            .into_iter()
            .zip(boundary)
            .map(|(verts, on_boundary)| {
                if on_boundary || verts.is_empty() {
                    VoronoiCell::Unbounded
                } else {
                    VoronoiCell::Bounded(verts)
                }
            })
            .collect();

        Self {
            cells,
            vertex_count: vertices.iter().flatten().count(),
        }
    }

    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }

    /// Number of finite Voronoi vertices in the whole tessellation
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }
}

fn normalize_edge(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Positive when `d` lies inside the circumcircle of the counter-clockwise triangle (a, b, c)
fn in_circle(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>, d: &Point2<f64>) -> f64 {
    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);
    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;

    adx * (bdy * cd - bd * cdy) - ady * (bdx * cd - bd * cdx) + ad * (bdx * cdy - bdy * cdx)
}

/// Triangles kept counter-clockwise, indexed by their directed edges
struct Mesh<'a> {
    points: &'a [Point2<f64>],
    slots: Vec<Option<[usize; 3]>>,
    /// Directed edge (a, b) -> slot of the triangle traversing it
    edges: HashMap<(usize, usize), usize>,
}

impl<'a> Mesh<'a> {
    fn new(points: &'a [Point2<f64>]) -> Self {
        Self { points, slots: Vec::new(), edges: HashMap::new() }
    }

    fn add(&mut self, tri: [usize; 3]) {
        let slot = self.slots.len();
        for k in 0..3 {
            self.edges.insert((tri[k], tri[(k + 1) % 3]), slot);
        }
        self.slots.push(Some(tri));
    }

    fn remove(&mut self, slot: usize) {
        if let Some(tri) = self.slots[slot].take() {
            for k in 0..3 {
                self.edges.remove(&(tri[k], tri[(k + 1) % 3]));
            }
        }
    }

    /// Slot and opposite vertex of the triangle traversing (a, b)
    fn apex(&self, a: usize, b: usize) -> Option<(usize, usize)> {
        let slot = *self.edges.get(&(a, b))?;
        let tri = self.slots[slot]?;
        tri.iter().copied().find(|&v| v != a && v != b).map(|v| (slot, v))
    }

    /// Lawson flips until no edge on the stack has its opposite vertex
    /// inside the neighbouring circumcircle
    fn legalize(&mut self, mut stack: Vec<(usize, usize)>, tolerance: f64) {
        let points = self.points;
        while let Some((u, v)) = stack.pop() {
            let ((t1, p), (t2, q)) = match (self.apex(u, v), self.apex(v, u)) {
                (Some(first), Some(second)) => (first, second),
                _ => continue,
            };

            if in_circle(&points[u], &points[v], &points[p], &points[q]) <= tolerance {
                continue;
            }
            // The flipped diagonal must stay inside the quadrilateral
            if cross(&points[u], &points[q], &points[p]) <= 0.0
                || cross(&points[q], &points[v], &points[p]) <= 0.0
            {
                continue;
            }

            self.remove(t1);
            self.remove(t2);
            self.add([u, q, p]);
            self.add([q, v, p]);
            stack.extend([(u, q), (q, v), (v, p), (p, u)]);
        }
    }

    fn into_triangles(self) -> Vec<[usize; 3]> {
        self.slots.into_iter().flatten().collect()
    }
}

fn delaunay_triangles(points: &[Point2<f64>]) -> Vec<[usize; 3]> {
    if points.len() < 3 {
        return Vec::new();
    }

    // Sweep order; the first of each group of identical points is kept
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| {
        points[i]
            .x
            .total_cmp(&points[j].x)
            .then(points[i].y.total_cmp(&points[j].y))
            .then(i.cmp(&j))
    });
    order.dedup_by(|later, earlier| {
        let duplicate = points[*later] == points[*earlier];
        if duplicate {
            log::debug!(
                "Skipping duplicate centroid {} at ({:.2}, {:.2})",
                later,
                points[*later].x,
                points[*later].y
            );
        }
        duplicate
    });
    if order.len() < 3 {
        return Vec::new();
    }

    // Find bounding box
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    let dx = max_x - min_x;
    let dy = max_y - min_y;
    let scale = (dx * dx + dy * dy).max(1.0);
    let tolerance = DEGENERATE_TOLERANCE * scale;

    // First point off the line through the two leftmost points
    let (s0, s1) = (order[0], order[1]);
    let seed = match (2..order.len())
        .find(|&k| cross(&points[s0], &points[s1], &points[order[k]]).abs() > tolerance)
    {
        Some(k) => k,
        None => return Vec::new(),
    };

    let mut mesh = Mesh::new(points);
    let apex = order[seed];
    for pair in order[..seed].windows(2) {
        if cross(&points[pair[0]], &points[pair[1]], &points[apex]) > 0.0 {
            mesh.add([pair[0], pair[1], apex]);
        } else {
            mesh.add([pair[1], pair[0], apex]);
        }
    }

    // Convex hull in counter-clockwise order
    let mut hull: Vec<usize> = if cross(&points[s0], &points[s1], &points[apex]) > 0.0 {
        order[..=seed].to_vec()
    } else {
        let mut hull = vec![s0, apex];
        hull.extend(order[1..seed].iter().rev());
        hull
    };

    for &idx in &order[seed + 1..] {
        let p = &points[idx];
        let h = hull.len();
        let visible: Vec<bool> = (0..h)
            .map(|i| cross(&points[hull[i]], &points[hull[(i + 1) % h]], p) < -tolerance)
            .collect();

        // Visible hull edges form one chain; find where it starts
        let start = match (0..h).find(|&i| visible[i] && !visible[(i + h - 1) % h]) {
            Some(start) => start,
            None => {
                log::debug!("Centroid {} sees no hull edge; left out of the triangulation", idx);
                continue;
            }
        };
        let mut count = 0;
        while count < h && visible[(start + count) % h] {
            let a = hull[(start + count) % h];
            let b = hull[(start + count + 1) % h];
            mesh.add([b, a, idx]);
            count += 1;
        }

        // The chain's interior vertices leave the hull, the new point joins it
        let end = (start + count) % h;
        let mut next = Vec::with_capacity(h - count + 2);
        let mut i = end;
        loop {
            next.push(hull[i]);
            if i == start {
                break;
            }
            i = (i + 1) % h;
        }
        next.push(idx);
        hull = next;
    }

    let stack: Vec<(usize, usize)> = mesh
        .slots
        .iter()
        .flatten()
        .flat_map(|tri| (0..3).map(move |k| (tri[k], tri[(k + 1) % 3])))
        .collect();
    mesh.legalize(stack, tolerance * scale);

    mesh.into_triangles()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::convex_hull;

    fn grid(side: usize, spacing: f64) -> Vec<Point2<f64>> {
        let mut points = Vec::new();
        for row in 0..side {
            for col in 0..side {
                // Small jitter keeps the grid away from cocircular ties
                let jitter = ((row * 7 + col * 3) % 5) as f64 * 0.01;
                let (x, y) = (col as f64 * spacing, row as f64 * spacing);
                points.push(Point2::new(x + jitter, y - jitter));
            }
        }
        points
    }

    #[test]
    fn square_with_center_has_four_triangles() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
            Point2::new(5.0, 5.0),
        ];
        let tri = Triangulation::build(&points);
        assert_eq!(tri.triangles().len(), 4);
        assert_eq!(tri.edges().len(), 8);

        let neighbors = tri.neighbors();
        assert_eq!(neighbors[4], vec![0, 1, 2, 3]);
        assert_eq!(neighbors[0], vec![1, 3, 4]);

        let boundary = tri.boundary_points();
        assert_eq!(boundary, vec![true, true, true, true, false]);
    }

    #[test]
    fn too_few_or_collinear_points_give_no_triangles() {
        let two = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(Triangulation::build(&two).triangles().is_empty());

        let line: Vec<Point2<f64>> =
            (0..5).map(|i| Point2::new(i as f64, 2.0 * i as f64)).collect();
        let tri = Triangulation::build(&line);
        assert!(tri.edges().is_empty());
        assert!(tri.boundary_points().iter().all(|&b| b));
    }

    #[test]
    fn duplicate_points_are_isolated() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
            Point2::new(4.0, 0.0),
        ];
        let tri = Triangulation::build(&points);
        assert_eq!(tri.triangles().len(), 1);
        assert!(tri.neighbors()[3].is_empty());
    }

    #[test]
    fn triangulation_is_delaunay() {
        let points = grid(5, 10.0);
        let tri = Triangulation::build(&points);
        // Euler: a triangulation of n points with h hull vertices has 2n - 2 - h triangles
        let hull = convex_hull(&points).len();
        assert_eq!(tri.triangles().len(), 2 * points.len() - 2 - hull);
        for t in tri.triangles() {
            let center = circumcenter(&points[t[0]], &points[t[1]], &points[t[2]]).unwrap();
            let r_sq = (points[t[0]] - center).norm_squared();
            for (i, p) in points.iter().enumerate() {
                if t.contains(&i) {
                    continue;
                }
                assert!((p - center).norm_squared() >= r_sq - 1e-9);
            }
        }
    }

    /// Uniform points in [0, 500)^2 from a 64-bit linear congruential generator
    fn scattered(seed: u64, n: usize) -> Vec<Point2<f64>> {
        let mut state = seed;
        let mut next = || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64 * 500.0
        };
        (0..n)
            .map(|_| {
                let x = next();
                let y = next();
                Point2::new(x, y)
            })
            .collect()
    }

    #[test]
    fn scattered_points_cover_their_hull() {
        for trial in 0..300u64 {
            let points = scattered(trial + 1, 5 + (trial as usize * 7) % 60);
            let tri = Triangulation::build(&points);
            let hull = convex_hull(&points);

            assert_eq!(
                tri.triangles().len(),
                2 * points.len() - 2 - hull.len(),
                "trial {}",
                trial
            );

            for t in tri.triangles() {
                let center = circumcenter(&points[t[0]], &points[t[1]], &points[t[2]]).unwrap();
                let r_sq = (points[t[0]] - center).norm_squared();
                for (i, p) in points.iter().enumerate() {
                    if !t.contains(&i) {
                        let d_sq = (p - center).norm_squared();
                        assert!(d_sq >= r_sq * (1.0 - 1e-9), "trial {}", trial);
                    }
                }
            }

            let voronoi = VoronoiCells::from_triangulation(&tri);
            for (i, cell) in voronoi.cells().iter().enumerate() {
                if !hull.contains(&points[i]) {
                    assert!(
                        matches!(cell, VoronoiCell::Bounded(_)),
                        "trial {}: interior point {} has an unbounded cell",
                        trial,
                        i
                    );
                }
            }
        }
    }

    #[test]
    fn interior_voronoi_cell_is_bounded() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
            Point2::new(5.0, 5.0),
        ];
        let voronoi = VoronoiCells::from_triangulation(&Triangulation::build(&points));
        assert_eq!(voronoi.vertex_count(), 4);
        assert_eq!(voronoi.cells()[0], VoronoiCell::Unbounded);
        match &voronoi.cells()[4] {
            VoronoiCell::Bounded(vertices) => assert_eq!(vertices.len(), 4),
            VoronoiCell::Unbounded => panic!("center cell should be bounded"),
        }
    }
}
