//! # Triangulation
//!
//! Delaunay triangulation of the valid (non-NaN) points of a [`Grid2D`](`crate::Grid2D`)
//! and barycentric interpolation on top of it.
//!
//! Coordinates are normalized into the unit square with the grid limits before the
//! triangulation is built. Without this, axes with very different units (volts
//! against tesla, say) produce long sliver triangles.
//!
//! The triangulation itself comes from [`spade`]. Its inner faces become the
//! simplices, and query points are located with a barycentric walk between
//! neighboring simplices. A point that is not inside any simplex is outside the
//! convex hull of the data and interpolates to NaN.

use crate::grid::Limits;
use crate::prelude::*;

use ndarray::Zip;
use spade::{DelaunayTriangulation, HasPosition, Point2, Triangulation as _};
use std::collections::HashMap;

/// barycentric weights down to `-HULL_TOLERANCE` still count as inside, so points
/// on the hull of the data are not lost to rounding
const HULL_TOLERANCE: f64 = 1e-10;

/// normalized coordinates closer to zero than this are snapped to zero, far below
/// anything a sweep resolves but above the underflow limit of `spade`
const UNDERFLOW: f64 = 1e-30;

/// maps between data coordinates and the unit square
#[derive(Debug, Clone, Copy, PartialEq)]
struct Normalization {
    x0: f64,
    dx: f64,
    y0: f64,
    dy: f64,
}

impl Normalization {
    fn from_limits(limits: &Limits) -> Self {
        Self {
            x0: limits.xmin,
            dx: limits.xmax - limits.xmin,
            y0: limits.ymin,
            dy: limits.ymax - limits.ymin,
        }
    }

    fn apply(&self, x: f64, y: f64) -> [f64; 2] {
        [(x - self.x0) / self.dx, (y - self.y0) / self.dy]
    }

    fn invert(&self, p: [f64; 2]) -> (f64, f64) {
        (p[0] * self.dx + self.x0, p[1] * self.dy + self.y0)
    }
}

/// Affine map from point coordinates to the first two barycentric coordinates of
/// a simplex `(a, b, c)`: `[l_a, l_b] = inv * (p - c)`, `l_c = 1 - l_a - l_b`
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    inv: [[f64; 2]; 2],
    origin: [f64; 2],
}

impl Affine {
    fn new(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Self {
        let m00 = a[0] - c[0];
        let m01 = b[0] - c[0];
        let m10 = a[1] - c[1];
        let m11 = b[1] - c[1];
        let det = m00 * m11 - m01 * m10;

        // a degenerate simplex gets a NaN transform and never contains anything
        let inv = if det == 0.0 {
            [[f64::NAN; 2]; 2]
        } else {
            [[m11 / det, -m01 / det], [-m10 / det, m00 / det]]
        };

        Self { inv, origin: c }
    }

    fn barycentric(&self, p: [f64; 2]) -> [f64; 3] {
        let d0 = p[0] - self.origin[0];
        let d1 = p[1] - self.origin[1];

        let la = self.inv[0][0] * d0 + self.inv[0][1] * d1;
        let lb = self.inv[1][0] * d0 + self.inv[1][1] * d1;

        [la, lb, 1.0 - la - lb]
    }
}

fn contains(bary: &[f64; 3]) -> bool {
    bary.iter().all(|l| *l >= -HULL_TOLERANCE)
}

/// a valid point of the grid in normalized coordinates, with its value
#[derive(Debug, Clone, Copy)]
struct Sample {
    position: Point2<f64>,
    value: f64,
}

impl HasPosition for Sample {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        self.position
    }
}

/// `neighbors[s][i]` is the simplex sharing the edge opposite of vertex `i` of `s`
fn neighbors(simplices: &[[usize; 3]]) -> Vec<[Option<usize>; 3]> {
    // edge (low, high) -> every (simplex, opposite vertex) it appears in
    let mut edges: HashMap<(usize, usize), Vec<(usize, usize)>> =
        HashMap::with_capacity(simplices.len() * 2);

    for (idx, simplex) in simplices.iter().enumerate() {
        for i in 0..3 {
            let a = simplex[(i + 1) % 3];
            let b = simplex[(i + 2) % 3];
            edges.entry((a.min(b), a.max(b))).or_default().push((idx, i));
        }
    }

    let mut neighbors = vec![[None; 3]; simplices.len()];

    for sides in edges.values() {
        if let [(s, i), (t, j)] = sides[..] {
            neighbors[s][i] = Some(t);
            neighbors[t][j] = Some(s);
        }
    }

    neighbors
}

/// Coarse bucket grid over the unit square, pointing at a simplex in (or near)
/// each bucket. Walks start from here instead of from an arbitrary simplex.
#[derive(Debug, Clone)]
struct Hints {
    size: usize,
    start: Vec<usize>,
}

impl Hints {
    fn new(points: &[[f64; 2]], simplices: &[[usize; 3]]) -> Self {
        let size = ((simplices.len() as f64).sqrt() / 2.0).ceil().clamp(1.0, 256.0) as usize;
        let mut start: Vec<Option<usize>> = vec![None; size * size];

        for (idx, simplex) in simplices.iter().enumerate() {
            let cx = simplex.iter().map(|&v| points[v][0]).sum::<f64>() / 3.0;
            let cy = simplex.iter().map(|&v| points[v][1]).sum::<f64>() / 3.0;
            start[Self::bucket(size, [cx, cy])] = Some(idx);
        }

        // empty buckets borrow the previous filled one
        let mut previous = 0;
        let start = start
            .into_iter()
            .map(|s| {
                if let Some(s) = s {
                    previous = s;
                }
                previous
            })
            .collect();

        Self { size, start }
    }

    fn bucket(size: usize, p: [f64; 2]) -> usize {
        let cell = |v: f64| ((v * size as f64).floor().max(0.0) as usize).min(size - 1);
        cell(p[1]) * size + cell(p[0])
    }

    fn get(&self, p: [f64; 2]) -> usize {
        self.start[Self::bucket(self.size, p)]
    }
}

#[derive(Debug, Clone)]
/// A Delaunay triangulation over normalized point coordinates together with the
/// values at every vertex.
pub struct Triangulation {
    points: Vec<[f64; 2]>,
    values: Vec<f64>,
    simplices: Vec<[usize; 3]>,
    /// `neighbors[s][i]` is the simplex across the edge opposite of vertex `i`
    neighbors: Vec<[Option<usize>; 3]>,
    transforms: Vec<Affine>,
    hints: Hints,
    normalization: Normalization,
}

impl Triangulation {
    /// Triangulate every cell with a finite `x`, `y` and `z`. The coordinates are
    /// normalized into the unit square using `limits`.
    pub fn build(
        x: ArrayView2<f64>,
        y: ArrayView2<f64>,
        z: ArrayView2<f64>,
        limits: &Limits,
    ) -> Result<Self, Error> {
        let normalization = Normalization::from_limits(limits);

        let snap = |v: f64| if v.abs() < UNDERFLOW { 0.0 } else { v };
        let mut samples = Vec::new();

        Zip::from(x).and(y).and(z).for_each(|&x, &y, &z| {
            if !(x.is_nan() || y.is_nan() || z.is_nan()) {
                let [px, py] = normalization.apply(x, y);
                samples.push(Sample {
                    position: Point2::new(snap(px), snap(py)),
                    value: z,
                });
            }
        });

        if samples.len() < 3 {
            return Err(Error::GeometryUnavailable(format!(
                "{} valid points, at least 3 are required",
                samples.len()
            )));
        }

        if samples
            .iter()
            .any(|s| !(s.position.x.is_finite() && s.position.y.is_finite()))
        {
            return Err(Error::GeometryUnavailable(
                "coordinates could not be normalized".into(),
            ));
        }

        let requested = samples.len();
        let mut delaunay: DelaunayTriangulation<Sample> = DelaunayTriangulation::new();

        // a repeated position replaces the earlier vertex, so the later sample wins
        for sample in samples {
            delaunay
                .insert(sample)
                .map_err(|err| Error::GeometryUnavailable(format!("point rejected: {err:?}")))?;
        }

        if delaunay.num_vertices() < requested {
            tracing::debug!(
                duplicates = requested - delaunay.num_vertices(),
                "duplicate points merged in the triangulation"
            );
        }

        let (points, values): (Vec<[f64; 2]>, Vec<f64>) = delaunay
            .vertices()
            .map(|vertex| {
                let sample = vertex.data();
                ([sample.position.x, sample.position.y], sample.value)
            })
            .unzip();

        let simplices: Vec<[usize; 3]> = delaunay
            .inner_faces()
            .map(|face| face.vertices().map(|vertex| vertex.fix().index()))
            .collect();

        if simplices.is_empty() {
            return Err(Error::GeometryUnavailable(
                "all valid points are collinear".into(),
            ));
        }

        let neighbors = neighbors(&simplices);

        let transforms = simplices
            .iter()
            .map(|&[a, b, c]| Affine::new(points[a], points[b], points[c]))
            .collect();

        let hints = Hints::new(&points, &simplices);

        tracing::debug!(
            points = points.len(),
            simplices = simplices.len(),
            "built triangulation"
        );

        Ok(Self {
            points,
            values,
            simplices,
            neighbors,
            transforms,
            hints,
            normalization,
        })
    }

    /// vertex indices of every triangle, counter clockwise
    pub fn simplices(&self) -> &[[usize; 3]] {
        &self.simplices
    }

    /// the values at every vertex
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// number of triangles
    pub fn len(&self) -> usize {
        self.simplices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simplices.is_empty()
    }

    /// the vertex coordinates in data (not normalized) units
    pub fn coordinates(&self) -> (Array1<f64>, Array1<f64>) {
        let (x, y): (Vec<f64>, Vec<f64>) = self
            .points
            .iter()
            .map(|&p| self.normalization.invert(p))
            .unzip();

        (Array1::from(x), Array1::from(y))
    }

    /// index of the simplex containing the point `(x, y)` given in data units
    pub fn find_simplex(&self, x: f64, y: f64) -> Option<usize> {
        let p = self.normalization.apply(x, y);
        self.locate(p).map(|(simplex, _)| simplex)
    }

    fn locate(&self, p: [f64; 2]) -> Option<(usize, [f64; 3])> {
        if p.iter().any(|v| v.is_nan() || *v < -HULL_TOLERANCE || *v > 1.0 + HULL_TOLERANCE) {
            return None;
        }

        let mut simplex = self.hints.get(p);

        for _ in 0..=self.simplices.len() {
            let bary = self.transforms[simplex].barycentric(p);

            if contains(&bary) {
                return Some((simplex, bary));
            }

            // step across the edge facing away from the most negative weight
            let (worst, _) = bary
                .iter()
                .enumerate()
                .fold((0, f64::INFINITY), |best, (idx, &l)| if l < best.1 { (idx, l) } else { best });

            match self.neighbors[simplex][worst] {
                Some(next) => simplex = next,
                None => break,
            }
        }

        // degenerate slivers can stop the walk short of the hull
        self.transforms
            .iter()
            .enumerate()
            .map(|(idx, transform)| (idx, transform.barycentric(p)))
            .find(|(_, bary)| contains(bary))
    }

    fn interpolate_one(&self, x: f64, y: f64) -> f64 {
        let p = self.normalization.apply(x, y);

        match self.locate(p) {
            Some((simplex, bary)) => self.simplices[simplex]
                .iter()
                .zip(bary.iter())
                .map(|(&vertex, &weight)| self.values[vertex] * weight)
                .sum(),
            None => f64::NAN,
        }
    }

    /// Interpolate at every row `(x, y)` of an `N x 2` array of points in data units.
    ///
    /// Points outside the triangulated region are NaN.
    pub fn interpolate(&self, points: ArrayView2<f64>) -> Result<Array1<f64>, Error> {
        if points.ncols() != 2 {
            return Err(Error::ShapeMismatch {
                name: "points",
                expected: (points.nrows(), 2),
                actual: points.dim(),
            });
        }

        let mut out = Array1::from_elem(points.nrows(), f64::NAN);
        let zip = Zip::from(&mut out).and(points.rows());

        #[cfg(feature = "parallel")]
        zip.par_for_each(|value, point| *value = self.interpolate_one(point[0], point[1]));
        #[cfg(not(feature = "parallel"))]
        zip.for_each(|value, point| *value = self.interpolate_one(point[0], point[1]));

        Ok(out)
    }
}
