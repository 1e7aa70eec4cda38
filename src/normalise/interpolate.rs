use nalgebra::{Matrix2, Point2, Vector2};
use ordered_float::OrderedFloat;

use crate::tethys_errors::TethysError;

/// Tolerance for the barycentric inside-triangle test and the
/// circumcircle predicate.
const GEOM_EPS: f64 = 1e-9;

/// A scattered linear interpolator over a planar point cloud.
///
/// Construction triangulates the samples with the Bowyer–Watson
/// incremental Delaunay algorithm; evaluation locates the containing
/// triangle and blends the three vertex values with barycentric weights.
///
/// Evaluation is a total function: a query outside the convex hull
/// returns `None`, never an error. The NaN-filling of outside-hull
/// targets is a deterministic consequence at the call site.
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    points: Vec<Point2<f64>>,
    values: Vec<f64>,
    triangles: Vec<[usize; 3]>,
}

impl LinearInterpolator {
    /// Triangulate `points` and attach `values`.
    ///
    /// Arguments
    /// ---------
    /// * `points`: sample positions `(x, y)`; must be distinct.
    /// * `values`: one finite value per sample.
    ///
    /// Return
    /// ------
    /// * The interpolator, or [`TethysError::InterpolationFailure`] when
    ///   fewer than 3 samples are given, samples coincide, or the
    ///   triangulation degenerates (e.g. all samples collinear).
    pub fn new(points: &[(f64, f64)], values: &[f64]) -> Result<Self, TethysError> {
        if points.len() != values.len() {
            return Err(TethysError::InterpolationFailure(format!(
                "{} sample points but {} values",
                points.len(),
                values.len()
            )));
        }
        if points.len() < 3 {
            return Err(TethysError::InterpolationFailure(format!(
                "need at least 3 sample points, got {}",
                points.len()
            )));
        }

        let mut sorted: Vec<(OrderedFloat<f64>, OrderedFloat<f64>)> = points
            .iter()
            .map(|&(x, y)| (OrderedFloat(x), OrderedFloat(y)))
            .collect();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(TethysError::InterpolationFailure(
                "coincident sample points".into(),
            ));
        }

        let points: Vec<Point2<f64>> = points.iter().map(|&(x, y)| Point2::new(x, y)).collect();
        let triangles = bowyer_watson(&points)?;

        Ok(Self {
            points,
            values: values.to_vec(),
            triangles,
        })
    }

    /// Interpolate at `(x, y)`; `None` outside the convex hull.
    pub fn evaluate(&self, x: f64, y: f64) -> Option<f64> {
        let p = Point2::new(x, y);
        for &[a, b, c] in &self.triangles {
            let Some((wa, wb, wc)) =
                barycentric(&self.points[a], &self.points[b], &self.points[c], &p)
            else {
                continue;
            };
            if wa >= -GEOM_EPS && wb >= -GEOM_EPS && wc >= -GEOM_EPS {
                return Some(wa * self.values[a] + wb * self.values[b] + wc * self.values[c]);
            }
        }
        None
    }

    /// Number of triangles in the triangulation.
    #[inline]
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }
}

/// Barycentric coordinates of `p` in triangle `(a, b, c)`, or `None`
/// when the triangle is degenerate.
fn barycentric(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    p: &Point2<f64>,
) -> Option<(f64, f64, f64)> {
    let t = Matrix2::from_columns(&[b - a, c - a]);
    let l = t.lu().solve(&(p - a))?;
    Some((1.0 - l.x - l.y, l.x, l.y))
}

/// Incremental Delaunay triangulation.
///
/// A super-triangle enclosing every sample is seeded, the samples are
/// inserted one by one (re-triangulating the cavity of circumcircles
/// containing the new point), and triangles touching the super vertices
/// are finally discarded. Coincident samples and fully collinear clouds
/// surface as `InterpolationFailure`.
fn bowyer_watson(points: &[Point2<f64>]) -> Result<Vec<[usize; 3]>, TethysError> {
    let n = points.len();

    // Super-triangle, comfortably enclosing the sample bounding box.
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        if !(p.x.is_finite() && p.y.is_finite()) {
            return Err(TethysError::InterpolationFailure(
                "non-finite sample position".into(),
            ));
        }
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let cx = (min_x + max_x) / 2.0;
    let cy = (min_y + max_y) / 2.0;
    let d = ((max_x - min_x).max(max_y - min_y)).max(1.0) * 20.0;

    let mut verts: Vec<Point2<f64>> = points.to_vec();
    verts.push(Point2::new(cx - 2.0 * d, cy - d));
    verts.push(Point2::new(cx + 2.0 * d, cy - d));
    verts.push(Point2::new(cx, cy + 2.0 * d));

    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

    for idx in 0..n {
        let p = &verts[idx];

        // Cavity: every triangle whose circumcircle contains the point.
        let mut bad: Vec<usize> = Vec::new();
        for (t, tri) in triangles.iter().enumerate() {
            if circumcircle_contains(&verts[tri[0]], &verts[tri[1]], &verts[tri[2]], p) {
                bad.push(t);
            }
        }
        if bad.is_empty() {
            // Cannot happen for a point inside the super-triangle unless
            // the predicates broke down numerically.
            return Err(TethysError::InterpolationFailure(
                "no cavity found while inserting a sample point".into(),
            ));
        }

        // Boundary of the cavity: edges used by exactly one bad triangle.
        let mut boundary: Vec<(usize, usize)> = Vec::new();
        for &t in &bad {
            let tri = triangles[t];
            for e in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let shared = bad.iter().any(|&u| {
                    u != t && {
                        let o = triangles[u];
                        let edges = [(o[0], o[1]), (o[1], o[2]), (o[2], o[0])];
                        edges.contains(&e) || edges.contains(&(e.1, e.0))
                    }
                });
                if !shared {
                    boundary.push(e);
                }
            }
        }

        for &t in bad.iter().rev() {
            triangles.swap_remove(t);
        }
        for (a, b) in boundary {
            triangles.push([a, b, idx]);
        }
    }

    // Keep real, non-sliver triangles only. A fully collinear cloud
    // leaves nothing behind.
    triangles.retain(|tri| {
        tri.iter().all(|&v| v < n) && {
            let (a, b, c) = (&verts[tri[0]], &verts[tri[1]], &verts[tri[2]]);
            let area2 = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            area2.abs() > 1e-12
        }
    });
    if triangles.is_empty() {
        return Err(TethysError::InterpolationFailure(
            "degenerate triangulation (collinear sample points)".into(),
        ));
    }
    Ok(triangles)
}

/// True iff `p` lies inside (or on) the circumcircle of `(a, b, c)`.
/// A degenerate triangle has an unbounded circumcircle and contains
/// every point.
fn circumcircle_contains(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    p: &Point2<f64>,
) -> bool {
    // Circumcenter u solves the perpendicular-bisector system.
    let m = Matrix2::new(b.x - a.x, b.y - a.y, c.x - a.x, c.y - a.y);
    let rhs = Vector2::new(
        ((b.x * b.x - a.x * a.x) + (b.y * b.y - a.y * a.y)) / 2.0,
        ((c.x * c.x - a.x * a.x) + (c.y * c.y - a.y * a.y)) / 2.0,
    );
    let Some(u) = m.lu().solve(&rhs) else {
        return true;
    };
    let r2 = (a.x - u.x).powi(2) + (a.y - u.y).powi(2);
    let d2 = (p.x - u.x).powi(2) + (p.y - u.y).powi(2);
    d2 <= r2 * (1.0 + GEOM_EPS)
}
