use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use crate::foundation::core::Point;
use crate::foundation::error::CalibrationError;

/// Points closer than this fraction of the point-set extent count as duplicates.
const DUPLICATE_REL_EPS: f64 = 1e-6;
/// Triangles whose normalized area falls below this count as collinear.
const COLLINEAR_REL_EPS: f64 = 1e-6;
/// Reciprocal condition number below which the 8x8 system is treated as singular.
const MIN_RCOND: f64 = 1e-12;
/// Homogeneous `w` magnitude below which a point maps to infinity.
const W_EPS: f64 = 1e-12;

/// A planar projective transform together with its inverse.
///
/// Matrices are normalized so the bottom-right entry is 1 whenever that entry is non-zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    m: Matrix3<f64>,
    inv: Matrix3<f64>,
}

impl Homography {
    /// Solve the homography mapping each `src[i]` onto `dst[i]`.
    ///
    /// Both point sets are Hartley-normalized before the 8x8 solve; near-singular systems
    /// (duplicate or collinear points on either side) are rejected.
    pub fn from_correspondences(
        src: &[Point; 4],
        dst: &[Point; 4],
    ) -> Result<Self, CalibrationError> {
        check_non_degenerate("source", src)?;
        check_non_degenerate("destination", dst)?;

        let (t_src, src_n) = normalize_points(src);
        let (t_dst, dst_n) = normalize_points(dst);

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for i in 0..4 {
            let (x, y) = (src_n[i].x, src_n[i].y);
            let (u, v) = (dst_n[i].x, dst_n[i].y);
            let r0 = 2 * i;
            let r1 = r0 + 1;

            a[(r0, 0)] = x;
            a[(r0, 1)] = y;
            a[(r0, 2)] = 1.0;
            a[(r0, 6)] = -u * x;
            a[(r0, 7)] = -u * y;
            b[r0] = u;

            a[(r1, 3)] = x;
            a[(r1, 4)] = y;
            a[(r1, 5)] = 1.0;
            a[(r1, 6)] = -v * x;
            a[(r1, 7)] = -v * y;
            b[r1] = v;
        }

        let sv = a.singular_values();
        let (s_min, s_max) = sv
            .iter()
            .fold((f64::INFINITY, 0.0f64), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        let rcond = if s_max > 0.0 { s_min / s_max } else { 0.0 };
        if rcond.is_nan() || rcond < MIN_RCOND {
            return Err(CalibrationError::Degenerate(format!(
                "correspondence system is near-singular (rcond {rcond:.3e})"
            )));
        }

        let h = a
            .lu()
            .solve(&b)
            .ok_or_else(|| CalibrationError::Degenerate("correspondence system is singular".into()))?;

        let hn = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        let t_dst_inv = t_dst.try_inverse().ok_or_else(|| {
            CalibrationError::Degenerate("destination normalization is not invertible".into())
        })?;

        Self::from_matrix(t_dst_inv * hn * t_src)
    }

    /// Wrap an explicit matrix, computing (and validating) its inverse.
    pub fn from_matrix(m: Matrix3<f64>) -> Result<Self, CalibrationError> {
        if m.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::Degenerate(
                "homography has non-finite entries".into(),
            ));
        }
        let m = normalize_scale(m);
        let inv = m.try_inverse().ok_or_else(|| {
            CalibrationError::Degenerate("homography is not invertible".into())
        })?;
        Ok(Self {
            m,
            inv: normalize_scale(inv),
        })
    }

    /// Map a point through the forward transform.
    ///
    /// Returns `None` when the point maps to infinity (the horizon line of the transform).
    pub fn apply(&self, p: Point) -> Option<Point> {
        apply_matrix(&self.m, p)
    }

    /// Map a point through the inverse transform.
    pub fn apply_inverse(&self, p: Point) -> Option<Point> {
        apply_matrix(&self.inv, p)
    }

    /// The transform going the other way.
    pub fn inverse(&self) -> Self {
        Self {
            m: self.inv,
            inv: self.m,
        }
    }

    /// Forward matrix, row-major.
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        rows(&self.m)
    }

    /// Forward matrix as a flat row-major array, for per-pixel evaluation.
    pub(crate) fn coeffs_f64(&self) -> [f64; 9] {
        let r = rows(&self.m);
        [
            r[0][0], r[0][1], r[0][2], r[1][0], r[1][1], r[1][2], r[2][0], r[2][1], r[2][2],
        ]
    }
}

fn rows(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

fn apply_matrix(m: &Matrix3<f64>, p: Point) -> Option<Point> {
    let v = m * Vector3::new(p.x, p.y, 1.0);
    let w = v[2];
    if !w.is_finite() || w.abs() <= W_EPS || !v[0].is_finite() || !v[1].is_finite() {
        return None;
    }
    Some(Point::new(v[0] / w, v[1] / w))
}

fn normalize_scale(m: Matrix3<f64>) -> Matrix3<f64> {
    let s = m[(2, 2)];
    if s.abs() > W_EPS { m / s } else { m }
}

/// Similarity transform moving the centroid to the origin with mean distance sqrt(2).
fn normalize_points(pts: &[Point; 4]) -> (Matrix3<f64>, [Point; 4]) {
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;
    let s = if mean_dist > 0.0 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let out = pts.map(|p| Point::new(s * (p.x - cx), s * (p.y - cy)));
    (t, out)
}

fn check_non_degenerate(side: &str, pts: &[Point; 4]) -> Result<(), CalibrationError> {
    if pts.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(CalibrationError::Degenerate(format!(
            "{side} points must be finite"
        )));
    }

    let (min_x, max_x, min_y, max_y) = pts.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(x0, x1, y0, y1), p| (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y)),
    );
    let extent = (max_x - min_x).hypot(max_y - min_y);
    if extent <= 0.0 {
        return Err(CalibrationError::Degenerate(format!(
            "{side} points are all identical"
        )));
    }

    for i in 0..4 {
        for j in (i + 1)..4 {
            if (pts[i] - pts[j]).hypot() <= DUPLICATE_REL_EPS * extent {
                return Err(CalibrationError::Degenerate(format!(
                    "{side} points {i} and {j} coincide"
                )));
            }
        }
    }

    for skip in 0..4 {
        let tri: Vec<Point> = (0..4).filter(|&k| k != skip).map(|k| pts[k]).collect();
        let ab = tri[1] - tri[0];
        let ac = tri[2] - tri[0];
        let cross = ab.cross(ac).abs();
        if cross <= COLLINEAR_REL_EPS * extent * extent {
            return Err(CalibrationError::Degenerate(format!(
                "three {side} points are collinear"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/calibration/homography.rs"]
mod tests;
