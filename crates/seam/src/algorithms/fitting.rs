use tracing::debug;

use crate::{
    error::{Result, SeamError},
    traits::LineFitter,
    types::{LineModel, PointSet, MIN_FIT_POINTS},
};

/// Relative eigenvalue gap below which the scatter is treated as isotropic
pub const DEFAULT_ISOTROPY_TOLERANCE: f64 = 1e-9;

/// Orthogonal (total least squares) regression.
///
/// The direction is the dominant eigenvector of the centered 2x2 scatter matrix and
/// the anchor is the centroid. Directions are canonicalized to point towards +x
/// (or +y for vertical lines). When both eigenvalues agree within
/// `isotropy_tolerance`, every axis through the centroid fits equally well and the
/// x-axis is returned.
#[derive(Debug, Clone)]
pub struct TotalLeastSquaresFitter {
    pub isotropy_tolerance: f64,
}

impl Default for TotalLeastSquaresFitter {
    fn default() -> Self {
        Self {
            isotropy_tolerance: DEFAULT_ISOTROPY_TOLERANCE,
        }
    }
}

impl LineFitter for TotalLeastSquaresFitter {
    fn fit(&self, points: &PointSet) -> Result<LineModel> {
        let n = points.len();
        if n < MIN_FIT_POINTS {
            return Err(points.source.insufficient(n));
        }
        let count = n as f64;

        let mut mu = [0.0f64, 0.0];
        for &[x, y] in points.iter() {
            mu[0] += f64::from(x);
            mu[1] += f64::from(y);
        }
        mu[0] /= count;
        mu[1] /= count;

        let mut cov_xx = 0.0f64;
        let mut cov_xy = 0.0f64;
        let mut cov_yy = 0.0f64;
        for &[x, y] in points.iter() {
            let dx = f64::from(x) - mu[0];
            let dy = f64::from(y) - mu[1];
            cov_xx += dx * dx;
            cov_xy += dx * dy;
            cov_yy += dy * dy;
        }
        cov_xx /= count;
        cov_xy /= count;
        cov_yy /= count;

        let trace = cov_xx + cov_yy;
        if trace <= f64::EPSILON {
            return Err(SeamError::DegenerateLineFit);
        }

        let gap = ((cov_xx - cov_yy) * (cov_xx - cov_yy) + 4.0 * cov_xy * cov_xy).sqrt();
        let direction = if gap <= self.isotropy_tolerance * trace {
            debug!(cov_xx, cov_yy, cov_xy, "isotropic point scatter, using the x-axis");
            [1.0, 0.0]
        } else {
            let lambda = 0.5 * (trace + gap);
            // Both rows of (C - lambda I) give an eigenvector; keep the better conditioned one.
            let from_row_x = [cov_xy, lambda - cov_xx];
            let from_row_y = [lambda - cov_yy, cov_xy];
            let v = if norm(from_row_x) >= norm(from_row_y) {
                from_row_x
            } else {
                from_row_y
            };
            let len = norm(v);
            if len <= f64::EPSILON {
                return Err(SeamError::DegenerateLineFit);
            }
            canonical([v[0] / len, v[1] / len])
        };

        Ok(LineModel {
            direction,
            anchor: mu,
        })
    }
}

#[inline]
fn norm(v: [f64; 2]) -> f64 {
    v[0].hypot(v[1])
}

/// Flip `v` so it points towards +x, or +y when vertical
fn canonical(v: [f64; 2]) -> [f64; 2] {
    if v[0] < 0.0 || (v[0] == 0.0 && v[1] < 0.0) {
        [-v[0], -v[1]]
    } else {
        v
    }
}
