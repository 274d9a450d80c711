//! Planar trilateration from three anchor ranges
//!
//! The three circle equations `(x - xi)² + (y - yi)² = di²` are linearised by
//! subtracting the first from the other two, leaving a 2x2 system in `(x, y)`.
//! When the anchors are collinear (or coincide) the system is singular and the
//! solver falls back to an inverse-distance weighted centroid of the anchors.

use nalgebra::{Matrix2, RowVector2, Vector2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::DEFAULT_SINGULARITY_TOLERANCE;

/// Reference point with its measured range, in a common length unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeMeasurement {
    pub x: f64,
    pub y: f64,
    pub distance: f64,
}

impl RangeMeasurement {
    pub fn new(x: f64, y: f64, distance: f64) -> Self {
        Self { x, y, distance }
    }
}

/// Which path produced the estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    /// Exact solution of the linearised system
    Linear,
    /// Inverse-distance weighted centroid used for singular geometry
    WeightedCentroid,
}

/// Estimated planar point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub x: f64,
    pub y: f64,
    pub method: SolveMethod,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("distance {slot} is zero; weighted centroid is undefined")]
    ZeroDistance { slot: usize },
    #[error("distance {slot} is not a finite non-negative value: {value}")]
    InvalidDistance { slot: usize, value: f64 },
    #[error("anchor {slot} has non-finite coordinates")]
    InvalidAnchor { slot: usize },
}

/// Three-anchor 2D trilateration
#[derive(Debug, Clone, Copy)]
pub struct Trilateration {
    /// Relative determinant tolerance for singularity detection
    pub singularity_tolerance: f64,
}

impl Default for Trilateration {
    fn default() -> Self {
        Self {
            singularity_tolerance: DEFAULT_SINGULARITY_TOLERANCE,
        }
    }
}

impl Trilateration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(singularity_tolerance: f64) -> Self {
        Self { singularity_tolerance }
    }

    /// Estimate the point whose distances to the three references match `ranges`.
    ///
    /// Slots in returned errors are 1-based to match anchor numbering.
    pub fn solve(&self, ranges: &[RangeMeasurement; 3]) -> Result<Solution, SolverError> {
        for (i, m) in ranges.iter().enumerate() {
            if !m.distance.is_finite() || m.distance < 0.0 {
                return Err(SolverError::InvalidDistance { slot: i + 1, value: m.distance });
            }
            if !m.x.is_finite() || !m.y.is_finite() {
                return Err(SolverError::InvalidAnchor { slot: i + 1 });
            }
        }

        match self.solve_linear(ranges) {
            Some((x, y)) => Ok(Solution { x, y, method: SolveMethod::Linear }),
            None => {
                tracing::debug!("singular anchor geometry, using weighted centroid");
                let (x, y) = weighted_centroid(ranges)?;
                Ok(Solution { x, y, method: SolveMethod::WeightedCentroid })
            }
        }
    }

    /// Exact solution of the linearised system, `None` when it is singular
    fn solve_linear(&self, ranges: &[RangeMeasurement; 3]) -> Option<(f64, f64)> {
        let p1 = ranges[0];
        let d1_sq = p1.distance * p1.distance;

        let mut rows = [RowVector2::zeros(); 2];
        let mut rhs = [0.0; 2];

        for i in 1..3 {
            let pi = ranges[i];
            let row = i - 1;
            rows[row] = RowVector2::new(2.0 * (pi.x - p1.x), 2.0 * (pi.y - p1.y));
            rhs[row] = d1_sq - pi.distance * pi.distance
                - p1.x.powi(2) + pi.x.powi(2)
                - p1.y.powi(2) + pi.y.powi(2);
        }

        let a_mat = Matrix2::from_rows(&rows);
        let b_vec = Vector2::new(rhs[0], rhs[1]);

        let scale = rows[0].norm() * rows[1].norm();
        let det = a_mat.determinant();
        if scale == 0.0 || det.abs() <= self.singularity_tolerance * scale {
            return None;
        }

        let xy = a_mat.try_inverse()? * b_vec;
        if xy.x.is_finite() && xy.y.is_finite() {
            Some((xy.x, xy.y))
        } else {
            None
        }
    }
}

/// Inverse-distance weighted centroid: closer anchors weigh more.
pub fn weighted_centroid(ranges: &[RangeMeasurement; 3]) -> Result<(f64, f64), SolverError> {
    if let Some(slot) = ranges.iter().position(|m| m.distance == 0.0) {
        return Err(SolverError::ZeroDistance { slot: slot + 1 });
    }

    let total_weight: f64 = ranges.iter().map(|m| 1.0 / m.distance).sum();
    let x = ranges.iter().map(|m| m.x / m.distance).sum::<f64>() / total_weight;
    let y = ranges.iter().map(|m| m.y / m.distance).sum::<f64>() / total_weight;

    Ok((x, y))
}
