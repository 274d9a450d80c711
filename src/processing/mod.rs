//! Measurement gating and position estimation

pub mod gate;
pub mod estimator;

pub use gate::MeasurementGate;
pub use estimator::{PositionEstimator, PositionFix, ZoneAssignment};
