//! Unit conversions and default thresholds

/// Factor applied to raw device readings (meters) to obtain stored distances (centimeters)
pub const CENTIMETERS_PER_METER: f64 = 100.0;

/// Minimum per-anchor distance change (cm) that triggers recomputation
pub const DEFAULT_SIGNIFICANT_CHANGE_CM: f64 = 50.0;

/// Relative determinant tolerance below which the linearised system is treated as singular
pub const DEFAULT_SINGULARITY_TOLERANCE: f64 = 1e-9;

/// Number of anchor readings required for one 2D fix
pub const READINGS_PER_FIX: usize = 3;

/// Default row limit for position history queries
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Scaled distances and gate deltas are rounded to 1/DISTANCE_STEPS_PER_CM cm
pub const DISTANCE_STEPS_PER_CM: f64 = 1e6;
