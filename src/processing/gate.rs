//! Significant-change gate for incoming distance triples

use crate::core::{DistanceTriple, DEFAULT_SIGNIFICANT_CHANGE_CM, DISTANCE_STEPS_PER_CM};

/// Round a distance to a micro-centimeter grid so decimal readings compare exactly at the threshold
pub fn normalize_cm(value: f64) -> f64 {
    (value * DISTANCE_STEPS_PER_CM).round() / DISTANCE_STEPS_PER_CM
}

/// Decides whether a new triple differs enough from the stored one to recompute.
///
/// Slots are compared positionally. A stored distance that is missing reads as zero.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementGate {
    /// Threshold in persisted units (centimeters)
    pub threshold_cm: f64,
}

impl Default for MeasurementGate {
    fn default() -> Self {
        Self {
            threshold_cm: DEFAULT_SIGNIFICANT_CHANGE_CM,
        }
    }
}

impl MeasurementGate {
    pub fn new(threshold_cm: f64) -> Self {
        Self { threshold_cm }
    }

    /// Absolute per-slot change against the stored triple, `None` without one
    pub fn deltas(&self, previous: Option<&DistanceTriple>, new_cm: &[f64; 3]) -> Option<[f64; 3]> {
        let previous = previous?.distances_or_zero();
        Some([
            normalize_cm((new_cm[0] - previous[0]).abs()),
            normalize_cm((new_cm[1] - previous[1]).abs()),
            normalize_cm((new_cm[2] - previous[2]).abs()),
        ])
    }

    pub fn is_significant(&self, previous: Option<&DistanceTriple>, new_cm: &[f64; 3]) -> bool {
        match self.deltas(previous, new_cm) {
            None => true,
            Some(deltas) => deltas.iter().any(|delta| *delta >= self.threshold_cm),
        }
    }
}
