//! Core positioning algorithms

pub mod trilateration;

pub use trilateration::{RangeMeasurement, Solution, SolveMethod, SolverError, Trilateration};
