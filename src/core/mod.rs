//! Core types and constants for the workshop positioning system

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
