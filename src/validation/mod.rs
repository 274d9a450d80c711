//! Input validation and error taxonomy

pub mod error;
pub mod input;

pub use error::{ApiError, ApiResult, EntityKind, ErrorSeverity, PositioningError};
pub use input::{parse_readings, ParsedReading};
