//! Workshop Positioning
//!
//! Estimates the planar position of UWB tags fixed to vehicles inside a
//! workshop from their ranges to three fixed anchors, and keeps a history
//! of those positions.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod store;
pub mod api;
pub mod utils;

// Re-export commonly used types
pub use core::{AnchorPoint, DistanceTriple, PositionEstimate, PositionQuery, TagRecord};
pub use algorithms::{RangeMeasurement, Solution, SolveMethod, SolverError, Trilateration};
pub use processing::{MeasurementGate, PositionEstimator, PositionFix, ZoneAssignment};
pub use validation::{ApiError, ApiResult, PositioningError};
pub use store::{InMemoryStore, SiteFixture, StoreError, WorkshopStore};
pub use api::{
    latest_position, position_history, tag_history, DistanceIngestionService, DistanceReading,
    IngestionStatus, RegisterDistancesRequest, RegisterDistancesResponse,
};
pub use utils::{init_logging, ServiceConfig};
