//! Operations exposed to the routing layer
//!
//! `RegisterDistances` is the write path; the history functions are the read side.

pub mod ingestion;
pub mod history;
pub mod types;

pub use ingestion::DistanceIngestionService;
pub use history::{latest_position, position_history, tag_history};
pub use types::{
    DistanceReading, DistanceTripleView, IngestionStatus, RegisterDistancesRequest,
    RegisterDistancesResponse,
};
