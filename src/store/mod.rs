//! Persistence seam for the positioning core
//!
//! Registries and stores are traits so the ingestion path can run against a
//! database-backed implementation or the in-memory one used by the CLI and tests.

pub mod registry;
pub mod memory;
pub mod error;

pub use registry::{AnchorRegistry, TagRegistry, DistanceStore, PositionStore, WorkshopStore};
pub use memory::{InMemoryStore, SiteFixture};
pub use error::{StoreError, StoreResult};
