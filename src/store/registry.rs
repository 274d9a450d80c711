//! Registry and store traits consumed by the positioning core

use chrono::{DateTime, Utc};

use crate::core::{
    AnchorId, AnchorPoint, DistanceTriple, NewPosition, PositionEstimate, PositionQuery, TagId,
    TagRecord, TripleData,
};
use crate::store::StoreResult;

/// Read-only lookup of fixed anchors
pub trait AnchorRegistry {
    fn anchor_by_id(&self, id: AnchorId) -> StoreResult<Option<AnchorPoint>>;

    /// Lookup by the external name devices report
    fn anchor_by_name(&self, name: &str) -> StoreResult<Option<AnchorPoint>>;
}

/// Lookup of mobile tags
pub trait TagRegistry {
    fn tag_by_code(&self, code: &str) -> StoreResult<Option<TagRecord>>;

    fn tag_by_id(&self, id: TagId) -> StoreResult<Option<TagRecord>>;

    fn touch_last_communication(&self, id: TagId, at: DateTime<Utc>) -> StoreResult<()>;
}

/// One distance triple per tag
pub trait DistanceStore {
    fn triple_by_tag(&self, tag: TagId) -> StoreResult<Option<DistanceTriple>>;

    /// Insert the tag's triple or overwrite its slots in place
    fn upsert_triple(&self, data: TripleData) -> StoreResult<DistanceTriple>;
}

/// Append-only position history
pub trait PositionStore {
    fn insert_position(&self, position: NewPosition) -> StoreResult<PositionEstimate>;

    /// Positions matching `query`, newest first, at most `query.limit`
    fn positions(&self, query: &PositionQuery) -> StoreResult<Vec<PositionEstimate>>;

    fn latest_position(&self, tag: TagId) -> StoreResult<Option<PositionEstimate>> {
        let query = PositionQuery {
            limit: 1,
            ..PositionQuery::for_tag(tag)
        };
        Ok(self.positions(&query)?.into_iter().next())
    }
}

/// Everything the ingestion path needs from persistence
pub trait WorkshopStore: AnchorRegistry + TagRegistry + DistanceStore + PositionStore {}

impl<T> WorkshopStore for T where T: AnchorRegistry + TagRegistry + DistanceStore + PositionStore {}
