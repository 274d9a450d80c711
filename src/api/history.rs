//! Read side of the position history

use crate::core::{PositionEstimate, PositionQuery, TagRecord};
use crate::store::{PositionStore, TagRegistry};
use crate::validation::error::{ApiError, ApiResult, EntityKind};

fn resolve_tag<S>(store: &S, code: &str) -> ApiResult<TagRecord>
where
    S: TagRegistry + ?Sized,
{
    store
        .tag_by_code(code)?
        .ok_or_else(|| ApiError::not_found(EntityKind::Tag, code))
}

/// Most recent position of the tag with external code `code`
pub fn latest_position<S>(store: &S, code: &str) -> ApiResult<PositionEstimate>
where
    S: TagRegistry + PositionStore + ?Sized,
{
    let tag = resolve_tag(store, code)?;
    store
        .latest_position(tag.id)?
        .ok_or_else(|| ApiError::not_found(EntityKind::Position, code))
}

/// Positions of one tag, newest first
pub fn tag_history<S>(store: &S, code: &str, limit: usize) -> ApiResult<Vec<PositionEstimate>>
where
    S: TagRegistry + PositionStore + ?Sized,
{
    let tag = resolve_tag(store, code)?;
    position_history(
        store,
        &PositionQuery {
            limit,
            ..PositionQuery::for_tag(tag.id)
        },
    )
}

/// Filtered position history, newest first
pub fn position_history<S>(store: &S, query: &PositionQuery) -> ApiResult<Vec<PositionEstimate>>
where
    S: PositionStore + ?Sized,
{
    if query.limit == 0 {
        return Err(ApiError::invalid("limit must be at least 1"));
    }
    Ok(store.positions(query)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ingestion::DistanceIngestionService;
    use crate::api::types::{DistanceReading, RegisterDistancesRequest};
    use crate::core::{AnchorPoint, TagRecord, ZoneId};
    use crate::store::{InMemoryStore, SiteFixture};

    fn tracked_store() -> InMemoryStore {
        let store = InMemoryStore::from_fixture(SiteFixture {
            anchors: vec![
                AnchorPoint::new(1, "A", 0, 0).with_zone(1),
                AnchorPoint::new(2, "B", 100, 0),
                AnchorPoint::new(3, "C", 0, 100),
            ],
            tags: vec![TagRecord::new(1, "T1"), TagRecord::new(2, "T2")],
        })
        .unwrap();

        let service = DistanceIngestionService::default();
        for (a, b, c) in [("0.50", "0.50", "1.118"), ("1.131371", "0.824621", "0.824621")] {
            let request = RegisterDistancesRequest::new(
                "T1",
                vec![DistanceReading::new("A", a), DistanceReading::new("B", b), DistanceReading::new("C", c)],
            );
            service.register_distances(&store, &request).unwrap();
        }
        store
    }

    #[test]
    fn test_latest_position() {
        let store = tracked_store();
        let latest = latest_position(&store, "T1").unwrap();
        assert_eq!((latest.x, latest.y), (80, 80));
        assert_eq!(latest.zone, Some(ZoneId(1)));
    }

    #[test]
    fn test_latest_position_errors() {
        let store = tracked_store();
        assert!(matches!(
            latest_position(&store, "T2"),
            Err(ApiError::NotFound { entity: EntityKind::Position, .. })
        ));
        assert!(matches!(
            latest_position(&store, "T3"),
            Err(ApiError::NotFound { entity: EntityKind::Tag, .. })
        ));
    }

    #[test]
    fn test_tag_history_limit() {
        let store = tracked_store();
        assert_eq!(tag_history(&store, "T1", 10).unwrap().len(), 2);

        let newest = tag_history(&store, "T1", 1).unwrap();
        assert_eq!(newest.len(), 1);
        assert_eq!((newest[0].x, newest[0].y), (80, 80));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let store = tracked_store();
        let query = PositionQuery {
            limit: 0,
            ..Default::default()
        };
        assert!(matches!(position_history(&store, &query), Err(ApiError::InvalidInput { .. })));
    }
}
