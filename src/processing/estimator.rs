//! Position estimation from a tag's distance triple
//!
//! Resolves the three anchors, runs the trilateration solver, rounds the result
//! to whole centimeters and assigns a zone. Persisting is a single insert made
//! only after everything else has succeeded.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::algorithms::trilateration::{RangeMeasurement, SolveMethod, Trilateration};
use crate::core::{AnchorId, AnchorPoint, NewPosition, PositionEstimate, TagId, ZoneId};
use crate::store::{AnchorRegistry, PositionStore};
use crate::validation::error::PositioningError;

/// Rule for the zone recorded with a new position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneAssignment {
    /// Zone of the first anchor of the triple. An approximation, not containment.
    #[default]
    FirstAnchor,
    /// Zone of the anchor with the smallest measured distance (first wins ties)
    NearestAnchor,
}

/// Rounded fix, not yet persisted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub x: i32,
    pub y: i32,
    pub zone: Option<ZoneId>,
    pub method: SolveMethod,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PositionEstimator {
    pub solver: Trilateration,
    pub zone_assignment: ZoneAssignment,
}

impl PositionEstimator {
    pub fn new(solver: Trilateration, zone_assignment: ZoneAssignment) -> Self {
        Self { solver, zone_assignment }
    }

    /// Compute a fix for `tag` from three (anchor, distance in cm) pairs without writing it
    pub fn compute<R>(
        &self,
        anchors: &R,
        tag: TagId,
        pairs: &[(AnchorId, f64); 3],
    ) -> Result<PositionFix, PositioningError>
    where
        R: AnchorRegistry + ?Sized,
    {
        let resolved = [
            resolve(anchors, pairs[0].0)?,
            resolve(anchors, pairs[1].0)?,
            resolve(anchors, pairs[2].0)?,
        ];

        let mut ranges = [RangeMeasurement::new(0.0, 0.0, 0.0); 3];
        for (i, anchor) in resolved.iter().enumerate() {
            let (x, y) = anchor
                .coordinates()
                .ok_or(PositioningError::IncompleteAnchorData { anchor: anchor.id })?;
            ranges[i] = RangeMeasurement::new(x, y, pairs[i].1);
        }

        let anchor_ids = pairs.map(|(id, _)| id);
        let distances = pairs.map(|(_, d)| d);

        let solution = self
            .solver
            .solve(&ranges)
            .map_err(|e| PositioningError::from_solver(e, tag, anchor_ids, distances))?;

        let (x, y) = match (round_cm(solution.x), round_cm(solution.y)) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                return Err(PositioningError::TriangulationFailed {
                    tag,
                    anchors: anchor_ids,
                    distances,
                    reason: format!("estimate ({}, {}) is outside the plan", solution.x, solution.y),
                })
            }
        };

        Ok(PositionFix {
            x,
            y,
            zone: self.assign_zone(&resolved, &distances),
            method: solution.method,
        })
    }

    /// Compute a fix and append it to the tag's position history
    pub fn estimate<S>(
        &self,
        store: &S,
        tag: TagId,
        pairs: &[(AnchorId, f64); 3],
    ) -> Result<PositionEstimate, PositioningError>
    where
        S: AnchorRegistry + PositionStore + ?Sized,
    {
        let fix = self.compute(store, tag, pairs)?;
        if fix.method == SolveMethod::WeightedCentroid {
            tracing::debug!(%tag, "anchors are collinear, position is a weighted centroid");
        }

        let estimate = store.insert_position(NewPosition {
            tag,
            x: fix.x,
            y: fix.y,
            zone: fix.zone,
            timestamp: Utc::now(),
        })?;

        tracing::info!(%tag, x = estimate.x, y = estimate.y, zone = ?estimate.zone, "position recorded");
        Ok(estimate)
    }

    fn assign_zone(&self, anchors: &[AnchorPoint; 3], distances: &[f64; 3]) -> Option<ZoneId> {
        match self.zone_assignment {
            ZoneAssignment::FirstAnchor => anchors[0].zone,
            ZoneAssignment::NearestAnchor => {
                let mut nearest = 0;
                for i in 1..3 {
                    if distances[i] < distances[nearest] {
                        nearest = i;
                    }
                }
                anchors[nearest].zone
            }
        }
    }
}

fn resolve<R>(anchors: &R, id: AnchorId) -> Result<AnchorPoint, PositioningError>
where
    R: AnchorRegistry + ?Sized,
{
    anchors
        .anchor_by_id(id)?
        .ok_or(PositioningError::MissingAnchor { anchor: id })
}

fn round_cm(value: f64) -> Option<i32> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= i32::MIN as f64 && rounded <= i32::MAX as f64 {
        Some(rounded as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TagRecord;
    use crate::store::{InMemoryStore, SiteFixture};

    fn site() -> InMemoryStore {
        let mut unplaced = AnchorPoint::new(4, "D", 0, 0);
        unplaced.x = None;

        InMemoryStore::from_fixture(SiteFixture {
            anchors: vec![
                AnchorPoint::new(1, "A", 0, 0).with_zone(10),
                AnchorPoint::new(2, "B", 100, 0).with_zone(20),
                AnchorPoint::new(3, "C", 0, 100).with_zone(30),
                unplaced,
                AnchorPoint::new(5, "E", 200, 0).with_zone(50),
            ],
            tags: vec![TagRecord::new(1, "T1")],
        })
        .unwrap()
    }

    fn pairs(ids: [u32; 3], distances: [f64; 3]) -> [(AnchorId, f64); 3] {
        [
            (AnchorId(ids[0]), distances[0]),
            (AnchorId(ids[1]), distances[1]),
            (AnchorId(ids[2]), distances[2]),
        ]
    }

    #[test]
    fn test_estimate_rounds_and_uses_first_anchor_zone() {
        let store = site();
        let estimator = PositionEstimator::default();

        let estimate = estimator
            .estimate(&store, TagId(1), &pairs([1, 2, 3], [50.0, 50.0, 111.8]))
            .unwrap();

        assert_eq!((estimate.x, estimate.y), (50, 0));
        assert_eq!(estimate.zone, Some(ZoneId(10)));
        assert_eq!(store.position_count(), 1);
    }

    #[test]
    fn test_nearest_anchor_zone() {
        let store = site();
        let estimator = PositionEstimator::new(Trilateration::new(), ZoneAssignment::NearestAnchor);

        // true point (80, 10): nearest anchor is B
        let d = |x: f64, y: f64| ((x - 80.0f64).powi(2) + (y - 10.0f64).powi(2)).sqrt();
        let fix = estimator
            .compute(&store, TagId(1), &pairs([1, 2, 3], [d(0.0, 0.0), d(100.0, 0.0), d(0.0, 100.0)]))
            .unwrap();

        assert_eq!((fix.x, fix.y), (80, 10));
        assert_eq!(fix.zone, Some(ZoneId(20)));
    }

    #[test]
    fn test_missing_anchor() {
        let store = site();
        let result = PositionEstimator::default().estimate(&store, TagId(1), &pairs([1, 2, 99], [1.0, 1.0, 1.0]));

        assert_eq!(result, Err(PositioningError::MissingAnchor { anchor: AnchorId(99) }));
        assert_eq!(store.position_count(), 0);
    }

    #[test]
    fn test_anchor_without_coordinates() {
        let store = site();
        let result = PositionEstimator::default().estimate(&store, TagId(1), &pairs([1, 4, 3], [1.0, 1.0, 1.0]));

        assert_eq!(result, Err(PositioningError::IncompleteAnchorData { anchor: AnchorId(4) }));
        assert_eq!(store.position_count(), 0);
    }

    #[test]
    fn test_collinear_zero_distance_fails_without_writing() {
        let store = site();
        let result = PositionEstimator::default().estimate(&store, TagId(1), &pairs([1, 2, 5], [100.0, 0.0, 100.0]));

        assert!(matches!(result, Err(PositioningError::TriangulationFailed { .. })));
        assert_eq!(store.position_count(), 0);
    }

    #[test]
    fn test_collinear_anchors_still_produce_position() {
        let store = site();
        let estimate = PositionEstimator::default()
            .estimate(&store, TagId(1), &pairs([1, 2, 5], [100.0, 100.0, 200.0]))
            .unwrap();

        assert_eq!((estimate.x, estimate.y), (80, 0));
    }

    #[test]
    fn test_store_failure_is_reported() {
        let store = site();
        store.simulate_position_write_failure(true);
        let result = PositionEstimator::default().estimate(&store, TagId(1), &pairs([1, 2, 3], [50.0, 50.0, 111.8]));

        assert!(matches!(result, Err(PositioningError::Store(_))));
    }

    #[test]
    fn test_round_cm_bounds() {
        assert_eq!(round_cm(49.5), Some(50));
        assert_eq!(round_cm(-0.4), Some(0));
        assert_eq!(round_cm(1e12), None);
        assert_eq!(round_cm(f64::NAN), None);
    }
}
