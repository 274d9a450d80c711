//! Distance ingestion: the `RegisterDistances` operation
//!
//! Input validation and entity resolution fail the whole request. Once the
//! distance triple is written, positioning failures are logged and contained:
//! raw telemetry is kept even when no position can be derived from it.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::api::types::{IngestionStatus, RegisterDistancesRequest, RegisterDistancesResponse};
use crate::algorithms::trilateration::Trilateration;
use crate::core::{AnchorId, DistanceSlot, TagId, TripleData, CENTIMETERS_PER_METER};
use crate::processing::gate::normalize_cm;
use crate::processing::{MeasurementGate, PositionEstimator};
use crate::store::WorkshopStore;
use crate::utils::config::ServiceConfig;
use crate::validation::error::{ApiError, ApiResult, EntityKind, ErrorSeverity, PositioningError};
use crate::validation::input::parse_readings;

/// One mutex per tag so read-gate-write sequences for the same tag never interleave.
///
/// Entries are never evicted; the map is bounded by the number of registered tags.
#[derive(Debug, Default)]
struct TagLocks {
    locks: Mutex<HashMap<TagId, Arc<Mutex<()>>>>,
}

impl TagLocks {
    fn lock_for(&self, tag: TagId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(tag).or_default().clone()
    }
}

/// Receives raw readings and drives the gate and the estimator
#[derive(Debug)]
pub struct DistanceIngestionService {
    gate: MeasurementGate,
    estimator: PositionEstimator,
    /// Multiplier from device units to stored centimeters
    distance_scale: f64,
    locks: TagLocks,
}

impl Default for DistanceIngestionService {
    fn default() -> Self {
        Self::new(MeasurementGate::default(), PositionEstimator::default(), CENTIMETERS_PER_METER)
    }
}

impl DistanceIngestionService {
    pub fn new(gate: MeasurementGate, estimator: PositionEstimator, distance_scale: f64) -> Self {
        Self {
            gate,
            estimator,
            distance_scale,
            locks: TagLocks::default(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            MeasurementGate::new(config.significant_change_cm),
            PositionEstimator::new(
                Trilateration::with_tolerance(config.singularity_tolerance),
                config.zone_assignment,
            ),
            config.distance_scale,
        )
    }

    /// Record a tag's three anchor readings and, when they changed enough, a new position.
    pub fn register_distances<S>(
        &self,
        store: &S,
        request: &RegisterDistancesRequest,
    ) -> ApiResult<RegisterDistancesResponse>
    where
        S: WorkshopStore + ?Sized,
    {
        let _span = tracing::info_span!("register_distances", tag = %request.tag).entered();

        let readings = parse_readings(&request.readings)?;

        let tag = store
            .tag_by_code(request.tag.trim())?
            .ok_or_else(|| ApiError::not_found(EntityKind::Tag, request.tag.trim()))?;

        let mut pairs = [(AnchorId(0), 0.0); 3];
        for (i, reading) in readings.iter().enumerate() {
            let anchor = store
                .anchor_by_name(&reading.anchor_name)?
                .ok_or_else(|| ApiError::not_found(EntityKind::Anchor, reading.anchor_name.as_str()))?;
            pairs[i] = (anchor.id, normalize_cm(reading.distance * self.distance_scale));
        }
        let distances = pairs.map(|(_, d)| d);

        let lock = self.locks.lock_for(tag.id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let previous = store.triple_by_tag(tag.id)?;
        if let Some(existing) = previous.as_ref() {
            if !self.gate.is_significant(Some(existing), &distances) {
                tracing::debug!(
                    deltas = ?self.gate.deltas(Some(existing), &distances),
                    threshold_cm = self.gate.threshold_cm,
                    "change below threshold"
                );
                return Ok(RegisterDistancesResponse::new(IngestionStatus::Unchanged, existing, None));
            }
        }

        let status = if previous.is_some() {
            IngestionStatus::Updated
        } else {
            IngestionStatus::Created
        };

        let triple = store.upsert_triple(TripleData {
            tag: tag.id,
            slots: pairs.map(|(anchor, distance)| DistanceSlot::new(anchor, distance)),
        })?;
        tracing::info!(triple = %triple.id, ?status, ?distances, "distance triple stored");

        let position = match self.estimator.estimate(store, tag.id, &pairs) {
            Ok(position) => Some(position),
            Err(error) => {
                report_positioning_failure(tag.id, &pairs, &error);
                None
            }
        };

        store.touch_last_communication(tag.id, Utc::now())?;

        Ok(RegisterDistancesResponse::new(status, &triple, position))
    }
}

fn report_positioning_failure(tag: TagId, pairs: &[(AnchorId, f64); 3], error: &PositioningError) {
    let anchors = pairs.map(|(anchor, _)| anchor.0);
    let distances = pairs.map(|(_, distance)| distance);
    match error.severity() {
        ErrorSeverity::Warning => {
            tracing::warn!(%tag, ?anchors, ?distances, %error, "position not recorded")
        }
        ErrorSeverity::High => {
            tracing::error!(%tag, ?anchors, ?distances, %error, "position not recorded")
        }
    }
}
