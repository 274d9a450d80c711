//! Core data types for the positioning system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Identity of a fixed UWB anchor
    AnchorId
);
entity_id!(
    /// Identity of a mobile UWB tag
    TagId
);
entity_id!(
    /// Identity of a workshop zone
    ZoneId
);
entity_id!(WorkshopId);
entity_id!(VehicleId);
entity_id!(TripleId);
entity_id!(PositionId);

/// Fixed UWB device with known coordinates (centimeters on the workshop plan)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub id: AnchorId,
    /// External name reported by devices (short address)
    pub name: String,
    #[serde(default)]
    pub mac: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    #[serde(default)]
    pub zone: Option<ZoneId>,
    #[serde(default)]
    pub workshop: Option<WorkshopId>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl AnchorPoint {
    pub fn new(id: u32, name: &str, x: i32, y: i32) -> Self {
        Self {
            id: AnchorId(id),
            name: name.to_string(),
            mac: None,
            x: Some(x),
            y: Some(y),
            zone: None,
            workshop: None,
            active: true,
        }
    }

    pub fn with_zone(mut self, zone: u32) -> Self {
        self.zone = Some(ZoneId(zone));
        self
    }

    /// Coordinates as floating point, if both are known
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x as f64, y as f64)),
            _ => None,
        }
    }
}

/// Lifecycle state of a tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStatus {
    #[default]
    Free,
    Assigned,
    Faulty,
    Retired,
    Maintenance,
}

/// Mobile UWB device attached to a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: TagId,
    /// External code used by devices to identify themselves
    pub code: String,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub status: TagStatus,
    #[serde(default)]
    pub battery: Option<u8>,
    #[serde(default)]
    pub last_communication: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vehicle: Option<VehicleId>,
}

impl TagRecord {
    pub fn new(id: u32, code: &str) -> Self {
        Self {
            id: TagId(id),
            code: code.to_string(),
            mac: None,
            status: TagStatus::Free,
            battery: None,
            last_communication: None,
            vehicle: None,
        }
    }
}

/// One (anchor, distance) pair of a triple
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DistanceSlot {
    pub anchor: Option<AnchorId>,
    pub distance_cm: Option<f64>,
}

impl DistanceSlot {
    pub fn new(anchor: AnchorId, distance_cm: f64) -> Self {
        Self {
            anchor: Some(anchor),
            distance_cm: Some(distance_cm),
        }
    }
}

/// Values written by an upsert; the store assigns the identity
#[derive(Debug, Clone, PartialEq)]
pub struct TripleData {
    pub tag: TagId,
    pub slots: [DistanceSlot; 3],
}

/// The three most recent (anchor, distance) measurements for one tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceTriple {
    pub id: TripleId,
    pub tag: TagId,
    pub slots: [DistanceSlot; 3],
}

impl DistanceTriple {
    /// Stored distances with missing values read as zero
    pub fn distances_or_zero(&self) -> [f64; 3] {
        self.slots.map(|slot| slot.distance_cm.unwrap_or(0.0))
    }
}

/// Values of a position about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub tag: TagId,
    pub x: i32,
    pub y: i32,
    pub zone: Option<ZoneId>,
    pub timestamp: DateTime<Utc>,
}

/// Persisted position of a tag; never mutated once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEstimate {
    pub id: PositionId,
    pub tag: TagId,
    pub x: i32,
    pub y: i32,
    pub zone: Option<ZoneId>,
    pub timestamp: DateTime<Utc>,
}

/// Filter for position history, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct PositionQuery {
    pub tag: Option<TagId>,
    pub zone: Option<ZoneId>,
    pub since: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl Default for PositionQuery {
    fn default() -> Self {
        Self {
            tag: None,
            zone: None,
            since: None,
            limit: crate::core::DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl PositionQuery {
    pub fn for_tag(tag: TagId) -> Self {
        Self {
            tag: Some(tag),
            ..Default::default()
        }
    }

    pub fn matches(&self, position: &PositionEstimate) -> bool {
        self.tag.map_or(true, |tag| position.tag == tag)
            && self.zone.map_or(true, |zone| position.zone == Some(zone))
            && self.since.map_or(true, |since| position.timestamp >= since)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_coordinates_require_both_axes() {
        let mut anchor = AnchorPoint::new(1, "A1", 10, 20);
        assert_eq!(anchor.coordinates(), Some((10.0, 20.0)));

        anchor.y = None;
        assert_eq!(anchor.coordinates(), None);
    }

    #[test]
    fn test_missing_distances_read_as_zero() {
        let triple = DistanceTriple {
            id: TripleId(1),
            tag: TagId(1),
            slots: [
                DistanceSlot::new(AnchorId(1), 120.0),
                DistanceSlot::default(),
                DistanceSlot::new(AnchorId(3), 80.5),
            ],
        };
        assert_eq!(triple.distances_or_zero(), [120.0, 0.0, 80.5]);
    }

    #[test]
    fn test_tag_fixture_defaults_to_free() {
        let tag: TagRecord = serde_json::from_str(r#"{ "id": 3, "code": "T3" }"#).unwrap();
        assert_eq!(tag.status, TagStatus::Free);
        assert_eq!(TagStatus::default(), TagStatus::Free);
    }

    #[test]
    fn test_anchor_fixture_defaults() {
        let json = r#"{ "id": 7, "name": "DA01", "x": 0, "y": 350 }"#;
        let anchor: AnchorPoint = serde_json::from_str(json).unwrap();
        assert_eq!(anchor.id, AnchorId(7));
        assert!(anchor.active);
        assert_eq!(anchor.zone, None);
    }

    #[test]
    fn test_position_query_filters() {
        let position = PositionEstimate {
            id: PositionId(1),
            tag: TagId(2),
            x: 0,
            y: 0,
            zone: Some(ZoneId(4)),
            timestamp: Utc::now(),
        };

        assert!(PositionQuery::for_tag(TagId(2)).matches(&position));
        assert!(!PositionQuery::for_tag(TagId(3)).matches(&position));

        let by_zone = PositionQuery {
            zone: Some(ZoneId(5)),
            ..Default::default()
        };
        assert!(!by_zone.matches(&position));
    }
}
