//! Request and response types of the ingestion API

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::{DistanceTriple, PositionEstimate};

/// One anchor reading as sent by a tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceReading {
    /// External anchor name (the device's short address)
    #[serde(alias = "shortAddres", alias = "shortAddress")]
    pub anchor: String,
    /// Raw distance in device units; numbers are accepted and kept as text
    #[serde(alias = "distancia", deserialize_with = "string_or_number")]
    pub distance: String,
}

impl DistanceReading {
    pub fn new(anchor: &str, distance: &str) -> Self {
        Self {
            anchor: anchor.to_string(),
            distance: distance.to_string(),
        }
    }
}

/// Body of a `RegisterDistances` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterDistancesRequest {
    /// External tag code
    pub tag: String,
    #[serde(alias = "anchors")]
    pub readings: Vec<DistanceReading>,
}

impl RegisterDistancesRequest {
    pub fn new(tag: &str, readings: Vec<DistanceReading>) -> Self {
        Self {
            tag: tag.to_string(),
            readings,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}

/// Outcome of a `RegisterDistances` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    /// First triple stored for the tag
    Created,
    /// Significant change stored
    Updated,
    /// Change below threshold; nothing written
    Unchanged,
}

impl IngestionStatus {
    pub fn message(&self) -> &'static str {
        match self {
            IngestionStatus::Created => "distances registered",
            IngestionStatus::Updated => "distances updated",
            IngestionStatus::Unchanged => "no significant change in distances",
        }
    }

    /// HTTP status for a successful call
    pub fn status_code(&self) -> u16 {
        match self {
            IngestionStatus::Created => 201,
            IngestionStatus::Updated | IngestionStatus::Unchanged => 200,
        }
    }
}

/// Flat serialised form of a distance triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceTripleView {
    pub id: u32,
    pub tag_id: u32,
    pub anchor1_id: Option<u32>,
    pub anchor1_dist: Option<f64>,
    pub anchor2_id: Option<u32>,
    pub anchor2_dist: Option<f64>,
    pub anchor3_id: Option<u32>,
    pub anchor3_dist: Option<f64>,
}

impl From<&DistanceTriple> for DistanceTripleView {
    fn from(triple: &DistanceTriple) -> Self {
        let [s1, s2, s3] = triple.slots;
        Self {
            id: triple.id.0,
            tag_id: triple.tag.0,
            anchor1_id: s1.anchor.map(|a| a.0),
            anchor1_dist: s1.distance_cm,
            anchor2_id: s2.anchor.map(|a| a.0),
            anchor2_dist: s2.distance_cm,
            anchor3_id: s3.anchor.map(|a| a.0),
            anchor3_dist: s3.distance_cm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterDistancesResponse {
    pub status: IngestionStatus,
    pub message: String,
    pub triple: DistanceTripleView,
    /// Position derived from this call, if one was recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionEstimate>,
}

impl RegisterDistancesResponse {
    pub fn new(status: IngestionStatus, triple: &DistanceTriple, position: Option<PositionEstimate>) -> Self {
        Self {
            status,
            message: status.message().to_string(),
            triple: triple.into(),
            position,
        }
    }
}
