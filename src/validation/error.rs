//! Error taxonomy for ingestion and positioning

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithms::trilateration::SolverError;
use crate::core::{AnchorId, TagId};
use crate::store::StoreError;

/// Result type for operations exposed to the routing layer
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of the request as a whole; nothing was written
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Malformed request shape or values
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
    /// Referenced tag or anchor does not exist
    #[error("{entity} '{key}' not found")]
    NotFound { entity: EntityKind, key: String },
    /// Persistence failure; not retried
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ApiError::InvalidInput { reason: reason.into() }
    }

    pub fn not_found(entity: EntityKind, key: impl Into<String>) -> Self {
        ApiError::NotFound { entity, key: key.into() }
    }

    /// HTTP status the routing layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidInput { .. } => 400,
            ApiError::NotFound { .. } => 404,
            ApiError::Store(_) => 500,
        }
    }
}

/// Entity named in a `NotFound` error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Tag,
    Anchor,
    Position,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Tag => write!(f, "tag"),
            EntityKind::Anchor => write!(f, "anchor"),
            EntityKind::Position => write!(f, "position"),
        }
    }
}

/// Failure to derive a position; contained by the ingestion service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositioningError {
    #[error("anchor {anchor} does not exist")]
    MissingAnchor { anchor: AnchorId },
    #[error("anchor {anchor} has no x/y coordinates")]
    IncompleteAnchorData { anchor: AnchorId },
    #[error("triangulation failed for tag {tag} (anchors {anchors:?}, distances {distances:?}): {reason}")]
    TriangulationFailed {
        tag: TagId,
        anchors: [AnchorId; 3],
        distances: [f64; 3],
        reason: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How loudly a contained failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Site data needs attention (unknown or unplaced anchors)
    Warning,
    /// Numerical or persistence failure
    High,
}

impl PositioningError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PositioningError::MissingAnchor { .. } | PositioningError::IncompleteAnchorData { .. } => {
                ErrorSeverity::Warning
            }
            PositioningError::TriangulationFailed { .. } | PositioningError::Store(_) => ErrorSeverity::High,
        }
    }

    pub(crate) fn from_solver(
        error: SolverError,
        tag: TagId,
        anchors: [AnchorId; 3],
        distances: [f64; 3],
    ) -> Self {
        PositioningError::TriangulationFailed {
            tag,
            anchors,
            distances,
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::invalid("two readings").status_code(), 400);
        assert_eq!(ApiError::not_found(EntityKind::Anchor, "A9").status_code(), 404);
        assert_eq!(
            ApiError::from(StoreError::Unavailable("down".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_not_found_message_names_entity() {
        let error = ApiError::not_found(EntityKind::Tag, "T7");
        assert_eq!(error.to_string(), "tag 'T7' not found");
    }

    #[test]
    fn test_triangulation_failure_carries_context() {
        let error = PositioningError::from_solver(
            SolverError::ZeroDistance { slot: 2 },
            TagId(1),
            [AnchorId(1), AnchorId(2), AnchorId(3)],
            [10.0, 0.0, 30.0],
        );

        assert_eq!(error.severity(), ErrorSeverity::High);
        let message = error.to_string();
        assert!(message.contains("tag 1"));
        assert!(message.contains("distance 2 is zero"));
    }

    #[test]
    fn test_site_data_errors_are_warnings() {
        let error = PositioningError::IncompleteAnchorData { anchor: AnchorId(4) };
        assert_eq!(error.severity(), ErrorSeverity::Warning);
    }
}
