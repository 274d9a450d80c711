use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::core::{CENTIMETERS_PER_METER, DEFAULT_SIGNIFICANT_CHANGE_CM, DEFAULT_SINGULARITY_TOLERANCE};
use crate::processing::ZoneAssignment;
use crate::utils::logging::LogConfig;

/// Service-wide configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Per-anchor distance change (cm) that triggers recomputation
    pub significant_change_cm: f64,
    /// Multiplier from device distance units to stored centimeters
    pub distance_scale: f64,
    /// Relative determinant tolerance for the trilateration solver
    pub singularity_tolerance: f64,
    /// Zone recorded with new positions
    pub zone_assignment: ZoneAssignment,
    /// Logging output
    pub logging: LogConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            significant_change_cm: DEFAULT_SIGNIFICANT_CHANGE_CM,
            distance_scale: CENTIMETERS_PER_METER,
            singularity_tolerance: DEFAULT_SINGULARITY_TOLERANCE,
            zone_assignment: ZoneAssignment::FirstAnchor,
            logging: LogConfig::default(),
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("failed to access '{path}': {message}")]
    Io { path: String, message: String },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn invalid(parameter: &str, value: f64, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl ServiceConfig {
    /// Load and validate configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path_str,
            message: e.to_string(),
        })?;

        let config: ServiceConfig = serde_json::from_str(&content)?;
        config.validate_strict()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !self.significant_change_cm.is_finite() || self.significant_change_cm <= 0.0 {
            result.errors.push(invalid(
                "significant_change_cm",
                self.significant_change_cm,
                "threshold must be a positive number of centimeters",
            ));
        } else if self.significant_change_cm > 500.0 {
            result
                .warnings
                .push("thresholds above 5 m will hide most vehicle movements inside a workshop".to_string());
        }

        if !self.distance_scale.is_finite() || self.distance_scale <= 0.0 {
            result.errors.push(invalid(
                "distance_scale",
                self.distance_scale,
                "scale must be a positive multiplier",
            ));
        }

        if !self.singularity_tolerance.is_finite() || self.singularity_tolerance < 0.0 {
            result.errors.push(invalid(
                "singularity_tolerance",
                self.singularity_tolerance,
                "tolerance must be zero or positive",
            ));
        } else if self.singularity_tolerance > 0.1 {
            result
                .warnings
                .push("large singularity tolerance sends well-spread anchors to the centroid fallback".to_string());
        }

        result
    }

    /// Fail on the first validation error; warnings are logged
    pub fn validate_strict(&self) -> Result<(), ConfigError> {
        let result = self.validate();
        for warning in &result.warnings {
            tracing::warn!("configuration: {}", warning);
        }
        match result.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
