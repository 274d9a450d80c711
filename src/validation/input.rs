//! Shape and value checks for incoming distance readings

use crate::api::types::DistanceReading;
use crate::core::READINGS_PER_FIX;
use crate::validation::error::ApiError;

/// Reading whose distance parsed as a finite non-negative number (device units)
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReading {
    pub anchor_name: String,
    pub distance: f64,
}

/// Validate a request's readings before any lookup is made.
///
/// Entries are numbered from 1 in error messages.
pub fn parse_readings(readings: &[DistanceReading]) -> Result<[ParsedReading; 3], ApiError> {
    if readings.len() != READINGS_PER_FIX {
        return Err(ApiError::invalid(format!(
            "exactly {} anchor readings are required, got {}",
            READINGS_PER_FIX,
            readings.len()
        )));
    }

    let parse = |index: usize| -> Result<ParsedReading, ApiError> {
        let reading = &readings[index];
        let anchor_name = reading.anchor.trim();
        if anchor_name.is_empty() {
            return Err(ApiError::invalid(format!("reading #{} has no anchor name", index + 1)));
        }

        let distance = parse_distance(&reading.distance).ok_or_else(|| {
            ApiError::invalid(format!(
                "reading #{} (anchor {}): distance '{}' is not a valid non-negative number",
                index + 1,
                anchor_name,
                reading.distance
            ))
        })?;

        Ok(ParsedReading {
            anchor_name: anchor_name.to_string(),
            distance,
        })
    };

    Ok([parse(0)?, parse(1)?, parse(2)?])
}

fn parse_distance(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(anchor: &str, distance: &str) -> DistanceReading {
        DistanceReading {
            anchor: anchor.to_string(),
            distance: distance.to_string(),
        }
    }

    #[test]
    fn test_three_valid_readings() {
        let parsed = parse_readings(&[
            reading("A1", "0.50"),
            reading(" A2 ", " 1.25"),
            reading("A3", "3"),
        ])
        .unwrap();

        assert_eq!(parsed[1].anchor_name, "A2");
        assert!((parsed[1].distance - 1.25).abs() < 1e-12);
        assert_eq!(parsed[2].distance, 3.0);
    }

    #[test]
    fn test_wrong_count_rejected() {
        let result = parse_readings(&[reading("A1", "1"), reading("A2", "1")]);
        assert!(matches!(result, Err(ApiError::InvalidInput { .. })));

        let four = vec![reading("A1", "1"); 4];
        assert!(parse_readings(&four).is_err());
    }

    #[test]
    fn test_non_numeric_entry_named() {
        let result = parse_readings(&[reading("A1", "1"), reading("A2", "far"), reading("A3", "1")]);
        match result {
            Err(ApiError::InvalidInput { reason }) => {
                assert!(reason.contains("#2"));
                assert!(reason.contains("A2"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_negative_and_non_finite_rejected() {
        for bad in ["-0.1", "NaN", "inf", ""] {
            let result = parse_readings(&[reading("A1", "1"), reading("A2", "1"), reading("A3", bad)]);
            assert!(result.is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_blank_anchor_name_rejected() {
        let result = parse_readings(&[reading("A1", "1"), reading("  ", "1"), reading("A3", "1")]);
        assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
    }
}
