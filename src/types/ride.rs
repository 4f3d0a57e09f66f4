//! Ride records submitted for duration prediction

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Taxi zone identifier as sent by clients.
///
/// Trip records carry integer zone ids, but string ids are accepted too.
/// The textual form is used verbatim when building the `PU_DO` feature.
/// Floats render the way the training pipeline printed them: shortest
/// round-trip digits, a trailing `.0` for whole numbers and a signed
/// two-digit exponent outside `[1e-4, 1e16)` (`10.0`, `1e+16`, `1e-05`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationId {
    Integer(i64),
    /// Integers above `i64::MAX`
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationId::Integer(id) => write!(f, "{}", id),
            LocationId::Unsigned(id) => write!(f, "{}", id),
            LocationId::Float(id) => f.write_str(&format_float(*id)),
            LocationId::Text(id) => f.write_str(id),
        }
    }
}

fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    if value == 0.0 {
        return format!("{:?}", value);
    }

    let scientific = format!("{:e}", value);
    let exponent = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| Some((mantissa, exp.parse::<i32>().ok()?)));

    match exponent {
        Some((mantissa, exp)) if !(-4..16).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        _ => {
            let mut fixed = format!("{}", value);
            if !fixed.contains('.') {
                fixed.push_str(".0");
            }
            fixed
        }
    }
}

impl From<i64> for LocationId {
    fn from(id: i64) -> Self {
        LocationId::Integer(id)
    }
}

impl From<i32> for LocationId {
    fn from(id: i32) -> Self {
        LocationId::Integer(id.into())
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        LocationId::Text(id.to_string())
    }
}

/// A single trip to predict the duration for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Pickup zone
    #[serde(rename = "PULocationID")]
    pub pu_location_id: LocationId,

    /// Drop-off zone
    #[serde(rename = "DOLocationID")]
    pub do_location_id: LocationId,

    /// Trip distance in miles
    pub trip_distance: f64,
}

/// Reasons a ride is rejected before it reaches the model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRide {
    #[error("trip_distance must be a finite number, got {0}")]
    NonFiniteDistance(f64),

    #[error("{0} must not be empty")]
    EmptyLocation(&'static str),
}

impl Ride {
    pub fn new(
        pu_location_id: impl Into<LocationId>,
        do_location_id: impl Into<LocationId>,
        trip_distance: f64,
    ) -> Self {
        Self {
            pu_location_id: pu_location_id.into(),
            do_location_id: do_location_id.into(),
            trip_distance,
        }
    }

    /// Check the ride is something the model can score.
    pub fn validate(&self) -> Result<(), InvalidRide> {
        if !self.trip_distance.is_finite() {
            return Err(InvalidRide::NonFiniteDistance(self.trip_distance));
        }
        if is_blank(&self.pu_location_id) {
            return Err(InvalidRide::EmptyLocation("PULocationID"));
        }
        if is_blank(&self.do_location_id) {
            return Err(InvalidRide::EmptyLocation("DOLocationID"));
        }
        Ok(())
    }
}

fn is_blank(id: &LocationId) -> bool {
    matches!(id, LocationId::Text(s) if s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ride_deserialization() {
        let ride: Ride = serde_json::from_str(
            r#"{"PULocationID": 10, "DOLocationID": 50, "trip_distance": 40}"#,
        )
        .unwrap();

        assert_eq!(ride.pu_location_id, LocationId::Integer(10));
        assert_eq!(ride.do_location_id, LocationId::Integer(50));
        assert_eq!(ride.trip_distance, 40.0);
    }

    #[test]
    fn test_string_and_float_location_ids() {
        let ride: Ride = serde_json::from_str(
            r#"{"PULocationID": "JFK", "DOLocationID": 7.0, "trip_distance": 1.5}"#,
        )
        .unwrap();

        assert_eq!(ride.pu_location_id.to_string(), "JFK");
        assert_eq!(ride.do_location_id.to_string(), "7.0");
    }

    #[test]
    fn test_large_unsigned_location_id_is_exact() {
        let ride: Ride = serde_json::from_str(
            r#"{"PULocationID": 18446744073709551615, "DOLocationID": 20, "trip_distance": 1.0}"#,
        )
        .unwrap();

        assert_eq!(ride.pu_location_id, LocationId::Unsigned(u64::MAX));
        assert_eq!(ride.pu_location_id.to_string(), "18446744073709551615");
    }

    #[test]
    fn test_float_location_id_rendering() {
        let cases = [
            (10.0, "10.0"),
            (10.5, "10.5"),
            (-3.0, "-3.0"),
            (0.0, "0.0"),
            (0.0001, "0.0001"),
            (0.00001, "1e-05"),
            (1e15, "1000000000000000.0"),
            (1e16, "1e+16"),
            (1.5e16, "1.5e+16"),
            (2.5e-7, "2.5e-07"),
            (1e100, "1e+100"),
        ];

        for (value, expected) in cases {
            assert_eq!(LocationId::Float(value).to_string(), expected, "{}", value);
        }
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let result = serde_json::from_str::<Ride>(r#"{"PULocationID": 10, "trip_distance": 2.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let ride: Ride = serde_json::from_str(
            r#"{"PULocationID": 1, "DOLocationID": 2, "trip_distance": 3.0, "fare_amount": 12.5}"#,
        )
        .unwrap();
        assert_eq!(ride, Ride::new(1, 2, 3.0));
    }

    #[test]
    fn test_validation() {
        assert!(Ride::new(10, 20, 5.0).validate().is_ok());
        assert!(Ride::new(10, 20, 0.0).validate().is_ok());
        // The model scores any finite distance, including negative ones
        assert!(Ride::new(10, 20, -0.5).validate().is_ok());
        assert!(matches!(
            Ride::new(10, 20, f64::NAN).validate(),
            Err(InvalidRide::NonFiniteDistance(_))
        ));
        assert_eq!(
            Ride::new(" ", 20, 1.0).validate(),
            Err(InvalidRide::EmptyLocation("PULocationID"))
        );
    }
}
