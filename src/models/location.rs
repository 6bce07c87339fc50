//! Location model: coordinates, place suggestions and field roles

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RideError;

/// Geographic coordinate in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude, -90..=90
    pub lat: f64,
    /// Longitude, -180..=180
    pub lng: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting values outside the valid ranges
    pub fn new(lat: f64, lng: f64) -> crate::Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(RideError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }

        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(RideError::validation(format!(
                "Longitude must be between -180 and 180, got: {lng}"
            )));
        }

        Ok(Self { lat, lng })
    }

    /// Whether both components are inside the valid ranges.
    ///
    /// Values built through [`Coordinate::new`] always are; the fields are
    /// public, so adapters re-check before sending them anywhere.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Format as "lat, lng" with four decimals
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_coordinates())
    }
}

/// A candidate place returned by the suggestion provider.
///
/// The description is an opaque label; it carries no coordinates until it is
/// explicitly resolved through the geocoder.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Suggestion {
    pub description: String,
}

impl Suggestion {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl From<&str> for Suggestion {
    fn from(description: &str) -> Self {
        Self::new(description)
    }
}

/// Which of the two location inputs a field plays
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    Pickup,
    Destination,
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRole::Pickup => write!(f, "pickup"),
            FieldRole::Destination => write!(f, "destination"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_coordinate_format() {
        let coordinate = Coordinate::new(6.4541, 3.3947).unwrap();
        assert_eq!(coordinate.format_coordinates(), "6.4541, 3.3947");
        assert_eq!(coordinate.to_string(), "6.4541, 3.3947");
    }

    #[rstest]
    #[case(90.0, 180.0)]
    #[case(-90.0, -180.0)]
    #[case(0.0, 0.0)]
    fn test_coordinate_accepts_bounds(#[case] lat: f64, #[case] lng: f64) {
        assert!(Coordinate::new(lat, lng).is_ok());
    }

    #[rstest]
    #[case(91.0, 8.0)]
    #[case(-91.0, 8.0)]
    #[case(46.0, 181.0)]
    #[case(46.0, -181.0)]
    #[case(f64::NAN, 0.0)]
    fn test_coordinate_rejects_out_of_range(#[case] lat: f64, #[case] lng: f64) {
        let err = Coordinate::new(lat, lng).unwrap_err();
        assert!(matches!(err, RideError::Validation { .. }));
    }

    #[test]
    fn test_is_valid_on_raw_struct() {
        let raw = Coordinate { lat: 120.0, lng: 0.0 };
        assert!(!raw.is_valid());
    }

    #[test]
    fn test_field_role_serializes_lowercase() {
        let json = serde_json::to_string(&FieldRole::Destination).unwrap();
        assert_eq!(json, "\"destination\"");
    }
}
