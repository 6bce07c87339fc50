//! Ride estimate model and display helpers

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distance and duration of the best route between two coordinates
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_minutes: f64,
}

impl RouteSummary {
    #[must_use]
    pub fn new(distance_km: f64, duration_minutes: f64) -> Self {
        Self {
            distance_km,
            duration_minutes,
        }
    }

    /// Both values finite and non-negative
    #[must_use]
    pub fn is_sane(&self) -> bool {
        self.distance_km.is_finite()
            && self.duration_minutes.is_finite()
            && self.distance_km >= 0.0
            && self.duration_minutes >= 0.0
    }
}

/// Vehicle class offered for a ride
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleClass {
    Economy,
    Standard,
    Premium,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 3] = [
        VehicleClass::Economy,
        VehicleClass::Standard,
        VehicleClass::Premium,
    ];

    /// Parse a class name, case-insensitively
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "economy" => Some(VehicleClass::Economy),
            "standard" => Some(VehicleClass::Standard),
            "premium" => Some(VehicleClass::Premium),
            _ => None,
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleClass::Economy => write!(f, "Economy"),
            VehicleClass::Standard => write!(f, "Standard"),
            VehicleClass::Premium => write!(f, "Premium"),
        }
    }
}

/// A complete, immutable ride estimate.
///
/// Built in one step from a [`RouteSummary`]; there is no partially filled
/// state. A newer estimate replaces the old one wholesale.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RideEstimate {
    pub vehicle_class: VehicleClass,
    /// Whole currency units
    pub price: u64,
    pub duration_minutes: f64,
    pub distance_km: f64,
    /// When the estimate was produced
    pub quoted_at: DateTime<Utc>,
}

impl RideEstimate {
    /// Trip time rounded to whole minutes
    #[must_use]
    pub fn display_minutes(&self) -> u64 {
        self.duration_minutes.max(0.0).round() as u64
    }

    /// Trip distance rounded to one decimal
    #[must_use]
    pub fn display_km(&self) -> f64 {
        (self.distance_km * 10.0).round() / 10.0
    }
}
