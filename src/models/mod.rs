//! Data models for RideCast
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, suggestions and field roles
//! - Estimate: route summaries and ride estimates
//! - Weather: current conditions and daily forecast

pub mod estimate;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use estimate::{RideEstimate, RouteSummary, VehicleClass};
pub use location::{Coordinate, FieldRole, Suggestion};
pub use weather::{ConditionReading, DailyReading, WeatherSnapshot};
