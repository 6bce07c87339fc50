//! `RideCast` - Ride estimates from free-text pickup and destination search
//!
//! Two location fields turn typed text into coordinates through place
//! suggestions and geocoding. Once both are resolved, a route lookup prices
//! the ride and a weather lookup describes the destination. Every lookup is
//! tagged so that only the answer to the latest request is ever shown.

pub mod config;
pub mod error;
pub mod estimate;
pub mod logging;
pub mod models;
pub mod pricing;
pub mod providers;
pub mod resolution;
pub mod session;

// Re-export core types for public API
pub use config::RideConfig;
pub use error::{
    FailureClass, GeocodeError, ProviderFailure, RideError, RouteError, SuggestionError,
    WeatherError,
};
pub use estimate::{EstimateCommand, EstimateOrchestrator, Panel};
pub use models::{
    ConditionReading, Coordinate, DailyReading, FieldRole, RideEstimate, RouteSummary,
    Suggestion, VehicleClass, WeatherSnapshot,
};
pub use pricing::{FarePolicy, Pricing, Tariff, VehicleClassPolicy};
pub use providers::{
    GeocodeProvider, ProviderDeadlines, Providers, RouteProvider, SuggestionProvider,
    WeatherProvider,
};
pub use resolution::{FieldError, FieldState, FieldView, LocationField, RequestToken};
pub use session::{RideSession, SessionHandle, SessionSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, RideError>;
