//! Error types and handling for `RideCast`
//!
//! Two layers live here: [`RideError`] for application-level failures
//! (configuration, validation, client construction) and one small error enum
//! per provider contract. Provider errors are values, not exceptions: the
//! component that issued a lookup stores them in its own state.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the `RideCast` application
#[derive(Error, Debug)]
pub enum RideError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API client setup errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl RideError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            RideError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            RideError::Api { .. } => {
                "Unable to set up the connection to external services.".to_string()
            }
            RideError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            RideError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            RideError::General { message } => message.clone(),
        }
    }
}

/// How the pipeline treats a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureClass {
    /// Network or service failure; the user may retry the triggering action
    Recoverable,
    /// Valid request with an empty or negative answer; never retried
    EmptyResult,
    /// A programming invariant was broken; fatal to the operation
    InvariantViolation,
}

/// Common surface of the four provider error enums
pub trait ProviderFailure: std::error::Error + Clone + Send + 'static {
    /// Classify this failure
    fn class(&self) -> FailureClass;

    /// Text suitable for rendering inline next to the affected field or panel
    fn user_message(&self) -> String;

    /// The error reported when a provider produced no answer within `limit`
    fn timed_out(limit: Duration) -> Self;
}

fn timeout_reason(limit: Duration) -> String {
    format!("no response within {:.1}s", limit.as_secs_f64())
}

/// Log a provider failure at the level its class calls for
pub fn log_failure<E: ProviderFailure>(scope: &str, error: &E) {
    match error.class() {
        FailureClass::Recoverable => tracing::warn!("{} failed: {}", scope, error),
        FailureClass::EmptyResult => tracing::info!("{}: {}", scope, error),
        FailureClass::InvariantViolation => tracing::error!("{} rejected: {}", scope, error),
    }
}

/// Place suggestion lookup failures
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SuggestionError {
    #[error("suggestion provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("no places match the query")]
    NoResults,
}

impl ProviderFailure for SuggestionError {
    fn class(&self) -> FailureClass {
        match self {
            SuggestionError::ProviderUnavailable(_) => FailureClass::Recoverable,
            SuggestionError::NoResults => FailureClass::EmptyResult,
        }
    }

    fn user_message(&self) -> String {
        match self {
            SuggestionError::ProviderUnavailable(_) => {
                "Place search is unavailable right now. Keep typing to try again.".to_string()
            }
            SuggestionError::NoResults => "No matching places.".to_string(),
        }
    }

    fn timed_out(limit: Duration) -> Self {
        SuggestionError::ProviderUnavailable(timeout_reason(limit))
    }
}

/// Geocode lookup failures
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeocodeError {
    #[error("address not found: {0}")]
    AddressNotFound(String),

    #[error("geocoding provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl ProviderFailure for GeocodeError {
    fn class(&self) -> FailureClass {
        match self {
            GeocodeError::AddressNotFound(_) => FailureClass::EmptyResult,
            GeocodeError::ProviderUnavailable(_) => FailureClass::Recoverable,
        }
    }

    fn user_message(&self) -> String {
        match self {
            GeocodeError::AddressNotFound(address) => {
                format!("Could not locate \"{address}\". Try another suggestion.")
            }
            GeocodeError::ProviderUnavailable(_) => {
                "Could not look up that place. Please select it again.".to_string()
            }
        }
    }

    fn timed_out(limit: Duration) -> Self {
        GeocodeError::ProviderUnavailable(timeout_reason(limit))
    }
}

/// Route lookup failures
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouteError {
    #[error("no route between pickup and destination")]
    NoRouteFound,

    #[error("routing provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl ProviderFailure for RouteError {
    fn class(&self) -> FailureClass {
        match self {
            RouteError::NoRouteFound => FailureClass::EmptyResult,
            RouteError::ProviderUnavailable(_) => FailureClass::Recoverable,
        }
    }

    fn user_message(&self) -> String {
        match self {
            RouteError::NoRouteFound => "No drivable route between these places.".to_string(),
            RouteError::ProviderUnavailable(_) => {
                "Failed to fetch estimate. Please try again.".to_string()
            }
        }
    }

    fn timed_out(limit: Duration) -> Self {
        RouteError::ProviderUnavailable(timeout_reason(limit))
    }
}

/// Weather lookup failures
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeatherError {
    #[error("weather provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

impl ProviderFailure for WeatherError {
    fn class(&self) -> FailureClass {
        match self {
            WeatherError::ProviderUnavailable(_) => FailureClass::Recoverable,
            WeatherError::InvalidCoordinate { .. } => FailureClass::InvariantViolation,
        }
    }

    fn user_message(&self) -> String {
        match self {
            WeatherError::ProviderUnavailable(_) => {
                "Weather data is unavailable right now.".to_string()
            }
            WeatherError::InvalidCoordinate { .. } => {
                "Weather cannot be shown for this destination.".to_string()
            }
        }
    }

    fn timed_out(limit: Duration) -> Self {
        WeatherError::ProviderUnavailable(timeout_reason(limit))
    }
}
