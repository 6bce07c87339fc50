//! Provider contracts
//!
//! The four lookups the pipeline depends on, expressed as injectable async
//! traits. Nothing above this module knows a provider's wire format; the
//! concrete HTTP adapters in the submodules translate payloads into the
//! shapes below.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::RideConfig;
use crate::error::{GeocodeError, ProviderFailure, RouteError, SuggestionError, WeatherError};
use crate::models::{Coordinate, RouteSummary, Suggestion, WeatherSnapshot};

pub mod graphhopper;
pub mod http;
pub mod open_meteo;

pub use graphhopper::GraphHopperClient;
pub use open_meteo::{OpenMeteoPlaces, OpenMeteoWeather};

/// Autocomplete lookup: partial text to candidate descriptions
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, text: &str) -> Result<Vec<Suggestion>, SuggestionError>;
}

/// Resolve a chosen description to a coordinate
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn geocode(&self, description: &str) -> Result<Coordinate, GeocodeError>;
}

/// Distance and duration between two coordinates
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteSummary, RouteError>;
}

/// Current conditions and forecast at a coordinate
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn weather(&self, at: Coordinate) -> Result<WeatherSnapshot, WeatherError>;
}

/// Per-provider upper bound on how long the pipeline waits for an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDeadlines {
    pub suggestions: Duration,
    pub geocode: Duration,
    pub route: Duration,
    pub weather: Duration,
}

impl Default for ProviderDeadlines {
    fn default() -> Self {
        Self::from_config(&RideConfig::default())
    }
}

impl ProviderDeadlines {
    /// Deadlines derived from the provider timeouts, plus one second of slack
    /// so the HTTP client's own timeout fires first
    #[must_use]
    pub fn from_config(config: &RideConfig) -> Self {
        let slack = Duration::from_secs(1);
        Self {
            suggestions: config.places.timeout() + slack,
            geocode: config.places.timeout() + slack,
            route: config.routing.timeout() + slack,
            weather: config.weather.timeout() + slack,
        }
    }
}

/// The set of providers a session talks to
#[derive(Clone)]
pub struct Providers {
    pub suggestions: Arc<dyn SuggestionProvider>,
    pub geocoder: Arc<dyn GeocodeProvider>,
    pub router: Arc<dyn RouteProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    pub deadlines: ProviderDeadlines,
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("deadlines", &self.deadlines)
            .finish_non_exhaustive()
    }
}

impl Providers {
    /// Build the HTTP-backed provider set from configuration
    pub fn from_config(config: &RideConfig) -> crate::Result<Self> {
        let places = Arc::new(OpenMeteoPlaces::new(config.places.clone())?);
        let router = Arc::new(GraphHopperClient::new(config.routing.clone())?);
        let weather = Arc::new(OpenMeteoWeather::new(config.weather.clone())?);

        Ok(Self {
            suggestions: places.clone(),
            geocoder: places,
            router,
            weather,
            deadlines: ProviderDeadlines::from_config(config),
        })
    }
}

/// Await a provider call, converting "no answer within `limit`" into the
/// provider's own unavailability error
pub async fn bounded<T, E, F>(limit: Duration, call: F) -> Result<T, E>
where
    E: ProviderFailure,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Provider call exceeded {:.1}s", limit.as_secs_f64());
            Err(E::timed_out(limit))
        }
    }
}
