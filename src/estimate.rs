//! Estimate orchestration
//!
//! Watches the pair of resolved coordinates and decides when a route and a
//! destination weather lookup are due. Like the fields, the orchestrator is
//! I/O free: [`EstimateOrchestrator::sync`] returns the lookups to issue and
//! their results are fed back with the token they carried.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RouteError, WeatherError, log_failure};
use crate::models::{Coordinate, RideEstimate, RouteSummary, WeatherSnapshot};
use crate::pricing::Pricing;
use crate::resolution::{Generation, RequestToken};

/// One independently updated result area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Panel<T, E> {
    Idle,
    Loading,
    Ready(T),
    Failed(E),
}

impl<T, E> Default for Panel<T, E> {
    fn default() -> Self {
        Panel::Idle
    }
}

impl<T, E> Panel<T, E> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Panel::Loading)
    }

    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&E> {
        match self {
            Panel::Failed(error) => Some(error),
            _ => None,
        }
    }
}

pub type EstimatePanel = Panel<RideEstimate, RouteError>;
pub type WeatherPanel = Panel<WeatherSnapshot, WeatherError>;

/// A lookup the orchestrator wants issued
#[derive(Debug, Clone, PartialEq)]
pub enum EstimateCommand {
    FetchRoute {
        token: RequestToken,
        origin: Coordinate,
        destination: Coordinate,
    },
    FetchWeather {
        token: RequestToken,
        at: Coordinate,
    },
}

/// Derives the estimate and weather panels from the two resolved fields
#[derive(Debug)]
pub struct EstimateOrchestrator {
    pricing: Pricing,
    pair: Option<(Coordinate, Coordinate)>,
    route_generation: Generation,
    weather_generation: Generation,
    active_route: Option<RequestToken>,
    active_weather: Option<RequestToken>,
    estimate: EstimatePanel,
    weather: WeatherPanel,
}

impl EstimateOrchestrator {
    #[must_use]
    pub fn new(pricing: Pricing) -> Self {
        Self {
            pricing,
            pair: None,
            route_generation: Generation::default(),
            weather_generation: Generation::default(),
            active_route: None,
            active_weather: None,
            estimate: Panel::Idle,
            weather: Panel::Idle,
        }
    }

    /// Reconcile with the current resolutions.
    ///
    /// Losing either resolution clears both panels at once. A changed pair
    /// re-issues the route lookup; weather is re-issued only when the
    /// destination moved.
    pub fn sync(
        &mut self,
        pickup: Option<Coordinate>,
        destination: Option<Coordinate>,
    ) -> Vec<EstimateCommand> {
        let (Some(origin), Some(target)) = (pickup, destination) else {
            self.clear();
            return Vec::new();
        };

        if self.pair == Some((origin, target)) {
            return Vec::new();
        }

        let destination_moved = self.pair.is_none_or(|(_, previous)| previous != target);
        self.pair = Some((origin, target));

        let mut commands = Vec::with_capacity(2);

        let token = self.route_generation.next();
        self.active_route = Some(token);
        self.estimate = Panel::Loading;
        debug!("Route lookup {} from ({}) to ({})", token, origin, target);
        commands.push(EstimateCommand::FetchRoute {
            token,
            origin,
            destination: target,
        });

        if destination_moved {
            let token = self.weather_generation.next();
            self.active_weather = Some(token);
            self.weather = Panel::Loading;
            debug!("Weather lookup {} at ({})", token, target);
            commands.push(EstimateCommand::FetchWeather { token, at: target });
        }

        commands
    }

    fn clear(&mut self) {
        if self.pair.take().is_some() {
            debug!("Resolution lost, clearing estimate and weather");
        }
        self.active_route = None;
        self.active_weather = None;
        self.estimate = Panel::Idle;
        self.weather = Panel::Idle;
    }

    /// Apply a route response. Returns false when the response was stale.
    pub fn on_route_received(
        &mut self,
        token: RequestToken,
        result: Result<RouteSummary, RouteError>,
    ) -> bool {
        if self.active_route != Some(token) {
            debug!("Dropping stale route {}", token);
            return false;
        }
        self.active_route = None;

        let result = result.and_then(|route| {
            if route.is_sane() {
                Ok(route)
            } else {
                Err(RouteError::ProviderUnavailable(format!(
                    "invalid route summary: {:.3} km, {:.3} min",
                    route.distance_km, route.duration_minutes
                )))
            }
        });

        self.estimate = match result {
            Ok(route) => {
                let estimate = self.pricing.quote(&route);
                debug!(
                    "Estimate {} for {:.1} km / {:.0} min: {}",
                    token, route.distance_km, route.duration_minutes, estimate.price
                );
                Panel::Ready(estimate)
            }
            Err(e) => {
                log_failure("Route estimate", &e);
                Panel::Failed(e)
            }
        };
        true
    }

    /// Apply a weather response. Returns false when the response was stale.
    pub fn on_weather_received(
        &mut self,
        token: RequestToken,
        result: Result<WeatherSnapshot, WeatherError>,
    ) -> bool {
        if self.active_weather != Some(token) {
            debug!("Dropping stale weather {}", token);
            return false;
        }
        self.active_weather = None;

        self.weather = match result {
            Ok(snapshot) => Panel::Ready(snapshot),
            Err(e) => {
                log_failure("Destination weather", &e);
                Panel::Failed(e)
            }
        };
        true
    }

    #[must_use]
    pub fn estimate(&self) -> &EstimatePanel {
        &self.estimate
    }

    #[must_use]
    pub fn weather(&self) -> &WeatherPanel {
        &self.weather
    }
}
