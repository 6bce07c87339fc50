use std::env;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::RouteProvider;
use super::http::{self, HttpFailure};
use crate::RideError;
use crate::config::RoutingConfig;
use crate::error::RouteError;
use crate::models::{Coordinate, RouteSummary};

/// Fallback when no key is configured
const API_KEY_ENV: &str = "GRAPHHOPPER_API_KEY";

/// Driving distance and duration from the GraphHopper routing API
pub struct GraphHopperClient {
    client: ClientWithMiddleware,
    config: RoutingConfig,
    api_key: String,
}

impl GraphHopperClient {
    pub fn new(config: RoutingConfig) -> crate::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty()))
            .ok_or_else(|| {
                RideError::config(format!(
                    "Missing routing API key. Set routing.api_key or {API_KEY_ENV}."
                ))
            })?;

        let client = http::build_client(config.timeout(), config.max_retries)?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route?point={},{}&point={},{}&profile={}\
             &points_encoded=false&calc_points=false&key={}",
            self.config.base_url.trim_end_matches('/'),
            origin.lat,
            origin.lng,
            destination.lat,
            destination.lng,
            urlencoding::encode(&self.config.profile),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl RouteProvider for GraphHopperClient {
    #[instrument(
        skip(self, origin, destination),
        fields(origin = %origin, destination = %destination)
    )]
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteSummary, RouteError> {
        debug!("Calling the routing API");
        let url = self.route_url(origin, destination);
        let response: ApiResponse = http::get_json(&self.client, &url)
            .await
            .map_err(|failure| match failure {
                // GraphHopper answers 400 when a point cannot be snapped to a road
                HttpFailure::Status { status: 400, .. } => RouteError::NoRouteFound,
                other => RouteError::ProviderUnavailable(other.to_string()),
            })?;

        let path = response.paths.first().ok_or(RouteError::NoRouteFound)?;
        Ok(path.summary())
    }
}

#[derive(Debug, Deserialize)]
struct PathResponse {
    /// Meters
    distance: f64,
    /// Milliseconds
    time: u64,
}

impl PathResponse {
    fn summary(&self) -> RouteSummary {
        RouteSummary::new(self.distance / 1000.0, self.time as f64 / 60_000.0)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    paths: Vec<PathResponse>,
}
