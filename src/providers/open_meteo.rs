//! Open-Meteo adapters
//!
//! The geocoding search API backs both place suggestions and geocoding; the
//! forecast API backs the destination weather panel. Neither needs an API key.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, info, instrument, warn};

use super::http::{self, HttpFailure};
use super::{GeocodeProvider, SuggestionProvider, WeatherProvider};
use crate::config::{PlacesConfig, WeatherConfig};
use crate::error::{GeocodeError, SuggestionError, WeatherError};
use crate::models::{ConditionReading, Coordinate, DailyReading, Suggestion, WeatherSnapshot};

/// How many hits the geocoder inspects when matching a description
const GEOCODE_CANDIDATES: u32 = 10;

/// Today plus the five days shown in the forecast
const FORECAST_DAYS: u8 = 6;

/// Place suggestions and geocoding backed by the Open-Meteo search API
pub struct OpenMeteoPlaces {
    client: ClientWithMiddleware,
    config: PlacesConfig,
}

impl OpenMeteoPlaces {
    pub fn new(config: PlacesConfig) -> crate::Result<Self> {
        let client = http::build_client(config.timeout(), config.max_retries)?;
        Ok(Self { client, config })
    }

    fn search_url(&self, name: &str, count: u32) -> String {
        format!(
            "{}/search?name={}&count={}&language={}&format=json",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(name),
            count,
            urlencoding::encode(&self.config.language)
        )
    }

    async fn search(&self, name: &str, count: u32) -> Result<Vec<wire::Place>, HttpFailure> {
        let url = self.search_url(name, count);
        let response: wire::SearchResponse = http::get_json(&self.client, &url).await?;
        Ok(response.results.unwrap_or_default())
    }
}

#[async_trait]
impl SuggestionProvider for OpenMeteoPlaces {
    #[instrument(skip(self))]
    async fn suggest(&self, text: &str) -> Result<Vec<Suggestion>, SuggestionError> {
        let places = self
            .search(text.trim(), self.config.max_suggestions)
            .await
            .map_err(|failure| match failure.status() {
                Some(400) => SuggestionError::NoResults,
                _ => SuggestionError::ProviderUnavailable(failure.to_string()),
            })?;

        let mut suggestions: Vec<Suggestion> = Vec::with_capacity(places.len());
        for place in &places {
            let suggestion = Suggestion::new(place.label());
            if !suggestions.contains(&suggestion) {
                suggestions.push(suggestion);
            }
        }

        if suggestions.is_empty() {
            info!("No places match '{}'", text);
            return Err(SuggestionError::NoResults);
        }

        debug!("Found {} suggestions for '{}'", suggestions.len(), text);
        Ok(suggestions)
    }
}

#[async_trait]
impl GeocodeProvider for OpenMeteoPlaces {
    #[instrument(skip(self))]
    async fn geocode(&self, description: &str) -> Result<Coordinate, GeocodeError> {
        let name = description.split(',').next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(GeocodeError::AddressNotFound(description.to_string()));
        }

        // Never inspect fewer hits than were offered as suggestions
        let count = GEOCODE_CANDIDATES.max(self.config.max_suggestions);
        let places = self
            .search(name, count)
            .await
            .map_err(|failure| match failure.status() {
                Some(400) => GeocodeError::AddressNotFound(description.to_string()),
                _ => GeocodeError::ProviderUnavailable(failure.to_string()),
            })?;

        // A qualified label must match exactly; a bare name takes the top hit
        let place = match places.iter().find(|place| place.label() == description) {
            Some(place) => Some(place),
            None if !description.contains(',') => places.first(),
            None => {
                info!("No place labelled '{}' among {} hits", description, places.len());
                None
            }
        }
        .ok_or_else(|| GeocodeError::AddressNotFound(description.to_string()))?;

        let coordinate = Coordinate::new(place.latitude, place.longitude).map_err(|e| {
            warn!("Geocoder returned an unusable coordinate: {}", e);
            GeocodeError::ProviderUnavailable(e.to_string())
        })?;

        debug!("Resolved '{}' to ({})", description, coordinate);
        Ok(coordinate)
    }
}

/// Destination weather backed by the Open-Meteo forecast API
pub struct OpenMeteoWeather {
    client: ClientWithMiddleware,
    config: WeatherConfig,
}

impl OpenMeteoWeather {
    pub fn new(config: WeatherConfig) -> crate::Result<Self> {
        let client = http::build_client(config.timeout(), config.max_retries)?;
        Ok(Self { client, config })
    }

    fn forecast_url(&self, at: Coordinate) -> String {
        format!(
            "{}/forecast?latitude={}&longitude={}\
             &current=temperature_2m,apparent_temperature,relative_humidity_2m,\
             wind_speed_10m,weather_code\
             &daily=weather_code,temperature_2m_max,temperature_2m_min\
             &timezone=auto&forecast_days={}",
            self.config.base_url.trim_end_matches('/'),
            at.lat,
            at.lng,
            FORECAST_DAYS
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    #[instrument(skip(self, at), fields(lat = at.lat, lng = at.lng))]
    async fn weather(&self, at: Coordinate) -> Result<WeatherSnapshot, WeatherError> {
        if !at.is_valid() {
            return Err(WeatherError::InvalidCoordinate {
                lat: at.lat,
                lng: at.lng,
            });
        }

        let url = self.forecast_url(at);
        let response: wire::ForecastResponse = http::get_json(&self.client, &url)
            .await
            .map_err(|failure| WeatherError::ProviderUnavailable(failure.to_string()))?;

        let snapshot = response.into_snapshot()?;
        info!(
            "Weather at ({}): {}, {} forecast days",
            at,
            snapshot.current.description,
            snapshot.forecast.len()
        );
        Ok(snapshot)
    }
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn describe_weather_code(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// Open-Meteo response structures
mod wire {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct SearchResponse {
        pub results: Option<Vec<Place>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Place {
        pub name: String,
        pub latitude: f64,
        pub longitude: f64,
        pub country: Option<String>,
        pub admin1: Option<String>,
    }

    impl Place {
        /// "name, region, country" with empty and repeated parts dropped
        pub fn label(&self) -> String {
            let mut parts: Vec<&str> = Vec::with_capacity(3);
            for part in [
                Some(self.name.as_str()),
                self.admin1.as_deref(),
                self.country.as_deref(),
            ]
            .into_iter()
            .flatten()
            {
                let part = part.trim();
                if !part.is_empty() && parts.last() != Some(&part) {
                    parts.push(part);
                }
            }
            parts.join(", ")
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current: Option<Current>,
        pub daily: Option<Daily>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Current {
        pub time: String,
        pub temperature_2m: f32,
        pub apparent_temperature: f32,
        pub relative_humidity_2m: f32,
        pub wind_speed_10m: f32,
        pub weather_code: u8,
    }

    #[derive(Debug, Deserialize)]
    pub struct Daily {
        pub time: Vec<String>,
        pub weather_code: Option<Vec<Option<u8>>>,
        pub temperature_2m_max: Option<Vec<Option<f32>>>,
        pub temperature_2m_min: Option<Vec<Option<f32>>>,
    }

    impl ForecastResponse {
        pub fn into_snapshot(self) -> Result<WeatherSnapshot, WeatherError> {
            let current = self.current.ok_or_else(|| {
                WeatherError::ProviderUnavailable("no current conditions in response".to_string())
            })?;

            let observed_at = NaiveDateTime::parse_from_str(&current.time, "%Y-%m-%dT%H:%M")
                .map_or_else(|_| Utc::now(), |dt| dt.and_utc());

            let reading = ConditionReading {
                observed_at,
                temperature_c: current.temperature_2m,
                feels_like_c: current.apparent_temperature,
                humidity_pct: current.relative_humidity_2m.clamp(0.0, 100.0).round() as u8,
                wind_speed_kmh: current.wind_speed_10m,
                description: describe_weather_code(current.weather_code).to_string(),
                condition_code: Some(current.weather_code),
            };

            let forecast = self.daily.map(Daily::readings).unwrap_or_default();
            Ok(WeatherSnapshot::new(reading, forecast))
        }
    }

    impl Daily {
        /// Days after today; days with missing temperatures are skipped
        fn readings(self) -> Vec<DailyReading> {
            let value_at = |values: &Option<Vec<Option<f32>>>, i: usize| {
                values.as_ref().and_then(|v| v.get(i).copied().flatten())
            };

            self.time
                .iter()
                .enumerate()
                .skip(1)
                .filter_map(|(i, day)| {
                    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;
                    let max_c = value_at(&self.temperature_2m_max, i)?;
                    let min_c = value_at(&self.temperature_2m_min, i)?;
                    let code = self
                        .weather_code
                        .as_ref()
                        .and_then(|codes| codes.get(i).copied().flatten());
                    Some(DailyReading {
                        date,
                        min_c,
                        max_c,
                        description: code.map_or("Unknown", describe_weather_code).to_string(),
                    })
                })
                .collect()
        }
    }
}
