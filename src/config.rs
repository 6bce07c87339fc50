//! Configuration management for `RideCast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::RideError;
use crate::models::VehicleClass;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `RideCast` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    /// Place search (suggestions and geocoding) configuration
    pub places: PlacesConfig,
    /// Routing API configuration
    pub routing: RoutingConfig,
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Fare and vehicle class configuration
    pub pricing: PricingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Place search settings, shared by the suggestion and geocode adapters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// Base URL of the geocoding search API
    pub base_url: String,
    /// Maximum number of suggestions per lookup
    pub max_suggestions: u32,
    /// Language for place names
    pub language: String,
    /// Shortest text that triggers a suggestion lookup
    pub min_query_chars: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
}

/// Routing API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// GraphHopper API key
    pub api_key: Option<String>,
    /// Base URL for the routing API
    pub base_url: String,
    /// Routing profile (car, bike, foot, ...)
    pub profile: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
}

/// Weather API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL for weather API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
}

/// Fare formula and vehicle class selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Price per kilometre
    pub per_km: f64,
    /// Price per minute
    pub per_minute: f64,
    /// Vehicle class policy: random, fixed or distance
    pub vehicle_policy: String,
    /// Class used by the fixed policy
    pub fixed_class: String,
    /// Distance from which the distance policy offers Standard
    pub standard_from_km: f64,
    /// Distance from which the distance policy offers Premium
    pub premium_from_km: f64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_places_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_max_suggestions() -> u32 {
    5
}

fn default_language() -> String {
    "en".to_string()
}

fn default_min_query_chars() -> u32 {
    1
}

fn default_routing_base_url() -> String {
    "https://graphhopper.com/api/1".to_string()
}

fn default_routing_profile() -> String {
    "car".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_per_km() -> f64 {
    1.5
}

fn default_per_minute() -> f64 {
    0.5
}

fn default_vehicle_policy() -> String {
    "random".to_string()
}

fn default_fixed_class() -> String {
    "standard".to_string()
}

fn default_standard_from_km() -> f64 {
    5.0
}

fn default_premium_from_km() -> f64 {
    25.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: default_places_base_url(),
            max_suggestions: default_max_suggestions(),
            language: default_language(),
            min_query_chars: default_min_query_chars(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_routing_base_url(),
            profile: default_routing_profile(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            per_km: default_per_km(),
            per_minute: default_per_minute(),
            vehicle_policy: default_vehicle_policy(),
            fixed_class: default_fixed_class(),
            standard_from_km: default_standard_from_km(),
            premium_from_km: default_premium_from_km(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl PlacesConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl RoutingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl RideConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // RIDECAST_ROUTING__API_KEY overrides routing.api_key
        builder = builder.add_source(
            Environment::with_prefix("RIDECAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: RideConfig = settings.try_deserialize().with_context(|| {
            format!(
                "Failed to deserialize configuration from {}",
                config_file.display()
            )
        })?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ridecast").join("config.toml"))
    }

    /// Apply default values to empty or zeroed configuration fields
    pub fn apply_defaults(&mut self) {
        if self.places.base_url.is_empty() {
            self.places.base_url = default_places_base_url();
        }
        if self.places.max_suggestions == 0 {
            self.places.max_suggestions = default_max_suggestions();
        }
        if self.places.language.is_empty() {
            self.places.language = default_language();
        }
        if self.places.timeout_seconds == 0 {
            self.places.timeout_seconds = default_timeout();
        }
        if self.routing.base_url.is_empty() {
            self.routing.base_url = default_routing_base_url();
        }
        if self.routing.profile.is_empty() {
            self.routing.profile = default_routing_profile();
        }
        if self.routing.timeout_seconds == 0 {
            self.routing.timeout_seconds = default_timeout();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.pricing.vehicle_policy.is_empty() {
            self.pricing.vehicle_policy = default_vehicle_policy();
        }
        if self.pricing.fixed_class.is_empty() {
            self.pricing.fixed_class = default_fixed_class();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // The key is only required once a routing client is built
        if let Some(api_key) = &self.routing.api_key {
            if api_key.is_empty() {
                return Err(RideError::config(
                    "Routing API key cannot be empty if provided. \
                     Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(RideError::config(
                    "Routing API key appears to be invalid (too short). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Places", self.places.timeout_seconds),
            ("Routing", self.routing.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
        ];
        for (name, timeout) in timeouts {
            if timeout > 300 {
                return Err(RideError::config(format!(
                    "{name} API timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        let retries = [
            ("Places", self.places.max_retries),
            ("Routing", self.routing.max_retries),
            ("Weather", self.weather.max_retries),
        ];
        for (name, max_retries) in retries {
            if max_retries > 10 {
                return Err(RideError::config(format!(
                    "{name} API max retries cannot exceed 10"
                ))
                .into());
            }
        }

        if self.places.max_suggestions > 20 {
            return Err(RideError::config("Maximum suggestions cannot exceed 20").into());
        }

        if !(self.pricing.per_km >= 0.0 && self.pricing.per_minute >= 0.0) {
            return Err(RideError::config(
                "Tariff rates must be non-negative numbers"
            ).into());
        }

        if !(0.0 <= self.pricing.standard_from_km
            && self.pricing.standard_from_km <= self.pricing.premium_from_km)
        {
            return Err(RideError::config(
                "Distance tiers must satisfy 0 <= standard_from_km <= premium_from_km"
            ).into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(RideError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(RideError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        let valid_policies = ["random", "fixed", "distance"];
        if !valid_policies.contains(&self.pricing.vehicle_policy.as_str()) {
            return Err(RideError::config(
                format!("Invalid vehicle policy '{}'. Must be one of: {}",
                    self.pricing.vehicle_policy,
                    valid_policies.join(", ")
                )
            ).into());
        }

        if VehicleClass::from_name(&self.pricing.fixed_class).is_none() {
            return Err(RideError::config(
                format!("Invalid fixed vehicle class '{}'", self.pricing.fixed_class)
            ).into());
        }

        let urls = [
            ("Places", &self.places.base_url),
            ("Routing", &self.routing.base_url),
            ("Weather", &self.weather.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(RideError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
