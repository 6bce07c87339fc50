//! Weather snapshot model and display methods

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of daily readings kept in a snapshot
pub const MAX_FORECAST_DAYS: usize = 5;

/// Current conditions at a coordinate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConditionReading {
    /// Observation time reported by the provider
    pub observed_at: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature_c: f32,
    /// Apparent ("feels like") temperature in Celsius
    pub feels_like_c: f32,
    /// Relative humidity percentage (0-100)
    pub humidity_pct: u8,
    /// Wind speed in km/h
    pub wind_speed_kmh: f32,
    /// Human-readable description of weather conditions
    pub description: String,
    /// Provider condition code, if any
    pub condition_code: Option<u8>,
}

impl ConditionReading {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.0}°C", self.temperature_c)
    }

    /// Format wind speed with unit
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.0} km/h", self.wind_speed_kmh)
    }
}

/// Forecast for one calendar day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyReading {
    pub date: NaiveDate,
    pub min_c: f32,
    pub max_c: f32,
    pub description: String,
}

impl DailyReading {
    /// "max° / min°", rounded
    #[must_use]
    pub fn format_range(&self) -> String {
        format!("{:.0}° / {:.0}°", self.max_c, self.min_c)
    }

    /// Short weekday name, e.g. "Mon"
    #[must_use]
    pub fn weekday(&self) -> String {
        self.date.format("%a").to_string()
    }
}

/// Current conditions plus a short daily forecast at the destination
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub current: ConditionReading,
    /// Ordered by date, at most [`MAX_FORECAST_DAYS`] entries
    pub forecast: Vec<DailyReading>,
}

impl WeatherSnapshot {
    /// Build a snapshot, keeping the first [`MAX_FORECAST_DAYS`] days in date order
    #[must_use]
    pub fn new(current: ConditionReading, mut forecast: Vec<DailyReading>) -> Self {
        forecast.sort_by_key(|day| day.date);
        forecast.truncate(MAX_FORECAST_DAYS);
        Self { current, forecast }
    }
}
