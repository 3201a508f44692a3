use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used for coordinate queries that could not be named.
pub const CURRENT_LOCATION_LABEL: &str = "Current location";

/// Glyph for condition codes a provider table does not know.
pub const DEFAULT_ICON: &str = "🌤️";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lon)
    }
}

/// What the caller wants weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    ByCity(String),
    ByCoordinates(Coordinates),
}

impl WeatherQuery {
    pub fn city(name: impl Into<String>) -> Self {
        Self::ByCity(name.into())
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self::ByCoordinates(Coordinates::new(lat, lon))
    }

    /// Key under which a successful reading for this query is cached.
    pub fn cache_key(&self) -> String {
        match self {
            Self::ByCity(name) => format!("weather_{name}"),
            Self::ByCoordinates(c) => format!("weather_{}_{}", c.lat, c.lon),
        }
    }

    pub fn coords(&self) -> Option<Coordinates> {
        match self {
            Self::ByCity(_) => None,
            Self::ByCoordinates(c) => Some(*c),
        }
    }
}

impl fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByCity(name) => write!(f, "city '{name}'"),
            Self::ByCoordinates(c) => write!(f, "coordinates ({c})"),
        }
    }
}

/// Normalized weather snapshot, independent of the provider that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub location_label: String,
    pub temperature_c: i32,
    pub feels_like_c: i32,
    pub humidity_percent: u8,
    pub condition_text: String,
    pub condition_icon: String,
    /// HH:MM at the location when the provider tells us its timezone.
    pub observed_at_local_time: String,
    pub retrieved_at: DateTime<Utc>,
    pub provider_name: String,
    pub is_demo: bool,
    #[serde(flatten)]
    pub coordinates: Option<Coordinates>,
}

impl WeatherReading {
    /// Fixed placeholder reading served when no provider could answer.
    pub fn demo(label: &str, now: DateTime<Utc>) -> Self {
        Self {
            location_label: label.to_string(),
            temperature_c: 22,
            feels_like_c: 24,
            humidity_percent: 65,
            condition_text: "Partly Cloudy".to_string(),
            condition_icon: "⛅".to_string(),
            observed_at_local_time: local_clock_time(now),
            retrieved_at: now,
            provider_name: "Demo".to_string(),
            is_demo: true,
            coordinates: None,
        }
    }

    /// Demo reading shaped for `query`: labelled with the city, or stamped
    /// with the input coordinates.
    pub fn demo_for(query: &WeatherQuery, now: DateTime<Utc>) -> Self {
        match query {
            WeatherQuery::ByCity(name) => Self::demo(name, now),
            WeatherQuery::ByCoordinates(c) => Self {
                coordinates: Some(*c),
                ..Self::demo(CURRENT_LOCATION_LABEL, now)
            },
        }
    }
}

/// HH:MM on this machine's clock.
pub fn local_clock_time(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local).format("%H:%M").to_string()
}
