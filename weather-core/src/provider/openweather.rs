use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::{Coordinates, DEFAULT_ICON, WeatherQuery, WeatherReading, local_clock_time},
    provider::{get_json, round_temp, title_case},
};

use super::{ProviderId, WeatherProvider};

const ID: ProviderId = ProviderId::OpenWeather;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    lang: String,
    url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, lang: &str, url: &str, http: Client) -> Self {
        Self { api_key, lang: lang.to_string(), url: url.to_string(), http }
    }

    async fn fetch_current(&self, query: &WeatherQuery) -> Result<OwCurrentResponse, ProviderError> {
        let mut params = match query {
            WeatherQuery::ByCity(name) => vec![("q", name.clone())],
            WeatherQuery::ByCoordinates(c) => {
                vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())]
            }
        };
        params.extend([
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
            ("lang", self.lang.clone()),
        ]);

        get_json(ID, self.http.get(&self.url).query(&params)).await
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize, Default)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    /// Shift from UTC in seconds.
    timezone: Option<i64>,
}

impl OwCurrentResponse {
    fn into_reading(
        self,
        coords: Option<Coordinates>,
        now: DateTime<Utc>,
    ) -> Result<WeatherReading, ProviderError> {
        let weather = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(ID, "response contained no weather entry"))?;

        let (location_label, provider_name) = match coords {
            Some(_) => {
                let country = self
                    .sys
                    .country
                    .ok_or_else(|| ProviderError::malformed(ID, "missing sys.country"))?;
                (format!("{}, {}", self.name, country), format!("{} (GPS)", ID.display_name()))
            }
            None => (self.name, ID.display_name().to_string()),
        };

        Ok(WeatherReading {
            location_label,
            temperature_c: round_temp(self.main.temp),
            feels_like_c: round_temp(self.main.feels_like),
            humidity_percent: self.main.humidity,
            condition_text: title_case(&weather.description),
            condition_icon: icon_for(&weather.icon).to_string(),
            observed_at_local_time: local_time_at_offset(now, self.timezone),
            retrieved_at: now,
            provider_name,
            is_demo: false,
            coordinates: coords,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ID
    }

    async fn try_fetch(&self, query: &WeatherQuery) -> Result<WeatherReading, ProviderError> {
        let parsed = self.fetch_current(query).await?;
        parsed.into_reading(query.coords(), Utc::now())
    }
}

/// HH:MM at `offset_secs` from UTC; local clock when absent or out of range.
fn local_time_at_offset(now: DateTime<Utc>, offset_secs: Option<i64>) -> String {
    let offset = offset_secs
        .and_then(|secs| i32::try_from(secs).ok())
        .and_then(FixedOffset::east_opt);

    match offset {
        Some(offset) => now.with_timezone(&offset).format("%H:%M").to_string(),
        None => local_clock_time(now),
    }
}

fn icon_for(icon: &str) -> &'static str {
    match icon {
        "01d" => "☀️",
        "01n" => "🌙",
        "02d" => "⛅",
        "02n" | "03d" | "03n" | "04d" | "04n" => "☁️",
        "09d" | "09n" => "🌧️",
        "10d" | "10n" => "🌦️",
        "11d" | "11n" => "⛈️",
        "13d" | "13n" => "❄️",
        "50d" | "50n" => "🌫️",
        _ => DEFAULT_ICON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FIXTURE: &str = r#"{
        "name": "Lima",
        "sys": {"country": "PE"},
        "main": {"temp": 18.4, "feels_like": 17.5, "humidity": 82},
        "weather": [{"description": "nubes dispersas", "icon": "03d"}],
        "timezone": -18000
    }"#;

    #[test]
    fn maps_city_response() {
        let parsed: OwCurrentResponse = serde_json::from_str(FIXTURE).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 17, 5, 0).unwrap();
        let reading = parsed.into_reading(None, now).unwrap();

        assert_eq!(reading.location_label, "Lima");
        assert_eq!(reading.temperature_c, 18);
        assert_eq!(reading.feels_like_c, 18);
        assert_eq!(reading.humidity_percent, 82);
        assert_eq!(reading.condition_text, "Nubes Dispersas");
        assert_eq!(reading.condition_icon, "☁️");
        assert_eq!(reading.observed_at_local_time, "12:05");
        assert_eq!(reading.provider_name, "OpenWeatherMap");
    }

    #[test]
    fn maps_coordinate_response() {
        let parsed: OwCurrentResponse = serde_json::from_str(FIXTURE).unwrap();
        let coords = Coordinates::new(-12.05, -77.04);
        let reading = parsed.into_reading(Some(coords), Utc::now()).unwrap();

        assert_eq!(reading.location_label, "Lima, PE");
        assert_eq!(reading.provider_name, "OpenWeatherMap (GPS)");
        assert_eq!(reading.coordinates, Some(coords));
    }

    #[test]
    fn empty_weather_list_is_malformed() {
        let parsed: OwCurrentResponse = serde_json::from_str(
            r#"{"name": "Lima", "main": {"temp": 1.0, "feels_like": 1.0, "humidity": 1}, "weather": []}"#,
        )
        .unwrap();

        let err = parsed.into_reading(None, Utc::now()).unwrap_err();
        assert!(matches!(err, ProviderError::ResponseMalformed { .. }));
    }

    #[test]
    fn offset_drives_local_time() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
        assert_eq!(local_time_at_offset(now, Some(3600)), "00:30");
        assert_eq!(local_time_at_offset(now, Some(10_000_000)), local_clock_time(now));
        assert_eq!(local_time_at_offset(now, None), local_clock_time(now));
    }

    #[test]
    fn fixture_codes_have_dedicated_icons() {
        for icon in ["01d", "01n", "02d", "03d", "04n", "09d", "10n", "11d", "13d", "50n"] {
            assert_ne!(icon_for(icon), DEFAULT_ICON, "icon {icon}");
        }
    }

    #[test]
    fn unknown_code_gets_default_icon() {
        assert_eq!(icon_for("9999"), DEFAULT_ICON);
    }
}
