use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    model::{Coordinates, DEFAULT_ICON, WeatherQuery, WeatherReading, local_clock_time},
    provider::{get_json, round_temp},
};

use super::{ProviderId, WeatherProvider};

const ID: ProviderId = ProviderId::WeatherApi;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    lang: String,
    url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, lang: &str, url: &str, http: Client) -> Self {
        Self { api_key, lang: lang.to_string(), url: url.to_string(), http }
    }

    async fn fetch_current(&self, q: &str) -> Result<WaResponse, ProviderError> {
        let request = self.http.get(&self.url).query(&[
            ("key", self.api_key.as_str()),
            ("q", q),
            ("lang", self.lang.as_str()),
        ]);

        get_json(ID, request).await
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: Option<String>,
    tz_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    code: u32,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

impl WaResponse {
    fn into_reading(
        self,
        coords: Option<Coordinates>,
        now: DateTime<Utc>,
    ) -> Result<WeatherReading, ProviderError> {
        let (location_label, provider_name) = match coords {
            Some(_) => {
                let country = self
                    .location
                    .country
                    .ok_or_else(|| ProviderError::malformed(ID, "missing location.country"))?;
                (format!("{}, {}", self.location.name, country), format!("{} (GPS)", ID.display_name()))
            }
            None => (self.location.name, ID.display_name().to_string()),
        };

        Ok(WeatherReading {
            location_label,
            temperature_c: round_temp(self.current.temp_c),
            feels_like_c: round_temp(self.current.feelslike_c),
            humidity_percent: self.current.humidity,
            condition_icon: icon_for(self.current.condition.code).to_string(),
            condition_text: self.current.condition.text,
            observed_at_local_time: local_time_in_zone(now, self.location.tz_id.as_deref()),
            retrieved_at: now,
            provider_name,
            is_demo: false,
            coordinates: coords,
        })
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ID
    }

    async fn try_fetch(&self, query: &WeatherQuery) -> Result<WeatherReading, ProviderError> {
        let q = match query {
            WeatherQuery::ByCity(name) => name.clone(),
            WeatherQuery::ByCoordinates(c) => c.to_string(),
        };

        let parsed = self.fetch_current(&q).await?;
        parsed.into_reading(query.coords(), Utc::now())
    }
}

/// HH:MM in the IANA zone `tz_id`, or on the local clock if the zone is
/// missing or unknown.
fn local_time_in_zone(now: DateTime<Utc>, tz_id: Option<&str>) -> String {
    match tz_id.map(str::parse::<Tz>) {
        Some(Ok(tz)) => now.with_timezone(&tz).format("%H:%M").to_string(),
        Some(Err(e)) => {
            tracing::debug!("WeatherAPI returned unusable tz_id: {e}");
            local_clock_time(now)
        }
        None => local_clock_time(now),
    }
}

fn icon_for(code: u32) -> &'static str {
    match code {
        1000 => "☀️",
        1003 => "⛅",
        1006 | 1009 => "☁️",
        1030 | 1135 | 1147 => "🌫️",
        1063 | 1150 | 1153 | 1180 | 1240 => "🌦️",
        1066 | 1069 | 1072 | 1204 | 1207 | 1210 | 1237 | 1249 | 1252 | 1255 | 1261 | 1264 => "🌨️",
        1087 | 1273 | 1276 | 1279 | 1282 => "⛈️",
        1114 | 1117 | 1213 | 1216 | 1219 | 1222 | 1225 | 1258 => "❄️",
        1168 | 1171 | 1183 | 1186 | 1189 | 1192 | 1195 | 1198 | 1201 | 1243 | 1246 => "🌧️",
        _ => DEFAULT_ICON,
    }
}
