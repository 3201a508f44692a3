use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{
    error::ProviderError,
    geocode::ReverseGeocoder,
    model::{DEFAULT_ICON, WeatherQuery, WeatherReading, local_clock_time},
    provider::{get_json, round_temp, title_case},
};

use super::{ProviderId, WeatherProvider};

const ID: ProviderId = ProviderId::Wttr;

/// Free, keyless last resort before demo data. Only understands place names,
/// so coordinate queries are reverse-geocoded first.
#[derive(Debug, Clone)]
pub struct WttrProvider {
    base_url: String,
    http: Client,
    geocoder: ReverseGeocoder,
}

impl WttrProvider {
    pub fn new(base_url: &str, http: Client, geocoder: ReverseGeocoder) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), http, geocoder }
    }

    fn city_url(&self, city: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::RequestFailed { provider: ID, message: e.to_string() })?;

        url.path_segments_mut()
            .map_err(|_| ProviderError::RequestFailed {
                provider: ID,
                message: format!("base URL cannot take a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .push(city);

        url.query_pairs_mut().append_pair("format", "j1");
        Ok(url)
    }

    async fn fetch_city(&self, city: &str) -> Result<WeatherReading, ProviderError> {
        let url = self.city_url(city)?;
        let parsed: WttrResponse = get_json(ID, self.http.get(url)).await?;
        parsed.into_reading(city, Utc::now())
    }
}

#[derive(Debug, Deserialize)]
struct WttrValue {
    value: String,
}

/// wttr.in reports every number as a string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WttrCurrent {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    humidity: String,
    weather_desc: Vec<WttrValue>,
    weather_code: String,
}

#[derive(Debug, Deserialize)]
struct WttrResponse {
    current_condition: Vec<WttrCurrent>,
}

impl WttrResponse {
    fn into_reading(self, city: &str, now: DateTime<Utc>) -> Result<WeatherReading, ProviderError> {
        let current = self
            .current_condition
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed(ID, "empty current_condition"))?;

        let description = current
            .weather_desc
            .into_iter()
            .next()
            .map(|d| d.value)
            .ok_or_else(|| ProviderError::malformed(ID, "empty weatherDesc"))?;

        Ok(WeatherReading {
            location_label: title_case(city),
            temperature_c: round_temp(parse_number(&current.temp_c, "temp_C")?),
            feels_like_c: round_temp(parse_number(&current.feels_like_c, "FeelsLikeC")?),
            humidity_percent: current.humidity.trim().parse().map_err(|_| {
                ProviderError::malformed(ID, format!("humidity is not a percentage: {}", current.humidity))
            })?,
            condition_text: description,
            condition_icon: icon_for(current.weather_code.trim()).to_string(),
            observed_at_local_time: local_clock_time(now),
            retrieved_at: now,
            provider_name: ID.display_name().to_string(),
            is_demo: false,
            coordinates: None,
        })
    }
}

fn parse_number(raw: &str, field: &str) -> Result<f64, ProviderError> {
    raw.trim()
        .parse()
        .map_err(|_| ProviderError::malformed(ID, format!("{field} is not a number: {raw}")))
}

#[async_trait]
impl WeatherProvider for WttrProvider {
    fn id(&self) -> ProviderId {
        ID
    }

    async fn try_fetch(&self, query: &WeatherQuery) -> Result<WeatherReading, ProviderError> {
        match query {
            WeatherQuery::ByCity(name) => self.fetch_city(name).await,
            WeatherQuery::ByCoordinates(coords) => {
                let label = self.geocoder.locality_name(*coords).await;
                let mut reading = self.fetch_city(&label).await?;
                // wttr.in never learns the coordinates; report the caller's.
                reading.coordinates = Some(*coords);
                Ok(reading)
            }
        }
    }
}

fn icon_for(code: &str) -> &'static str {
    match code {
        "113" => "☀️",
        "116" => "⛅",
        "119" | "122" => "☁️",
        "143" | "248" | "260" => "🌫️",
        "176" | "263" | "266" | "293" | "353" => "🌦️",
        "179" | "182" | "185" | "317" | "320" | "323" | "350" | "362" | "365" | "368" | "374" | "377" => "🌨️",
        "200" | "386" | "389" | "392" | "395" => "⛈️",
        "227" | "230" | "326" | "329" | "332" | "335" | "338" | "371" => "❄️",
        "281" | "284" | "296" | "299" | "302" | "305" | "308" | "311" | "314" | "356" | "359" => "🌧️",
        _ => DEFAULT_ICON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const FIXTURE: &str = r#"{"current_condition":[{"temp_C":"18","FeelsLikeC":"17","humidity":"80","weatherDesc":[{"value":"Light rain"}],"weatherCode":"296"}]}"#;

    fn provider(base_url: &str) -> WttrProvider {
        let geocoder = ReverseGeocoder::new("http://127.0.0.1:9", "en", Duration::from_secs(1))
            .expect("client builds");
        WttrProvider::new(base_url, Client::new(), geocoder)
    }

    #[test]
    fn maps_string_fields() {
        let parsed: WttrResponse = serde_json::from_str(FIXTURE).unwrap();
        let reading = parsed.into_reading("lima", Utc::now()).unwrap();

        assert_eq!(reading.location_label, "Lima");
        assert_eq!(reading.temperature_c, 18);
        assert_eq!(reading.feels_like_c, 17);
        assert_eq!(reading.humidity_percent, 80);
        assert_eq!(reading.condition_text, "Light rain");
        assert_eq!(reading.condition_icon, "🌧️");
        assert_eq!(reading.provider_name, "wttr.in (free)");
        assert!(!reading.is_demo);
    }

    #[test]
    fn non_numeric_temperature_is_malformed() {
        let parsed: WttrResponse = serde_json::from_str(&FIXTURE.replace(r#""18""#, r#""warm""#)).unwrap();
        let err = parsed.into_reading("Lima", Utc::now()).unwrap_err();
        assert!(matches!(err, ProviderError::ResponseMalformed { .. }));
    }

    #[test]
    fn city_is_a_percent_encoded_path_segment() {
        let url = provider("https://wttr.in/").city_url("San José").unwrap();
        assert_eq!(url.as_str(), "https://wttr.in/San%20Jos%C3%A9?format=j1");
    }

    #[test]
    fn fixture_codes_have_dedicated_icons() {
        for code in ["113", "116", "119", "143", "176", "179", "200", "227", "296", "389"] {
            assert_ne!(icon_for(code), DEFAULT_ICON, "code {code}");
        }
    }

    #[test]
    fn unknown_code_gets_default_icon() {
        assert_eq!(icon_for("9999"), DEFAULT_ICON);
    }
}
