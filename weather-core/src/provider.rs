use crate::{
    Config, WeatherQuery, WeatherReading,
    error::ProviderError,
    geocode::ReverseGeocoder,
    provider::{
        accuweather::AccuWeatherProvider, openweather::OpenWeatherProvider,
        weatherapi::WeatherApiProvider, wttr::WttrProvider,
    },
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{fmt::Debug, time::Duration};

pub mod accuweather;
pub mod openweather;
pub mod weatherapi;
pub mod wttr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    WeatherApi,
    OpenWeather,
    AccuWeather,
    Wttr,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::OpenWeather => "openweather",
            ProviderId::AccuWeather => "accuweather",
            ProviderId::Wttr => "wttr",
        }
    }

    /// Name stamped into readings as `provider_name`.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "WeatherAPI",
            ProviderId::OpenWeather => "OpenWeatherMap",
            ProviderId::AccuWeather => "AccuWeather",
            ProviderId::Wttr => "wttr.in (free)",
        }
    }

    pub fn requires_key(&self) -> bool {
        !matches!(self, ProviderId::Wttr)
    }

    /// Environment variable that may carry this provider's API key.
    pub fn env_var(&self) -> Option<&'static str> {
        match self {
            ProviderId::WeatherApi => Some("WEATHERAPI_KEY"),
            ProviderId::OpenWeather => Some("OPENWEATHER_API_KEY"),
            ProviderId::AccuWeather => Some("ACCUWEATHER_API_KEY"),
            ProviderId::Wttr => None,
        }
    }

    /// All providers, highest priority first.
    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::WeatherApi,
            ProviderId::OpenWeather,
            ProviderId::AccuWeather,
            ProviderId::Wttr,
        ]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "openweather" => Ok(ProviderId::OpenWeather),
            "accuweather" => Ok(ProviderId::AccuWeather),
            "wttr" => Ok(ProviderId::Wttr),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: weatherapi, openweather, accuweather, wttr."
            )),
        }
    }
}

/// One upstream weather source in the fallback chain.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Whether this provider can answer `query` at all. Unsupported queries
    /// are skipped without counting as an attempt.
    fn supports(&self, _query: &WeatherQuery) -> bool {
        true
    }

    async fn try_fetch(&self, query: &WeatherQuery) -> Result<WeatherReading, ProviderError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> Result<Box<dyn WeatherProvider>, ProviderError> {
    let api_key = || {
        config
            .provider_api_key(id)
            .map(str::to_owned)
            .ok_or(ProviderError::Unavailable { provider: id })
    };

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::WeatherApi => Box::new(WeatherApiProvider::new(
            api_key()?,
            &config.lang,
            &config.endpoints.weatherapi,
            http_client(id, config.timeouts.keyed())?,
        )),
        ProviderId::OpenWeather => Box::new(OpenWeatherProvider::new(
            api_key()?,
            &config.lang,
            &config.endpoints.openweather,
            http_client(id, config.timeouts.keyed())?,
        )),
        ProviderId::AccuWeather => {
            // Only its presence gates the slot; no request is ever made.
            api_key()?;
            Box::new(AccuWeatherProvider)
        }
        ProviderId::Wttr => {
            let geocoder = ReverseGeocoder::new(
                &config.endpoints.geocode,
                &config.lang,
                config.timeouts.geocode(),
            )
            .map_err(|source| ProviderError::Client { provider: id, source })?;

            Box::new(WttrProvider::new(
                &config.endpoints.wttr,
                http_client(id, config.timeouts.free())?,
                geocoder,
            ))
        }
    };

    Ok(boxed)
}

/// Build the full fallback chain in priority order, leaving out providers
/// whose credentials are not configured.
pub fn providers_from_config(
    config: &Config,
) -> Result<Vec<Box<dyn WeatherProvider>>, ProviderError> {
    let mut chain = Vec::with_capacity(ProviderId::all().len());

    for &id in ProviderId::all() {
        match provider_from_config(id, config) {
            Ok(provider) => chain.push(provider),
            Err(err @ ProviderError::Unavailable { .. }) => tracing::debug!("skipping: {err}"),
            Err(err) => return Err(err),
        }
    }

    Ok(chain)
}

pub(crate) fn http_client(id: ProviderId, timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|source| ProviderError::Client { provider: id, source })
}

/// Send `request`, require a 2xx status and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    id: ProviderId,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let res = request.send().await.map_err(|e| ProviderError::request(id, e))?;

    let status = res.status();
    let body = res.text().await.map_err(|e| ProviderError::request(id, e))?;

    if !status.is_success() {
        return Err(ProviderError::RequestFailed {
            provider: id,
            message: format!("status {}: {}", status, truncate_body(&body)),
        });
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::malformed(id, e.to_string()))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

/// Uppercase the first letter of every word, lowercase the rest.
pub(crate) fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Providers report fractional degrees; readings carry whole ones.
pub(crate) fn round_temp(celsius: f64) -> i32 {
    celsius.round() as i32
}
