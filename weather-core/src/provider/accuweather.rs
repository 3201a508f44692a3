use async_trait::async_trait;

use crate::{WeatherQuery, WeatherReading, error::ProviderError};

use super::{ProviderId, WeatherProvider};

/// Placeholder slot in the chain. AccuWeather needs a location-key lookup
/// before current conditions can be fetched, which is not wired up, so every
/// attempt reports no result and the chain moves on.
#[derive(Debug, Clone)]
pub struct AccuWeatherProvider;

#[async_trait]
impl WeatherProvider for AccuWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::AccuWeather
    }

    fn supports(&self, query: &WeatherQuery) -> bool {
        matches!(query, WeatherQuery::ByCity(_))
    }

    async fn try_fetch(&self, _query: &WeatherQuery) -> Result<WeatherReading, ProviderError> {
        Err(ProviderError::NoResult {
            provider: ProviderId::AccuWeather,
            reason: "integration not implemented",
        })
    }
}
