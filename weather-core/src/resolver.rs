//! First-success driver over the provider chain, fronted by the TTL cache.
//!
//! [`WeatherResolver::resolve`] has no failure variant: when nothing upstream
//! answers, the caller gets demo data, and demo data is never cached so the
//! next call goes back to live providers.

use chrono::{Duration, Utc};

use crate::{
    Config, WeatherQuery, WeatherReading,
    cache::ReadingCache,
    error::{ProviderError, ResolveError},
    provider::{WeatherProvider, providers_from_config},
};

#[derive(Debug)]
pub struct WeatherResolver {
    providers: Vec<Box<dyn WeatherProvider>>,
    cache: ReadingCache,
}

impl WeatherResolver {
    /// Chain is tried strictly in the given order.
    pub fn new(providers: Vec<Box<dyn WeatherProvider>>, cache_ttl: Duration) -> Self {
        Self { providers, cache: ReadingCache::new(cache_ttl) }
    }

    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let providers = providers_from_config(config)?;
        tracing::debug!(
            "Weather provider chain: [{}]",
            providers.iter().map(|p| p.id().as_str()).collect::<Vec<_>>().join(", ")
        );
        Ok(Self::new(providers, config.cache_ttl()))
    }

    pub fn cache(&self) -> &ReadingCache {
        &self.cache
    }

    pub async fn resolve_city(&self, city: &str) -> WeatherReading {
        self.resolve(&WeatherQuery::city(city)).await
    }

    pub async fn resolve_coordinates(&self, lat: f64, lon: f64) -> WeatherReading {
        self.resolve(&WeatherQuery::coordinates(lat, lon)).await
    }

    pub async fn resolve(&self, query: &WeatherQuery) -> WeatherReading {
        let key = query.cache_key();

        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!("Cache hit for {query} ({})", hit.provider_name);
            return hit;
        }

        match self.first_success(query).await {
            Ok(reading) => {
                self.cache.insert(key, reading.clone()).await;
                reading
            }
            Err(err) => {
                tracing::warn!("Serving demo data for {query}: {err}");
                WeatherReading::demo_for(query, Utc::now())
            }
        }
    }

    async fn first_success(&self, query: &WeatherQuery) -> Result<WeatherReading, ResolveError> {
        let mut attempted = 0;

        for provider in self.providers.iter().filter(|p| p.supports(query)) {
            attempted += 1;

            match provider.try_fetch(query).await {
                Ok(reading) => {
                    tracing::info!(
                        "Weather for {query} from {}: {} - {}°C",
                        reading.provider_name,
                        reading.location_label,
                        reading.temperature_c
                    );
                    return Ok(reading);
                }
                Err(err @ ProviderError::NoResult { .. }) => tracing::debug!("{err}"),
                Err(err) => tracing::warn!("Weather lookup for {query} failed: {err}"),
            }
        }

        Err(ResolveError::AllProvidersExhausted { attempted })
    }
}
