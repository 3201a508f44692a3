use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::provider::ProviderId;

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Per-call upper bounds for outbound requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// WeatherAPI, OpenWeatherMap and AccuWeather.
    pub keyed_secs: u64,
    /// wttr.in
    pub free_secs: u64,
    pub geocode_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { keyed_secs: 10, free_secs: 15, geocode_secs: 5 }
    }
}

impl Timeouts {
    pub fn keyed(&self) -> Duration {
        Duration::from_secs(self.keyed_secs)
    }

    pub fn free(&self) -> Duration {
        Duration::from_secs(self.free_secs)
    }

    pub fn geocode(&self) -> Duration {
        Duration::from_secs(self.geocode_secs)
    }
}

/// Upstream URLs. Only worth overriding to point at a proxy or a mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub weatherapi: String,
    pub openweather: String,
    /// Base URL; the city is appended as a path segment.
    pub wttr: String,
    pub geocode: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            weatherapi: "https://api.weatherapi.com/v1/current.json".to_string(),
            openweather: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            wttr: "https://wttr.in".to_string(),
            geocode: "https://api.bigdatacloud.net/data/reverse-geocode-client".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    pub providers: HashMap<String, ProviderConfig>,

    /// How long a successful reading is reused before providers are asked again.
    pub cache_ttl_secs: u64,

    /// Language code passed to providers that localize condition text.
    pub lang: String,

    pub timeouts: Timeouts,

    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            cache_ttl_secs: 300,
            lang: "en".to_string(),
            timeouts: Timeouts::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    pub fn has_provider(&self, id: ProviderId) -> bool {
        self.providers.contains_key(id.as_str())
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.cache_ttl_secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
        chrono::Duration::seconds(secs)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay credentials and cache duration from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::apply_env`] with an injectable variable lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for &id in ProviderId::all() {
            if let Some(key) = id.env_var().and_then(|var| non_empty(var)) {
                self.providers.insert(id.as_str().to_string(), ProviderConfig { api_key: key });
            }
        }

        if let Some(raw) = non_empty("WEATHER_CACHE_DURATION") {
            self.cache_ttl_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid WEATHER_CACHE_DURATION: {raw}"))?;
        }

        Ok(())
    }

    /// Set or replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.is_empty())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();

        assert_eq!(cfg.cache_ttl(), chrono::Duration::minutes(5));
        assert_eq!(cfg.timeouts.keyed(), Duration::from_secs(10));
        assert_eq!(cfg.timeouts.free(), Duration::from_secs(15));
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn upsert_sets_api_key() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
        assert!(!cfg.is_provider_configured(ProviderId::WeatherApi));
    }

    #[test]
    fn empty_api_key_counts_as_unconfigured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, String::new());

        assert!(cfg.has_provider(ProviderId::WeatherApi));
        assert!(!cfg.is_provider_configured(ProviderId::WeatherApi));
    }

    #[test]
    fn env_overrides_keys_and_ttl() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "FROM_FILE".into());

        cfg.apply_env_from(|name| match name {
            "WEATHERAPI_KEY" => Some("WA".to_string()),
            "OPENWEATHER_API_KEY" => Some("OW".to_string()),
            "ACCUWEATHER_API_KEY" => Some("  ".to_string()),
            "WEATHER_CACHE_DURATION" => Some("60".to_string()),
            _ => None,
        })
        .expect("valid env");

        assert_eq!(cfg.provider_api_key(ProviderId::WeatherApi), Some("WA"));
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("OW"));
        assert!(!cfg.is_provider_configured(ProviderId::AccuWeather));
        assert_eq!(cfg.cache_ttl_secs, 60);
    }

    #[test]
    fn invalid_cache_duration_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_from(|name| (name == "WEATHER_CACHE_DURATION").then(|| "soon".to_string()))
            .unwrap_err();

        assert!(err.to_string().contains("Invalid WEATHER_CACHE_DURATION"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            lang = "es"

            [providers.weatherapi]
            api_key = "abc"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.lang, "es");
        assert_eq!(cfg.provider_api_key(ProviderId::WeatherApi), Some("abc"));
        assert_eq!(cfg.cache_ttl_secs, 300);
        assert_eq!(cfg.endpoints.wttr, "https://wttr.in");
    }
}
