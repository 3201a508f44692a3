use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::Password;
use weather_core::{Config, ProviderId, WeatherReading, WeatherResolver};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "weatherapi", "openweather" or "accuweather".
        provider: String,
    },

    /// Show current weather for a city.
    Show {
        /// City name.
        #[arg(default_value = "Lima")]
        city: String,

        /// Print the reading as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show current weather at a latitude/longitude pair.
    #[command(allow_negative_numbers = true)]
    Coords {
        lat: f64,
        lon: f64,

        /// Print the reading as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show { city, json } => {
                let resolver = load_resolver()?;
                let reading = resolver.resolve_city(&city).await;
                print_reading(&reading, json)
            }
            Command::Coords { lat, lon, json } => {
                let resolver = load_resolver()?;
                let reading = resolver.resolve_coordinates(lat, lon).await;
                print_reading(&reading, json)
            }
        }
    }
}

fn load_resolver() -> anyhow::Result<WeatherResolver> {
    let mut config = Config::load()?;
    config.apply_env()?;

    let configured: Vec<_> = ProviderId::all()
        .iter()
        .filter(|id| config.is_provider_configured(**id))
        .map(|id| id.as_str())
        .collect();
    tracing::debug!(
        "Configuration loaded: keys for [{}], cache TTL {}s, lang {}",
        configured.join(", "),
        config.cache_ttl_secs,
        config.lang
    );

    WeatherResolver::from_config(&config).context("Failed to set up weather providers")
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    if !id.requires_key() {
        println!("{id} needs no API key; nothing to configure.");
        return Ok(());
    }

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let mut config = Config::load()?;
    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;

    println!("Saved {id} credentials to {}", Config::config_file_path()?.display());
    Ok(())
}

fn print_reading(reading: &WeatherReading, json: bool) -> anyhow::Result<()> {
    if json {
        let out = serde_json::to_string_pretty(reading).context("Failed to serialize reading")?;
        println!("{out}");
    } else {
        println!("{}", render(reading));
    }
    Ok(())
}

fn render(reading: &WeatherReading) -> String {
    let mut lines = vec![
        format!(
            "{} {}  {}°C (feels like {}°C)",
            reading.condition_icon,
            reading.location_label,
            reading.temperature_c,
            reading.feels_like_c
        ),
        format!("{}, humidity {}%", reading.condition_text, reading.humidity_percent),
    ];

    if let Some(coords) = reading.coordinates {
        lines.push(format!("Coordinates: {}, {}", coords.lat, coords.lon));
    }

    lines.push(format!(
        "Observed {} local, fetched {} via {}",
        reading.observed_at_local_time,
        reading.retrieved_at.with_timezone(&Local).format("%H:%M:%S"),
        reading.provider_name
    ));

    if reading.is_demo {
        lines.push(
            "Demo data: no provider answered. Run `weather configure <provider>` to add API keys."
                .to_string(),
        );
    }

    lines.join("\n")
}
