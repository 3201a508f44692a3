//! Binary crate for the `weather` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting
//!
//! # Environment Variables
//! - `WEATHERAPI_KEY`, `OPENWEATHER_API_KEY`, `ACCUWEATHER_API_KEY` (optional)
//!   override keys from the config file
//! - `WEATHER_CACHE_DURATION` (optional) – cache TTL in seconds
//! - `RUST_LOG` / `WEATHER_LOG_LEVEL` (optional) – log verbosity (default: `warn`)

use std::env;

use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let cmd = cli::Cli::parse();
    cmd.run().await
}

/// Install the global subscriber. Logs go to stderr so stdout carries only
/// command output (which may be JSON).
fn init_tracing() {
    // Use RUST_LOG if available, otherwise fall back to WEATHER_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("WEATHER_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("error") => "error",
            _ => "warn",
        };
        EnvFilter::new(format!("{level},reqwest=warn,hyper=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
