//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather providers behind one capability trait, tried in priority order
//! - A resolver that caches successful readings and degrades to demo data
//! - Shared domain models (queries, readings)
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod error;
pub mod geocode;
pub mod model;
pub mod provider;
pub mod resolver;

pub use config::{Config, Endpoints, ProviderConfig, Timeouts};
pub use error::ProviderError;
pub use model::{Coordinates, WeatherQuery, WeatherReading};
pub use provider::{ProviderId, WeatherProvider};
pub use resolver::WeatherResolver;
