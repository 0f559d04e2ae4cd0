//! Core library for `citycast`.
//!
//! This crate defines:
//! - Configuration (API key, base URL, unit system, favorites location)
//! - The weather provider abstraction and its OpenWeather implementation
//! - Aggregation of 3-hour forecasts into daily summaries
//! - The persisted favorites list
//! - A session type tying these together for a front end
//!
//! It is used by `citycast-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod favorites;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod session;

pub use config::Config;
pub use error::WeatherError;
pub use favorites::{FavoritesList, FavoritesStore};
pub use forecast::{DailySummary, TemperatureStats, aggregate};
pub use model::{CityQuery, CurrentWeather, ForecastSample, Units};
pub use provider::{WeatherProvider, provider_from_config};
pub use session::{SessionError, Snapshot, WeatherSession};
