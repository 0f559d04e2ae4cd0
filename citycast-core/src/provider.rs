use crate::{
    Config,
    error::WeatherError,
    model::{CityQuery, CurrentWeather, ForecastSample},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Days requested when the caller does not ask for a specific horizon.
pub const DEFAULT_FORECAST_DAYS: u32 = 5;

/// The provider returns one sample every three hours.
pub const SAMPLES_PER_DAY: u32 = 8;

/// Read-only access to a weather provider. Every call is a fresh request.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current(&self, city: &CityQuery) -> Result<CurrentWeather, WeatherError>;

    async fn forecast(
        &self,
        city: &CityQuery,
        days: u32,
    ) -> Result<Vec<ForecastSample>, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `citycast configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    let provider =
        OpenWeatherProvider::new(api_key.to_owned(), config.base_url.clone(), config.units)?;

    Ok(Box::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No OpenWeather API key configured"));
        assert!(msg.contains("Hint: run `citycast configure`"));
    }

    #[test]
    fn provider_from_config_works_when_key_set() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
