use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    error::WeatherError,
    model::{CityQuery, CurrentWeather, ForecastSample, Units},
};

use super::{SAMPLES_PER_DAY, WeatherProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    units: Units,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String, units: Units) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            units,
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &CityQuery,
        extra: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut query: Vec<(&str, String)> = vec![
            ("q", city.as_str().to_string()),
            ("appid", self.api_key.clone()),
            ("units", self.units.as_str().to_string()),
        ];
        query.extend(extra.iter().cloned());

        tracing::debug!(%url, city = %city, "requesting OpenWeather {endpoint}");

        let res = self.http.get(&url).query(&query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| WeatherError::MalformedResponse(format!("OpenWeather {endpoint}: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: Option<f64>,
    humidity: u8,
    #[serde(default)]
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
    #[serde(default)]
    sunrise: i64,
    #[serde(default)]
    sunset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct OwCoord {
    #[serde(default)]
    lat: f64,
    #[serde(default)]
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    clouds: Option<OwClouds>,
    visibility: Option<u32>,
    #[serde(default)]
    sys: OwSys,
    #[serde(default)]
    coord: OwCoord,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current(&self, city: &CityQuery) -> Result<CurrentWeather, WeatherError> {
        let parsed: OwCurrentResponse = self.get_json("weather", city, &[]).await?;

        Ok(CurrentWeather {
            city: parsed.name,
            country: parsed.sys.country,
            observed_at: unix_to_utc(parsed.dt)?,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like.unwrap_or(parsed.main.temp),
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            wind_speed: parsed.wind.speed,
            wind_deg: parsed.wind.deg,
            cloudiness_pct: parsed.clouds.map(|c| c.all),
            visibility_m: parsed.visibility,
            sunrise: parsed.sys.sunrise,
            sunset: parsed.sys.sunset,
            lat: parsed.coord.lat,
            lon: parsed.coord.lon,
            condition: condition_of(&parsed.weather),
        })
    }

    async fn forecast(
        &self,
        city: &CityQuery,
        days: u32,
    ) -> Result<Vec<ForecastSample>, WeatherError> {
        let count = days.saturating_mul(SAMPLES_PER_DAY);
        let parsed: OwForecastResponse =
            self.get_json("forecast", city, &[("cnt", count.to_string())]).await?;

        parsed
            .list
            .into_iter()
            .map(|entry| {
                Ok(ForecastSample {
                    time: unix_to_utc(entry.dt)?,
                    temperature: entry.main.temp,
                    humidity_pct: entry.main.humidity,
                    wind_speed: entry.wind.speed,
                    condition: condition_of(&entry.weather),
                })
            })
            .collect()
    }
}

fn condition_of(weather: &[OwWeather]) -> String {
    weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| WeatherError::MalformedResponse(format!("timestamp out of range: {ts}")))
}

/// Prefer the provider's own `message` field, else a shortened raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
