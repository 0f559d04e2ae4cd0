//! Per-session state: the city being looked at, its latest snapshot, and the
//! favorites store.

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::{collections::BTreeMap, fmt::Write as _};

use crate::{
    Config,
    error::WeatherError,
    favorites::{FavoritesList, FavoritesStore},
    forecast::{self, DailySummary, TemperatureStats},
    model::{CityQuery, CurrentWeather, ForecastSample, Units},
    provider::{DEFAULT_FORECAST_DAYS, WeatherProvider, provider_from_config},
};

pub const NO_DATA_MESSAGE: &str = "No weather data available";

const MAX_RECENT_SEARCHES: usize = 10;

/// Errors surfaced to the presentation layer, always naming the city involved.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not fetch weather for {city}: {source}")]
    Fetch {
        city: String,
        #[source]
        source: WeatherError,
    },

    #[error("could not update favorites with {city}: {source}")]
    Favorites {
        city: String,
        #[source]
        source: WeatherError,
    },
}

/// Weather for one city, replaced as a whole on every successful search.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub city: CityQuery,
    pub current: CurrentWeather,
    pub forecast: Vec<ForecastSample>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct WeatherSession {
    provider: Box<dyn WeatherProvider>,
    favorites: FavoritesStore,
    units: Units,
    snapshot: Option<Snapshot>,
    recent: Vec<String>,
}

impl WeatherSession {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        favorites: FavoritesStore,
        units: Units,
    ) -> Self {
        Self { provider, favorites, units, snapshot: None, recent: Vec::new() }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        let favorites = FavoritesStore::new(config.favorites_path()?);
        Ok(Self::new(provider, favorites, config.units))
    }

    /// Fetch current conditions and the forecast for `city`.
    ///
    /// The previous snapshot is kept as-is unless both requests succeed.
    pub async fn search_city(&mut self, city: &str) -> Result<&Snapshot, SessionError> {
        let fetch_err = |source| SessionError::Fetch { city: city.to_string(), source };

        let query = CityQuery::new(city).map_err(fetch_err)?;
        let current = self.provider.current(&query).await.map_err(fetch_err)?;
        let forecast = self
            .provider
            .forecast(&query, DEFAULT_FORECAST_DAYS)
            .await
            .map_err(fetch_err)?;

        tracing::info!(city = %query, samples = forecast.len(), "weather snapshot replaced");
        self.remember_search(city);

        Ok(&*self.snapshot.insert(Snapshot {
            city: query,
            current,
            forecast,
            fetched_at: Utc::now(),
        }))
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn current_city(&self) -> Option<&CityQuery> {
        self.snapshot.as_ref().map(|s| &s.city)
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Add `city`, or the current city when none is given.
    ///
    /// Returns false when it was already a favorite or there is no city at all.
    /// A blank `city` is rejected with a validation error.
    pub fn add_current_to_favorites(&mut self, city: Option<&str>) -> Result<bool, SessionError> {
        let query = match city {
            Some(city) => CityQuery::new(city).map_err(|source| SessionError::Favorites {
                city: city.to_string(),
                source,
            })?,
            None => match self.current_city() {
                Some(current) => current.clone(),
                None => return Ok(false),
            },
        };

        self.favorites
            .add(query.as_str())
            .map_err(|source| SessionError::Favorites { city: query.to_string(), source })
    }

    pub fn remove_favorite(&mut self, city: &str) -> Result<bool, SessionError> {
        self.favorites
            .remove(city)
            .map_err(|source| SessionError::Favorites { city: city.to_string(), source })
    }

    pub fn favorites(&mut self) -> FavoritesList {
        self.favorites.list().clone()
    }

    /// Daily buckets of the current forecast, at most `days` of them.
    pub fn daily_forecast(&self, days: usize) -> BTreeMap<NaiveDate, DailySummary> {
        match &self.snapshot {
            Some(s) => forecast::first_days(forecast::aggregate(&s.forecast), days),
            None => BTreeMap::new(),
        }
    }

    pub fn forecast_stats(&self) -> Option<TemperatureStats> {
        self.snapshot.as_ref().and_then(|s| forecast::temperature_stats(&s.forecast))
    }

    /// Previously searched cities, newest first.
    pub fn recent_searches(&self, n: usize) -> Vec<&str> {
        self.recent.iter().rev().take(n).map(String::as_str).collect()
    }

    fn remember_search(&mut self, city: &str) {
        if self.recent.iter().any(|c| c == city) {
            return;
        }
        self.recent.push(city.to_string());
        if self.recent.len() > MAX_RECENT_SEARCHES {
            self.recent.remove(0);
        }
    }

    /// Human-readable description of the current snapshot.
    pub fn format_summary(&self) -> String {
        let Some(snapshot) = &self.snapshot else {
            return NO_DATA_MESSAGE.to_string();
        };
        let w = &snapshot.current;
        let t = self.units.temperature_symbol();

        let mut out = String::new();
        let place = if w.country.is_empty() {
            w.city.clone()
        } else {
            format!("{}, {}", w.city, w.country)
        };
        let _ = writeln!(out, "Current Weather in {place}:");
        let _ = writeln!(
            out,
            "Temperature: {:.1}{t} (feels like {:.1}{t})",
            w.temperature, w.feels_like
        );
        let _ = writeln!(out, "Conditions: {}", title_case(&w.condition));
        let _ = writeln!(out, "Humidity: {}%", w.humidity_pct);
        let _ = writeln!(out, "Pressure: {} hPa", w.pressure_hpa);

        let wind = self.units.wind_speed_symbol();
        match w.wind_deg {
            Some(deg) => {
                let _ = writeln!(out, "Wind: {} {wind} from {deg}°", w.wind_speed);
            }
            None => {
                let _ = writeln!(out, "Wind: {} {wind}", w.wind_speed);
            }
        }
        if let Some(clouds) = w.cloudiness_pct {
            let _ = writeln!(out, "Cloudiness: {clouds}%");
        }
        if let Some(visibility) = w.visibility_m {
            let _ = writeln!(out, "Visibility: {:.1} km", f64::from(visibility) / 1000.0);
        }
        if let (Some(rise), Some(set)) = (local_clock(w.sunrise), local_clock(w.sunset)) {
            let _ = writeln!(out, "Sunrise: {rise}  Sunset: {set}");
        }
        let _ = write!(out, "Coordinates: {:.2}, {:.2}", w.lat, w.lon);
        out
    }
}

fn local_clock(epoch: i64) -> Option<String> {
    if epoch == 0 {
        return None;
    }
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M").to_string())
}

/// "light rain" -> "Light Rain"
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
