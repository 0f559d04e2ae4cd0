//! Favorite cities persisted to a single JSON file.
//!
//! The store assumes it is the only writer of its file; concurrent processes
//! writing the same file get last-write-wins.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::WeatherError;

/// Ordered, duplicate-free list of city names (exact, case-sensitive match).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoritesList {
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 or an offset-less ISO-8601 local time; anything else reads as `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(text)) => parse_timestamp(&text),
        _ => None,
    })
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = text.parse::<NaiveDateTime>().ok()?;
    naive.and_local_timezone(Local).earliest().map(|dt| dt.with_timezone(&Utc))
}

impl FavoritesList {
    pub fn contains(&self, city: &str) -> bool {
        self.favorites.iter().any(|c| c == city)
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.favorites.iter().map(String::as_str)
    }

    fn insert(&mut self, city: &str) -> bool {
        if self.contains(city) {
            return false;
        }
        self.favorites.push(city.to_string());
        true
    }

    fn remove(&mut self, city: &str) -> bool {
        match self.favorites.iter().position(|c| c == city) {
            Some(idx) => {
                self.favorites.remove(idx);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    cached: Option<FavoritesList>,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cached: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing or unreadable file yields an empty list.
    pub fn load(&self) -> FavoritesList {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return FavoritesList::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "could not read favorites");
                return FavoritesList::default();
            }
        };

        match serde_json::from_str::<FavoritesList>(&contents) {
            Ok(mut list) => {
                dedup_in_order(&mut list.favorites);
                list
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring unparsable favorites file"
                );
                FavoritesList::default()
            }
        }
    }

    /// Replace the file contents, stamping `last_updated` with the current time.
    pub fn save(&mut self, list: &FavoritesList) -> Result<(), WeatherError> {
        let mut list = list.clone();
        list.last_updated = Some(Utc::now());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| WeatherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(&list)
            .map_err(|e| WeatherError::Io { path: self.path.clone(), source: e.into() })?;

        fs::write(&self.path, json)
            .map_err(|source| WeatherError::Io { path: self.path.clone(), source })?;

        tracing::info!(path = %self.path.display(), count = list.len(), "saved favorites");
        self.cached = Some(list);
        Ok(())
    }

    /// The in-memory list, loaded from disk on first access.
    pub fn list(&mut self) -> &FavoritesList {
        if self.cached.is_none() {
            self.cached = Some(self.load());
        }
        self.cached.get_or_insert_with(FavoritesList::default)
    }

    /// Returns false (and writes nothing) when the city is already present.
    pub fn add(&mut self, city: &str) -> Result<bool, WeatherError> {
        let mut list = self.list().clone();
        if !list.insert(city) {
            return Ok(false);
        }
        self.save(&list)?;
        Ok(true)
    }

    /// Returns false (and writes nothing) when the city is absent.
    pub fn remove(&mut self, city: &str) -> Result<bool, WeatherError> {
        let mut list = self.list().clone();
        if !list.remove(city) {
            return Ok(false);
        }
        self.save(&list)?;
        Ok(true)
    }
}

/// Hand-edited files may carry repeats; keep the first occurrence.
fn dedup_in_order(cities: &mut Vec<String>) {
    let mut seen: Vec<String> = Vec::with_capacity(cities.len());
    cities.retain(|c| {
        if seen.contains(c) {
            false
        } else {
            seen.push(c.clone());
            true
        }
    });
}
