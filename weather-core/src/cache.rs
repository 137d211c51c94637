//! Last-known-good weather store.
//!
//! One JSON file per logical key. Writes go to a temp file in the same
//! directory and are renamed over the slot, so a reader sees either the old or
//! the new value.

use serde::{Serialize, de::DeserializeOwned};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};
use thiserror::Error;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fixed cache slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    CurrentWeather,
    WeeklyWeather,
    ResolvedPlaceName,
}

impl CacheKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::CurrentWeather => "current-weather",
            CacheKey::WeeklyWeather => "weekly-weather",
            CacheKey::ResolvedPlaceName => "resolved-place-name",
        }
    }

    pub const fn all() -> &'static [CacheKey] {
        &[
            CacheKey::CurrentWeather,
            CacheKey::WeeklyWeather,
            CacheKey::ResolvedPlaceName,
        ]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize cache entry '{key}': {source}")]
    Serialize {
        key: CacheKey,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct WeatherCache {
    dir: PathBuf,
}

impl WeatherCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    /// Persist `value` under `key`, replacing whatever was there.
    pub fn write<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<(), CacheError> {
        let payload = serde_json::to_vec_pretty(value)
            .map_err(|source| CacheError::Serialize { key, source })?;

        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!(
            ".{}.{}-{}.tmp",
            key.as_str(),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let result = write_then_rename(&tmp_path, &path, &payload);
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result.map_err(|source| CacheError::Io { path, source })?;

        tracing::debug!(key = %key, "cache entry written");
        Ok(())
    }

    /// Last value written under `key`. Missing and corrupt slots both read as
    /// `None`; corruption is only logged.
    pub fn read<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let path = self.path_for(key);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(key = %key, "cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %key, "failed to read cache entry {}: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                tracing::debug!(key = %key, "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, "ignoring corrupt cache entry {}: {e}", path.display());
                None
            }
        }
    }
}

fn write_then_rename(tmp_path: &Path, path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(tmp_path)?;
    file.write_all(payload)?;
    file.sync_all()?;
    fs::rename(tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DailyForecastEntry, GeoCoordinate, WeeklyForecast};
    use std::sync::Arc;

    fn weekly(avg: f64) -> WeeklyForecast {
        WeeklyForecast {
            coordinate: GeoCoordinate {
                latitude: 59.93,
                longitude: 30.31,
            },
            days: vec![DailyForecastEntry {
                date: "2024-03-25T04:00:00Z".into(),
                temperature_avg_c: avg,
                temperature_min_c: avg - 3.0,
                temperature_max_c: avg + 3.0,
            }],
        }
    }

    #[test]
    fn keys_have_fixed_names() {
        let names: Vec<_> = CacheKey::all().iter().map(CacheKey::as_str).collect();
        assert_eq!(names, ["current-weather", "weekly-weather", "resolved-place-name"]);
    }

    #[test]
    fn read_of_unwritten_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());
        assert_eq!(cache.read::<WeeklyForecast>(CacheKey::WeeklyWeather), None);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path().join("nested"));

        cache.write(CacheKey::WeeklyWeather, &weekly(1.5)).unwrap();
        cache.write(CacheKey::ResolvedPlaceName, &"Saint Petersburg, Russia").unwrap();

        assert_eq!(cache.read(CacheKey::WeeklyWeather), Some(weekly(1.5)));
        assert_eq!(
            cache.read::<String>(CacheKey::ResolvedPlaceName).as_deref(),
            Some("Saint Petersburg, Russia")
        );
    }

    #[test]
    fn overwrite_keeps_latest_value_only() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());

        cache.write(CacheKey::WeeklyWeather, &weekly(1.0)).unwrap();
        cache.write(CacheKey::WeeklyWeather, &weekly(2.0)).unwrap();

        assert_eq!(cache.read(CacheKey::WeeklyWeather), Some(weekly(2.0)));
    }

    #[test]
    fn writing_same_value_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());

        cache.write(CacheKey::WeeklyWeather, &weekly(4.0)).unwrap();
        let first = fs::read(cache.path_for(CacheKey::WeeklyWeather)).unwrap();
        cache.write(CacheKey::WeeklyWeather, &weekly(4.0)).unwrap();
        let second = fs::read(cache.path_for(CacheKey::WeeklyWeather)).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.read(CacheKey::WeeklyWeather), Some(weekly(4.0)));
    }

    #[test]
    fn corrupt_entry_reads_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());
        fs::write(cache.path_for(CacheKey::CurrentWeather), "{not-json").unwrap();

        assert_eq!(cache.read::<WeeklyForecast>(CacheKey::CurrentWeather), None);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let cache = WeatherCache::new(dir.path());
        cache.write(CacheKey::WeeklyWeather, &weekly(1.0)).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn concurrent_reader_never_sees_a_torn_value() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(WeatherCache::new(dir.path()));
        let a = weekly(1.0);
        let b = weekly(2.0);
        cache.write(CacheKey::WeeklyWeather, &a).unwrap();

        let writer = {
            let cache = Arc::clone(&cache);
            let (a, b) = (a.clone(), b.clone());
            std::thread::spawn(move || {
                for i in 0..200 {
                    let value = if i % 2 == 0 { &b } else { &a };
                    cache.write(CacheKey::WeeklyWeather, value).unwrap();
                }
            })
        };

        for _ in 0..200 {
            let seen: WeeklyForecast = cache
                .read(CacheKey::WeeklyWeather)
                .expect("slot must always hold a complete value");
            assert!(seen == a || seen == b);
        }

        writer.join().unwrap();
    }
}
