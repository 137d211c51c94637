//! One coordination cycle: probe connectivity once, then either fetch live
//! weather (writing each success through to the cache) or fall back to the
//! cache with every value marked stale.

use serde::{Serialize, de::DeserializeOwned};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use thiserror::Error;

use crate::cache::{CacheKey, WeatherCache};
use crate::collab::{ConnectivityProbe, Geocoder};
use crate::model::{
    Advisory, CurrentWeatherReading, CycleId, FetchOutcome, GeoCoordinate, UnavailableReason,
    WeatherReport, WeeklyForecast,
};
use crate::provider::{NetworkError, WeatherProvider};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("city name must not be empty")]
    EmptyQuery,
    #[error("no internet connection")]
    Offline,
    #[error("city '{0}' was not found")]
    CityNotFound(String),
}

#[derive(Debug)]
pub struct WeatherCoordinator {
    provider: Arc<dyn WeatherProvider>,
    cache: WeatherCache,
    connectivity: Arc<dyn ConnectivityProbe>,
    geocoder: Arc<dyn Geocoder>,
    generation: AtomicU64,
}

impl WeatherCoordinator {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        cache: WeatherCache,
        connectivity: Arc<dyn ConnectivityProbe>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            provider,
            cache,
            connectivity,
            geocoder,
            generation: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    /// Most recently issued cycle; `CycleId(0)` before the first request.
    pub fn latest_cycle(&self) -> CycleId {
        CycleId(self.generation.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, cycle: CycleId) -> bool {
        self.latest_cycle() == cycle
    }

    /// Drop a report that a newer cycle has superseded.
    pub fn accept_if_current(&self, report: WeatherReport) -> Option<WeatherReport> {
        if self.is_current(report.cycle) {
            Some(report)
        } else {
            tracing::debug!(
                cycle = %report.cycle,
                latest = %self.latest_cycle(),
                "discarding superseded report"
            );
            None
        }
    }

    fn begin_cycle(&self) -> CycleId {
        CycleId(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Run one coordination cycle for `coordinate`.
    pub async fn request_weather(&self, coordinate: GeoCoordinate) -> WeatherReport {
        let cycle = self.begin_cycle();
        let online = self.connectivity.is_online().await;
        self.run_cycle(cycle, coordinate, online).await
    }

    /// Resolve a city name and run a cycle for it.
    pub async fn search_city(&self, city: &str) -> Result<WeatherReport, SearchError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        if !self.connectivity.is_online().await {
            return Err(SearchError::Offline);
        }

        let coordinate = self
            .geocoder
            .resolve_coordinate(city)
            .await
            .ok_or_else(|| SearchError::CityNotFound(city.to_string()))?;

        tracing::info!(city, %coordinate, "resolved city");
        // The connectivity check above decides this cycle too.
        let cycle = self.begin_cycle();
        Ok(self.run_cycle(cycle, coordinate, true).await)
    }

    async fn run_cycle(
        &self,
        cycle: CycleId,
        coordinate: GeoCoordinate,
        online: bool,
    ) -> WeatherReport {
        tracing::info!(%cycle, %coordinate, online, "starting weather cycle");

        if online {
            self.fetch_live(cycle, coordinate).await
        } else {
            self.load_cached(cycle, coordinate)
        }
    }

    async fn fetch_live(&self, cycle: CycleId, coordinate: GeoCoordinate) -> WeatherReport {
        let (current, weekly, place) = tokio::join!(
            self.provider.fetch_current(coordinate),
            self.provider.fetch_weekly(coordinate),
            self.geocoder.resolve_place_name(coordinate),
        );

        let place = match place {
            Some(name) => {
                self.persist(cycle, CacheKey::ResolvedPlaceName, &name);
                FetchOutcome::Fresh(name)
            }
            None => FetchOutcome::Unavailable(UnavailableReason::PlaceNotResolved),
        };

        WeatherReport {
            cycle,
            coordinate,
            current: self.write_through(cycle, CacheKey::CurrentWeather, current),
            weekly: self.write_through(cycle, CacheKey::WeeklyWeather, weekly),
            place,
            advisory: None,
        }
    }

    fn load_cached(&self, cycle: CycleId, coordinate: GeoCoordinate) -> WeatherReport {
        let current: FetchOutcome<CurrentWeatherReading> =
            self.from_cache(CacheKey::CurrentWeather);
        let weekly: FetchOutcome<WeeklyForecast> = self.from_cache(CacheKey::WeeklyWeather);
        let place: FetchOutcome<String> = self.from_cache(CacheKey::ResolvedPlaceName);

        let advisory =
            (current.is_stale() || weekly.is_stale()).then_some(Advisory::ShowingSavedData);
        if advisory.is_none() {
            tracing::warn!(%cycle, "offline and no cached weather available");
        }

        WeatherReport {
            cycle,
            coordinate,
            current,
            weekly,
            place,
            advisory,
        }
    }

    fn write_through<T: Serialize>(
        &self,
        cycle: CycleId,
        key: CacheKey,
        result: Result<T, NetworkError>,
    ) -> FetchOutcome<T> {
        match result {
            Ok(value) => {
                self.persist(cycle, key, &value);
                FetchOutcome::Fresh(value)
            }
            Err(err) => {
                tracing::warn!(%key, "live fetch failed: {err}");
                FetchOutcome::Unavailable(UnavailableReason::Network(err))
            }
        }
    }

    /// Cache a live value unless a newer cycle has started since `cycle`.
    fn persist<T: Serialize>(&self, cycle: CycleId, key: CacheKey, value: &T) {
        if !self.is_current(cycle) {
            tracing::debug!(%cycle, %key, "superseded cycle, not updating cache");
            return;
        }
        if let Err(e) = self.cache.write(key, value) {
            tracing::warn!(%key, "failed to update cache: {e}");
        }
    }

    fn from_cache<T: DeserializeOwned>(&self, key: CacheKey) -> FetchOutcome<T> {
        match self.cache.read(key) {
            Some(value) => FetchOutcome::Stale(value),
            None => FetchOutcome::Unavailable(UnavailableReason::NoCachedData),
        }
    }
}
