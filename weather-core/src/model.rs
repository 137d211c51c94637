use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::provider::NetworkError;
use crate::weather_code;

/// A point on the globe for which weather is requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Build a coordinate, rejecting values outside the valid lat/lon ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("invalid latitude {0}: must be within -90..=90")]
    InvalidLatitude(f64),
    #[error("invalid longitude {0}: must be within -180..=180")]
    InvalidLongitude(f64),
}

/// Normalized realtime conditions at a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherReading {
    /// Provider observation timestamp, kept as the provider's ISO-8601 string.
    pub observed_at: String,
    pub coordinate: GeoCoordinate,
    pub cloud_cover_pct: u8,
    pub humidity_pct: u8,
    pub precipitation_probability_pct: u8,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub uv_index: i32,
    pub visibility_km: f64,
    pub weather_code: i32,
    pub wind_direction_deg: f64,
    pub wind_speed_ms: f64,
}

impl CurrentWeatherReading {
    pub fn description(&self) -> &'static str {
        weather_code::describe(self.weather_code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastEntry {
    pub date: String,
    pub temperature_avg_c: f64,
    pub temperature_min_c: f64,
    pub temperature_max_c: f64,
}

/// Multi-day forecast, days in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyForecast {
    pub coordinate: GeoCoordinate,
    pub days: Vec<DailyForecastEntry>,
}

/// Why one half of a report carries no value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "error", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Online, but the provider request failed.
    Network(NetworkError),
    /// Offline and nothing was ever cached for this slot.
    NoCachedData,
    /// Online, but reverse geocoding produced no place name.
    PlaceNotResolved,
}

/// Coarse classification the presentation layer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableKind {
    ProviderError,
    OfflineNoCache,
    PlaceUnknown,
}

impl UnavailableReason {
    pub fn kind(&self) -> UnavailableKind {
        match self {
            Self::Network(_) => UnavailableKind::ProviderError,
            Self::NoCachedData => UnavailableKind::OfflineNoCache,
            Self::PlaceNotResolved => UnavailableKind::PlaceUnknown,
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(err) => write!(f, "{err}"),
            Self::NoCachedData => f.write_str("no cached data available"),
            Self::PlaceNotResolved => f.write_str("place name could not be resolved"),
        }
    }
}

/// Result of one half of a coordination cycle. `Stale` means the value came
/// from the cache because the network was unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum FetchOutcome<T> {
    Fresh(T),
    Stale(T),
    Unavailable(UnavailableReason),
}

impl<T> FetchOutcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Fresh(v) | Self::Stale(v) => Some(v),
            Self::Unavailable(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Fresh(v) | Self::Stale(v) => Some(v),
            Self::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&UnavailableReason> {
        match self {
            Self::Unavailable(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            Self::Fresh(v) => FetchOutcome::Fresh(f(v)),
            Self::Stale(v) => FetchOutcome::Stale(f(v)),
            Self::Unavailable(reason) => FetchOutcome::Unavailable(reason),
        }
    }
}

/// Monotonic identifier of one coordination cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CycleId(pub u64);

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side-channel notice attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    /// No connection; cached values are shown instead.
    ShowingSavedData,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ShowingSavedData => "No internet connection, showing last saved data.",
        }
    }
}

/// Everything one coordination cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub cycle: CycleId,
    pub coordinate: GeoCoordinate,
    pub current: FetchOutcome<CurrentWeatherReading>,
    pub weekly: FetchOutcome<WeeklyForecast>,
    pub place: FetchOutcome<String>,
    pub advisory: Option<Advisory>,
}
