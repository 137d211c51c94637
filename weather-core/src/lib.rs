//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The Tomorrow.io client behind the `WeatherProvider` trait
//! - A last-known-good cache for offline use
//! - The coordinator that decides between live data and cached data
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod collab;
pub mod config;
pub mod coordinator;
pub mod display;
pub mod model;
pub mod provider;
pub mod weather_code;

pub use cache::{CacheError, CacheKey, WeatherCache};
pub use collab::{
    ConnectivityProbe, FixedConnectivity, Geocoder, NominatimGeocoder, TcpReachabilityProbe,
};
pub use config::Config;
pub use coordinator::{SearchError, WeatherCoordinator};
pub use model::{
    Advisory, CoordinateError, CurrentWeatherReading, CycleId, DailyForecastEntry, FetchOutcome,
    GeoCoordinate, UnavailableKind, UnavailableReason, WeatherReport, WeeklyForecast,
};
pub use provider::{NetworkError, TomorrowIoClient, WeatherProvider};
