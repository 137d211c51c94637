use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};
use std::{fmt, time::Duration};

use crate::model::{CurrentWeatherReading, DailyForecastEntry, GeoCoordinate, WeeklyForecast};

use super::{NetworkError, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.tomorrow.io";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const REALTIME_PATH: &str = "/v4/weather/realtime";
const FORECAST_PATH: &str = "/v4/weather/forecast";

/// Tomorrow.io v4 client.
#[derive(Clone)]
pub struct TomorrowIoClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl fmt::Debug for TomorrowIoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TomorrowIoClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl TomorrowIoClient {
    pub fn new(api_key: String) -> Result<Self, NetworkError> {
        Self::with_options(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        api_key: String,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NetworkError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| NetworkError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, NetworkError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, "requesting Tomorrow.io {what}");

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Tomorrow.io {what} request failed: {e}");
                NetworkError::Transport(e.to_string())
            })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| NetworkError::Transport(format!("failed to read {what} body: {e}")))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Tomorrow.io {what} request rejected");
            return Err(NetworkError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("failed to decode Tomorrow.io {what} response: {e}");
            NetworkError::Decode(format!("{what}: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct TioLocation {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TioRealtimeValues {
    cloud_cover: f64,
    humidity: f64,
    precipitation_probability: f64,
    temperature: f64,
    temperature_apparent: f64,
    uv_index: f64,
    visibility: f64,
    weather_code: i32,
    wind_direction: f64,
    wind_speed: f64,
}

#[derive(Debug, Deserialize)]
struct TioRealtimeData {
    time: String,
    values: TioRealtimeValues,
}

#[derive(Debug, Deserialize)]
struct TioRealtimeResponse {
    data: TioRealtimeData,
    location: Option<TioLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TioDailyValues {
    temperature_avg: f64,
    temperature_min: f64,
    temperature_max: f64,
}

#[derive(Debug, Deserialize)]
struct TioDaily {
    time: String,
    values: TioDailyValues,
}

#[derive(Debug, Deserialize)]
struct TioTimelines {
    daily: Vec<TioDaily>,
}

#[derive(Debug, Deserialize)]
struct TioForecastResponse {
    timelines: TioTimelines,
    location: Option<TioLocation>,
}

#[async_trait]
impl WeatherProvider for TomorrowIoClient {
    async fn fetch_current(
        &self,
        coordinate: GeoCoordinate,
    ) -> Result<CurrentWeatherReading, NetworkError> {
        let location = coordinate.to_string();
        let parsed: TioRealtimeResponse = self
            .get_json("realtime", REALTIME_PATH, &[("location", location.as_str())])
            .await?;

        Ok(normalize_current(parsed, coordinate))
    }

    async fn fetch_weekly(
        &self,
        coordinate: GeoCoordinate,
    ) -> Result<WeeklyForecast, NetworkError> {
        let location = coordinate.to_string();
        let parsed: TioForecastResponse = self
            .get_json(
                "forecast",
                FORECAST_PATH,
                &[
                    ("location", location.as_str()),
                    ("units", "metric"),
                    ("timesteps", "daily"),
                ],
            )
            .await?;

        Ok(normalize_weekly(parsed, coordinate))
    }
}

fn normalize_current(
    parsed: TioRealtimeResponse,
    requested: GeoCoordinate,
) -> CurrentWeatherReading {
    let values = parsed.data.values;

    CurrentWeatherReading {
        observed_at: parsed.data.time,
        coordinate: resolve_coordinate(parsed.location, requested),
        cloud_cover_pct: percent(values.cloud_cover),
        humidity_pct: percent(values.humidity),
        precipitation_probability_pct: percent(values.precipitation_probability),
        temperature_c: values.temperature,
        feels_like_c: values.temperature_apparent,
        uv_index: values.uv_index.round() as i32,
        visibility_km: values.visibility,
        weather_code: values.weather_code,
        wind_direction_deg: values.wind_direction,
        wind_speed_ms: values.wind_speed,
    }
}

fn normalize_weekly(parsed: TioForecastResponse, requested: GeoCoordinate) -> WeeklyForecast {
    let mut days: Vec<DailyForecastEntry> = parsed
        .timelines
        .daily
        .into_iter()
        .map(|d| DailyForecastEntry {
            date: d.time,
            temperature_avg_c: d.values.temperature_avg,
            temperature_min_c: d.values.temperature_min,
            temperature_max_c: d.values.temperature_max,
        })
        .collect();

    // ISO-8601 timestamps sort chronologically as strings.
    days.sort_by(|a, b| a.date.cmp(&b.date));

    WeeklyForecast {
        coordinate: resolve_coordinate(parsed.location, requested),
        days,
    }
}

fn resolve_coordinate(location: Option<TioLocation>, requested: GeoCoordinate) -> GeoCoordinate {
    location
        .and_then(|l| GeoCoordinate::new(l.lat, l.lon).ok())
        .unwrap_or(requested)
}

fn percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
