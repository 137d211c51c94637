use crate::{Config, CurrentWeatherReading, GeoCoordinate, WeeklyForecast};
use async_trait::async_trait;
use serde::Serialize;
use std::{fmt::Debug, sync::Arc};
use thiserror::Error;

pub mod tomorrow;

pub use tomorrow::TomorrowIoClient;

/// Failure of a single provider request.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NetworkError {
    /// Connection refused, DNS failure, timeout, or an unreadable body.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status.
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body did not match the expected schema.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl NetworkError {
    /// Non-2xx responses count as transport failures for callers that only
    /// care whether the provider was reachable and healthy.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(
        &self,
        coordinate: GeoCoordinate,
    ) -> Result<CurrentWeatherReading, NetworkError>;

    async fn fetch_weekly(&self, coordinate: GeoCoordinate) -> Result<WeeklyForecast, NetworkError>;
}

/// Construct the weather client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let client = TomorrowIoClient::with_options(api_key, config.base_url(), config.timeout())?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_count_as_transport() {
        let status = NetworkError::Status {
            status: 503,
            body: "down".into(),
        };
        assert!(status.is_transport());
        assert!(NetworkError::Transport("refused".into()).is_transport());
        assert!(!NetworkError::Decode("missing field".into()).is_transport());
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let cfg = Config {
            api_key: Some("KEY".to_string()),
            ..Config::default()
        };
        assert!(provider_from_config(&cfg).is_ok());
    }
}
