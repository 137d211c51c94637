//! Collaborators the coordinator consumes only through their signatures:
//! geocoding and connectivity. The concrete types here are what the CLI wires
//! in; tests substitute their own.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::model::GeoCoordinate;
use crate::provider::NetworkError;

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Reverse lookup, e.g. "Moscow, Russia".
    async fn resolve_place_name(&self, coordinate: GeoCoordinate) -> Option<String>;

    /// Forward lookup of a city name.
    async fn resolve_coordinate(&self, city: &str) -> Option<GeoCoordinate>;
}

#[async_trait]
pub trait ConnectivityProbe: Send + Sync + Debug {
    async fn is_online(&self) -> bool;
}

/// Probe that always answers the same; used for `--offline` and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedConnectivity(pub bool);

#[async_trait]
impl ConnectivityProbe for FixedConnectivity {
    async fn is_online(&self) -> bool {
        self.0
    }
}

/// Considers the machine online when a TCP connection to `host:port` can be
/// opened within the timeout.
#[derive(Debug, Clone)]
pub struct TcpReachabilityProbe {
    target: String,
    timeout: Duration,
}

impl TcpReachabilityProbe {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ConnectivityProbe for TcpReachabilityProbe {
    async fn is_online(&self) -> bool {
        let attempt = tokio::net::TcpStream::connect(self.target.as_str());
        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(probe = %self.target, "connectivity probe failed: {e}");
                false
            }
            Err(_) => {
                tracing::debug!(probe = %self.target, "connectivity probe timed out");
                false
            }
        }
    }
}

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("weather-core/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoding via Nominatim (OpenStreetMap); no API key required.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self, NetworkError> {
        Self::with_base_url(NOMINATIM_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, NetworkError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                NetworkError::Transport(format!("failed to build geocoding client: {e}"))
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Option<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = match self.http.get(&url).query(query).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("geocoding request failed: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!("geocoding returned status {}", response.status());
            return None;
        }

        match response.json().await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::debug!("geocoding parse error: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve_place_name(&self, coordinate: GeoCoordinate) -> Option<String> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();
        let body: NominatimReverse = self
            .get(
                "/reverse",
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("format", "json"),
                    ("addressdetails", "1"),
                    ("zoom", "10"),
                ],
            )
            .await?;

        let name = place_name(body.address?)?;
        tracing::info!("Reverse geocoded to: {}", name);
        Some(name)
    }

    async fn resolve_coordinate(&self, city: &str) -> Option<GeoCoordinate> {
        let places: Vec<NominatimPlace> = self
            .get("/search", &[("q", city), ("format", "json"), ("limit", "1")])
            .await?;

        let place = places.into_iter().next()?;
        let lat = place.lat.parse().ok()?;
        let lon = place.lon.parse().ok()?;
        GeoCoordinate::new(lat, lon).ok()
    }
}

/// "Locality, Country", dropping whichever part is missing.
fn place_name(addr: NominatimAddress) -> Option<String> {
    let locality = addr.city.or(addr.town).or(addr.village).or(addr.municipality);

    let parts: Vec<String> = [locality, addr.country]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect();

    if parts.is_empty() { None } else { Some(parts.join(", ")) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn address(city: Option<&str>, town: Option<&str>, country: Option<&str>) -> NominatimAddress {
        NominatimAddress {
            city: city.map(String::from),
            town: town.map(String::from),
            village: None,
            municipality: None,
            country: country.map(String::from),
        }
    }

    #[test]
    fn place_name_joins_locality_and_country() {
        assert_eq!(
            place_name(address(Some("Moscow"), None, Some("Russia"))).as_deref(),
            Some("Moscow, Russia")
        );
        assert_eq!(
            place_name(address(None, Some("Sochi"), None)).as_deref(),
            Some("Sochi")
        );
        assert_eq!(place_name(address(None, None, None)), None);
    }

    #[tokio::test]
    async fn fixed_connectivity_reports_its_value() {
        assert!(FixedConnectivity(true).is_online().await);
        assert!(!FixedConnectivity(false).is_online().await);
    }

    #[tokio::test]
    async fn tcp_probe_sees_listening_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpReachabilityProbe::new(addr.to_string());
        assert!(probe.is_online().await);
    }

    #[tokio::test]
    async fn tcp_probe_reports_offline_for_closed_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe =
            TcpReachabilityProbe::new(addr.to_string()).with_timeout(Duration::from_secs(1));
        assert!(!probe.is_online().await);
    }

    #[tokio::test]
    async fn reverse_geocode_via_nominatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "display_name": "Kazan, Tatarstan, Russia",
                "address": { "city": "Kazan", "state": "Tatarstan", "country": "Russia" }
            })))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::with_base_url(server.uri()).unwrap();
        let name = geocoder
            .resolve_place_name(GeoCoordinate::new(55.79, 49.12).unwrap())
            .await;

        assert_eq!(name.as_deref(), Some("Kazan, Russia"));
    }

    #[tokio::test]
    async fn forward_geocode_parses_string_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Kazan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "lat": "55.7887",
                "lon": "49.1221",
                "display_name": "Kazan"
            }])))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::with_base_url(server.uri()).unwrap();
        let coord = geocoder.resolve_coordinate("Kazan").await.unwrap();

        assert_eq!(coord, GeoCoordinate::new(55.7887, 49.1221).unwrap());
    }

    #[tokio::test]
    async fn forward_geocode_without_results_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::with_base_url(server.uri()).unwrap();
        assert_eq!(geocoder.resolve_coordinate("Atlantis").await, None);
    }

    #[tokio::test]
    async fn geocoder_error_status_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::with_base_url(server.uri()).unwrap();
        let name = geocoder
            .resolve_place_name(GeoCoordinate::new(0.0, 0.0).unwrap())
            .await;
        assert_eq!(name, None);
    }
}
