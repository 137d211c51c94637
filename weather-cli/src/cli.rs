use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use weather_core::{
    Config, ConnectivityProbe, FixedConnectivity, GeoCoordinate, NominatimGeocoder, SearchError,
    TcpReachabilityProbe, WeatherCache, WeatherCoordinator, provider::provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Log debug details to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the Tomorrow.io API key and cache location.
    Configure,

    /// Show current weather and the daily forecast.
    Show {
        /// Latitude in degrees.
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude in degrees.
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        /// City name to look up instead of coordinates.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        /// Skip the network and show saved data.
        #[arg(long)]
        offline: bool,

        /// Print the raw report as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon, city, offline, json } => {
                show(lat, lon, city, offline, json).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("Tomorrow.io API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key.trim().to_string());

    let current_dir = config.resolved_cache_dir()?;
    let answer = inquire::Text::new("Cache directory:")
        .with_default(&current_dir.display().to_string())
        .prompt()
        .context("Failed to read cache directory")?;
    apply_cache_dir_answer(&mut config, &answer)?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Apply the cache-directory prompt answer; a blank answer keeps the current setting.
fn apply_cache_dir_answer(config: &mut Config, answer: &str) -> anyhow::Result<()> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(());
    }
    config.set_cache_dir(PathBuf::from(answer))
}

async fn show(
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    offline: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let coordinator = build_coordinator(&config, offline)?;

    let report = match (city, lat, lon) {
        (Some(city), _, _) => match coordinator.search_city(&city).await {
            Ok(report) => report,
            Err(err) => bail!(search_message(&err)),
        },
        (None, Some(lat), Some(lon)) => {
            let coordinate = GeoCoordinate::new(lat, lon)?;
            coordinator.request_weather(coordinate).await
        }
        _ => bail!("Specify either --city <NAME> or --lat <LAT> --lon <LON>"),
    };

    let Some(report) = coordinator.accept_if_current(report) else {
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::report(&report, chrono::Local::now().date_naive()));
    }

    Ok(())
}

fn build_coordinator(config: &Config, offline: bool) -> anyhow::Result<WeatherCoordinator> {
    let provider = provider_from_config(config)?;
    let cache = WeatherCache::new(config.resolved_cache_dir()?);
    tracing::debug!(cache_dir = %cache.dir().display(), offline, "building coordinator");
    let connectivity: Arc<dyn ConnectivityProbe> = if offline {
        Arc::new(FixedConnectivity(false))
    } else {
        Arc::new(TcpReachabilityProbe::new(config.probe_host()))
    };
    let geocoder = NominatimGeocoder::new()?;

    Ok(WeatherCoordinator::new(provider, cache, connectivity, Arc::new(geocoder)))
}

fn search_message(err: &SearchError) -> String {
    match err {
        SearchError::EmptyQuery => "City name must not be empty.".to_string(),
        SearchError::Offline => "No internet connection.".to_string(),
        SearchError::CityNotFound(_) => {
            "City not found. Check the spelling and try again.".to_string()
        }
    }
}
