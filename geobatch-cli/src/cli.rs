use anyhow::{Context, Result};
use clap::Parser;
use geobatch_core::GeocoderConfig;
use std::path::PathBuf;

/// Geocode addresses and reverse geocode coordinates, one at a time or for a whole CSV file
#[derive(Parser, Debug)]
#[command(name = "geobatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Geocodes and reverse geocodes addresses using OpenStreetMap Nominatim",
    long_about = None
)]
pub struct Args {
    /// Switch to reverse geocoding (coordinates to address)
    #[arg(short = 'r', long = "reverse")]
    pub reverse: bool,

    /// Address to geocode (single entry)
    #[arg(short = 'a', long = "address", conflicts_with = "input")]
    pub address: Option<String>,

    /// Latitude to reverse geocode (single entry)
    #[arg(long = "lat", allow_negative_numbers = true, requires = "lon", conflicts_with = "input")]
    pub lat: Option<f64>,

    /// Longitude to reverse geocode (single entry)
    #[arg(long = "lon", allow_negative_numbers = true, requires = "lat", conflicts_with = "input")]
    pub lon: Option<f64>,

    /// Coordinate to reverse geocode as "latitude,longitude" (single entry)
    #[arg(long = "coords", allow_hyphen_values = true, conflicts_with_all = ["lat", "lon", "input"])]
    pub coords: Option<String>,

    /// CSV file to process in batch mode
    #[arg(short = 'i', long = "input", value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Address column (forward batch)
    #[arg(short = 'c', long = "column", value_name = "NAME")]
    pub column: Option<String>,

    /// Latitude column (reverse batch)
    #[arg(long = "lat-column", value_name = "NAME")]
    pub lat_column: Option<String>,

    /// Longitude column (reverse batch)
    #[arg(long = "lon-column", value_name = "NAME")]
    pub lon_column: Option<String>,

    /// Where to write batch results (defaults to geocoded_results.csv / reverse_geocoded_results.csv)
    #[arg(short = 'o', long = "output", value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Start the batch without asking for confirmation
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// JSON file with geocoder settings
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// User-Agent identifying this application to Nominatim
    #[arg(long = "user-agent")]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Pause after every request in milliseconds (at least 1000)
    #[arg(long = "delay-ms", value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Base URL of the Nominatim instance
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Settings from the config file (if any) with command-line overrides applied
    pub fn geocoder_config(&self) -> Result<GeocoderConfig> {
        let mut config = match &self.config {
            Some(path) => GeocoderConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => GeocoderConfig::default(),
        };

        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parses command-line arguments
pub fn parse_args() -> Args {
    Args::parse()
}
