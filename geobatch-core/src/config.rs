use crate::error::{GeocodeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Shortest pause Nominatim's usage policy allows between requests
pub const MIN_DELAY_MS: u64 = 1000;

/// Settings for the lookup service and the rate-limit pause.
///
/// Every field has a default, so a config file only needs to list the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Identifying User-Agent sent with every request (required by Nominatim)
    pub user_agent: String,
    /// Per-request network timeout in seconds
    pub timeout_secs: u64,
    /// Pause after every request in milliseconds, never below `MIN_DELAY_MS`
    pub delay_ms: u64,
    /// Base URL of the Nominatim instance
    pub base_url: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: 10,
            delay_ms: MIN_DELAY_MS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

fn default_user_agent() -> String {
    format!(
        "geobatch/{} (https://github.com/favtai/geobatch)",
        env!("CARGO_PKG_VERSION")
    )
}

impl GeocoderConfig {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: GeocoderConfig = serde_json::from_str(&data)
            .map_err(|e| GeocodeError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(GeocodeError::Config(
                "user_agent must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(GeocodeError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.delay_ms < MIN_DELAY_MS {
            return Err(GeocodeError::Config(format!(
                "delay_ms must be at least {} (1 request/second), got {}",
                MIN_DELAY_MS, self.delay_ms
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(GeocodeError::Config("base_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
