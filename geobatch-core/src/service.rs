use crate::config::GeocoderConfig;
use crate::coordinate::Coordinate;
use crate::error::{GeocodeError, Result};
use serde::Deserialize;

/// One round trip to a geocoding backend.
///
/// Implementations perform exactly one request per call and report "no
/// match" as `Ok(None)`. Rate limiting is not their concern.
pub trait LookupService {
    /// Best-ranked coordinate for a free-form address
    fn search(&self, address: &str) -> Result<Option<Coordinate>>;

    /// Best-matching address for a coordinate
    fn reverse(&self, coord: Coordinate) -> Result<Option<String>>;
}

impl<S: LookupService + ?Sized> LookupService for &S {
    fn search(&self, address: &str) -> Result<Option<Coordinate>> {
        (**self).search(address)
    }

    fn reverse(&self, coord: Coordinate) -> Result<Option<String>> {
        (**self).reverse(coord)
    }
}

/// Entry of the `/search` response array
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

/// Body of the `/reverse` response. On no match Nominatim sends
/// `{"error": "Unable to geocode"}` instead of a place.
#[derive(Debug, Deserialize)]
struct ReverseResult {
    display_name: Option<String>,
    error: Option<String>,
}

/// Nominatim (OpenStreetMap) backend over blocking HTTP
pub struct NominatimService {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NominatimService {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<reqwest::blocking::Response> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self.client.get(&url).query(params).send()?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        Ok(response)
    }
}

impl LookupService for NominatimService {
    fn search(&self, address: &str) -> Result<Option<Coordinate>> {
        log::debug!("Geocoding '{}' via Nominatim", address);

        let params = [
            ("q", address.to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
        ];
        let results: Vec<SearchResult> = self
            .get("search", &params)?
            .json()
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let Some(best) = results.first() else {
            return Ok(None);
        };

        let lat: f64 = best
            .lat
            .parse()
            .map_err(|_| GeocodeError::Parse(format!("invalid latitude '{}'", best.lat)))?;
        let lon: f64 = best
            .lon
            .parse()
            .map_err(|_| GeocodeError::Parse(format!("invalid longitude '{}'", best.lon)))?;

        Coordinate::new(lat, lon)
            .map(Some)
            .map_err(|e| GeocodeError::Parse(e.to_string()))
    }

    fn reverse(&self, coord: Coordinate) -> Result<Option<String>> {
        log::debug!("Reverse geocoding {} via Nominatim", coord);

        let params = [
            ("lat", coord.latitude.to_string()),
            ("lon", coord.longitude.to_string()),
            ("format", "json".to_string()),
        ];
        let result: ReverseResult = self
            .get("reverse", &params)?
            .json()
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        if let Some(reason) = result.error {
            log::debug!("No address for {}: {}", coord, reason);
            return Ok(None);
        }

        Ok(result.display_name.filter(|name| !name.trim().is_empty()))
    }
}
