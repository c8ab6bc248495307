use crate::config::GeocoderConfig;
use crate::coordinate::{self, Coordinate, GeocodeOutcome};
use crate::error::Result;
use crate::service::{LookupService, NominatimService};
use crate::throttle::{FixedDelay, Throttle};

/// Forward and reverse geocoding client.
///
/// Build one per process and pass it by reference to everything that needs
/// to look things up. Every request it issues is followed by a pause of the
/// throttle, whether the request succeeded or not, so callers that go
/// through a single `Geocoder` never exceed the service's rate limit.
pub struct Geocoder<S, T> {
    service: S,
    throttle: T,
}

impl Geocoder<NominatimService, FixedDelay> {
    /// Nominatim client with the configured user agent, timeout and delay
    pub fn from_config(config: &GeocoderConfig) -> Result<Self> {
        let service = NominatimService::new(config)?;
        Ok(Self::new(service, FixedDelay::new(config.delay())))
    }
}

impl<S: LookupService, T: Throttle> Geocoder<S, T> {
    pub fn new(service: S, throttle: T) -> Self {
        Self { service, throttle }
    }

    pub fn throttle(&self) -> &T {
        &self.throttle
    }

    /// Resolve a free-form address to its best-ranked coordinate.
    ///
    /// "No match" is `GeocodeOutcome::NotFound`, not an error. Only transport
    /// and protocol failures are returned as `Err`.
    pub fn geocode(&self, address: &str) -> Result<GeocodeOutcome> {
        let result = self.service.search(address);
        self.throttle.pause();

        match result? {
            Some(coord) => {
                log::debug!("Geocoded '{}' -> {}", address, coord);
                Ok(GeocodeOutcome::Found(coord))
            }
            None => {
                log::debug!("No match for '{}'", address);
                Ok(GeocodeOutcome::NotFound)
            }
        }
    }

    /// Resolve a coordinate to an address.
    ///
    /// `None` input means there is nothing to look up; it returns `None`
    /// without issuing a request or pausing.
    pub fn reverse_geocode(&self, coord: Option<Coordinate>) -> Result<Option<String>> {
        let Some(coord) = coord else {
            return Ok(None);
        };

        let result = self.service.reverse(coord);
        self.throttle.pause();

        let address = result?;
        if address.is_none() {
            log::debug!("No address for {}", coord);
        }
        Ok(address)
    }

    /// Reverse geocode `"latitude,longitude"` text.
    ///
    /// `"None,None"`, `"nan,nan"` and other absent markers short-circuit to
    /// `None`. Text that is neither absent nor a valid coordinate is an
    /// error raised before any request.
    pub fn reverse_geocode_text(&self, coord_text: &str) -> Result<Option<String>> {
        let coord = coordinate::parse_coordinate_text(coord_text)?;
        self.reverse_geocode(coord)
    }
}
