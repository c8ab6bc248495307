//! Rate-limited geocoding and reverse geocoding of single entries or whole
//! CSV tables through OpenStreetMap Nominatim.
//!
//! Build one [`Geocoder`] per process and pass it to whatever needs it:
//!
//! ```no_run
//! use geobatch_core::{BatchRunner, ForwardSelection, Geocoder, GeocoderConfig, Table};
//!
//! # fn main() -> geobatch_core::Result<()> {
//! let geocoder = Geocoder::from_config(&GeocoderConfig::default())?;
//! let table = Table::from_path("addresses.csv".as_ref())?;
//! let result = BatchRunner::new(&geocoder)
//!     .geocode_column(&table, &ForwardSelection::new(Some("addr".to_string())))?;
//! result.table.to_path("geocoded_results.csv".as_ref())?;
//! # Ok(())
//! # }
//! ```

mod batch;
mod config;
mod coordinate;
mod error;
mod geocoding;
mod service;
mod table;
mod throttle;

#[cfg(test)]
mod test_support;

// Re-export public types
pub use batch::{
    BatchResult, BatchRunner, ForwardSelection, ProgressCallback, ReverseSelection,
    ADDRESS_COLUMN, GEOCODED_RESULTS_FILE, LATITUDE_COLUMN, LONGITUDE_COLUMN,
    REVERSE_GEOCODED_RESULTS_FILE,
};
pub use config::{GeocoderConfig, DEFAULT_BASE_URL, MIN_DELAY_MS};
pub use coordinate::{parse_cell, parse_coordinate_text, Coordinate, GeocodeOutcome};
pub use error::{GeocodeError, Result, SelectionError};
pub use geocoding::Geocoder;
pub use service::{LookupService, NominatimService};
pub use table::Table;
pub use throttle::{FixedDelay, Throttle};
