use crate::coordinate::{self, Coordinate};
use crate::error::{Result, SelectionError};
use crate::geocoding::Geocoder;
use crate::service::LookupService;
use crate::table::Table;
use crate::throttle::Throttle;
use std::time::Duration;

pub const LATITUDE_COLUMN: &str = "Latitude";
pub const LONGITUDE_COLUMN: &str = "Longitude";
pub const ADDRESS_COLUMN: &str = "Address";

/// Default export file name for forward batches
pub const GEOCODED_RESULTS_FILE: &str = "geocoded_results.csv";
/// Default export file name for reverse batches
pub const REVERSE_GEOCODED_RESULTS_FILE: &str = "reverse_geocoded_results.csv";

/// Progress callback type: `(rows_done, rows_total)`
pub type ProgressCallback = Box<dyn Fn(usize, usize)>;

/// Column chosen as the address source of a forward batch
#[derive(Debug, Clone, Default)]
pub struct ForwardSelection {
    pub address_column: Option<String>,
}

impl ForwardSelection {
    pub fn new(address_column: Option<String>) -> Self {
        Self { address_column }
    }

    /// Index of the address column, or why the selection is unusable
    pub fn validate(&self, table: &Table) -> std::result::Result<usize, SelectionError> {
        let name = self
            .address_column
            .as_deref()
            .ok_or(SelectionError::NoAddressColumn)?;
        table
            .column_index(name)
            .ok_or_else(|| SelectionError::UnknownColumn(name.to_string()))
    }
}

/// Columns chosen as latitude and longitude sources of a reverse batch
#[derive(Debug, Clone, Default)]
pub struct ReverseSelection {
    pub latitude_column: Option<String>,
    pub longitude_column: Option<String>,
}

impl ReverseSelection {
    pub fn new(latitude_column: Option<String>, longitude_column: Option<String>) -> Self {
        Self {
            latitude_column,
            longitude_column,
        }
    }

    /// Indices of the latitude and longitude columns
    pub fn validate(&self, table: &Table) -> std::result::Result<(usize, usize), SelectionError> {
        let (Some(lat), Some(lon)) = (
            self.latitude_column.as_deref(),
            self.longitude_column.as_deref(),
        ) else {
            return Err(SelectionError::MissingCoordinateColumns);
        };

        if lat == lon {
            return Err(SelectionError::IdenticalColumns(lat.to_string()));
        }

        let lat_idx = table
            .column_index(lat)
            .ok_or_else(|| SelectionError::UnknownColumn(lat.to_string()))?;
        let lon_idx = table
            .column_index(lon)
            .ok_or_else(|| SelectionError::UnknownColumn(lon.to_string()))?;

        Ok((lat_idx, lon_idx))
    }
}

/// Outcome of a batch run
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Input columns followed by the result column(s)
    pub table: Table,
    /// Rows the service found a match for
    pub matched: usize,
    /// Rows the service was asked about but had no match for
    pub not_found: usize,
    /// Reverse rows without a coordinate to look up; always 0 for forward runs
    pub skipped: usize,
}

/// Applies a `Geocoder` to every row of a table, one row at a time.
///
/// Rows run strictly in order through the geocoder's throttle. A failure
/// aborts the whole run and discards everything processed so far.
pub struct BatchRunner<'a, S, T> {
    geocoder: &'a Geocoder<S, T>,
    progress: Option<ProgressCallback>,
}

impl<'a, S: LookupService, T: Throttle> BatchRunner<'a, S, T> {
    pub fn new(geocoder: &'a Geocoder<S, T>) -> Self {
        Self {
            geocoder,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Minimum wall-clock time for `rows` lookups, excluding network latency
    pub fn estimate(&self, rows: usize) -> Duration {
        self.geocoder.throttle().delay() * u32::try_from(rows).unwrap_or(u32::MAX)
    }

    fn report(&self, done: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress(done, total);
        }
    }

    /// Geocode the selected address column, appending `Latitude` and `Longitude`
    pub fn geocode_column(&self, table: &Table, selection: &ForwardSelection) -> Result<BatchResult> {
        let idx = selection.validate(table)?;
        let total = table.len();
        log::info!("Geocoding {} rows (estimated {:?})", total, self.estimate(total));

        let mut latitudes = Vec::with_capacity(total);
        let mut longitudes = Vec::with_capacity(total);
        let (mut matched, mut not_found) = (0, 0);

        // Every cell goes to the service as-is, blank ones included
        for (i, row) in table.rows().iter().enumerate() {
            let address = row[idx].as_str();

            let outcome = self.geocoder.geocode(address)?;
            if outcome.coordinate().is_some() {
                matched += 1;
            } else {
                log::warn!("Row {}: no match for '{}'", i + 1, address);
                not_found += 1;
            }
            let (lat, lon) = outcome.into_pair();

            latitudes.push(lat.map(|v| v.to_string()));
            longitudes.push(lon.map(|v| v.to_string()));
            self.report(i + 1, total);
        }

        let mut output = table.clone();
        output.append_column(LATITUDE_COLUMN, latitudes)?;
        output.append_column(LONGITUDE_COLUMN, longitudes)?;

        log::info!(
            "Geocoding finished: {} matched, {} not found",
            matched,
            not_found
        );

        Ok(BatchResult {
            table: output,
            matched,
            not_found,
            skipped: 0,
        })
    }

    /// Reverse geocode the selected latitude/longitude columns, appending `Address`
    pub fn reverse_geocode_columns(
        &self,
        table: &Table,
        selection: &ReverseSelection,
    ) -> Result<BatchResult> {
        let (lat_idx, lon_idx) = selection.validate(table)?;
        let total = table.len();
        log::info!(
            "Reverse geocoding {} rows (estimated {:?})",
            total,
            self.estimate(total)
        );

        let mut addresses = Vec::with_capacity(total);
        let (mut matched, mut not_found, mut skipped) = (0, 0, 0);

        for (i, row) in table.rows().iter().enumerate() {
            let coord = Coordinate::from_parts(
                coordinate::parse_cell(&row[lat_idx])?,
                coordinate::parse_cell(&row[lon_idx])?,
            )?;

            let address = match coord {
                None => {
                    log::debug!("Row {}: no coordinate, skipping", i + 1);
                    skipped += 1;
                    None
                }
                Some(coord) => {
                    let address = self.geocoder.reverse_geocode(Some(coord))?;
                    if address.is_some() {
                        matched += 1;
                    } else {
                        log::warn!("Row {}: no address for {}", i + 1, coord);
                        not_found += 1;
                    }
                    address
                }
            };

            addresses.push(address);
            self.report(i + 1, total);
        }

        let mut output = table.clone();
        output.append_column(ADDRESS_COLUMN, addresses)?;

        log::info!(
            "Reverse geocoding finished: {} matched, {} not found, {} skipped",
            matched,
            not_found,
            skipped
        );

        Ok(BatchResult {
            table: output,
            matched,
            not_found,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeocodeError;
    use crate::test_support::{count, journal, FakeService, RecordingThrottle};
    use crate::throttle::FixedDelay;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Instant;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_forward_batch_mixed_rows() {
        let log = journal();
        let service = FakeService::new(&log).with_place("Nairobi", -1.2921, 36.8219);
        let geocoder = Geocoder::new(service, RecordingThrottle::new(&log));
        let input = table("addr\nNairobi\nQwxyzinvalidplace123\n");

        let result = BatchRunner::new(&geocoder)
            .geocode_column(&input, &ForwardSelection::new(Some("addr".to_string())))
            .unwrap();

        assert_eq!(result.table.len(), 2);
        assert_eq!(result.table.headers(), ["addr", "Latitude", "Longitude"]);
        assert_eq!(result.table.rows()[0], vec!["Nairobi", "-1.2921", "36.8219"]);
        assert_eq!(result.table.rows()[1], vec!["Qwxyzinvalidplace123", "", ""]);
        assert_eq!((result.matched, result.not_found, result.skipped), (1, 1, 0));

        // Input table is left untouched
        assert_eq!(input.headers(), ["addr"]);
    }

    #[test]
    fn test_forward_batch_is_sequential_one_request_per_row() {
        let log = journal();
        let geocoder = Geocoder::new(FakeService::new(&log), RecordingThrottle::new(&log));
        let input = table("addr\nA\nB\nC\n");

        BatchRunner::new(&geocoder)
            .geocode_column(&input, &ForwardSelection::new(Some("addr".to_string())))
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["search:A", "pause", "search:B", "pause", "search:C", "pause"]
        );
    }

    #[test]
    fn test_forward_batch_accumulates_real_delay() {
        let log = journal();
        let delay = Duration::from_millis(15);
        let geocoder = Geocoder::new(FakeService::new(&log), FixedDelay::new(delay));
        let input = table("addr\nA\nB\nC\n");

        let runner = BatchRunner::new(&geocoder);
        assert_eq!(runner.estimate(3), delay * 3);

        let start = Instant::now();
        runner
            .geocode_column(&input, &ForwardSelection::new(Some("addr".to_string())))
            .unwrap();

        assert!(start.elapsed() >= delay * 3);
        assert_eq!(count(&log, "search:"), 3);
    }

    #[test]
    fn test_forward_batch_sends_blank_cells() {
        let log = journal();
        let service = FakeService::new(&log).with_place("Nairobi", -1.2921, 36.8219);
        let geocoder = Geocoder::new(service, RecordingThrottle::new(&log));
        let input = table("id,addr\n1,Nairobi\n2,\n3,  \n");

        let result = BatchRunner::new(&geocoder)
            .geocode_column(&input, &ForwardSelection::new(Some("addr".to_string())))
            .unwrap();

        assert_eq!(result.table.len(), 3);
        assert_eq!((result.matched, result.not_found, result.skipped), (1, 2, 0));
        assert_eq!(
            *log.borrow(),
            vec!["search:Nairobi", "pause", "search:", "pause", "search:  ", "pause"]
        );
        assert_eq!(result.table.rows()[1], vec!["2", "", "", ""]);
    }

    #[test]
    fn test_forward_selection_errors_before_any_request() {
        let log = journal();
        let geocoder = Geocoder::new(FakeService::new(&log), RecordingThrottle::new(&log));
        let runner = BatchRunner::new(&geocoder);
        let input = table("addr\nNairobi\n");

        let err = runner
            .geocode_column(&input, &ForwardSelection::default())
            .unwrap_err();
        assert!(matches!(
            err,
            GeocodeError::Selection(SelectionError::NoAddressColumn)
        ));

        let err = runner
            .geocode_column(&input, &ForwardSelection::new(Some("street".to_string())))
            .unwrap_err();
        assert!(matches!(
            err,
            GeocodeError::Selection(SelectionError::UnknownColumn(ref name)) if name == "street"
        ));

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_forward_batch_aborts_on_transport_failure() {
        let log = journal();
        let service = FakeService::new(&log).failing_on("B");
        let geocoder = Geocoder::new(service, RecordingThrottle::new(&log));
        let input = table("addr\nA\nB\nC\n");

        let result = BatchRunner::new(&geocoder)
            .geocode_column(&input, &ForwardSelection::new(Some("addr".to_string())));

        assert!(matches!(result, Err(GeocodeError::Status(503))));
        // C is never attempted
        assert_eq!(count(&log, "search:"), 2);
        assert_eq!(count(&log, "pause"), 2);
    }

    #[test]
    fn test_reverse_rejects_identical_columns() {
        let log = journal();
        let geocoder = Geocoder::new(FakeService::new(&log), RecordingThrottle::new(&log));
        let input = table("lat,lon\n48.8584,2.2945\n");

        let selection = ReverseSelection::new(Some("lat".to_string()), Some("lat".to_string()));
        let err = BatchRunner::new(&geocoder)
            .reverse_geocode_columns(&input, &selection)
            .unwrap_err();

        assert!(matches!(
            err,
            GeocodeError::Selection(SelectionError::IdenticalColumns(_))
        ));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_reverse_requires_both_columns() {
        let input = table("lat,lon\n1,2\n");

        let selection = ReverseSelection::new(Some("lat".to_string()), None);
        assert_eq!(
            selection.validate(&input),
            Err(SelectionError::MissingCoordinateColumns)
        );

        let selection = ReverseSelection::new(Some("lat".to_string()), Some("lng".to_string()));
        assert_eq!(
            selection.validate(&input),
            Err(SelectionError::UnknownColumn("lng".to_string()))
        );

        let selection = ReverseSelection::new(Some("lon".to_string()), Some("lat".to_string()));
        assert_eq!(selection.validate(&input), Ok((1, 0)));
    }

    #[test]
    fn test_reverse_batch_skips_missing_coordinates() {
        let log = journal();
        let service = FakeService::new(&log).with_place("Tour Eiffel, Paris, France", 48.8584, 2.2945);
        let geocoder = Geocoder::new(service, RecordingThrottle::new(&log));
        let input = table("name,lat,lon\neiffel,48.8584,2.2945\nfailed,nan,nan\nblank,,\nsea,0,0\n");

        let selection = ReverseSelection::new(Some("lat".to_string()), Some("lon".to_string()));
        let result = BatchRunner::new(&geocoder)
            .reverse_geocode_columns(&input, &selection)
            .unwrap();

        let addresses: Vec<&str> = result.table.column("Address").unwrap().collect();
        assert_eq!(addresses, vec!["Tour Eiffel, Paris, France", "", "", ""]);
        assert_eq!((result.matched, result.not_found, result.skipped), (1, 1, 2));
        assert_eq!(count(&log, "reverse:"), 2);
        assert_eq!(count(&log, "pause"), 2);
    }

    #[test]
    fn test_reverse_batch_invalid_cell_aborts() {
        let log = journal();
        let geocoder = Geocoder::new(FakeService::new(&log), RecordingThrottle::new(&log));
        let input = table("lat,lon\n1,2\nabc,3\n");

        let selection = ReverseSelection::new(Some("lat".to_string()), Some("lon".to_string()));
        let result = BatchRunner::new(&geocoder).reverse_geocode_columns(&input, &selection);

        assert!(matches!(result, Err(GeocodeError::InvalidCoordinate(_))));
        assert_eq!(count(&log, "reverse:"), 1);
    }

    #[test]
    fn test_progress_reported_per_row() {
        let log = journal();
        let geocoder = Geocoder::new(FakeService::new(&log), RecordingThrottle::new(&log));
        let input = table("addr\nA\n\nB\n");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        BatchRunner::new(&geocoder)
            .with_progress(Box::new(move |done, total| sink.borrow_mut().push((done, total))))
            .geocode_column(&input, &ForwardSelection::new(Some("addr".to_string())))
            .unwrap();

        assert_eq!(*seen.borrow(), vec![(1, 2), (2, 2)]);
    }
}
