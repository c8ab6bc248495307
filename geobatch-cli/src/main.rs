use anyhow::{Context, Result};
use geobatch_core::{
    BatchRunner, Coordinate, ForwardSelection, GeocodeOutcome, Geocoder, LookupService,
    ReverseSelection, SelectionError, Table, Throttle, GEOCODED_RESULTS_FILE,
    REVERSE_GEOCODED_RESULTS_FILE,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod cli;

/// Zoom level of the map link shown after a single lookup
const MAP_ZOOM: u8 = 10;
/// Rows shown before a batch starts
const PREVIEW_ROWS: usize = 5;

fn main() -> Result<()> {
    let args = cli::parse_args();

    // Initialize logger with appropriate level based on verbose flag
    if std::env::var("RUST_LOG").is_err() {
        if args.verbose {
            std::env::set_var("RUST_LOG", "debug");
        } else {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    let config = args.geocoder_config()?;
    log::debug!("Using {:?}", config);

    // One client for the whole process, shared by every lookup below
    let geocoder = Geocoder::from_config(&config).context("Failed to create geocoding client")?;

    let outcome = match (&args.input, args.reverse) {
        (Some(input), false) => geocode_batch(&geocoder, &args, input),
        (Some(input), true) => reverse_geocode_batch(&geocoder, &args, input),
        (None, false) => geocode_single(&geocoder, &args),
        (None, true) => reverse_geocode_single(&geocoder, &args),
    };

    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            if let Some(selection) = e.downcast_ref::<SelectionError>() {
                eprintln!("⚠️  {}", selection);
                std::process::exit(2);
            }
            Err(e)
        }
    }
}

/// Read one line from stdin after printing `label`
fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;

    let mut response = String::new();
    std::io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_string())
}

fn geocode_single<S: LookupService, T: Throttle>(
    geocoder: &Geocoder<S, T>,
    args: &cli::Args,
) -> Result<bool> {
    let address = match &args.address {
        Some(address) => address.clone(),
        None => prompt("Enter an address: ")?,
    };

    match geocoder.geocode(&address)? {
        GeocodeOutcome::Found(coord) => {
            println!("✓ Latitude: {}, Longitude: {}", coord.latitude, coord.longitude);
            println!("  Map: {}", coord.map_url(MAP_ZOOM));
            Ok(true)
        }
        GeocodeOutcome::NotFound => {
            eprintln!("✗ Address could not be geocoded.");
            Ok(false)
        }
    }
}

fn reverse_geocode_single<S: LookupService, T: Throttle>(
    geocoder: &Geocoder<S, T>,
    args: &cli::Args,
) -> Result<bool> {
    let coord = match (&args.coords, args.lat, args.lon) {
        (Some(text), _, _) => geobatch_core::parse_coordinate_text(text)?,
        (None, Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
        _ => {
            let lat = geobatch_core::parse_cell(&prompt("Latitude: ")?)?;
            let lon = geobatch_core::parse_cell(&prompt("Longitude: ")?)?;
            Coordinate::from_parts(lat, lon)?
        }
    };

    match (coord, geocoder.reverse_geocode(coord)?) {
        (Some(coord), Some(address)) => {
            println!("✓ Address =>> {}", address);
            println!("  Map: {}", coord.map_url(MAP_ZOOM));
            Ok(true)
        }
        _ => {
            eprintln!("✗ Coordinates could not be reverse geocoded.");
            Ok(false)
        }
    }
}

/// Load the input file and show the operator what was read
fn load_table(input: &Path) -> Result<Table> {
    let table = Table::from_path(input)
        .with_context(|| format!("Failed to read CSV file {}", input.display()))?;

    println!("Preview of uploaded data:");
    print!("{}", table.preview(PREVIEW_ROWS).to_csv_string()?);
    println!("({} rows; columns: {})\n", table.len(), table.headers().join(", "));

    Ok(table)
}

/// Print the rate-limit notice and expected duration, then ask to proceed
fn confirm_run(rows: usize, estimate: Duration, assume_yes: bool) -> Result<bool> {
    println!("Note: OSM Nominatim usage is limited to 1 request per second.");
    let finish = chrono::Local::now()
        + chrono::Duration::from_std(estimate).unwrap_or_else(|_| chrono::Duration::zero());
    println!(
        "{} rows will take at least {}s (finishing around {}).",
        rows,
        estimate.as_secs(),
        finish.format("%H:%M:%S")
    );
    println!("Progress is not saved: interrupting the run discards all results.");

    if assume_yes {
        return Ok(true);
    }

    let response = prompt("\nStart now? [Y/n]: ")?.to_lowercase();
    Ok(response.is_empty() || response == "y" || response == "yes")
}

fn print_progress(done: usize, total: usize) {
    print!("\r⏳ Processed {}/{}", done, total);
    std::io::stdout().flush().ok();
    if done == total {
        println!();
    }
}

fn finish_batch(result: &geobatch_core::BatchResult, output: PathBuf) -> Result<bool> {
    print!("{}", result.table.to_csv_string()?);
    result
        .table
        .to_path(&output)
        .with_context(|| format!("Failed to write results to {}", output.display()))?;

    println!(
        "\n✅ {} matched, {} not found, {} skipped. Results saved to {}",
        result.matched,
        result.not_found,
        result.skipped,
        output.display()
    );
    Ok(true)
}

fn geocode_batch<S: LookupService, T: Throttle>(
    geocoder: &Geocoder<S, T>,
    args: &cli::Args,
    input: &Path,
) -> Result<bool> {
    let table = load_table(input)?;
    let selection = ForwardSelection::new(args.column.clone());
    selection.validate(&table)?;

    let runner = BatchRunner::new(geocoder).with_progress(Box::new(print_progress));
    if !confirm_run(table.len(), runner.estimate(table.len()), args.yes)? {
        println!("Cancelled.");
        return Ok(true);
    }

    let result = runner.geocode_column(&table, &selection)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(GEOCODED_RESULTS_FILE));
    finish_batch(&result, output)
}

fn reverse_geocode_batch<S: LookupService, T: Throttle>(
    geocoder: &Geocoder<S, T>,
    args: &cli::Args,
    input: &Path,
) -> Result<bool> {
    let table = load_table(input)?;
    let selection = ReverseSelection::new(args.lat_column.clone(), args.lon_column.clone());
    selection.validate(&table)?;

    let runner = BatchRunner::new(geocoder).with_progress(Box::new(print_progress));
    if !confirm_run(table.len(), runner.estimate(table.len()), args.yes)? {
        println!("Cancelled.");
        return Ok(true);
    }

    let result = runner.reverse_geocode_columns(&table, &selection)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(REVERSE_GEOCODED_RESULTS_FILE));
    finish_batch(&result, output)
}
