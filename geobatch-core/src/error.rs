use thiserror::Error;

/// Problems with the columns chosen for a batch run.
///
/// All of these are detected before the first request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no address column selected")]
    NoAddressColumn,

    #[error("both a latitude and a longitude column must be selected")]
    MissingCoordinateColumns,

    #[error("latitude and longitude columns cannot be the same ('{0}')")]
    IdenticalColumns(String),

    #[error("column '{0}' does not exist in the table")]
    UnknownColumn(String),
}

/// Errors raised by the geocoding pipeline.
///
/// A lookup that simply finds nothing is not an error; it comes back as
/// `GeocodeOutcome::NotFound` or `None`.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network failure or timeout talking to the lookup service
    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with a non-success HTTP status
    #[error("geocoding service returned status {0}")]
    Status(u16),

    /// Service answered with something we could not read
    #[error("failed to parse geocoding response: {0}")]
    Parse(String),

    /// Malformed or out-of-range latitude/longitude input
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Table shape problems, such as a result column of the wrong length
    #[error("table error: {0}")]
    Table(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GeocodeError>;
