use crate::error::{GeocodeError, Result};
use std::fmt;

/// A validated WGS84 position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate.
    ///
    /// Latitude outside [-90, 90] is rejected, since wrapping it would land on
    /// the other pole. Longitude outside [-180, 180] is wrapped into range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeocodeError::InvalidCoordinate(format!(
                "latitude {} is outside [-90, 90]",
                latitude
            )));
        }
        if !longitude.is_finite() {
            return Err(GeocodeError::InvalidCoordinate(format!(
                "longitude {} is not a finite number",
                longitude
            )));
        }
        let longitude = if longitude.abs() > 180.0 {
            wrap_longitude(longitude)
        } else {
            longitude
        };
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Combine two optional cell values. Either half missing means there is
    /// no coordinate at all.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Option<Self>> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            _ => Ok(None),
        }
    }

    /// OpenStreetMap link centred on this coordinate with a single marker
    pub fn map_url(&self, zoom: u8) -> String {
        format!(
            "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map={zoom}/{lat}/{lon}",
            lat = self.latitude,
            lon = self.longitude,
            zoom = zoom
        )
    }
}

/// Wrap into [-180, 180)
fn wrap_longitude(longitude: f64) -> f64 {
    let wrapped = longitude % 360.0;
    if wrapped < -180.0 {
        wrapped + 360.0
    } else if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Result of a forward lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeOutcome {
    Found(Coordinate),
    NotFound,
}

impl GeocodeOutcome {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            GeocodeOutcome::Found(coord) => Some(*coord),
            GeocodeOutcome::NotFound => None,
        }
    }

    /// Unpack into `(latitude, longitude)`, both `None` when not found
    pub fn into_pair(self) -> (Option<f64>, Option<f64>) {
        match self {
            GeocodeOutcome::Found(coord) => (Some(coord.latitude), Some(coord.longitude)),
            GeocodeOutcome::NotFound => (None, None),
        }
    }
}

/// Values that upstream tools write for "no number here"
fn is_absent_marker(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.eq_ignore_ascii_case("none")
        || value.eq_ignore_ascii_case("nan")
        || value.eq_ignore_ascii_case("null")
}

/// Parses one latitude or longitude cell.
///
/// Absent markers (empty, `None`, `nan`, `null`) give `Ok(None)`.
/// Accepts decimal degrees as well as degrees/minutes/seconds:
/// "48.8584", "48 51.504", "48 deg 51' 30.24\" N", "2 17 40.2 W".
pub fn parse_cell(value: &str) -> Result<Option<f64>> {
    if is_absent_marker(value) {
        return Ok(None);
    }

    parse_degrees(value)
        .map(Some)
        .ok_or_else(|| GeocodeError::InvalidCoordinate(format!("cannot parse '{}'", value.trim())))
}

fn parse_degrees(value: &str) -> Option<f64> {
    let cleaned = value
        .replace("deg", " ")
        .replace(['°', '\'', '"'], " ")
        .trim()
        .to_string();

    let parts: Vec<&str> = cleaned.split_whitespace().collect();

    // S and W make the value negative whatever sign the number carried
    let mut negate = false;
    let numeric_parts: Vec<&str> = parts
        .iter()
        .filter(|p| match p.to_uppercase().as_str() {
            "N" | "E" => false,
            "S" | "W" => {
                negate = true;
                false
            }
            _ => true,
        })
        .copied()
        .collect();

    let magnitude = match numeric_parts.len() {
        1 => numeric_parts[0].parse::<f64>().ok()?,
        2 => {
            let degrees: f64 = numeric_parts[0].parse().ok()?;
            let minutes: f64 = numeric_parts[1].parse().ok()?;
            degrees + minutes / 60.0
        }
        3 => {
            let degrees: f64 = numeric_parts[0].parse().ok()?;
            let minutes: f64 = numeric_parts[1].parse().ok()?;
            let seconds: f64 = numeric_parts[2].parse().ok()?;
            degrees + minutes / 60.0 + seconds / 3600.0
        }
        _ => return None,
    };

    if !magnitude.is_finite() {
        return None;
    }

    Some(if negate { -magnitude.abs() } else { magnitude })
}

/// Parses `"latitude,longitude"` text.
///
/// Returns `Ok(None)` when either half is an absent marker, which covers the
/// `"None,None"` and `"nan,nan"` strings produced by a failed forward lookup.
pub fn parse_coordinate_text(text: &str) -> Result<Option<Coordinate>> {
    let (lat, lon) = text.split_once(',').ok_or_else(|| {
        GeocodeError::InvalidCoordinate(format!("expected 'latitude,longitude', got '{}'", text))
    })?;

    Coordinate::from_parts(parse_cell(lat)?, parse_cell(lon)?)
}
