//! In-memory lookup service and throttle for unit tests

use crate::coordinate::Coordinate;
use crate::error::{GeocodeError, Result};
use crate::service::LookupService;
use crate::throttle::Throttle;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// Shared record of requests and pauses, in the order they happened
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn count(journal: &Journal, prefix: &str) -> usize {
    journal
        .borrow()
        .iter()
        .filter(|entry| entry.starts_with(prefix))
        .count()
}

pub struct FakeService {
    places: HashMap<String, Coordinate>,
    addresses: Vec<(Coordinate, String)>,
    failing: Option<String>,
    journal: Journal,
}

impl FakeService {
    pub fn new(journal: &Journal) -> Self {
        Self {
            places: HashMap::new(),
            addresses: Vec::new(),
            failing: None,
            journal: Rc::clone(journal),
        }
    }

    pub fn with_place(mut self, address: &str, lat: f64, lon: f64) -> Self {
        let coord = Coordinate::new(lat, lon).unwrap();
        self.places.insert(address.to_string(), coord);
        self.addresses.push((coord, address.to_string()));
        self
    }

    /// Requests for this address (or coordinate text) fail with a 503
    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing = Some(query.to_string());
        self
    }

    fn check_failure(&self, query: &str) -> Result<()> {
        if self.failing.as_deref() == Some(query) {
            return Err(GeocodeError::Status(503));
        }
        Ok(())
    }
}

impl LookupService for FakeService {
    fn search(&self, address: &str) -> Result<Option<Coordinate>> {
        self.journal.borrow_mut().push(format!("search:{}", address));
        self.check_failure(address)?;
        Ok(self.places.get(address).copied())
    }

    fn reverse(&self, coord: Coordinate) -> Result<Option<String>> {
        self.journal.borrow_mut().push(format!("reverse:{}", coord));
        self.check_failure(&coord.to_string())?;
        Ok(self
            .addresses
            .iter()
            .find(|(known, _)| {
                (known.latitude - coord.latitude).abs() < 1e-6
                    && (known.longitude - coord.longitude).abs() < 1e-6
            })
            .map(|(_, address)| address.clone()))
    }
}

pub struct RecordingThrottle {
    journal: Journal,
}

impl RecordingThrottle {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
        }
    }
}

impl Throttle for RecordingThrottle {
    fn pause(&self) {
        self.journal.borrow_mut().push("pause".to_string());
    }

    fn delay(&self) -> Duration {
        Duration::from_secs(1)
    }
}
