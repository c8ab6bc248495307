use std::time::Duration;

/// Blocks the caller after every lookup request to respect the service's
/// usage policy.
pub trait Throttle {
    fn pause(&self);

    /// Length of one pause, used for duration estimates
    fn delay(&self) -> Duration;
}

impl<T: Throttle + ?Sized> Throttle for &T {
    fn pause(&self) {
        (**self).pause()
    }

    fn delay(&self) -> Duration {
        (**self).delay()
    }
}

/// Sleeps the current thread for a fixed duration (1 request/second for Nominatim)
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Throttle for FixedDelay {
    fn pause(&self) {
        log::trace!("Rate limiting: sleeping {:?}", self.delay);
        std::thread::sleep(self.delay);
    }

    fn delay(&self) -> Duration {
        self.delay
    }
}
