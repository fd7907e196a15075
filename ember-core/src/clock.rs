//! Time sources for the restoration scheduler.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A monotonic time source.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// The real monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a clock frozen at its creation instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    /// The instant the clock started at.
    #[must_use]
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// The instant `offset` after the origin.
    #[must_use]
    pub fn at(&self, offset: Duration) -> Instant {
        self.origin + offset
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    /// Moves the clock to `offset` after its origin. Going backwards is ignored.
    pub fn set(&self, offset: Duration) {
        let mut elapsed = self.elapsed.lock();
        if offset > *elapsed {
            *elapsed = offset;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}
