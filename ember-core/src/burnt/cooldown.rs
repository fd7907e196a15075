//! Burn-again cooldown.

use std::time::Instant;

use ember_utils::Location;
use rustc_hash::FxHashMap;

/// Locations that were restored recently, mapped to when they may burn again.
///
/// Reads never evict. Expired entries are only purged by [`CooldownCache::evict`],
/// which runs from the cleanup driver.
#[derive(Debug, Default)]
pub struct CooldownCache {
    entries: FxHashMap<Location, Instant>,
}

impl CooldownCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cooldown of `location` to end at `expiry`, replacing any previous one.
    pub fn put(&mut self, location: Location, expiry: Instant) {
        self.entries.insert(location, expiry);
    }

    /// Drops the cooldown of `location`, returning true if there was one.
    pub fn remove(&mut self, location: &Location) -> bool {
        self.entries.remove(location).is_some()
    }

    /// Checks if `location` is still cooling down at `now`.
    #[must_use]
    pub fn is_active(&self, location: &Location, now: Instant) -> bool {
        self.entries.get(location).is_some_and(|expiry| *expiry > now)
    }

    /// Removes every entry that expired at or before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn evict(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expiry| *expiry > now);
        before - self.entries.len()
    }

    /// Returns the number of entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
