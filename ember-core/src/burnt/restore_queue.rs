//! Pending restoration queue.

use std::collections::VecDeque;
use std::mem;
use std::time::Instant;

use ember_utils::Location;
use rustc_hash::FxHashMap;

use super::BurntBlock;

/// Burnt blocks waiting for restoration, in the order they were recorded.
///
/// This struct provides:
/// - A FIFO queue that is also in ready order, since delays are fixed per kind
/// - Deduplication so a location is never pending twice
/// - A location to slot map the fire index uses as its back-reference
///
/// When a record is enqueued for a location that is already pending, the new
/// record is ignored and the existing one keeps its timing.
pub struct RestoreQueue<S> {
    /// Records in insertion order.
    queue: VecDeque<BurntBlock<S>>,
    /// Slot of the pending record at each location.
    slots: FxHashMap<Location, u64>,
    /// Next slot to hand out.
    next_slot: u64,
}

impl<S> RestoreQueue<S> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            slots: FxHashMap::default(),
            next_slot: 0,
        }
    }

    /// Appends a record unless its location is already pending.
    ///
    /// Returns the slot assigned to the record, or `None` if it was a duplicate.
    pub fn enqueue(&mut self, mut record: BurntBlock<S>) -> Option<u64> {
        if self.slots.contains_key(&record.location) {
            return None;
        }

        let slot = self.next_slot;
        self.next_slot = self.next_slot.wrapping_add(1);

        record.set_slot(slot);
        self.slots.insert(record.location.clone(), slot);
        self.queue.push_back(record);
        Some(slot)
    }

    /// Removes and returns every record ready at `now`, front to back.
    ///
    /// Scanning stops at the first record that is not ready yet, so this costs
    /// the number of ready records rather than the queue length.
    pub fn drain_ready(&mut self, now: Instant) -> Vec<BurntBlock<S>> {
        let mut ready = Vec::new();

        while self.queue.front().is_some_and(|record| record.is_ready(now)) {
            let Some(record) = self.queue.pop_front() else {
                break;
            };
            self.slots.remove(&record.location);
            ready.push(record);
        }

        ready
    }

    /// Removes and returns every record matching `predicate`, ready or not.
    ///
    /// Both the drained and the remaining records keep their relative order.
    pub fn force_drain_where<F>(&mut self, mut predicate: F) -> Vec<BurntBlock<S>>
    where
        F: FnMut(&BurntBlock<S>) -> bool,
    {
        let mut drained = Vec::new();
        let mut kept = VecDeque::with_capacity(self.queue.len());

        for record in mem::take(&mut self.queue) {
            if predicate(&record) {
                self.slots.remove(&record.location);
                drained.push(record);
            } else {
                kept.push_back(record);
            }
        }

        self.queue = kept;
        drained
    }

    /// Checks if a restoration is pending at `location`.
    #[must_use]
    pub fn is_pending(&self, location: &Location) -> bool {
        self.slots.contains_key(location)
    }

    /// The slot of the record pending at `location`.
    #[must_use]
    pub fn slot_of(&self, location: &Location) -> Option<u64> {
        self.slots.get(location).copied()
    }

    /// When the record at the front of the queue becomes ready.
    #[must_use]
    pub fn next_ready_at(&self) -> Option<Instant> {
        self.queue.front().map(|record| record.ready_at)
    }

    /// Iterates over the pending records in queue order.
    pub fn iter(&self) -> impl Iterator<Item = &BurntBlock<S>> {
        self.queue.iter()
    }

    /// Returns the number of pending records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<S> Default for RestoreQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}
