//! Pending restoration records.

use std::time::Instant;

use ember_utils::Location;

/// Why a block was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecordKind {
    /// The block the fire consumed.
    #[default]
    Primary,
    /// A block that hung on a burnt block and came down with it.
    ///
    /// Restored slightly after its support.
    Dependent,
}

/// A burnt block waiting to be put back.
#[derive(Debug, Clone)]
pub struct BurntBlock<S> {
    /// Where the block was.
    pub location: Location,
    /// The captured block.
    pub snapshot: S,
    /// When the block becomes eligible for restoration.
    pub ready_at: Instant,
    /// Why the block was recorded.
    pub kind: RecordKind,
    /// Queue slot, unique for the lifetime of the queue.
    slot: u64,
}

impl<S> BurntBlock<S> {
    /// Creates a record. The slot is assigned when it is enqueued.
    pub fn new(location: Location, snapshot: S, ready_at: Instant, kind: RecordKind) -> Self {
        Self {
            location,
            snapshot,
            ready_at,
            kind,
            slot: 0,
        }
    }

    /// Whether the record may be restored at `now`.
    #[inline]
    #[must_use]
    pub fn is_ready(&self, now: Instant) -> bool {
        now >= self.ready_at
    }

    /// The queue slot this record occupies.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> u64 {
        self.slot
    }

    pub(super) fn set_slot(&mut self, slot: u64) {
        self.slot = slot;
    }
}
