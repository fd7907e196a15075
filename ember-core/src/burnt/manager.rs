//! The burnt block manager.
//!
//! Three execution contexts share a manager:
//! - the host's world context, which records burnt blocks and runs [`BurntBlockManager::tick`]
//! - the cleanup task, which runs [`BurntBlockManager::cleanup`] on a background worker
//! - any thread asking [`BurntBlockManager::has_neighbor`] or [`BurntBlockManager::is_on_cooldown`]
//!
//! The restore queue and the fire index are always changed together under one
//! mutex. The cooldown cache has its own lock, taken after the state lock when
//! both are needed. World calls are made with no lock held.

use std::sync::Arc;
use std::time::Instant;

use ember_utils::{Location, WorldId};
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;

use super::{BurntBlock, CooldownCache, FireIndex, RecordKind, RestoreQueue};
use crate::clock::{Clock, SystemClock};
use crate::config::BurnSettings;
use crate::world::{BlockWorld, CapturedBlock};

/// What happened to a burnt block handed to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The block was removed and will be restored later.
    Recorded,
    /// The block was restored recently and must not burn again yet.
    CoolingDown,
    /// A restoration is already pending at this location.
    AlreadyPending,
}

/// Result of a restoration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Blocks put back into the world.
    pub restored: usize,
    /// Blocks the world refused, dropped without retry.
    pub failed: usize,
}

/// Result of a cleanup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    /// Empty fire index buckets freed.
    pub buckets_reclaimed: usize,
    /// Expired cooldowns removed.
    pub cooldowns_evicted: usize,
}

/// The queue and the index, which must never disagree.
struct BurntState<S> {
    queue: RestoreQueue<S>,
    fire_index: FireIndex,
}

/// Schedules burnt blocks for restoration and keeps restored blocks fireproof for a while.
///
/// One manager serves every world of a server. Share it behind an `Arc`.
pub struct BurntBlockManager<W: BlockWorld, C: Clock = SystemClock> {
    world: Arc<W>,
    clock: Arc<C>,
    settings: BurnSettings,
    state: Mutex<BurntState<W::Snapshot>>,
    cooldowns: RwLock<CooldownCache>,
}

impl<W: BlockWorld, C: Clock> BurntBlockManager<W, C> {
    /// Creates a manager restoring blocks into `world`.
    pub fn new(world: Arc<W>, clock: Arc<C>, settings: BurnSettings) -> Self {
        if settings.lightweight {
            log::info!("Burnt block manager running in lightweight mode");
        }
        Self {
            world,
            clock,
            settings,
            state: Mutex::new(BurntState {
                queue: RestoreQueue::new(),
                fire_index: FireIndex::new(),
            }),
            cooldowns: RwLock::new(CooldownCache::new()),
        }
    }

    /// Records a burnt block and removes it from the world.
    ///
    /// Nothing happens if the location is cooling down or already pending.
    pub fn record(&self, location: Location, snapshot: W::Snapshot, kind: RecordKind) -> RecordOutcome {
        let now = self.clock.now();
        if self.is_on_cooldown_at(&location, now) {
            log::trace!("Ignoring burn at {location}, still cooling down");
            return RecordOutcome::CoolingDown;
        }

        let outcome = {
            let mut state = self.state.lock();
            self.enqueue(&mut state, location.clone(), snapshot, kind, now)
        };

        if outcome == RecordOutcome::Recorded {
            self.world.remove_block(&location);
        }
        outcome
    }

    /// Records a burnt block together with the blocks hanging on it.
    ///
    /// The dependents are only recorded if the primary block is. They are
    /// removed from the world before their support, and restored shortly
    /// after it. Returns the primary outcome and how many dependents were
    /// recorded.
    pub fn record_cascade<I>(&self, location: Location, snapshot: W::Snapshot, dependents: I) -> (RecordOutcome, usize)
    where
        I: IntoIterator<Item = (Location, W::Snapshot)>,
    {
        let now = self.clock.now();
        if self.is_on_cooldown_at(&location, now) {
            log::trace!("Ignoring burn at {location}, still cooling down");
            return (RecordOutcome::CoolingDown, 0);
        }

        let dependents: SmallVec<[(Location, W::Snapshot); 5]> = dependents
            .into_iter()
            .filter(|(loc, _)| !self.is_on_cooldown_at(loc, now))
            .collect();

        let mut removed: SmallVec<[Location; 5]> = SmallVec::new();
        let outcome = {
            let mut state = self.state.lock();
            let outcome = self.enqueue(&mut state, location.clone(), snapshot, RecordKind::Primary, now);
            if outcome == RecordOutcome::Recorded {
                for (loc, snapshot) in dependents {
                    if self.enqueue(&mut state, loc.clone(), snapshot, RecordKind::Dependent, now)
                        == RecordOutcome::Recorded
                    {
                        removed.push(loc);
                    }
                }
            }
            outcome
        };

        if outcome == RecordOutcome::Recorded {
            for loc in &removed {
                self.world.remove_block(loc);
            }
            self.world.remove_block(&location);
        }
        (outcome, removed.len())
    }

    /// Restores every block that is ready at `now`.
    ///
    /// Runs from the host's world context. Failed restorations are logged and dropped.
    pub fn tick(&self, now: Instant) -> TickReport {
        let ready = {
            let mut state = self.state.lock();
            let ready = state.queue.drain_ready(now);
            self.release(&mut state, &ready, now);
            ready
        };

        if ready.is_empty() {
            return TickReport::default();
        }
        self.restore_all(ready)
    }

    /// Restores every pending block of `world` right away, ready or not.
    pub fn force_replace(&self, world: &WorldId) -> TickReport {
        let now = self.clock.now();
        let drained = {
            let mut state = self.state.lock();
            let drained = state.queue.force_drain_where(|record| record.location.world == *world);
            self.release(&mut state, &drained, now);
            drained
        };

        log::info!("Force replacing {} burnt blocks in {world}", drained.len());
        if drained.is_empty() {
            return TickReport::default();
        }
        self.restore_all(drained)
    }

    /// Frees empty fire index buckets and forgets expired cooldowns.
    ///
    /// Runs from the background cleanup task. Does nothing in lightweight mode.
    pub fn cleanup(&self, now: Instant) -> CleanupReport {
        if self.settings.lightweight {
            return CleanupReport::default();
        }

        let buckets_reclaimed = self.state.lock().fire_index.compact();
        let cooldowns_evicted = self.cooldowns.write().evict(now);

        CleanupReport {
            buckets_reclaimed,
            cooldowns_evicted,
        }
    }

    /// Returns true if `location` or a face neighbour of it is waiting for restoration.
    ///
    /// Always false in lightweight mode.
    #[must_use]
    pub fn has_neighbor(&self, location: &Location) -> bool {
        !self.settings.lightweight && self.state.lock().fire_index.has_neighbor(location)
    }

    /// Returns true if no restoration is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let state = self.state.lock();
        if self.settings.lightweight {
            state.queue.is_empty()
        } else {
            state.fire_index.is_empty()
        }
    }

    /// Returns true if `location` was restored recently and must not burn again yet.
    #[must_use]
    pub fn is_on_cooldown(&self, location: &Location) -> bool {
        self.is_on_cooldown_at(location, self.clock.now())
    }

    /// Checks if a restoration is pending at `location`.
    #[must_use]
    pub fn is_pending(&self, location: &Location) -> bool {
        self.state.lock().queue.is_pending(location)
    }

    /// Returns the number of pending restorations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Returns the number of cooldown entries, expired ones included.
    #[must_use]
    pub fn cooldown_count(&self) -> usize {
        self.cooldowns.read().len()
    }

    /// When the next pending block becomes ready.
    #[must_use]
    pub fn next_ready_at(&self) -> Option<Instant> {
        self.state.lock().queue.next_ready_at()
    }

    /// Worlds with at least one pending restoration.
    #[must_use]
    pub fn pending_worlds(&self) -> Vec<WorldId> {
        let state = self.state.lock();
        let mut worlds: Vec<WorldId> = Vec::new();
        for record in state.queue.iter() {
            if !worlds.contains(&record.location.world) {
                worlds.push(record.location.world.clone());
            }
        }
        worlds
    }

    /// The timing this manager was built with.
    #[must_use]
    pub fn settings(&self) -> &BurnSettings {
        &self.settings
    }

    /// The clock driving this manager.
    #[must_use]
    pub fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// The world blocks are restored into.
    #[must_use]
    pub fn world(&self) -> &Arc<W> {
        &self.world
    }

    fn is_on_cooldown_at(&self, location: &Location, now: Instant) -> bool {
        !self.settings.lightweight && self.cooldowns.read().is_active(location, now)
    }

    fn enqueue(
        &self,
        state: &mut BurntState<W::Snapshot>,
        location: Location,
        snapshot: W::Snapshot,
        kind: RecordKind,
        now: Instant,
    ) -> RecordOutcome {
        let ready_at = now + self.settings.delay_for(kind);
        let record = BurntBlock::new(location.clone(), snapshot, ready_at, kind);

        let Some(slot) = state.queue.enqueue(record) else {
            return RecordOutcome::AlreadyPending;
        };
        if !self.settings.lightweight {
            state.fire_index.add(&location, slot);
        }
        RecordOutcome::Recorded
    }

    /// Unindexes drained records and puts them on cooldown before `state` is released.
    ///
    /// A burn arriving while the block is being restored then sees the
    /// cooldown instead of an empty slot.
    fn release(&self, state: &mut BurntState<W::Snapshot>, records: &[BurntBlock<W::Snapshot>], now: Instant) {
        if self.settings.lightweight || records.is_empty() {
            return;
        }
        let expiry = now + self.settings.cooldown;
        let mut cooldowns = self.cooldowns.write();
        for record in records {
            state.fire_index.remove(&record.location, record.slot());
            cooldowns.put(record.location.clone(), expiry);
        }
    }

    fn restore_all(&self, records: Vec<BurntBlock<W::Snapshot>>) -> TickReport {
        let mut report = TickReport::default();
        let mut failed: Vec<Location> = Vec::new();

        for record in records {
            match self.world.restore_block(&record.location, &record.snapshot) {
                Ok(()) => report.restored += 1,
                Err(err) => {
                    report.failed += 1;
                    log::warn!(
                        "Could not restore burnt {} at {}: {err}",
                        record.snapshot.block_id(),
                        record.location
                    );
                    failed.push(record.location);
                }
            }
        }

        if !self.settings.lightweight && !failed.is_empty() {
            let mut cooldowns = self.cooldowns.write();
            for location in &failed {
                cooldowns.remove(location);
            }
        }

        log::debug!(
            "Restored {} burnt blocks ({} failed)",
            report.restored,
            report.failed
        );
        report
    }
}
