//! Turns the host's fire events into burnt block records.

use std::sync::Arc;

use ember_utils::{Direction, Location};
use smallvec::SmallVec;

use crate::burnt::{BurntBlockManager, RecordOutcome};
use crate::clock::Clock;
use crate::config::ConfigHandle;
use crate::world::{BlockWorld, CapturedBlock};

/// TNT is left alone so it can still prime.
pub const TNT: &str = "minecraft:tnt";

/// Why a burn event was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Burnt block replacement is turned off for the world.
    ReplaceDisabled,
    /// The world is not loaded.
    Unloaded,
    /// The burning block is TNT.
    Tnt,
    /// The burning block is black listed, or missing from the white list.
    BlackListed,
    /// There is nothing at the location.
    Air,
}

/// The result of [`BurnListener::on_block_burn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnOutcome {
    /// The block and `dependents` attached blocks are scheduled for restoration.
    Recorded {
        /// Attached blocks recorded alongside.
        dependents: usize,
    },
    /// The block was restored recently and is not recorded again.
    CoolingDown,
    /// The block is already waiting to be restored.
    AlreadyPending,
    /// The event was ignored.
    Skipped(SkipReason),
}

/// What the host should do with an ignition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgniteVerdict {
    /// The block was just restored, cancel the ignition.
    Cancel,
    /// Let the fire start. `cascade` is set when the fire is spreading from
    /// blocks that are already burnt.
    Allow {
        /// Whether a neighbouring block is waiting to be restored.
        cascade: bool,
    },
}

/// Host-facing entry point for fire events.
pub struct BurnListener<W: BlockWorld, C: Clock> {
    manager: Arc<BurntBlockManager<W, C>>,
    config: Arc<ConfigHandle>,
}

impl<W: BlockWorld, C: Clock> BurnListener<W, C> {
    /// Creates a listener feeding `manager`, filtered by the live `config`.
    #[must_use]
    pub fn new(manager: Arc<BurntBlockManager<W, C>>, config: Arc<ConfigHandle>) -> Self {
        Self { manager, config }
    }

    /// Handles a block being destroyed by fire.
    ///
    /// Must run before the host removes the block, so it can still be captured.
    pub fn on_block_burn(&self, location: &Location) -> BurnOutcome {
        let config = self.config.get();
        let world_config = config.world(&location.world);
        if !world_config.replace_burnt {
            return BurnOutcome::Skipped(SkipReason::ReplaceDisabled);
        }

        let world = self.manager.world();
        let Some(snapshot) = world.capture_block(location) else {
            return BurnOutcome::Skipped(SkipReason::Unloaded);
        };
        if snapshot.is_air() {
            return BurnOutcome::Skipped(SkipReason::Air);
        }
        if snapshot.block_id() == TNT {
            return BurnOutcome::Skipped(SkipReason::Tnt);
        }
        if world_config.is_black_listed(snapshot.block_id()) {
            return BurnOutcome::Skipped(SkipReason::BlackListed);
        }

        let dependents: SmallVec<[(Location, W::Snapshot); 5]> = Direction::CARDINALS
            .iter()
            .filter_map(|&face| {
                let neighbour = face.relative_location(location)?;
                let block = world.capture_block(&neighbour)?;
                (!block.is_air() && block.is_supported_from(face)).then_some((neighbour, block))
            })
            .collect();

        match self.manager.record_cascade(location.clone(), snapshot, dependents) {
            (RecordOutcome::Recorded, dependents) => BurnOutcome::Recorded { dependents },
            (RecordOutcome::CoolingDown, _) => BurnOutcome::CoolingDown,
            (RecordOutcome::AlreadyPending, _) => BurnOutcome::AlreadyPending,
        }
    }

    /// Handles fire trying to start at `location`.
    #[must_use]
    pub fn on_block_ignite(&self, location: &Location) -> IgniteVerdict {
        if self.manager.is_on_cooldown(location) {
            log::trace!("Cancelling ignition at {location}, restored recently");
            return IgniteVerdict::Cancel;
        }
        IgniteVerdict::Allow {
            cascade: self.manager.has_neighbor(location),
        }
    }

    /// The manager this listener feeds.
    #[must_use]
    pub fn manager(&self) -> &Arc<BurntBlockManager<W, C>> {
        &self.manager
    }
}
