//! In-memory block world.
//!
//! Keeps blocks in a concurrent map instead of chunks. Useful for:
//! - Running the restoration scheduler without a server
//! - Integration tests of the host-facing service

use ember_core::{BlockWorld, CapturedBlock, RestoreError};
use ember_utils::{Direction, Location, WorldId};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use scc::HashMap;

/// Block id of air.
pub const AIR: &str = "minecraft:air";

/// A block stored in a [`MemoryWorld`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    id: String,
    /// Face of the supporting block this block hangs on, if any.
    support_face: Option<Direction>,
}

impl MemoryBlock {
    /// A free standing block.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            support_face: None,
        }
    }

    /// A block that hangs on the block next to it.
    ///
    /// `face` points from the support towards this block.
    #[must_use]
    pub fn attached(id: impl Into<String>, face: Direction) -> Self {
        Self {
            id: id.into(),
            support_face: Some(face),
        }
    }

    /// An air block.
    #[must_use]
    pub fn air() -> Self {
        Self::new(AIR)
    }

    /// The block id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl CapturedBlock for MemoryBlock {
    fn block_id(&self) -> &str {
        &self.id
    }

    fn is_supported_from(&self, face: Direction) -> bool {
        self.support_face == Some(face)
    }
}

/// A [`BlockWorld`] held entirely in memory.
///
/// Positions that were never set are air. Blocks in unloaded worlds can be
/// neither captured nor restored.
pub struct MemoryWorld {
    blocks: HashMap<Location, MemoryBlock>,
    loaded: RwLock<FxHashSet<WorldId>>,
}

impl MemoryWorld {
    /// Creates a world store with `worlds` loaded.
    #[must_use]
    pub fn new(worlds: impl IntoIterator<Item = WorldId>) -> Self {
        Self {
            blocks: HashMap::new(),
            loaded: RwLock::new(worlds.into_iter().collect()),
        }
    }

    /// Marks `world` as loaded.
    pub fn load_world(&self, world: WorldId) {
        self.loaded.write().insert(world);
    }

    /// Marks `world` as unloaded. Its blocks are kept.
    pub fn unload_world(&self, world: &WorldId) {
        self.loaded.write().remove(world);
    }

    /// Checks if `world` is loaded.
    #[must_use]
    pub fn is_loaded(&self, world: &WorldId) -> bool {
        self.loaded.read().contains(world)
    }

    /// Places `block` at `loc`, replacing whatever was there.
    pub fn set_block(&self, loc: &Location, block: MemoryBlock) {
        let _ = self.blocks.remove_sync(loc);
        if !block.is_air() {
            let _ = self.blocks.insert_sync(loc.clone(), block);
        }
    }

    /// The block at `loc`, air included.
    #[must_use]
    pub fn block_at(&self, loc: &Location) -> MemoryBlock {
        self.blocks
            .read_sync(loc, |_, block| block.clone())
            .unwrap_or_else(MemoryBlock::air)
    }

    /// Number of non-air blocks across all worlds.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl BlockWorld for MemoryWorld {
    type Snapshot = MemoryBlock;

    fn capture_block(&self, loc: &Location) -> Option<MemoryBlock> {
        self.is_loaded(&loc.world).then(|| self.block_at(loc))
    }

    fn remove_block(&self, loc: &Location) {
        if self.is_loaded(&loc.world) {
            let _ = self.blocks.remove_sync(loc);
        }
    }

    fn restore_block(&self, loc: &Location, snapshot: &MemoryBlock) -> Result<(), RestoreError> {
        if !self.is_loaded(&loc.world) {
            return Err(RestoreError::Unloaded);
        }
        if let Some(existing) = self.blocks.read_sync(loc, |_, block| block.id.clone()) {
            return Err(RestoreError::Occupied(existing));
        }
        self.set_block(loc, snapshot.clone());
        Ok(())
    }
}
