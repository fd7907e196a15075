//! The world boundary the restoration scheduler talks to.
//!
//! The host server owns the blocks. The scheduler only ever asks it to
//! snapshot a block, remove it, or put a snapshot back.

use std::fmt::Debug;

use ember_utils::{Direction, Location};
use thiserror::Error;

/// Why a snapshot could not be put back into the world.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RestoreError {
    /// Something else now occupies the position.
    #[error("position is occupied by {0}")]
    Occupied(String),
    /// The world or chunk holding the position is not loaded.
    #[error("world or chunk is not loaded")]
    Unloaded,
    /// The host refused the restoration.
    #[error("restore rejected: {0}")]
    Rejected(String),
}

/// A captured block, enough to recreate it.
pub trait CapturedBlock: Clone + Debug + Send + Sync + 'static {
    /// The namespaced block id, e.g. `minecraft:oak_planks`.
    fn block_id(&self) -> &str;

    /// Whether this is an air block.
    fn is_air(&self) -> bool {
        self.block_id() == "minecraft:air"
    }

    /// Whether this block hangs on the block in the opposite direction of `face`.
    ///
    /// `face` points from the supporting block towards this block, so a torch
    /// standing on top of its support answers `true` for `Direction::Up`.
    fn is_supported_from(&self, face: Direction) -> bool;
}

/// Mutable access to the host world.
///
/// Called from the host's world context only, except `capture_block` which
/// must tolerate any thread.
pub trait BlockWorld: Send + Sync + 'static {
    /// The snapshot type used to restore blocks.
    type Snapshot: CapturedBlock;

    /// Captures the block at `loc`, or `None` if the world is not loaded.
    fn capture_block(&self, loc: &Location) -> Option<Self::Snapshot>;

    /// Removes the block at `loc`, leaving air.
    fn remove_block(&self, loc: &Location);

    /// Puts `snapshot` back at `loc`.
    fn restore_block(&self, loc: &Location, snapshot: &Self::Snapshot) -> Result<(), RestoreError>;
}
