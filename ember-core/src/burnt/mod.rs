//! Burnt block restoration.
//!
//! Blocks destroyed by fire are snapshotted, removed, and put back once their
//! delay has passed. A restored block then stays fireproof for a cooldown so
//! the fire that is still burning around it cannot immediately take it again.
//!
//! # Architecture
//!
//! - [`BurntBlock`] - A single pending restoration
//! - [`RestoreQueue`] - Pending restorations in ready order, with per-location deduplication
//! - [`FireIndex`] - Sparse spatial index of pending locations for neighbour queries
//! - [`CooldownCache`] - Burn-again suppression, location to expiry
//! - [`BurntBlockManager`] - Owns the three structures and their locking

mod burnt_block;
mod cooldown;
mod fire_index;
mod manager;
mod restore_queue;

pub use burnt_block::{BurntBlock, RecordKind};
pub use cooldown::CooldownCache;
pub use fire_index::FireIndex;
pub use manager::{BurntBlockManager, CleanupReport, RecordOutcome, TickReport};
pub use restore_queue::RestoreQueue;
