//! # Ember Core
//!
//! Burnt block restoration: pending restorations, the active fire index and
//! the burn-again cooldown, plus the drivers that keep them moving.
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(
    clippy::single_call_fn,
    clippy::multiple_inherent_impl,
    clippy::shadow_unrelated,
    clippy::missing_errors_doc,
    clippy::struct_excessive_bools,
    clippy::needless_pass_by_value,
    clippy::cargo_common_metadata
)]

pub mod burnt;
pub mod clock;
pub mod config;
pub mod driver;
pub mod listener;
pub mod world;

pub use burnt::{BurntBlockManager, RecordKind, RecordOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use world::{BlockWorld, CapturedBlock, RestoreError};

#[cfg(test)]
mod test_world;
