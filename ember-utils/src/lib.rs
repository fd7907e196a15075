//! # Ember Utils
//!
//! Shared value types for the Ember block restoration workspace.
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
    clippy::cargo_common_metadata
)]

/// Face directions.
pub mod direction;
/// Small integer vector math.
pub mod math;
/// Position and world identifier types.
pub mod types;

pub use direction::Direction;
pub use types::{BlockPos, Location, SectionPos, WorldId};
