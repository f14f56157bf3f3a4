//! Headless testing helpers: Pilot, snapshot outlines.
//!
//! Use the [`Pilot`] to drive a [`View`](crate::view::View) with simulated
//! input. Use [`outline`] to capture a subtree as plain text for snapshot
//! assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::outline;
