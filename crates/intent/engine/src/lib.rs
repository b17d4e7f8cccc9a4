//! Intent Engine - score aggregation, decay, and movement detection
//!
//! **CRITICAL INVARIANT**: `|delta| ≤ delta_cap` for every accepted
//! mutation, decay included. Same-anchor mutations are serialized through
//! a per-anchor lock; different anchors never coordinate.
//!
//! Every mutation writes through the guard layer. A rejection leaves the
//! previous score untouched and is surfaced, never retried here.

#![deny(unsafe_code)]

pub mod engine;
pub mod locks;
pub mod movement;
pub mod sweep;

pub use engine::{ScoreEngine, ScoreOutcome, SignalReport};
pub use locks::AnchorLocks;
pub use movement::MovementDetector;
pub use sweep::{DecaySweep, SweepReport};
