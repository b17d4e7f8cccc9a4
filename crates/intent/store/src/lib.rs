//! Intent Store - durable collections owned by the engine
//!
//! Four append-only collections (signals, scores, movements, proofs;
//! the error sink additionally allows marking resolution) plus one
//! derived, rebuildable projection of current score + band per anchor.
//!
//! Lock poisoning surfaces as the transient `StoreUnavailable` error;
//! no operation leaves a partial effect behind it.

#![deny(unsafe_code)]

pub mod movements;
pub mod projection;
pub mod proofs;
pub mod scores;
pub mod signals;
pub mod sink;

pub use movements::MovementStore;
pub use projection::{AnchorSnapshot, CurrentStateProjection};
pub use proofs::ProofStore;
pub use scores::ScoreStore;
pub use signals::SignalStore;
pub use sink::ErrorSink;
