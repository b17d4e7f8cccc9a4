//! Intent Types - Data model for the buyer-intent scoring engine
//!
//! **CRITICAL INVARIANT**: Every engine record references the canonical
//! spine anchor. The deprecated per-tenant identifier is rejected at the
//! guard boundary and never persisted.
//!
//! Configuration is explicit, versioned data threaded into every scoring
//! call, so historical proof lines stay reproducible after config changes.

#![deny(unsafe_code)]

pub mod anchor;
pub mod audit;
pub mod band;
pub mod config;
pub mod errors;
pub mod movement;
pub mod proof;
pub mod score;
pub mod signal;

pub use anchor::{AnchorId, CorrelationId, IdentityRef};
pub use audit::{ErrorRecord, ErrorRecordId};
pub use band::{Band, BandThresholds};
pub use config::{EngineConfig, SignalWeight, SignalWeightTable};
pub use errors::{EngineError, EngineResult};
pub use movement::{Direction, MovementEvent, MovementId};
pub use proof::{ProofId, ProofLine};
pub use score::{ScoreRecord, ScoreRecordId};
pub use signal::{Signal, SignalId, SignalType};
