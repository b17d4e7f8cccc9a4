//! Intent Read - the read-only query surface
//!
//! Read-only by construction: the reader holds shared store handles and
//! exposes nothing that mutates them. Consumers that need current state
//! come here, never to the engine.

#![deny(unsafe_code)]

use intent_store::{
    AnchorSnapshot, CurrentStateProjection, MovementStore, ProofStore, ScoreStore, SignalStore,
};
use intent_types::{
    AnchorId, Band, EngineError, EngineResult, MovementEvent, ProofLine, ScoreRecord, Signal,
};
use std::sync::Arc;

/// Read-only view over the intent stores
pub struct IntentReader {
    signals: Arc<SignalStore>,
    scores: Arc<ScoreStore>,
    movements: Arc<MovementStore>,
    proofs: Arc<ProofStore>,
    projection: Arc<CurrentStateProjection>,
}

impl IntentReader {
    /// Create a reader over shared store handles
    pub fn new(
        signals: Arc<SignalStore>,
        scores: Arc<ScoreStore>,
        movements: Arc<MovementStore>,
        proofs: Arc<ProofStore>,
        projection: Arc<CurrentStateProjection>,
    ) -> Self {
        Self {
            signals,
            scores,
            movements,
            proofs,
            projection,
        }
    }

    /// Current score for an anchor
    pub fn get_score(&self, anchor_id: &AnchorId) -> EngineResult<i64> {
        Ok(self.snapshot(anchor_id)?.score)
    }

    /// Current band for an anchor
    pub fn get_band(&self, anchor_id: &AnchorId) -> EngineResult<Band> {
        Ok(self.snapshot(anchor_id)?.band)
    }

    /// Current projected state for an anchor
    pub fn snapshot(&self, anchor_id: &AnchorId) -> EngineResult<AnchorSnapshot> {
        self.projection
            .get(anchor_id)?
            .ok_or_else(|| EngineError::AnchorUnknown(anchor_id.as_str().to_string()))
    }

    /// Full score record history, oldest first
    pub fn get_score_history(&self, anchor_id: &AnchorId) -> EngineResult<Vec<ScoreRecord>> {
        self.scores.history(anchor_id)
    }

    /// The `limit` most recent proof lines, newest first
    pub fn get_recent_proof_lines(
        &self,
        anchor_id: &AnchorId,
        limit: usize,
    ) -> EngineResult<Vec<ProofLine>> {
        self.proofs.recent_for(anchor_id, limit)
    }

    /// The `limit` most recent movement events, newest first
    pub fn get_recent_movements(
        &self,
        anchor_id: &AnchorId,
        limit: usize,
    ) -> EngineResult<Vec<MovementEvent>> {
        self.movements.recent_for(anchor_id, limit)
    }

    /// Signals observed in `[from, to)`, oldest first
    pub fn get_signals(
        &self,
        anchor_id: &AnchorId,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
    ) -> EngineResult<Vec<Signal>> {
        self.signals.signals_in_window(anchor_id, from, to)
    }

    /// All anchors with projected state, in id order
    pub fn anchors(&self) -> EngineResult<Vec<AnchorId>> {
        self.scores.anchors()
    }
}
