//! Batched decay sweep over all tracked anchors
//!
//! The sweep walks anchors in stable id order, persisting a cursor after
//! each one. A sweep interrupted mid-run resumes from the cursor, and
//! its deterministic per-anchor correlation ids make a replayed anchor a
//! no-op rather than a double decay.

use crate::engine::{decay_correlation, ScoreEngine, ScoreOutcome};
use intent_types::{AnchorId, EngineResult};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// What one sweep batch did
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepReport {
    /// Anchors decayed in this batch
    pub processed: usize,
    /// Anchors skipped because another writer held their lock
    pub skipped: Vec<AnchorId>,
    /// True when the batch reached the end of the anchor list
    pub completed: bool,
}

/// Resumable decay sweep
pub struct DecaySweep {
    engine: Arc<ScoreEngine>,
    cursor: RwLock<Option<AnchorId>>,
}

impl DecaySweep {
    /// Create a sweep over the engine, starting from the beginning
    pub fn new(engine: Arc<ScoreEngine>) -> Self {
        Self {
            engine,
            cursor: RwLock::new(None),
        }
    }

    /// The anchor the last completed step recorded, if mid-run
    pub fn cursor(&self) -> EngineResult<Option<AnchorId>> {
        let cursor = self.cursor.read().map_err(|_| cursor_poisoned())?;
        Ok(cursor.clone())
    }

    /// Run one batch of at most `batch_limit` anchors as of `as_of`
    ///
    /// Busy anchors are skipped, not waited on; they are retried by a
    /// later run once the sweep wraps around.
    pub fn run(
        &self,
        as_of: chrono::DateTime<chrono::Utc>,
        batch_limit: usize,
    ) -> EngineResult<SweepReport> {
        let resume_after = self.cursor()?;
        let anchors = self.engine.tracked_anchors()?;
        let remaining: Vec<AnchorId> = anchors
            .into_iter()
            .filter(|a| match &resume_after {
                Some(cursor) => a > cursor,
                None => true,
            })
            .collect();

        let batch: Vec<AnchorId> = remaining.iter().take(batch_limit).cloned().collect();
        let completed = batch.len() == remaining.len();

        let mut processed = 0;
        let mut skipped = Vec::new();
        for anchor in &batch {
            match self.engine.apply_decay_if_idle(anchor, as_of)? {
                Some(ScoreOutcome { record, .. }) => {
                    processed += 1;
                    debug!(
                        anchor = %anchor,
                        score = record.score,
                        delta = record.delta,
                        "sweep decayed anchor"
                    );
                }
                None => {
                    debug!(anchor = %anchor, "sweep skipped busy anchor");
                    skipped.push(anchor.clone());
                }
            }
            // Persist progress after each anchor so an interrupted sweep
            // resumes here instead of at the start
            let mut cursor = self.cursor.write().map_err(|_| cursor_poisoned())?;
            *cursor = Some(anchor.clone());
        }

        if completed {
            let mut cursor = self.cursor.write().map_err(|_| cursor_poisoned())?;
            *cursor = None;
        }

        info!(
            processed,
            skipped = skipped.len(),
            completed,
            "decay sweep batch finished"
        );
        Ok(SweepReport {
            processed,
            skipped,
            completed,
        })
    }
}

fn cursor_poisoned() -> intent_types::EngineError {
    intent_types::EngineError::StoreUnavailable("sweep cursor poisoned".to_string())
}
