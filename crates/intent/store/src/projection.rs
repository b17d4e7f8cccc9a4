//! Derived current-state projection
//!
//! One snapshot of score + band per anchor for fast reads. The projection
//! is not authoritative: it can be dropped and rebuilt from the score
//! store at any time, and rebuilding yields an identical projection.

use crate::scores::ScoreStore;
use intent_types::{AnchorId, Band, EngineError, EngineResult, ScoreRecord};
use std::collections::HashMap;
use std::sync::RwLock;

/// Current score and band for one anchor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorSnapshot {
    pub score: i64,
    pub band: Band,
    pub version: u64,
    pub watermark: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Rebuildable projection of current score + band per anchor
pub struct CurrentStateProjection {
    current: RwLock<HashMap<AnchorId, AnchorSnapshot>>,
}

impl CurrentStateProjection {
    /// Create an empty projection
    pub fn new() -> Self {
        Self {
            current: RwLock::new(HashMap::new()),
        }
    }

    /// Fold an accepted score record into the projection
    pub fn apply(&self, record: &ScoreRecord) -> EngineResult<()> {
        let mut current = self.current.write().map_err(|_| lock_poisoned())?;
        current.insert(
            record.anchor_id.clone(),
            AnchorSnapshot {
                score: record.score,
                band: record.band,
                version: record.version,
                watermark: record.watermark,
                updated_at: record.computed_at,
            },
        );
        Ok(())
    }

    /// Current snapshot for an anchor
    pub fn get(&self, anchor_id: &AnchorId) -> EngineResult<Option<AnchorSnapshot>> {
        let current = self.current.read().map_err(|_| lock_poisoned())?;
        Ok(current.get(anchor_id).cloned())
    }

    /// Drop everything and rebuild from the authoritative score store
    pub fn rebuild_from(&self, scores: &ScoreStore) -> EngineResult<()> {
        let mut rebuilt = HashMap::new();
        for anchor_id in scores.anchors()? {
            if let Some(record) = scores.latest(&anchor_id)? {
                rebuilt.insert(
                    anchor_id,
                    AnchorSnapshot {
                        score: record.score,
                        band: record.band,
                        version: record.version,
                        watermark: record.watermark,
                        updated_at: record.computed_at,
                    },
                );
            }
        }
        let mut current = self.current.write().map_err(|_| lock_poisoned())?;
        *current = rebuilt;
        Ok(())
    }

    /// Number of tracked anchors
    pub fn len(&self) -> EngineResult<usize> {
        let current = self.current.read().map_err(|_| lock_poisoned())?;
        Ok(current.len())
    }

    /// Whether the projection is empty
    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for CurrentStateProjection {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned() -> EngineError {
    EngineError::StoreUnavailable("projection lock poisoned".to_string())
}
