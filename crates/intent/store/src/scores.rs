//! Versioned per-anchor score history
//!
//! Appends enforce the per-anchor sequence: version `n + 1` only follows
//! version `n`. A writer that lost the race gets a typed conflict and the
//! store is left untouched, which is what makes same-anchor mutations
//! atomic from the outside.

use intent_types::{AnchorId, CorrelationId, EngineError, EngineResult, ScoreRecord};
use std::collections::HashMap;
use std::sync::RwLock;

/// Append-only, versioned score record store
pub struct ScoreStore {
    history: RwLock<HashMap<AnchorId, Vec<ScoreRecord>>>,
    by_correlation: RwLock<HashMap<(AnchorId, CorrelationId), ScoreRecord>>,
}

impl ScoreStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            history: RwLock::new(HashMap::new()),
            by_correlation: RwLock::new(HashMap::new()),
        }
    }

    /// Append a record, enforcing the per-anchor version sequence
    pub fn append(&self, record: ScoreRecord) -> EngineResult<()> {
        let mut history = self.history.write().map_err(|_| lock_poisoned())?;
        let entries = history.entry(record.anchor_id.clone()).or_default();

        let expected = entries.last().map(|r| r.version + 1).unwrap_or(1);
        if record.version != expected {
            return Err(EngineError::VersionConflict {
                anchor: record.anchor_id.as_str().to_string(),
                expected,
                got: record.version,
            });
        }

        let mut by_correlation = self.by_correlation.write().map_err(|_| lock_poisoned())?;
        by_correlation.insert(
            (record.anchor_id.clone(), record.correlation_id.clone()),
            record.clone(),
        );
        entries.push(record);
        Ok(())
    }

    /// Latest record for an anchor
    pub fn latest(&self, anchor_id: &AnchorId) -> EngineResult<Option<ScoreRecord>> {
        let history = self.history.read().map_err(|_| lock_poisoned())?;
        Ok(history.get(anchor_id).and_then(|e| e.last().cloned()))
    }

    /// Full history for an anchor, oldest first
    pub fn history(&self, anchor_id: &AnchorId) -> EngineResult<Vec<ScoreRecord>> {
        let history = self.history.read().map_err(|_| lock_poisoned())?;
        Ok(history.get(anchor_id).cloned().unwrap_or_default())
    }

    /// Record previously accepted under this correlation id, if any
    ///
    /// This is the idempotency lookup: a replayed mutation returns the
    /// identical record instead of computing a new one.
    pub fn find_by_correlation(
        &self,
        anchor_id: &AnchorId,
        correlation_id: &CorrelationId,
    ) -> EngineResult<Option<ScoreRecord>> {
        let by_correlation = self.by_correlation.read().map_err(|_| lock_poisoned())?;
        Ok(by_correlation
            .get(&(anchor_id.clone(), correlation_id.clone()))
            .cloned())
    }

    /// All tracked anchors in sorted order (sweep iteration order)
    pub fn anchors(&self) -> EngineResult<Vec<AnchorId>> {
        let history = self.history.read().map_err(|_| lock_poisoned())?;
        let mut anchors: Vec<AnchorId> = history.keys().cloned().collect();
        anchors.sort();
        Ok(anchors)
    }
}

impl Default for ScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned() -> EngineError {
    EngineError::StoreUnavailable("score store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_types::{Band, ScoreRecordId};

    fn record(anchor: &str, version: u64, score: i64, correlation: &str) -> ScoreRecord {
        ScoreRecord {
            record_id: ScoreRecordId::generate(),
            anchor_id: AnchorId::new(anchor),
            score,
            previous_score: 0,
            delta: score,
            band: Band::Silent,
            decay_applied: false,
            applied_signal_ids: vec![],
            watermark: None,
            computed_at: chrono::Utc::now(),
            correlation_id: CorrelationId::new(correlation),
            config_version: 1,
            version,
        }
    }

    #[test]
    fn test_append_and_latest() {
        let store = ScoreStore::new();
        store.append(record("anchor-1", 1, 20, "c1")).unwrap();
        store.append(record("anchor-1", 2, 40, "c2")).unwrap();

        let latest = store.latest(&AnchorId::new("anchor-1")).unwrap().unwrap();
        assert_eq!(latest.version, 2);
        assert_eq!(latest.score, 40);
        assert_eq!(store.history(&AnchorId::new("anchor-1")).unwrap().len(), 2);
    }

    #[test]
    fn test_version_sequence_enforced() {
        let store = ScoreStore::new();
        store.append(record("anchor-1", 1, 20, "c1")).unwrap();

        let result = store.append(record("anchor-1", 3, 40, "c2"));
        assert!(matches!(
            result,
            Err(EngineError::VersionConflict {
                expected: 2,
                got: 3,
                ..
            })
        ));
        // The failed append left nothing behind
        assert_eq!(store.history(&AnchorId::new("anchor-1")).unwrap().len(), 1);
    }

    #[test]
    fn test_first_version_must_be_one() {
        let store = ScoreStore::new();
        assert!(store.append(record("anchor-1", 2, 20, "c1")).is_err());
    }

    #[test]
    fn test_correlation_lookup() {
        let store = ScoreStore::new();
        store.append(record("anchor-1", 1, 20, "c1")).unwrap();

        let anchor = AnchorId::new("anchor-1");
        let found = store
            .find_by_correlation(&anchor, &CorrelationId::new("c1"))
            .unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().score, 20);

        assert!(store
            .find_by_correlation(&anchor, &CorrelationId::new("unused"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_anchors_sorted() {
        let store = ScoreStore::new();
        store.append(record("anchor-b", 1, 10, "c1")).unwrap();
        store.append(record("anchor-a", 1, 10, "c2")).unwrap();

        let anchors = store.anchors().unwrap();
        assert_eq!(anchors, vec![AnchorId::new("anchor-a"), AnchorId::new("anchor-b")]);
    }
}
