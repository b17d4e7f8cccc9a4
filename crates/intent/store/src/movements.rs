//! Append-only movement event log

use intent_types::{AnchorId, EngineError, EngineResult, MovementEvent, MovementId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Append-only movement event store with a per-anchor index
pub struct MovementStore {
    by_id: RwLock<HashMap<MovementId, MovementEvent>>,
    by_anchor: RwLock<HashMap<AnchorId, Vec<MovementId>>>,
}

impl MovementStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
            by_anchor: RwLock::new(HashMap::new()),
        }
    }

    /// Append a movement event
    pub fn append(&self, event: MovementEvent) -> EngineResult<MovementId> {
        let mut by_id = self.by_id.write().map_err(|_| lock_poisoned())?;
        let mut by_anchor = self.by_anchor.write().map_err(|_| lock_poisoned())?;

        let movement_id = event.movement_id.clone();
        by_anchor
            .entry(event.anchor_id.clone())
            .or_default()
            .push(movement_id.clone());
        by_id.insert(movement_id.clone(), event);
        Ok(movement_id)
    }

    /// Get a movement event by id
    pub fn get(&self, movement_id: &MovementId) -> EngineResult<Option<MovementEvent>> {
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        Ok(by_id.get(movement_id).cloned())
    }

    /// All movements for an anchor, oldest first
    pub fn for_anchor(&self, anchor_id: &AnchorId) -> EngineResult<Vec<MovementEvent>> {
        // Same acquisition order as append
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        let by_anchor = self.by_anchor.read().map_err(|_| lock_poisoned())?;
        Ok(by_anchor
            .get(anchor_id)
            .map(|ids| ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    /// Most recent `limit` movements for an anchor, newest first
    pub fn recent_for(&self, anchor_id: &AnchorId, limit: usize) -> EngineResult<Vec<MovementEvent>> {
        let mut events = self.for_anchor(anchor_id)?;
        events.reverse();
        events.truncate(limit);
        Ok(events)
    }

    /// Number of movements stored
    pub fn len(&self) -> EngineResult<usize> {
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        Ok(by_id.len())
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for MovementStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned() -> EngineError {
    EngineError::StoreUnavailable("movement store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_types::{Band, Direction, ScoreRecordId, SignalType};

    fn event(anchor: &str, from: Band, to: Band) -> MovementEvent {
        MovementEvent {
            movement_id: MovementId::generate(),
            anchor_id: AnchorId::new(anchor),
            from_band: from,
            to_band: to,
            direction: Direction::Rising,
            domain: Some(SignalType::Hiring),
            triggering_score_ids: vec![ScoreRecordId::generate()],
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_append_and_query() {
        let store = MovementStore::new();
        let id = store.append(event("anchor-1", Band::Silent, Band::Watch)).unwrap();

        assert!(store.get(&id).unwrap().is_some());
        assert_eq!(store.for_anchor(&AnchorId::new("anchor-1")).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_newest_first() {
        let store = MovementStore::new();
        store.append(event("anchor-1", Band::Silent, Band::Watch)).unwrap();
        store
            .append(event("anchor-1", Band::Watch, Band::Exploratory))
            .unwrap();
        store
            .append(event("anchor-1", Band::Exploratory, Band::Targeted))
            .unwrap();

        let recent = store.recent_for(&AnchorId::new("anchor-1"), 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].to_band, Band::Targeted);
        assert_eq!(recent[1].to_band, Band::Exploratory);
    }
}
