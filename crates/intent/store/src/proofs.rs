//! Append-only proof line store with the movement link set
//!
//! Proof lines relate many-to-many with movement events through an
//! explicit link set, and the store can answer "is there already a line
//! for exactly these movements", the lookup behind byte-reproducible
//! regeneration.

use intent_types::{AnchorId, EngineError, EngineResult, MovementId, ProofId, ProofLine};
use std::collections::HashMap;
use std::sync::RwLock;

/// Append-only proof line store
pub struct ProofStore {
    by_id: RwLock<HashMap<ProofId, ProofLine>>,
    by_anchor: RwLock<HashMap<AnchorId, Vec<ProofId>>>,
    links: RwLock<HashMap<MovementId, Vec<ProofId>>>,
}

impl ProofStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
            by_anchor: RwLock::new(HashMap::new()),
            links: RwLock::new(HashMap::new()),
        }
    }

    /// Append a proof line and its movement links
    pub fn append(&self, line: ProofLine) -> EngineResult<ProofId> {
        let mut by_id = self.by_id.write().map_err(|_| lock_poisoned())?;
        let mut by_anchor = self.by_anchor.write().map_err(|_| lock_poisoned())?;
        let mut links = self.links.write().map_err(|_| lock_poisoned())?;

        let proof_id = line.proof_id.clone();
        for movement_id in &line.movement_ids {
            links
                .entry(movement_id.clone())
                .or_default()
                .push(proof_id.clone());
        }
        by_anchor
            .entry(line.anchor_id.clone())
            .or_default()
            .push(proof_id.clone());
        by_id.insert(proof_id.clone(), line);
        Ok(proof_id)
    }

    /// Get a proof line by id
    pub fn get(&self, proof_id: &ProofId) -> EngineResult<Option<ProofLine>> {
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        Ok(by_id.get(proof_id).cloned())
    }

    /// Existing line covering exactly this movement set, if any
    pub fn find_for_movements(
        &self,
        movement_ids: &[MovementId],
    ) -> EngineResult<Option<ProofLine>> {
        let first = match movement_ids.first() {
            Some(id) => id,
            None => return Ok(None),
        };
        // Same acquisition order as append
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        let links = self.links.read().map_err(|_| lock_poisoned())?;

        let candidates = match links.get(first) {
            Some(ids) => ids,
            None => return Ok(None),
        };
        for proof_id in candidates {
            if let Some(line) = by_id.get(proof_id) {
                if line.movement_ids == movement_ids {
                    return Ok(Some(line.clone()));
                }
            }
        }
        Ok(None)
    }

    /// Proof lines explaining a movement
    pub fn for_movement(&self, movement_id: &MovementId) -> EngineResult<Vec<ProofLine>> {
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        let links = self.links.read().map_err(|_| lock_poisoned())?;
        Ok(links
            .get(movement_id)
            .map(|ids| ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    /// Most recent `limit` proof lines for an anchor, newest first
    pub fn recent_for(&self, anchor_id: &AnchorId, limit: usize) -> EngineResult<Vec<ProofLine>> {
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        let by_anchor = self.by_anchor.read().map_err(|_| lock_poisoned())?;

        let mut lines: Vec<ProofLine> = by_anchor
            .get(anchor_id)
            .map(|ids| ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
            .unwrap_or_default();
        lines.reverse();
        lines.truncate(limit);
        Ok(lines)
    }
}

impl Default for ProofStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned() -> EngineError {
    EngineError::StoreUnavailable("proof store lock poisoned".to_string())
}
