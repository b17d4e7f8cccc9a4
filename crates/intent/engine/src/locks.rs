//! Per-anchor write serialization
//!
//! One mutex per anchor, created on first use. Holding an anchor's mutex
//! is what serializes its read-modify-write; the registry lock itself is
//! held only long enough to hand out the handle.

use intent_types::{AnchorId, EngineError, EngineResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Registry of per-anchor mutexes
pub struct AnchorLocks {
    inner: Mutex<HashMap<AnchorId, Arc<Mutex<()>>>>,
}

impl AnchorLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Handle for an anchor's mutex, creating it on first use
    pub fn handle(&self, anchor_id: &AnchorId) -> EngineResult<Arc<Mutex<()>>> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| EngineError::StoreUnavailable("lock registry poisoned".to_string()))?;
        Ok(inner
            .entry(anchor_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }
}

impl Default for AnchorLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_anchor_same_mutex() {
        let locks = AnchorLocks::new();
        let a = locks.handle(&AnchorId::new("anchor-1")).unwrap();
        let b = locks.handle(&AnchorId::new("anchor-1")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_different_anchors_independent() {
        let locks = AnchorLocks::new();
        let a = locks.handle(&AnchorId::new("anchor-1")).unwrap();
        let b = locks.handle(&AnchorId::new("anchor-2")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        // Holding one must not block the other
        let _held = a.lock().unwrap();
        assert!(b.try_lock().is_ok());
    }

    #[test]
    fn test_held_lock_blocks_try_lock() {
        let locks = AnchorLocks::new();
        let handle = locks.handle(&AnchorId::new("anchor-1")).unwrap();
        let _held = handle.lock().unwrap();

        let again = locks.handle(&AnchorId::new("anchor-1")).unwrap();
        assert!(again.try_lock().is_err());
    }
}
