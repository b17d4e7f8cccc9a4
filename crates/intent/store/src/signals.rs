//! Append-only log of intent signals

use intent_types::{AnchorId, EngineError, EngineResult, Signal, SignalId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Append-only signal log with a per-anchor index
pub struct SignalStore {
    by_id: RwLock<HashMap<SignalId, Signal>>,
    by_anchor: RwLock<HashMap<AnchorId, Vec<SignalId>>>,
}

impl SignalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
            by_anchor: RwLock::new(HashMap::new()),
        }
    }

    /// Append a signal
    ///
    /// Signals are immutable; re-appending an existing id is rejected.
    pub fn append(&self, signal: Signal) -> EngineResult<SignalId> {
        signal.validate_shape()?;

        let mut by_id = self.by_id.write().map_err(|_| lock_poisoned())?;
        if by_id.contains_key(&signal.signal_id) {
            return Err(EngineError::DuplicateSignal(
                signal.signal_id.as_str().to_string(),
            ));
        }

        let mut by_anchor = self.by_anchor.write().map_err(|_| lock_poisoned())?;
        let signal_id = signal.signal_id.clone();
        by_anchor
            .entry(signal.anchor_id.clone())
            .or_default()
            .push(signal_id.clone());
        by_id.insert(signal_id.clone(), signal);
        Ok(signal_id)
    }

    /// Get a signal by id
    pub fn get(&self, signal_id: &SignalId) -> EngineResult<Option<Signal>> {
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        Ok(by_id.get(signal_id).cloned())
    }

    /// All signals for an anchor, oldest observation first
    pub fn signals_for(&self, anchor_id: &AnchorId) -> EngineResult<Vec<Signal>> {
        // Same acquisition order as append
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        let by_anchor = self.by_anchor.read().map_err(|_| lock_poisoned())?;

        let mut signals: Vec<Signal> = by_anchor
            .get(anchor_id)
            .map(|ids| ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
            .unwrap_or_default();
        signals.sort_by(|a, b| {
            a.observed_at
                .cmp(&b.observed_at)
                .then_with(|| a.signal_id.as_str().cmp(b.signal_id.as_str()))
        });
        Ok(signals)
    }

    /// Signals observed after the watermark and still valid at `as_of`
    pub fn unapplied_after(
        &self,
        anchor_id: &AnchorId,
        watermark: Option<chrono::DateTime<chrono::Utc>>,
        as_of: chrono::DateTime<chrono::Utc>,
    ) -> EngineResult<Vec<Signal>> {
        let signals = self.signals_for(anchor_id)?;
        Ok(signals
            .into_iter()
            .filter(|s| match watermark {
                Some(mark) => s.observed_at > mark,
                None => true,
            })
            .filter(|s| s.is_valid_at(as_of))
            .collect())
    }

    /// Signals observed inside a time window, oldest first
    pub fn signals_in_window(
        &self,
        anchor_id: &AnchorId,
        from: chrono::DateTime<chrono::Utc>,
        to: chrono::DateTime<chrono::Utc>,
    ) -> EngineResult<Vec<Signal>> {
        let signals = self.signals_for(anchor_id)?;
        Ok(signals
            .into_iter()
            .filter(|s| s.observed_at >= from && s.observed_at < to)
            .collect())
    }

    /// Number of signals stored
    pub fn len(&self) -> EngineResult<usize> {
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        Ok(by_id.len())
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for SignalStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned() -> EngineError {
    EngineError::StoreUnavailable("signal store lock poisoned".to_string())
}
