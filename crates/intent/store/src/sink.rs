//! Error sink - durable record of every guard rejection and engine failure
//!
//! Records are mutable only to mark resolution.

use intent_types::{CorrelationId, EngineError, EngineResult, ErrorRecord, ErrorRecordId};
use std::collections::HashMap;
use std::sync::RwLock;

/// Durable error record store keyed by anchor and correlation id
pub struct ErrorSink {
    by_id: RwLock<HashMap<ErrorRecordId, ErrorRecord>>,
    order: RwLock<Vec<ErrorRecordId>>,
}

impl ErrorSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self {
            by_id: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Record a rejection or failure
    pub fn record(
        &self,
        anchor: impl Into<String>,
        correlation_id: Option<CorrelationId>,
        rule_violated: impl Into<String>,
        payload_snapshot: serde_json::Value,
    ) -> EngineResult<ErrorRecordId> {
        let record = ErrorRecord::new(anchor, correlation_id, rule_violated, payload_snapshot);
        let error_id = record.error_id.clone();

        let mut by_id = self.by_id.write().map_err(|_| lock_poisoned())?;
        let mut order = self.order.write().map_err(|_| lock_poisoned())?;
        order.push(error_id.clone());
        by_id.insert(error_id.clone(), record);
        Ok(error_id)
    }

    /// Get a record by id
    pub fn get(&self, error_id: &ErrorRecordId) -> EngineResult<Option<ErrorRecord>> {
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        Ok(by_id.get(error_id).cloned())
    }

    /// Mark a record resolved
    pub fn mark_resolved(&self, error_id: &ErrorRecordId) -> EngineResult<()> {
        let mut by_id = self.by_id.write().map_err(|_| lock_poisoned())?;
        let record = by_id
            .get_mut(error_id)
            .ok_or_else(|| EngineError::ErrorRecordUnknown(error_id.as_str().to_string()))?;
        record.resolved = true;
        Ok(())
    }

    /// All records for an anchor as presented, oldest first
    pub fn for_anchor(&self, anchor: &str) -> EngineResult<Vec<ErrorRecord>> {
        self.filtered(|r| r.anchor == anchor)
    }

    /// All records carrying a correlation id
    pub fn for_correlation(&self, correlation_id: &CorrelationId) -> EngineResult<Vec<ErrorRecord>> {
        self.filtered(|r| r.correlation_id.as_ref() == Some(correlation_id))
    }

    /// All unresolved records, oldest first
    pub fn unresolved(&self) -> EngineResult<Vec<ErrorRecord>> {
        self.filtered(|r| !r.resolved)
    }

    /// Number of records
    pub fn len(&self) -> EngineResult<usize> {
        let order = self.order.read().map_err(|_| lock_poisoned())?;
        Ok(order.len())
    }

    /// Whether the sink is empty
    pub fn is_empty(&self) -> EngineResult<bool> {
        Ok(self.len()? == 0)
    }

    fn filtered(&self, keep: impl Fn(&ErrorRecord) -> bool) -> EngineResult<Vec<ErrorRecord>> {
        let by_id = self.by_id.read().map_err(|_| lock_poisoned())?;
        let order = self.order.read().map_err(|_| lock_poisoned())?;
        Ok(order
            .iter()
            .filter_map(|id| by_id.get(id))
            .filter(|r| keep(r))
            .cloned()
            .collect())
    }
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned() -> EngineError {
    EngineError::StoreUnavailable("error sink lock poisoned".to_string())
}
