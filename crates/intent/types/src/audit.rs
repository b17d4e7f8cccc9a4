//! Error records - the durable shape of every guard rejection
//!
//! Records are mutable only to mark resolution. The anchor field holds
//! the identity exactly as presented, so a rejected legacy identifier is
//! auditable without ever becoming an engine anchor.

use crate::anchor::CorrelationId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an error record
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorRecordId(String);

impl ErrorRecordId {
    /// Create an error record ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random error record ID
    pub fn generate() -> Self {
        Self(format!("error-{}", Uuid::new_v4()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ErrorRecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted guard rejection or engine failure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Unique record ID
    pub error_id: ErrorRecordId,
    /// The identity the request presented, verbatim
    pub anchor: String,
    /// Correlation id when the request carried one
    pub correlation_id: Option<CorrelationId>,
    /// Name of the violated rule
    pub rule_violated: String,
    /// Snapshot of the rejected payload
    pub payload_snapshot: serde_json::Value,
    /// When the rejection occurred
    pub occurred_at: chrono::DateTime<chrono::Utc>,
    /// Whether an operator has resolved the record
    pub resolved: bool,
}

impl ErrorRecord {
    /// Create an unresolved record occurring now
    pub fn new(
        anchor: impl Into<String>,
        correlation_id: Option<CorrelationId>,
        rule_violated: impl Into<String>,
        payload_snapshot: serde_json::Value,
    ) -> Self {
        Self {
            error_id: ErrorRecordId::generate(),
            anchor: anchor.into(),
            correlation_id,
            rule_violated: rule_violated.into(),
            payload_snapshot,
            occurred_at: chrono::Utc::now(),
            resolved: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_record_starts_unresolved() {
        let record = ErrorRecord::new(
            "tenant-42",
            None,
            "spine_violation",
            serde_json::json!({"kind": "LegacyTenant"}),
        );
        assert!(!record.resolved);
        assert_eq!(record.rule_violated, "spine_violation");
    }
}
