//! Score records - one per accepted mutation
//!
//! Records are versioned per anchor; version `n + 1` may only follow
//! version `n`, which is what serializes concurrent writers. The applied
//! signal ids and watermark make the current-state projection rebuildable
//! and let proof lines trace back to contributing signals.

use crate::anchor::{AnchorId, CorrelationId};
use crate::band::Band;
use crate::signal::SignalId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a score record
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreRecordId(String);

impl ScoreRecordId {
    /// Create a score record ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random score record ID
    pub fn generate() -> Self {
        Self(format!("score-{}", Uuid::new_v4()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScoreRecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An accepted score mutation
///
/// Immutable once written. `config_version` pins the configuration the
/// mutation was computed under so the record stays explainable after
/// configuration changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Unique record ID
    pub record_id: ScoreRecordId,
    /// The anchor this score belongs to
    pub anchor_id: AnchorId,
    /// New bounded score
    pub score: i64,
    /// Score before this mutation
    pub previous_score: i64,
    /// Accepted change; `|delta|` never exceeds the configured cap
    pub delta: i64,
    /// Band derived from `score`, persisted for fast reads
    pub band: Band,
    /// Whether this record was produced by decay rather than signals
    pub decay_applied: bool,
    /// Signals consumed by this mutation (empty for decay and manual ops)
    pub applied_signal_ids: Vec<SignalId>,
    /// Latest observation timestamp applied so far
    pub watermark: Option<chrono::DateTime<chrono::Utc>>,
    /// When the mutation was computed
    pub computed_at: chrono::DateTime<chrono::Utc>,
    /// Correlation id of the accepted request (idempotency key)
    pub correlation_id: CorrelationId,
    /// Version of the configuration used to compute this record
    pub config_version: u32,
    /// Per-anchor sequence number, starting at 1
    pub version: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_record_serialization() {
        let record = ScoreRecord {
            record_id: ScoreRecordId::generate(),
            anchor_id: AnchorId::new("anchor-1"),
            score: 60,
            previous_score: 0,
            delta: 60,
            band: Band::Watch,
            decay_applied: false,
            applied_signal_ids: vec![SignalId::generate()],
            watermark: Some(chrono::Utc::now()),
            computed_at: chrono::Utc::now(),
            correlation_id: CorrelationId::new("corr-1"),
            config_version: 1,
            version: 1,
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: ScoreRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
