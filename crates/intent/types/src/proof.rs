//! Proof lines - human-readable justification for movement events

use crate::anchor::AnchorId;
use crate::movement::MovementId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a proof line
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofId(String);

impl ProofId {
    /// Create a proof ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random proof ID
    pub fn generate() -> Self {
        Self(format!("proof-{}", Uuid::new_v4()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProofId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rendered justification for one or more movement events
///
/// Immutable; repeated generation for the same movements returns the
/// stored line byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofLine {
    /// Unique proof ID
    pub proof_id: ProofId,
    /// The anchor the justification is about
    pub anchor_id: AnchorId,
    /// Movement events this line explains
    pub movement_ids: Vec<MovementId>,
    /// Deterministic human-readable narrative
    pub narrative_text: String,
    /// When the line was first rendered
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ProofLine {
    /// Create a new proof line rendered now
    pub fn new(
        anchor_id: AnchorId,
        movement_ids: Vec<MovementId>,
        narrative_text: impl Into<String>,
    ) -> Self {
        Self {
            proof_id: ProofId::generate(),
            anchor_id,
            movement_ids,
            narrative_text: narrative_text.into(),
            created_at: chrono::Utc::now(),
        }
    }
}
