//! Intent signals - the append-only raw material of every score
//!
//! Signals are immutable once reported. A superseded signal is closed by
//! its validity window (`valid_until`), never updated or deleted.

use crate::anchor::{AnchorId, CorrelationId};
use crate::errors::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an intent signal
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalId(String);

impl SignalId {
    /// Create a signal ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random signal ID
    pub fn generate() -> Self {
        Self(format!("signal-{}", Uuid::new_v4()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The type of an intent signal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalType {
    /// Open roles, hiring velocity
    Hiring,
    /// Funding rounds, capital events
    Funding,
    /// Adoption of relevant technology
    TechAdoption,
    /// Geographic or headcount expansion
    Expansion,
    /// Executive or decision-maker changes
    LeadershipChange,
    /// Direct engagement with web properties
    WebEngagement,
}

impl SignalType {
    /// All signal types, in display order
    pub const ALL: [SignalType; 6] = [
        SignalType::Hiring,
        SignalType::Funding,
        SignalType::TechAdoption,
        SignalType::Expansion,
        SignalType::LeadershipChange,
        SignalType::WebEngagement,
    ];

    /// Lowercase name used in weight tables and proof narratives
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Hiring => "hiring",
            SignalType::Funding => "funding",
            SignalType::TechAdoption => "tech-adoption",
            SignalType::Expansion => "expansion",
            SignalType::LeadershipChange => "leadership-change",
            SignalType::WebEngagement => "web-engagement",
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discrete intent signal about an anchor
///
/// Shape is validated at ingest; content quality is the producer's
/// problem, not the engine's.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Unique signal ID
    pub signal_id: SignalId,
    /// The anchor this signal is about
    pub anchor_id: AnchorId,
    /// What kind of signal this is
    pub signal_type: SignalType,
    /// Signed strength of the signal
    pub magnitude: i64,
    /// Producer that reported the signal
    pub source: String,
    /// When the signal was observed
    pub observed_at: chrono::DateTime<chrono::Utc>,
    /// End of the validity window; open-ended when `None`
    pub valid_until: Option<chrono::DateTime<chrono::Utc>>,
    /// Correlation id of the reporting request
    pub correlation_id: CorrelationId,
}

impl Signal {
    /// Create a new signal observed now
    pub fn new(
        anchor_id: AnchorId,
        signal_type: SignalType,
        magnitude: i64,
        source: impl Into<String>,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            signal_id: SignalId::generate(),
            anchor_id,
            signal_type,
            magnitude,
            source: source.into(),
            observed_at: chrono::Utc::now(),
            valid_until: None,
            correlation_id,
        }
    }

    /// Set the observation timestamp
    pub fn observed_at(mut self, at: chrono::DateTime<chrono::Utc>) -> Self {
        self.observed_at = at;
        self
    }

    /// Close the validity window at the given instant
    pub fn valid_until(mut self, until: chrono::DateTime<chrono::Utc>) -> Self {
        self.valid_until = Some(until);
        self
    }

    /// Shape validation only: the engine does not judge content quality
    pub fn validate_shape(&self) -> EngineResult<()> {
        if self.source.is_empty() {
            return Err(EngineError::InvalidSignal {
                reason: "signal source must not be empty".to_string(),
            });
        }
        if let Some(until) = self.valid_until {
            if until <= self.observed_at {
                return Err(EngineError::InvalidSignal {
                    reason: "validity window closes before the signal was observed".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether the signal is inside its validity window at `at`
    pub fn is_valid_at(&self, at: chrono::DateTime<chrono::Utc>) -> bool {
        match self.valid_until {
            Some(until) => at < until,
            None => true,
        }
    }
}
