//! Movement events - recorded band changes and reversal swings

use crate::anchor::AnchorId;
use crate::band::Band;
use crate::score::ScoreRecordId;
use crate::signal::SignalType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a movement event
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementId(String);

impl MovementId {
    /// Create a movement ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random movement ID
    pub fn generate() -> Self {
        Self(format!("movement-{}", Uuid::new_v4()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MovementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a movement, by score comparison
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Rising,
    Falling,
}

/// A material score transition
///
/// Created only when the band changes or a swing crosses the configured
/// reversal threshold. Immutable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementEvent {
    /// Unique movement ID
    pub movement_id: MovementId,
    /// The anchor that moved
    pub anchor_id: AnchorId,
    /// Band before the transition
    pub from_band: Band,
    /// Band after the transition
    pub to_band: Band,
    /// Whether the score rose or fell
    pub direction: Direction,
    /// Dominant signal type among contributing signals, when any exist
    ///
    /// Decay-only movements have no contributing signals; the dominant
    /// type over the anchor's history is used, or `None` for an anchor
    /// with no signals at all.
    pub domain: Option<SignalType>,
    /// Score records that triggered this movement
    pub triggering_score_ids: Vec<ScoreRecordId>,
    /// When the movement was detected
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl MovementEvent {
    /// Whether the bands differ (as opposed to an intra-band reversal)
    pub fn is_band_change(&self) -> bool {
        self.from_band != self.to_band
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_change_detection() {
        let event = MovementEvent {
            movement_id: MovementId::generate(),
            anchor_id: AnchorId::new("anchor-1"),
            from_band: Band::Silent,
            to_band: Band::Watch,
            direction: Direction::Rising,
            domain: Some(SignalType::Hiring),
            triggering_score_ids: vec![ScoreRecordId::generate()],
            created_at: chrono::Utc::now(),
        };
        assert!(event.is_band_change());

        let reversal = MovementEvent {
            from_band: Band::Watch,
            to_band: Band::Watch,
            direction: Direction::Falling,
            ..event
        };
        assert!(!reversal.is_band_change());
    }
}
