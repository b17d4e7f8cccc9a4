//! Movement detection - material transitions between score records
//!
//! A movement exists iff the band changed, or a non-decay swing inside
//! one band reached the configured reversal threshold. Decay that stays
//! inside its band is not a movement.

use intent_types::{
    BandThresholds, Direction, MovementEvent, MovementId, ScoreRecord, SignalType,
};

/// Detects material transitions from accepted score records
pub struct MovementDetector {
    thresholds: BandThresholds,
    reversal_threshold: i64,
}

impl MovementDetector {
    /// Create a detector with the configured thresholds
    pub fn new(thresholds: BandThresholds, reversal_threshold: i64) -> Self {
        Self {
            thresholds,
            reversal_threshold,
        }
    }

    /// Compare the record against its predecessor state
    ///
    /// `domain` is the dominant signal type among contributing signals,
    /// when any exist.
    pub fn detect(&self, record: &ScoreRecord, domain: Option<SignalType>) -> Option<MovementEvent> {
        let from_band = self.thresholds.classify(record.previous_score);
        let to_band = record.band;

        let band_changed = from_band != to_band;
        let reversal_crossed =
            !record.decay_applied && record.delta != 0 && record.delta.abs() >= self.reversal_threshold;

        if !band_changed && !reversal_crossed {
            return None;
        }

        let direction = if record.score >= record.previous_score {
            Direction::Rising
        } else {
            Direction::Falling
        };

        Some(MovementEvent {
            movement_id: MovementId::generate(),
            anchor_id: record.anchor_id.clone(),
            from_band,
            to_band,
            direction,
            domain,
            triggering_score_ids: vec![record.record_id.clone()],
            created_at: record.computed_at,
        })
    }
}
