//! Intent Proof - human-readable justification for movement events
//!
//! Rendering is deterministic: the narrative is a pure function of the
//! movement event and its contributing signals, and a repeated `explain`
//! for the same movement returns the stored line byte-for-byte rather
//! than rendering a second one.

#![deny(unsafe_code)]

use intent_store::{ProofStore, ScoreStore, SignalStore};
use intent_types::{
    Direction, EngineError, EngineResult, MovementEvent, ProofLine, ScoreRecord, SignalType,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Renders and stores proof lines for movement events
pub struct ProofGenerator {
    signals: Arc<SignalStore>,
    scores: Arc<ScoreStore>,
    proofs: Arc<ProofStore>,
}

impl ProofGenerator {
    /// Create a generator over the engine stores
    pub fn new(signals: Arc<SignalStore>, scores: Arc<ScoreStore>, proofs: Arc<ProofStore>) -> Self {
        Self {
            signals,
            scores,
            proofs,
        }
    }

    /// Render the justification for a movement event
    ///
    /// Idempotent: a line already stored for this movement is returned
    /// unchanged, which is what makes repeated calls byte-reproducible.
    pub fn explain(&self, movement: &MovementEvent) -> EngineResult<ProofLine> {
        let movement_ids = vec![movement.movement_id.clone()];
        if let Some(existing) = self.proofs.find_for_movements(&movement_ids)? {
            return Ok(existing);
        }

        let triggering = self.triggering_records(movement)?;
        let current = triggering
            .iter()
            .max_by_key(|r| r.version)
            .ok_or_else(|| EngineError::MovementUnknown(movement.movement_id.as_str().to_string()))?;

        let narrative = self.render(movement, current, &triggering)?;
        debug!(
            anchor = %movement.anchor_id,
            movement = %movement.movement_id,
            "proof line rendered"
        );

        let line = ProofLine::new(movement.anchor_id.clone(), movement_ids, narrative);
        self.proofs.append(line.clone())?;
        Ok(line)
    }

    /// The proof store lines are appended to
    pub fn store(&self) -> &Arc<ProofStore> {
        &self.proofs
    }

    fn triggering_records(&self, movement: &MovementEvent) -> EngineResult<Vec<ScoreRecord>> {
        let history = self.scores.history(&movement.anchor_id)?;
        Ok(history
            .into_iter()
            .filter(|r| movement.triggering_score_ids.contains(&r.record_id))
            .collect())
    }

    fn render(
        &self,
        movement: &MovementEvent,
        current: &ScoreRecord,
        triggering: &[ScoreRecord],
    ) -> EngineResult<String> {
        let verb = match movement.direction {
            Direction::Rising => "rose",
            Direction::Falling => "fell",
        };

        let mut counts: BTreeMap<SignalType, usize> = BTreeMap::new();
        for record in triggering {
            for signal_id in &record.applied_signal_ids {
                if let Some(signal) = self.signals.get(signal_id)? {
                    *counts.entry(signal.signal_type).or_insert(0) += 1;
                }
            }
        }

        let cause = if !counts.is_empty() {
            format!("driven by {}", join_counts(&counts))
        } else if current.decay_applied {
            "after decay with no new signals".to_string()
        } else {
            "driven by a manual adjustment".to_string()
        };

        let transition = if movement.is_band_change() {
            format!(
                "crossing {}→{}",
                movement.from_band.as_str(),
                movement.to_band.as_str()
            )
        } else {
            format!("swinging within {}", movement.to_band.as_str())
        };

        Ok(format!(
            "Score {} from {} to {} {}, {}",
            verb, current.previous_score, current.score, cause, transition
        ))
    }
}

/// "3 hiring signals and 1 funding signal": count-descending, then by
/// type name, singular/plural handled
fn join_counts(counts: &BTreeMap<SignalType, usize>) -> String {
    let mut entries: Vec<(SignalType, usize)> = counts.iter().map(|(t, c)| (*t, *c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

    let segments: Vec<String> = entries
        .iter()
        .map(|(signal_type, count)| {
            let noun = if *count == 1 { "signal" } else { "signals" };
            format!("{} {} {}", count, signal_type.as_str(), noun)
        })
        .collect();

    match segments.len() {
        1 => segments[0].clone(),
        _ => format!(
            "{} and {}",
            segments[..segments.len() - 1].join(", "),
            segments[segments.len() - 1]
        ),
    }
}
