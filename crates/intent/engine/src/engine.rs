//! The score engine - the only writer of score records
//!
//! Aggregates unapplied signals into a bounded delta, applies time decay,
//! and accepts manual adjustments and band overrides. All four mutations
//! share the same shape: guard-validate, serialize on the anchor,
//! read-modify-write one versioned record, detect movement, render proof.
//!
//! Idempotency: a mutation replayed under its correlation id returns the
//! record accepted the first time, bit for bit.

use crate::locks::AnchorLocks;
use crate::movement::MovementDetector;
use intent_guard::{GuardLayer, GuardRequest, GuardRequestKind};
use intent_proof::ProofGenerator;
use intent_store::{
    CurrentStateProjection, ErrorSink, MovementStore, ProofStore, ScoreStore, SignalStore,
};
use intent_types::{
    AnchorId, Band, CorrelationId, EngineConfig, EngineError, EngineResult, IdentityRef,
    MovementEvent, ProofLine, ScoreRecord, ScoreRecordId, Signal, SignalId, SignalType,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// A signal as reported by a producer
#[derive(Clone, Debug)]
pub struct SignalReport {
    pub identity: IdentityRef,
    pub signal_type: SignalType,
    pub magnitude: i64,
    pub source: String,
    pub observed_at: chrono::DateTime<chrono::Utc>,
    pub valid_until: Option<chrono::DateTime<chrono::Utc>>,
    pub correlation_id: CorrelationId,
}

/// Result of an accepted mutation
#[derive(Clone, Debug)]
pub struct ScoreOutcome {
    /// The record written (or replayed) for this correlation id
    pub record: ScoreRecord,
    /// Movement event, when the transition was material
    pub movement: Option<MovementEvent>,
    /// Proof line rendered for the movement
    pub proof: Option<ProofLine>,
}

/// The buyer-intent score engine
pub struct ScoreEngine {
    config: EngineConfig,
    signals: Arc<SignalStore>,
    scores: Arc<ScoreStore>,
    movements: Arc<MovementStore>,
    projection: Arc<CurrentStateProjection>,
    guard: Arc<GuardLayer>,
    detector: MovementDetector,
    proofs: ProofGenerator,
    locks: AnchorLocks,
}

impl ScoreEngine {
    /// Create an engine over existing stores
    ///
    /// The guard is built here from the same configuration the engine
    /// scores with, so clamping and guard decisions can never disagree.
    pub fn new(
        config: EngineConfig,
        signals: Arc<SignalStore>,
        scores: Arc<ScoreStore>,
        movements: Arc<MovementStore>,
        proofs: Arc<ProofStore>,
        projection: Arc<CurrentStateProjection>,
        sink: Arc<ErrorSink>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let guard = Arc::new(GuardLayer::new(sink, config.clone())?);
        let detector =
            MovementDetector::new(config.thresholds.clone(), config.reversal_threshold);
        let proofs = ProofGenerator::new(signals.clone(), scores.clone(), proofs);
        Ok(Self {
            config,
            signals,
            scores,
            movements,
            projection,
            guard,
            detector,
            proofs,
            locks: AnchorLocks::new(),
        })
    }

    /// Create an engine with fresh in-memory stores
    pub fn in_memory(config: EngineConfig) -> EngineResult<Self> {
        Self::new(
            config,
            Arc::new(SignalStore::new()),
            Arc::new(ScoreStore::new()),
            Arc::new(MovementStore::new()),
            Arc::new(ProofStore::new()),
            Arc::new(CurrentStateProjection::new()),
            Arc::new(ErrorSink::new()),
        )
    }

    /// Record a produced signal
    ///
    /// Shape only; content quality is the producer's concern.
    pub fn ingest_signal(&self, report: SignalReport) -> EngineResult<SignalId> {
        let anchor = self.guard.validate(&GuardRequest::new(
            report.identity.clone(),
            Some(report.correlation_id.clone()),
            GuardRequestKind::Ingest,
        ))?;

        let mut signal = Signal::new(
            anchor,
            report.signal_type,
            report.magnitude,
            report.source,
            report.correlation_id,
        )
        .observed_at(report.observed_at);
        signal.valid_until = report.valid_until;
        self.signals.append(signal)
    }

    /// Aggregate unapplied signals into one bounded score mutation
    pub fn apply_signals(
        &self,
        identity: &IdentityRef,
        correlation_id: &CorrelationId,
    ) -> EngineResult<ScoreOutcome> {
        let anchor = self.validate_shape(identity, correlation_id)?;
        if let Some(existing) = self.scores.find_by_correlation(&anchor, correlation_id)? {
            return Ok(replayed(existing));
        }

        let handle = self.locks.handle(&anchor)?;
        let _serial = handle.lock().map_err(|_| anchor_lock_poisoned())?;
        if let Some(existing) = self.scores.find_by_correlation(&anchor, correlation_id)? {
            return Ok(replayed(existing));
        }

        let now = chrono::Utc::now();
        let latest = self.scores.latest(&anchor)?;
        let previous_score = latest
            .as_ref()
            .map(|r| r.score)
            .unwrap_or(self.config.score_floor);
        let version = latest.as_ref().map(|r| r.version + 1).unwrap_or(1);
        let watermark = latest.as_ref().and_then(|r| r.watermark);

        let pending = self.signals.unapplied_after(&anchor, watermark, now)?;
        // Producer magnitudes are unbounded; saturate so the pre-clamp sum
        // stays total
        let raw = pending.iter().fold(0i64, |sum, s| {
            sum.saturating_add(s.magnitude.saturating_mul(self.config.weights.weight(s.signal_type)))
        });
        let delta = raw.clamp(-self.config.delta_cap, self.config.delta_cap);
        let score = (previous_score + delta).clamp(self.config.score_floor, self.config.score_ceiling);
        let delta = score - previous_score;

        self.validate_mutation(identity, correlation_id, delta)?;

        let new_watermark = pending
            .iter()
            .map(|s| s.observed_at)
            .max()
            .map(|newest| match watermark {
                Some(mark) => newest.max(mark),
                None => newest,
            })
            .or(watermark);
        let domain = dominant_domain(&pending);
        let applied: Vec<SignalId> = pending.into_iter().map(|s| s.signal_id).collect();

        self.commit(Mutation {
            anchor,
            previous_score,
            score,
            delta,
            decay_applied: false,
            applied_signal_ids: applied,
            watermark: new_watermark,
            computed_at: now,
            correlation_id: correlation_id.clone(),
            version,
            domain,
        })
    }

    /// Apply time decay as of the given instant
    pub fn apply_decay(
        &self,
        identity: &IdentityRef,
        as_of: chrono::DateTime<chrono::Utc>,
        correlation_id: &CorrelationId,
    ) -> EngineResult<ScoreOutcome> {
        let anchor = self.validate_shape(identity, correlation_id)?;
        if let Some(existing) = self.scores.find_by_correlation(&anchor, correlation_id)? {
            return Ok(replayed(existing));
        }

        let handle = self.locks.handle(&anchor)?;
        let _serial = handle.lock().map_err(|_| anchor_lock_poisoned())?;
        self.decay_locked(identity, &anchor, as_of, correlation_id)
    }

    /// Apply decay only if no other writer holds the anchor
    ///
    /// The sweep's entry point: returns `Ok(None)` instead of waiting when
    /// a concurrent signal application owns the lock.
    pub fn apply_decay_if_idle(
        &self,
        anchor_id: &AnchorId,
        as_of: chrono::DateTime<chrono::Utc>,
    ) -> EngineResult<Option<ScoreOutcome>> {
        let identity = IdentityRef::Spine(anchor_id.clone());
        let correlation_id = decay_correlation(anchor_id, as_of);
        let anchor = self.validate_shape(&identity, &correlation_id)?;
        if let Some(existing) = self.scores.find_by_correlation(&anchor, &correlation_id)? {
            return Ok(Some(replayed(existing)));
        }

        let handle = self.locks.handle(&anchor)?;
        let _serial = match handle.try_lock() {
            Ok(guard) => guard,
            Err(std::sync::TryLockError::WouldBlock) => return Ok(None),
            Err(std::sync::TryLockError::Poisoned(_)) => return Err(anchor_lock_poisoned()),
        };
        self.decay_locked(&identity, &anchor, as_of, &correlation_id)
            .map(Some)
    }

    /// Apply an explicit manual delta
    ///
    /// Unlike signal aggregation, a requested delta past the cap is
    /// rejected outright rather than clamped; the caller resubmits.
    pub fn apply_adjustment(
        &self,
        identity: &IdentityRef,
        requested_delta: i64,
        correlation_id: &CorrelationId,
    ) -> EngineResult<ScoreOutcome> {
        let anchor = self.guard.validate(&GuardRequest::new(
            identity.clone(),
            Some(correlation_id.clone()),
            GuardRequestKind::ScoreMutation {
                proposed_delta: requested_delta,
            },
        ))?;
        if let Some(existing) = self.scores.find_by_correlation(&anchor, correlation_id)? {
            return Ok(replayed(existing));
        }

        let handle = self.locks.handle(&anchor)?;
        let _serial = handle.lock().map_err(|_| anchor_lock_poisoned())?;
        if let Some(existing) = self.scores.find_by_correlation(&anchor, correlation_id)? {
            return Ok(replayed(existing));
        }

        let now = chrono::Utc::now();
        let latest = self.scores.latest(&anchor)?;
        let previous_score = latest
            .as_ref()
            .map(|r| r.score)
            .unwrap_or(self.config.score_floor);
        let version = latest.as_ref().map(|r| r.version + 1).unwrap_or(1);
        let watermark = latest.as_ref().and_then(|r| r.watermark);

        let score = (previous_score + requested_delta)
            .clamp(self.config.score_floor, self.config.score_ceiling);
        let delta = score - previous_score;

        self.commit(Mutation {
            anchor,
            previous_score,
            score,
            delta,
            decay_applied: false,
            applied_signal_ids: vec![],
            watermark,
            computed_at: now,
            correlation_id: correlation_id.clone(),
            version,
            domain: None,
        })
    }

    /// Manually steer the anchor toward a named band
    ///
    /// The band value must be one of the enumerated bands. The score
    /// moves toward the target band's floor by at most the delta cap per
    /// operation, so the bounded-delta invariant holds for overrides too.
    pub fn apply_override(
        &self,
        identity: &IdentityRef,
        band_value: &str,
        correlation_id: &CorrelationId,
    ) -> EngineResult<ScoreOutcome> {
        let anchor = self.guard.validate(&GuardRequest::new(
            identity.clone(),
            Some(correlation_id.clone()),
            GuardRequestKind::ManualOverride {
                band: band_value.to_string(),
            },
        ))?;
        let band = Band::parse(band_value)?;
        if let Some(existing) = self.scores.find_by_correlation(&anchor, correlation_id)? {
            return Ok(replayed(existing));
        }

        let handle = self.locks.handle(&anchor)?;
        let _serial = handle.lock().map_err(|_| anchor_lock_poisoned())?;
        if let Some(existing) = self.scores.find_by_correlation(&anchor, correlation_id)? {
            return Ok(replayed(existing));
        }

        let now = chrono::Utc::now();
        let latest = self.scores.latest(&anchor)?;
        let previous_score = latest
            .as_ref()
            .map(|r| r.score)
            .unwrap_or(self.config.score_floor);
        let version = latest.as_ref().map(|r| r.version + 1).unwrap_or(1);
        let watermark = latest.as_ref().and_then(|r| r.watermark);

        let target = self.config.thresholds.floor_of(band);
        let delta = (target - previous_score).clamp(-self.config.delta_cap, self.config.delta_cap);
        let score = previous_score + delta;

        self.commit(Mutation {
            anchor,
            previous_score,
            score,
            delta,
            decay_applied: false,
            applied_signal_ids: vec![],
            watermark,
            computed_at: now,
            correlation_id: correlation_id.clone(),
            version,
            domain: None,
        })
    }

    /// All anchors with score history, in sweep order
    pub fn tracked_anchors(&self) -> EngineResult<Vec<AnchorId>> {
        self.scores.anchors()
    }

    #[cfg(test)]
    pub(crate) fn lock_handle(&self, anchor_id: &AnchorId) -> Arc<std::sync::Mutex<()>> {
        self.locks.handle(anchor_id).unwrap()
    }

    /// The configuration this engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Signal store handle
    pub fn signals(&self) -> &Arc<SignalStore> {
        &self.signals
    }

    /// Score store handle
    pub fn scores(&self) -> &Arc<ScoreStore> {
        &self.scores
    }

    /// Movement store handle
    pub fn movements(&self) -> &Arc<MovementStore> {
        &self.movements
    }

    /// Proof store handle
    pub fn proofs(&self) -> &Arc<ProofStore> {
        self.proofs.store()
    }

    /// Current-state projection handle
    pub fn projection(&self) -> &Arc<CurrentStateProjection> {
        &self.projection
    }

    /// Error sink handle
    pub fn sink(&self) -> &Arc<ErrorSink> {
        self.guard.sink()
    }

    fn decay_locked(
        &self,
        identity: &IdentityRef,
        anchor: &AnchorId,
        as_of: chrono::DateTime<chrono::Utc>,
        correlation_id: &CorrelationId,
    ) -> EngineResult<ScoreOutcome> {
        if let Some(existing) = self.scores.find_by_correlation(anchor, correlation_id)? {
            return Ok(replayed(existing));
        }

        let latest = self
            .scores
            .latest(anchor)?
            .ok_or_else(|| EngineError::AnchorUnknown(anchor.as_str().to_string()))?;

        let previous_score = latest.score;
        let elapsed = (as_of - latest.computed_at).num_seconds().max(0);
        let factor = 0.5_f64.powf(elapsed as f64 / self.config.half_life_secs as f64);
        let floor = self.config.score_floor;
        let target = floor + (((previous_score - floor) as f64) * factor).floor() as i64;
        let delta = (target - previous_score).clamp(-self.config.delta_cap, 0);
        let score = previous_score + delta;

        self.validate_mutation(identity, correlation_id, delta)?;

        self.commit(Mutation {
            anchor: anchor.clone(),
            previous_score,
            score,
            delta,
            decay_applied: true,
            applied_signal_ids: vec![],
            watermark: latest.watermark,
            computed_at: as_of,
            correlation_id: correlation_id.clone(),
            version: latest.version + 1,
            domain: dominant_domain(&self.signals.signals_for(anchor)?),
        })
    }

    fn validate_shape(
        &self,
        identity: &IdentityRef,
        correlation_id: &CorrelationId,
    ) -> EngineResult<AnchorId> {
        self.guard.validate(&GuardRequest::new(
            identity.clone(),
            Some(correlation_id.clone()),
            GuardRequestKind::Ingest,
        ))
    }

    fn validate_mutation(
        &self,
        identity: &IdentityRef,
        correlation_id: &CorrelationId,
        proposed_delta: i64,
    ) -> EngineResult<()> {
        self.guard.validate(&GuardRequest::new(
            identity.clone(),
            Some(correlation_id.clone()),
            GuardRequestKind::ScoreMutation { proposed_delta },
        ))?;
        Ok(())
    }

    fn commit(&self, mutation: Mutation) -> EngineResult<ScoreOutcome> {
        if mutation.score < self.config.score_floor || mutation.score > self.config.score_ceiling {
            error!(
                anchor = %mutation.anchor,
                score = mutation.score,
                "out-of-range score reached commit"
            );
            return Err(EngineError::ScoreOutOfRange {
                score: mutation.score,
                floor: self.config.score_floor,
                ceiling: self.config.score_ceiling,
            });
        }

        let record = ScoreRecord {
            record_id: ScoreRecordId::generate(),
            anchor_id: mutation.anchor.clone(),
            score: mutation.score,
            previous_score: mutation.previous_score,
            delta: mutation.delta,
            band: self.config.thresholds.classify(mutation.score),
            decay_applied: mutation.decay_applied,
            applied_signal_ids: mutation.applied_signal_ids,
            watermark: mutation.watermark,
            computed_at: mutation.computed_at,
            correlation_id: mutation.correlation_id,
            config_version: self.config.version,
            version: mutation.version,
        };

        self.scores.append(record.clone())?;
        self.projection.apply(&record)?;

        let movement = self.detector.detect(&record, mutation.domain);
        let mut proof = None;
        if let Some(ref event) = movement {
            self.movements.append(event.clone())?;
            proof = Some(self.proofs.explain(event)?);
        }

        info!(
            anchor = %record.anchor_id,
            score = record.score,
            delta = record.delta,
            decay = record.decay_applied,
            moved = movement.is_some(),
            "score record accepted"
        );

        Ok(ScoreOutcome {
            record,
            movement,
            proof,
        })
    }
}

struct Mutation {
    anchor: AnchorId,
    previous_score: i64,
    score: i64,
    delta: i64,
    decay_applied: bool,
    applied_signal_ids: Vec<SignalId>,
    watermark: Option<chrono::DateTime<chrono::Utc>>,
    computed_at: chrono::DateTime<chrono::Utc>,
    correlation_id: CorrelationId,
    version: u64,
    domain: Option<SignalType>,
}

/// Deterministic decay correlation id: a resumed sweep replays instead of
/// double-decaying
pub(crate) fn decay_correlation(
    anchor_id: &AnchorId,
    as_of: chrono::DateTime<chrono::Utc>,
) -> CorrelationId {
    CorrelationId::new(format!("decay-{}-{}", anchor_id.as_str(), as_of.timestamp()))
}

fn replayed(record: ScoreRecord) -> ScoreOutcome {
    ScoreOutcome {
        record,
        movement: None,
        proof: None,
    }
}

fn anchor_lock_poisoned() -> EngineError {
    EngineError::StoreUnavailable("anchor lock poisoned".to_string())
}

/// Dominant signal type: most signals, then largest total magnitude, then
/// first by name, so every path is deterministic
fn dominant_domain(signals: &[Signal]) -> Option<SignalType> {
    let mut tally: BTreeMap<SignalType, (usize, i64)> = BTreeMap::new();
    for signal in signals {
        let entry = tally.entry(signal.signal_type).or_insert((0, 0i64));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(signal.magnitude.saturating_abs());
    }
    tally
        .into_iter()
        .max_by(|a, b| {
            a.1 .0
                .cmp(&b.1 .0)
                .then_with(|| a.1 .1.cmp(&b.1 .1))
                .then_with(|| b.0.as_str().cmp(a.0.as_str()))
        })
        .map(|(signal_type, _)| signal_type)
}
