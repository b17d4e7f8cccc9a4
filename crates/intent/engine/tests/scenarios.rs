//! End-to-end flows through ingest, guard, scoring, movement, and proof

use intent_engine::{DecaySweep, ScoreEngine, SignalReport};
use intent_types::{
    AnchorId, Band, CorrelationId, EngineConfig, EngineError, IdentityRef, SignalType,
};
use std::sync::Arc;

fn spine(anchor: &str) -> IdentityRef {
    IdentityRef::Spine(AnchorId::new(anchor))
}

fn report(anchor: &str, signal_type: SignalType, magnitude: i64, corr: &str) -> SignalReport {
    SignalReport {
        identity: spine(anchor),
        signal_type,
        magnitude,
        source: "scraper".to_string(),
        observed_at: chrono::Utc::now(),
        valid_until: None,
        correlation_id: CorrelationId::new(corr),
    }
}

#[test]
fn test_hiring_burst_crosses_into_watch_with_proof() {
    // A single aggregation pass may carry up to 100 points here
    let engine = ScoreEngine::in_memory(EngineConfig::new(40).with_delta_cap(100)).unwrap();

    for i in 0..3 {
        engine
            .ingest_signal(report("anchor-1", SignalType::Hiring, 20, &format!("h{}", i)))
            .unwrap();
    }

    let outcome = engine
        .apply_signals(&spine("anchor-1"), &CorrelationId::new("burst-1"))
        .unwrap();

    assert_eq!(outcome.record.score, 60);
    assert_eq!(outcome.record.band, Band::Watch);

    let movement = outcome.movement.expect("band change must emit a movement");
    assert_eq!(movement.from_band, Band::Silent);
    assert_eq!(movement.to_band, Band::Watch);
    assert_eq!(movement.domain, Some(SignalType::Hiring));

    let anchor = AnchorId::new("anchor-1");
    assert_eq!(engine.movements().for_anchor(&anchor).unwrap().len(), 1);

    let proof = outcome.proof.expect("movement must carry a proof line");
    assert_eq!(
        proof.narrative_text,
        "Score rose from 0 to 60 driven by 3 hiring signals, crossing SILENT→WATCH"
    );
}

#[test]
fn test_legacy_identifier_is_fatal_and_audited() {
    let engine = ScoreEngine::in_memory(EngineConfig::new(40)).unwrap();
    let legacy = IdentityRef::LegacyTenant("tenant-42".to_string());

    let err = engine
        .ingest_signal(SignalReport {
            identity: legacy.clone(),
            signal_type: SignalType::Funding,
            magnitude: 30,
            source: "crm".to_string(),
            observed_at: chrono::Utc::now(),
            valid_until: None,
            correlation_id: CorrelationId::new("legacy-1"),
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::SpineViolation { .. }));
    assert!(err.is_doctrine_violation());

    let err = engine
        .apply_signals(&legacy, &CorrelationId::new("legacy-2"))
        .unwrap_err();
    assert!(err.is_doctrine_violation());

    // Every rejection is in the sink; no score record exists anywhere
    let rejections = engine.sink().for_anchor("tenant-42").unwrap();
    assert_eq!(rejections.len(), 2);
    assert!(rejections.iter().all(|r| r.rule_violated == "spine_violation"));
    assert!(engine.scores().anchors().unwrap().is_empty());
}

#[test]
fn test_oversized_adjustment_rejected_then_resubmitted_at_cap() {
    let engine = ScoreEngine::in_memory(EngineConfig::new(40)).unwrap();
    let identity = spine("anchor-1");

    let err = engine
        .apply_adjustment(&identity, 75, &CorrelationId::new("adj-1"))
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::DeltaCapExceeded {
            proposed: 75,
            cap: 50
        }
    );

    // Rejected means rejected: not clamped, not partially applied
    let anchor = AnchorId::new("anchor-1");
    assert!(engine.scores().latest(&anchor).unwrap().is_none());
    let rejections = engine.sink().for_correlation(&CorrelationId::new("adj-1")).unwrap();
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].rule_violated, "delta_cap_exceeded");

    // Resubmission at exactly the cap succeeds
    let outcome = engine
        .apply_adjustment(&identity, 50, &CorrelationId::new("adj-2"))
        .unwrap();
    assert_eq!(outcome.record.score, 50);
    assert_eq!(outcome.record.delta, 50);
    assert_eq!(outcome.record.band, Band::Watch);
}

#[test]
fn test_decay_is_strictly_decreasing_and_quiet_inside_band() {
    let engine = ScoreEngine::in_memory(
        EngineConfig::new(40)
            .with_delta_cap(500)
            .with_half_life_secs(86_400),
    )
    .unwrap();
    let identity = spine("anchor-1");

    engine
        .apply_adjustment(&identity, 400, &CorrelationId::new("seed"))
        .unwrap();
    let seeded = engine
        .scores()
        .latest(&AnchorId::new("anchor-1"))
        .unwrap()
        .unwrap();
    assert_eq!(seeded.band, Band::Watch);

    let mut previous = 400;
    let mut crossings = 0;
    for day in 1..=3 {
        let outcome = engine
            .apply_decay(
                &identity,
                seeded.computed_at + chrono::Duration::days(day),
                &CorrelationId::new(format!("decay-day-{}", day)),
            )
            .unwrap();
        assert!(outcome.record.decay_applied);
        assert!(outcome.record.score < previous);
        if outcome.movement.is_some() {
            crossings += 1;
        }
        previous = outcome.record.score;
    }

    // 400, 200, 100, 50: three half-lives land exactly on the WATCH
    // floor, so no band was ever crossed and no movement emitted
    assert_eq!(previous, 50);
    assert_eq!(crossings, 0);
    assert_eq!(
        engine.projection().get(&AnchorId::new("anchor-1")).unwrap().unwrap().band,
        Band::Watch
    );
}

#[test]
fn test_mutation_replay_returns_first_decision() {
    let engine = ScoreEngine::in_memory(EngineConfig::new(40)).unwrap();
    let identity = spine("anchor-1");

    engine
        .ingest_signal(report("anchor-1", SignalType::Funding, 15, "f1"))
        .unwrap();

    let correlation = CorrelationId::new("apply-1");
    let first = engine.apply_signals(&identity, &correlation).unwrap();

    // More signals arrive, then the original request is replayed
    engine
        .ingest_signal(report("anchor-1", SignalType::Funding, 15, "f2"))
        .unwrap();
    let replay = engine.apply_signals(&identity, &correlation).unwrap();

    assert_eq!(first.record, replay.record);
    assert_eq!(
        engine.scores().history(&AnchorId::new("anchor-1")).unwrap().len(),
        1
    );
}

#[test]
fn test_interrupted_sweep_resumes_without_double_decay() {
    let engine = Arc::new(
        ScoreEngine::in_memory(EngineConfig::new(40).with_half_life_secs(3600)).unwrap(),
    );
    for anchor in ["anchor-a", "anchor-b", "anchor-c", "anchor-d"] {
        engine
            .apply_adjustment(
                &spine(anchor),
                40,
                &CorrelationId::new(format!("seed-{}", anchor)),
            )
            .unwrap();
    }
    let as_of = engine
        .scores()
        .latest(&AnchorId::new("anchor-d"))
        .unwrap()
        .unwrap()
        .computed_at
        + chrono::Duration::hours(1);

    // First sweep dies after two anchors; a fresh sweep at the same
    // as_of covers all four, replaying the two already done
    let interrupted = DecaySweep::new(engine.clone());
    interrupted.run(as_of, 2).unwrap();

    let restarted = DecaySweep::new(engine.clone());
    let report = restarted.run(as_of, 10).unwrap();
    assert_eq!(report.processed, 4);
    assert!(report.completed);

    for anchor in ["anchor-a", "anchor-b", "anchor-c", "anchor-d"] {
        let history = engine.scores().history(&AnchorId::new(anchor)).unwrap();
        assert_eq!(history.len(), 2, "exactly one decay record for {}", anchor);
        assert_eq!(history[1].score, 20);
    }
}

#[test]
fn test_band_override_walks_toward_target() {
    let engine = ScoreEngine::in_memory(EngineConfig::new(40)).unwrap();
    let identity = spine("anchor-1");

    // Reaching EXPLORATORY's floor of 450 takes nine capped steps
    let mut band = Band::Silent;
    for step in 0..9 {
        let outcome = engine
            .apply_override(&identity, "EXPLORATORY", &CorrelationId::new(format!("ov-{}", step)))
            .unwrap();
        assert!(outcome.record.delta.abs() <= 50);
        band = outcome.record.band;
    }
    assert_eq!(band, Band::Exploratory);

    let snapshot = engine.projection().get(&AnchorId::new("anchor-1")).unwrap().unwrap();
    assert_eq!(snapshot.score, 450);

    // A tenth override is a no-op: already at the target floor
    let outcome = engine
        .apply_override(&identity, "EXPLORATORY", &CorrelationId::new("ov-9"))
        .unwrap();
    assert_eq!(outcome.record.delta, 0);
}
