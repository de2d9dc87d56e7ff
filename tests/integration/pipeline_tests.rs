//! End-to-end pipeline tests: scripted samples in, merged events and
//! SQLite rows out.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use datalogger::app::events::{Event, MotionKind};
use datalogger::config::{ImuConfig, LoggerConfig};
use datalogger::error::{AcquisitionError, Error};
use datalogger::pipeline::Pipeline;
use datalogger::storage::PersistenceEngine;
use datalogger::storage::batch::BATCH_SIZE;

use crate::mock_io::{RecordingSink, ScriptedSource, fix_3d, row_count, run_until, sample_time};

fn engine() -> PersistenceEngine {
    let mut engine = PersistenceEngine::open_in_memory().unwrap();
    engine.init(LoggerConfig::default().db_log_ttl()).unwrap();
    engine
}

fn pipeline_with_fix() -> Pipeline {
    let pipeline = Pipeline::new(LoggerConfig::default()).unpaced();
    pipeline.current_fix().replace(Arc::new(fix_3d()));
    pipeline
}

// ── Right turn through the whole chain ───────────────────────

#[test]
fn sustained_right_turn_emits_one_event_and_persists_samples() {
    let engine = engine();
    let pipeline = pipeline_with_fix();
    let sink = RecordingSink::new();
    let seen = sink.clone();

    // Slight forward motion keeps the stop tracker quiet.
    let source = ScriptedSource::from_xy(&[(0.05, -0.3); BATCH_SIZE]);

    let result = run_until(&pipeline, source, &engine, sink, || {
        seen.count("corrected") == BATCH_SIZE
            && seen.count("raw") == BATCH_SIZE
            && !seen.motions().is_empty()
            && row_count(&engine, "imu") == BATCH_SIZE as i64
            && row_count(&engine, "merged") == BATCH_SIZE as i64
    });
    assert!(result.is_ok(), "{result:?}");

    let motions = seen.motions();
    assert_eq!(motions.len(), 1, "{motions:?}");
    assert_eq!(motions[0].kind, MotionKind::RightTurn);
    assert_eq!(motions[0].occurred_at, sample_time(49));
    assert!((motions[0].triggering_magnitude + 0.3).abs() < 1e-9);

    assert_eq!(seen.count("raw"), BATCH_SIZE);

    // Every merged row carries the current fix.
    let lat: f64 = engine
        .single_row_query("SELECT MIN(latitude) FROM merged", [], |r| r.get(0))
        .unwrap()
        .unwrap();
    assert!((lat - fix_3d().latitude).abs() < 1e-9);

    // A single direction event stays below the batch threshold.
    assert_eq!(row_count(&engine, "direction_events"), 0);
}

#[test]
fn position_fix_reaches_register_and_merged_stream() {
    let engine = engine();
    let pipeline = Pipeline::new(LoggerConfig::default()).unpaced();
    pipeline.positions().submit_blocking(fix_3d());
    let sink = RecordingSink::new();
    let seen = sink.clone();

    let result = run_until(&pipeline, ScriptedSource::from_xy(&[]), &engine, sink, || {
        seen.count("position") == 1
    });
    assert!(result.is_ok());
    assert!(pipeline.positions().is_storing());
    assert_eq!(
        pipeline.current_fix().snapshot().unwrap().latitude,
        fix_3d().latitude
    );
}

// ── Failures surface through the supervisor ──────────────────

#[test]
fn sample_without_fix_fails_the_recorder() {
    let engine = engine();
    let pipeline = Pipeline::new(LoggerConfig::default()).unpaced();
    let source = ScriptedSource::from_xy(&[(0.0, 0.0); 5]);

    let result = run_until(&pipeline, source, &engine, RecordingSink::new(), || false);

    match result {
        Err(Error::Unit { unit, source }) => {
            assert_eq!(unit, "recorder");
            assert!(matches!(*source, Error::NoFixAvailable));
        }
        other => panic!("expected recorder failure, got {other:?}"),
    }
    assert_eq!(row_count(&engine, "merged"), 0);
}

#[test]
fn motion_without_fix_fails_the_recorder_and_writes_nothing() {
    let engine = engine();
    let config = LoggerConfig {
        persist_merged_samples: false,
        imu: ImuConfig {
            turn_continuous_count_window: 3,
            ..ImuConfig::default()
        },
        ..LoggerConfig::default()
    };
    let pipeline = Pipeline::new(config).unpaced();
    let source = ScriptedSource::from_xy(&[(0.05, -0.3); 5]);

    let result = run_until(&pipeline, source, &engine, RecordingSink::new(), || false);

    match result {
        Err(Error::Unit { unit, source }) => {
            assert_eq!(unit, "recorder");
            assert!(matches!(*source, Error::NoFixAvailable));
        }
        other => panic!("expected recorder failure, got {other:?}"),
    }
    assert!(pipeline.current_fix().snapshot().is_none());
    assert_eq!(row_count(&engine, "direction_events"), 0);
    assert_eq!(row_count(&engine, "merged"), 0);
}

#[test]
fn read_failure_fails_the_raw_feed() {
    let engine = engine();
    let pipeline = pipeline_with_fix();
    let source = ScriptedSource::from_xy(&[(0.0, 0.0); 10]).failing_after(3);

    let result = run_until(&pipeline, source, &engine, RecordingSink::new(), || false);

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Unit { unit: "raw_feed", .. }), "{err}");
    assert!(matches!(
        err.root(),
        Error::Acquisition(AcquisitionError::Acceleration(_))
    ));
}

// ── Transient anomaly is recovered locally ───────────────────

#[test]
fn angular_rate_spike_reinitialises_without_failing() {
    let engine = engine();
    let pipeline = pipeline_with_fix();
    let sink = RecordingSink::new();
    let seen = sink.clone();
    let source = ScriptedSource::from_xy(&[(0.05, 0.0); 10]).with_rate_spike(4, -2500.0);
    let reinits = source.reinits.clone();

    let result = run_until(&pipeline, source, &engine, sink, || {
        seen.count("corrected") == 9 && seen.count("raw") == 9
    });

    assert!(result.is_ok());
    assert_eq!(reinits.load(Ordering::Relaxed), 1);
    let spiked_at = sample_time(4);
    let events = seen.events.lock().unwrap();
    assert!(events.iter().all(|p| match &p.event {
        Event::Raw(s) => s.acceleration.time != spiked_at,
        Event::Corrected(a) => a.time != spiked_at,
        _ => true,
    }));
}
