//! PersistenceEngine tests: batching threshold, retention purge and the
//! query surface, driven through the public `log` / writer path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_lite::future;

use datalogger::gnss::{FixQuality, PositionFix};
use datalogger::imu::{Acceleration, AngularRate, RawSample};
use datalogger::storage::{PersistenceEngine, QUEUE_DEPTH};
use datalogger::storage::batch::BATCH_SIZE;
use datalogger::storage::records::{GnssRecord, ImuRecord};

use crate::mock_io::row_count;

const TWELVE_HOURS: Duration = Duration::from_secs(12 * 60 * 60);

fn engine() -> PersistenceEngine {
    let mut engine = PersistenceEngine::open_in_memory().unwrap();
    engine.init(TWELVE_HOURS).unwrap();
    engine
}

fn imu_at(time: DateTime<Utc>) -> ImuRecord {
    ImuRecord(RawSample {
        acceleration: Acceleration::new(time, 0.0, 0.0, 1.0),
        angular_rate: AngularRate::default(),
        temperature: 31.0,
    })
}

/// Queue `records`, then let the writer drain the queue.
fn log_all<R: datalogger::app::ports::Insertable>(engine: &PersistenceEngine, records: &[R]) {
    future::block_on(future::or(
        async {
            for r in records {
                engine.log(r).await;
            }
            // One more turn for the writer to drain what is queued.
            for _ in 0..4 {
                future::yield_now().await;
            }
        },
        async {
            engine.run_writer().await.unwrap();
        },
    ));
}

// ── Batching ─────────────────────────────────────────────────

#[test]
fn ninety_nine_records_write_nothing() {
    let engine = engine();
    let now = Utc::now();
    let records: Vec<_> = (0..BATCH_SIZE - 1)
        .map(|i| imu_at(now + TimeDelta::milliseconds(i as i64)))
        .collect();
    log_all(&engine, &records);
    assert_eq!(row_count(&engine, "imu"), 0);
}

#[test]
fn hundredth_record_flushes_the_batch() {
    let engine = engine();
    let now = Utc::now();
    let records: Vec<_> = (0..BATCH_SIZE)
        .map(|i| imu_at(now + TimeDelta::milliseconds(i as i64)))
        .collect();
    log_all(&engine, &records);
    assert_eq!(row_count(&engine, "imu"), BATCH_SIZE as i64);
}

#[test]
fn pending_batch_is_dropped_with_the_writer() {
    // There is no flush on shutdown: a stopped writer loses its partial
    // batch, and a new one starts from empty.
    let engine = engine();
    let now = Utc::now();
    let records: Vec<_> = (0..150)
        .map(|i| imu_at(now + TimeDelta::milliseconds(i)))
        .collect();
    log_all(&engine, &records[..75]);
    log_all(&engine, &records[75..]);
    assert_eq!(row_count(&engine, "imu"), 0);
    log_all(&engine, &records);
    assert_eq!(row_count(&engine, "imu"), 100);
}

// ── Retention ────────────────────────────────────────────────

#[test]
fn purge_deletes_only_rows_older_than_ttl() {
    let engine = engine();
    let now = Utc::now();
    let old = now - TimeDelta::hours(13);
    let recent = now - TimeDelta::hours(1);
    let records: Vec<_> = (0..BATCH_SIZE)
        .map(|i| {
            let base = if i < 10 { old } else { recent };
            imu_at(base + TimeDelta::milliseconds(i as i64))
        })
        .collect();
    log_all(&engine, &records);
    assert_eq!(row_count(&engine, "imu"), 100);

    assert_eq!(engine.purge(TWELVE_HOURS).unwrap(), 10);
    assert_eq!(row_count(&engine, "imu"), 90);
}

#[test]
fn purge_is_idempotent() {
    let engine = engine();
    let old = Utc::now() - TimeDelta::hours(13);
    let records: Vec<_> = (0..BATCH_SIZE)
        .map(|i| imu_at(old + TimeDelta::milliseconds(i as i64)))
        .collect();
    log_all(&engine, &records);

    assert_eq!(engine.purge(TWELVE_HOURS).unwrap(), BATCH_SIZE);
    assert_eq!(engine.purge(TWELVE_HOURS).unwrap(), 0);
}

#[test]
fn retention_beyond_the_calendar_purges_nothing() {
    let engine = engine();
    let old = Utc::now() - TimeDelta::days(400);
    let records: Vec<_> = (0..BATCH_SIZE)
        .map(|i| imu_at(old + TimeDelta::milliseconds(i as i64)))
        .collect();
    log_all(&engine, &records);

    for ttl in [Duration::from_secs(100_000_000_000_000), Duration::MAX] {
        assert_eq!(engine.purge(ttl).unwrap(), 0);
    }
    assert_eq!(row_count(&engine, "imu"), BATCH_SIZE as i64);
}

#[test]
fn try_log_refuses_when_queue_is_full() {
    let engine = engine();
    let record = imu_at(Utc::now());
    // No writer is draining the queue.
    for _ in 0..QUEUE_DEPTH {
        assert!(engine.try_log(&record));
    }
    assert!(!engine.try_log(&record));
}

#[test]
fn purge_covers_every_managed_table() {
    let engine = engine();
    let old = Utc::now() - TimeDelta::days(2);
    let fixes: Vec<_> = (0..BATCH_SIZE)
        .map(|i| {
            GnssRecord(Arc::new(PositionFix::at(
                old + TimeDelta::seconds(i as i64),
                FixQuality::ThreeD,
                1.0,
                2.0,
                3.0,
            )))
        })
        .collect();
    log_all(&engine, &fixes);
    assert_eq!(row_count(&engine, "gnss"), 100);
    assert_eq!(engine.purge_older_than(Utc::now()).unwrap(), 100);
}

// ── Query surface ────────────────────────────────────────────

#[test]
fn last_position_skips_fixless_rows() {
    let engine = engine();
    let t = Utc::now();
    let fixes: Vec<_> = (0..BATCH_SIZE)
        .map(|i| {
            let (quality, lat) = if i == BATCH_SIZE - 1 {
                (FixQuality::None, 0.0)
            } else {
                (FixQuality::TwoD, i as f64)
            };
            GnssRecord(Arc::new(PositionFix::at(
                t + TimeDelta::seconds(i as i64),
                quality,
                lat,
                10.0,
                100.0,
            )))
        })
        .collect();
    log_all(&engine, &fixes);

    let p = engine.last_position().unwrap().unwrap();
    assert!((p.latitude - (BATCH_SIZE - 2) as f64).abs() < 1e-9);
    assert!((p.longitude - 10.0).abs() < 1e-9);
}

#[test]
fn query_visits_every_row() {
    let engine = engine();
    let now = Utc::now();
    let records: Vec<_> = (0..BATCH_SIZE)
        .map(|i| imu_at(now + TimeDelta::milliseconds(i as i64)))
        .collect();
    log_all(&engine, &records);

    let mut temps = Vec::new();
    let n = engine
        .query("SELECT temperature FROM imu ORDER BY time", [], |row| {
            temps.push(row.get::<_, f64>(0)?);
            Ok(())
        })
        .unwrap();
    assert_eq!(n, BATCH_SIZE);
    assert!(temps.iter().all(|&t| (t - 31.0).abs() < 1e-9));
}
