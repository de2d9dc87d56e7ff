//! Mock collaborators for integration tests.
//!
//! A scripted sample source, a recording event sink and a driver that runs
//! a whole pipeline until a condition holds, all on the host with no
//! devices and no real acquisition timers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use futures_lite::future;

use datalogger::app::events::{Event, MotionEvent, Published};
use datalogger::app::ports::{EventSink, SampleSource};
use datalogger::error::{AcquisitionError, Result};
use datalogger::gnss::{FixQuality, PositionFix};
use datalogger::imu::{Acceleration, AngularRate, RawSample};
use datalogger::pipeline::Pipeline;
use datalogger::storage::PersistenceEngine;

/// Cadence of scripted samples.
pub const SAMPLE_PERIOD_MS: i64 = 25;

/// Longest a scripted pipeline may run before the test fails.
pub const DEADLINE: Duration = Duration::from_secs(10);

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn sample_time(i: usize) -> DateTime<Utc> {
    t0() + TimeDelta::milliseconds(SAMPLE_PERIOD_MS * i as i64)
}

pub fn fix_3d() -> PositionFix {
    PositionFix::at(t0(), FixQuality::ThreeD, 45.5017, -73.5673, 35.0)
}

// ── Scripted sample source ────────────────────────────────────

/// Replays a fixed list of samples, then reports exhaustion.
pub struct ScriptedSource {
    samples: VecDeque<RawSample>,
    fail_after: Option<usize>,
    read: usize,
    pub reinits: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl ScriptedSource {
    /// One sample per `(x, y)` pair, gravity on `z`, 25 ms apart.
    pub fn from_xy(xy: &[(f64, f64)]) -> Self {
        let samples = xy
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| RawSample {
                acceleration: Acceleration::new(sample_time(i), x, y, 1.0),
                angular_rate: AngularRate::default(),
                temperature: 30.0,
            })
            .collect();
        Self {
            samples,
            fail_after: None,
            read: 0,
            reinits: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Fail the read after `n` successful ones.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Give sample `i` an angular rate of `rate` dps on x.
    pub fn with_rate_spike(mut self, i: usize, rate: f64) -> Self {
        if let Some(s) = self.samples.get_mut(i) {
            s.angular_rate.x = rate;
        }
        self
    }
}

impl SampleSource for ScriptedSource {
    fn read(&mut self) -> core::result::Result<Option<RawSample>, AcquisitionError> {
        if self.fail_after == Some(self.read) {
            return Err(AcquisitionError::Acceleration("i2c: no ack".into()));
        }
        self.read += 1;
        Ok(self.samples.pop_front())
    }

    fn reinit(&mut self) -> core::result::Result<(), AcquisitionError> {
        self.reinits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// ── Recording sink ────────────────────────────────────────────

/// Keeps every merged event; clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Arc<Mutex<Vec<Published<Event>>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn count(&self, origin: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.event.origin() == origin)
            .count()
    }

    pub fn motions(&self) -> Vec<MotionEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|p| match p.event {
                Event::Motion(m) => Some(m),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &Published<Event>) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── Pipeline driver ───────────────────────────────────────────

/// Run `pipeline` until `done` holds (then shut it down) or a unit fails.
/// Panics if neither happens within [`DEADLINE`].
pub fn run_until<S, K>(
    pipeline: &Pipeline,
    source: S,
    engine: &PersistenceEngine,
    sink: K,
    mut done: impl FnMut() -> bool,
) -> Result<()>
where
    S: SampleSource,
    K: EventSink,
{
    let watcher = async {
        let started = Instant::now();
        while !done() {
            assert!(
                started.elapsed() < DEADLINE,
                "pipeline did not settle within {:?}",
                DEADLINE
            );
            async_io_mini::Timer::after(Duration::from_millis(5)).await;
        }
        pipeline.supervisor().shutdown();
        future::pending::<Result<()>>().await
    };
    future::block_on(future::or(pipeline.run(source, engine, sink), watcher))
}

/// Rows currently in `table`.
pub fn row_count(engine: &PersistenceEngine, table: &str) -> i64 {
    engine
        .single_row_query(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
        .unwrap_or(0)
}
