//! Pipeline wiring and supervision.
//!
//! ```text
//!  SampleSource ─▶ RawFeed ─▶ [raw] ─┬─▶ CorrectedFeed ─▶ [corrected] ─┬─▶ DirectionFeed ─▶ [direction] ─┐
//!                                    │                                 │                                 │
//!                                    ▼                                 ▼                                 ▼
//!  positioning ─▶ PositionFeed ─▶ [position] ─────────────────────▶ StreamMerger ─▶ [merged] ─┬─▶ Recorder ─▶ PersistenceEngine
//!       │                                                                                     └─▶ EventSink
//!       └─▶ CurrentFix ◀── (snapshot) ── Recorder
//! ```
//!
//! Every unit is a future on one `LocalExecutor`.  Units that can fail run
//! under [`Supervisor::guard`]; the first failure ends [`Pipeline::run`]
//! with [`Error::Unit`], as does [`Supervisor::shutdown`] (with `Ok`).

use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{error, info};

use crate::app::events::Event;
use crate::app::ports::{EventSink, SampleSource};
use crate::bus::Subscription;
use crate::bus::merger::StreamMerger;
use crate::config::LoggerConfig;
use crate::error::{Error, Result};
use crate::gnss::current::CurrentFix;
use crate::gnss::feed::PositionFeed;
use crate::imu::direction::{DirectionFeed, MotionClassifier};
use crate::imu::orientation::CorrectedFeed;
use crate::imu::raw_feed::RawFeed;
use crate::recorder::Recorder;
use crate::storage::PersistenceEngine;

/// Task slots on the pipeline executor.
const EXECUTOR_TASKS: usize = 32;

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

/// Shutdown and failure boundary shared by every pipeline unit.
pub struct Supervisor {
    shutdown: Signal<CriticalSectionRawMutex, ()>,
    failure: Signal<CriticalSectionRawMutex, Error>,
    failed: AtomicBool,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub const fn new() -> Self {
        Self {
            shutdown: Signal::new(),
            failure: Signal::new(),
            failed: AtomicBool::new(false),
        }
    }

    /// Request an orderly stop.  Safe to call from any thread.
    pub fn shutdown(&self) {
        self.shutdown.signal(());
    }

    /// Run `unit`; if it fails, record the failure (first one wins).
    pub async fn guard<F>(&self, unit: &'static str, fut: F)
    where
        F: Future<Output = Result<()>>,
    {
        match fut.await {
            Ok(()) => info!("Unit '{}' finished", unit),
            Err(e) => {
                error!("Unit '{}' failed: {}", unit, e);
                if !self.failed.swap(true, Ordering::AcqRel) {
                    self.failure.signal(Error::Unit {
                        unit,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    /// Resolves on shutdown (`Ok`) or on the first unit failure (`Err`).
    pub async fn wait(&self) -> Result<()> {
        future::or(
            async {
                self.shutdown.wait().await;
                Ok(())
            },
            async { Err(self.failure.wait().await) },
        )
        .await
    }
}

// ───────────────────────────────────────────────────────────────
// Pipeline
// ───────────────────────────────────────────────────────────────

pub struct Pipeline {
    config: LoggerConfig,
    sample_interval: Option<Duration>,
    raw: RawFeed,
    corrected: CorrectedFeed,
    direction: DirectionFeed,
    positions: PositionFeed,
    merger: StreamMerger,
    current_fix: CurrentFix,
    supervisor: Supervisor,
}

impl Pipeline {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            sample_interval: Some(config.sample_interval()),
            config,
            raw: RawFeed::new(),
            corrected: CorrectedFeed::new(),
            direction: DirectionFeed::new(),
            positions: PositionFeed::new(),
            merger: StreamMerger::new(),
            current_fix: CurrentFix::new(),
            supervisor: Supervisor::new(),
        }
    }

    /// Read samples back to back instead of at the configured cadence
    /// (replays, tests).
    #[must_use]
    pub fn unpaced(mut self) -> Self {
        self.sample_interval = None;
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Inbox for the positioning collaborator.
    pub fn positions(&self) -> &PositionFeed {
        &self.positions
    }

    pub fn current_fix(&self) -> &CurrentFix {
        &self.current_fix
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Extra subscription on the merged stream.  Taken before
    /// [`run`](Self::run), it sees every merged event.  It must be drained:
    /// a full subscription stalls the merged bus.
    pub async fn subscribe(&self, name: impl Into<String>) -> Subscription<Event> {
        self.merger.subscribe(name).await
    }

    /// Run every unit until shutdown or the first failure.
    pub async fn run<S, K>(&self, source: S, engine: &PersistenceEngine, sink: K) -> Result<()>
    where
        S: SampleSource,
        K: EventSink,
    {
        // Wiring first, so no unit publishes into a bus before its
        // consumers are registered.
        let orientation_in = self.raw.subscribe("orientation").await;
        let direction_in = self.corrected.subscribe("direction").await;
        let upstreams = vec![
            self.raw.subscribe("merger").await,
            self.corrected.subscribe("merger").await,
            self.direction.subscribe("merger").await,
            self.positions.subscribe("merger").await,
        ];
        let recorder_in = self.merger.subscribe("recorder").await;
        let sink_in = self.merger.subscribe("sink").await;

        let classifier = MotionClassifier::from_config(&self.config.imu);
        let recorder = Recorder::new(engine, &self.current_fix)
            .persist_raw(self.config.persist_raw_samples)
            .persist_merged(self.config.persist_merged_samples);
        let sv = &self.supervisor;

        let executor: edge_executor::LocalExecutor<'_, EXECUTOR_TASKS> =
            edge_executor::LocalExecutor::new();

        for bus in [
            self.raw.bus(),
            self.corrected.bus(),
            self.direction.bus(),
            self.positions.bus(),
            self.merger.bus(),
        ] {
            executor.spawn(bus.run()).detach();
        }

        executor
            .spawn(sv.guard("raw_feed", self.raw.run(source, self.sample_interval)))
            .detach();
        executor
            .spawn(self.corrected.run(orientation_in, self.config.axis_map))
            .detach();
        executor
            .spawn(self.direction.run(direction_in, classifier))
            .detach();
        executor
            .spawn(self.positions.run(&self.current_fix, engine))
            .detach();
        executor.spawn(self.merger.run(upstreams)).detach();
        executor
            .spawn(sv.guard("recorder", recorder.run(recorder_in)))
            .detach();
        executor
            .spawn(sv.guard("sink", forward_to_sink(sink_in, sink)))
            .detach();
        executor.spawn(sv.guard("persistence", engine.run())).detach();

        info!(
            "Pipeline running ({})",
            match self.sample_interval {
                Some(period) => format!("{} ms cadence", period.as_millis()),
                None => "unpaced".to_string(),
            }
        );

        let outcome = executor.run(sv.wait()).await;
        match &outcome {
            Ok(()) => info!("Pipeline stopped"),
            Err(e) => error!("Pipeline stopped: {}", e),
        }
        outcome
    }
}

async fn forward_to_sink<K: EventSink>(merged: Subscription<Event>, mut sink: K) -> Result<()> {
    loop {
        let delivered = merged.recv().await;
        sink.emit(&delivered);
    }
}
