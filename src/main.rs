//! Datalogger main entry point
//!
//! Host bootstrap for the event pipeline, with simulated collaborators
//! standing in for the IMU driver and the positioning receiver.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  main thread                                                 │
//! │  block_on ─▶ Pipeline::run (LocalExecutor: buses, feeds,     │
//! │              merger, recorder, sink, writer, purge)          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  sim-gnss thread ─▶ PositionFeed::try_submit (1 Hz)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use datalogger::adapters::log_sink::LogEventSink;
use datalogger::adapters::sim::{SimulatedImu, run_simulated_gnss, simulated_fix};
use datalogger::config::LoggerConfig;
use datalogger::pipeline::Pipeline;
use datalogger::storage::PersistenceEngine;

const DEFAULT_CONFIG_PATH: &str = "imu-logger.json";
const GNSS_PERIOD: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Datalogger v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration (never fatal) ────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = LoggerConfig::load(&config_path);
    info!(
        "Config: windows turn={} acc={} dec={} stop={}/{} | thresholds L={} R={} acc={} dec={} stop={} | \
         db={} ttl={}s | sample={}ms",
        config.imu.turn_continuous_count_window,
        config.imu.acceleration_continuous_count_window,
        config.imu.deceleration_continuous_count_window,
        config.imu.stop_continuous_count_window,
        config.imu.stop_end_continuous_count_window,
        config.imu.left_turn_threshold,
        config.imu.right_turn_threshold,
        config.imu.g_force_accelerator_threshold,
        config.imu.g_force_decelerator_threshold,
        config.imu.stop_magnitude_threshold,
        config.db_path,
        config.db_log_ttl_secs,
        config.sample_interval_ms,
    );

    // ── 3. Storage (fatal before the pipeline starts) ─────────
    let mut engine = PersistenceEngine::open(&config.db_path)
        .with_context(|| format!("opening database {}", config.db_path))?;
    engine
        .init(config.db_log_ttl())
        .context("initializing database")?;
    match engine.last_position() {
        Ok(Some(p)) => info!(
            "Last stored position: {:.6},{:.6} alt {:.1}",
            p.latitude, p.longitude, p.altitude
        ),
        Ok(None) => info!("No stored position yet"),
        Err(e) => log::warn!("Reading last position failed: {}", e),
    }

    // ── 4. Pipeline ───────────────────────────────────────────
    let pipeline = Pipeline::new(config);

    // Seed the position inbox so samples never arrive before a fix.
    pipeline.positions().submit_blocking(simulated_fix(45.5017, -73.5673));

    let stop = AtomicBool::new(false);
    let positions = pipeline.positions();
    std::thread::scope(|s| {
        std::thread::Builder::new()
            .name("sim-gnss".into())
            .spawn_scoped(s, || run_simulated_gnss(positions, GNSS_PERIOD, &stop))
            .context("spawning simulated GNSS")?;

        let outcome = futures_lite::future::block_on(pipeline.run(
            SimulatedImu::new(),
            &engine,
            LogEventSink::new(),
        ));
        stop.store(true, Ordering::Release);
        outcome.context("pipeline terminated")
    })
}
