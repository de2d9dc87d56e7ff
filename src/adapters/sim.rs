//! Simulated collaborators for host runs.
//!
//! [`SimulatedImu`] stands in for the inertial driver: a level, stationary
//! device with gravity on `z` and a little deterministic jitter.
//! [`run_simulated_gnss`] stands in for the positioning receiver,
//! submitting one 3D fix per period until told to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};

use crate::app::ports::SampleSource;
use crate::error::AcquisitionError;
use crate::gnss::feed::PositionFeed;
use crate::gnss::{Dop, FixQuality, PositionFix, RfStatus, Satellites};
use crate::imu::{Acceleration, AngularRate, RawSample};

// ── IMU ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SimulatedImu {
    tick: u64,
}

impl SimulatedImu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SampleSource for SimulatedImu {
    fn read(&mut self) -> Result<Option<RawSample>, AcquisitionError> {
        self.tick += 1;
        // Triangle wave, ±0.005 g.
        let jitter = ((self.tick % 20) as f64 - 10.0) * 0.0005;
        Ok(Some(RawSample {
            acceleration: Acceleration::new(Utc::now(), jitter, -jitter, 1.0),
            angular_rate: AngularRate {
                x: jitter * 100.0,
                y: 0.0,
                z: 0.0,
            },
            temperature: 36.5,
        }))
    }

    fn reinit(&mut self) -> Result<(), AcquisitionError> {
        info!("Simulated IMU reinitialised");
        self.tick = 0;
        Ok(())
    }
}

// ── GNSS ─────────────────────────────────────────────────────

/// A plausible 3D fix at the given coordinates.
pub fn simulated_fix(latitude: f64, longitude: f64) -> PositionFix {
    let now = Utc::now();
    PositionFix {
        eph: 1500,
        sep: 2500,
        heading: 0.0,
        speed: 0.0,
        dop: Dop {
            gdop: 1.4,
            hdop: 0.8,
            pdop: 1.2,
            tdop: 0.7,
            vdop: 0.9,
            xdop: 0.5,
            ydop: 0.6,
        },
        satellites: Satellites { seen: 18, used: 12 },
        ttff: 28_000,
        rf: RfStatus {
            jamming_state: "ok".to_string(),
            ant_status: "ok".to_string(),
            ant_power: "on".to_string(),
            ..RfStatus::default()
        },
        ..PositionFix::at(now, FixQuality::ThreeD, latitude, longitude, 35.0)
    }
}

/// Submit a fix every `period` until `stop` is set.  Blocks; run it on
/// its own (scoped) thread.  Never waits on the feed, so a stopped
/// pipeline cannot wedge it.
pub fn run_simulated_gnss(feed: &PositionFeed, period: Duration, stop: &AtomicBool) {
    let mut step: u32 = 0;
    while !stop.load(Ordering::Acquire) {
        let drift = f64::from(step) * 1e-6;
        if !feed.try_submit(simulated_fix(45.5017 + drift, -73.5673)) {
            debug!("Position inbox full, fix dropped");
        }
        step = step.wrapping_add(1);
        std::thread::sleep(period);
    }
    info!("Simulated GNSS stopped");
}
