//! Inertial subsystem: sample types and the three IMU pipeline stages.
//!
//! ```text
//! SampleSource ──▶ RawFeed ──▶ CorrectedFeed ──▶ DirectionFeed ──▶ motion events
//!                 (poller)    (axis remap)      (five trackers)
//! ```

pub mod direction;
pub mod orientation;
pub mod raw_feed;
pub mod trackers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One acceleration sample in g, with its acquisition time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    pub time: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Total magnitude across all three axes, as reported by the device.
    pub magnitude: f64,
}

impl Acceleration {
    /// Build a sample, computing the total magnitude from the axes.
    pub fn new(time: DateTime<Utc>, x: f64, y: f64, z: f64) -> Self {
        Self {
            time,
            x,
            y,
            z,
            magnitude: (x * x + y * y + z * z).sqrt(),
        }
    }

    /// True when every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.magnitude.is_finite()
    }
}

/// Angular rate in device-native units (degrees per second).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AngularRate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl AngularRate {
    /// Largest absolute rate across the three axes.
    pub fn peak(&self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }
}

/// Everything one acquisition cycle produces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub acceleration: Acceleration,
    pub angular_rate: AngularRate,
    /// Die temperature in degrees Celsius.
    pub temperature: f64,
}
