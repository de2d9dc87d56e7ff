//! Orientation correction: device frame to vehicle frame.
//!
//! The mounting orientation is a static signed axis permutation supplied by
//! configuration: each vehicle axis is read from one device axis, optionally
//! inverted.  The vehicle frame has `x` forward, `y` left, `z` up.

use serde::{Deserialize, Serialize};

use crate::app::events::Event;
use crate::bus::{EventBus, Subscription};
use crate::imu::Acceleration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Where one vehicle axis comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSource {
    pub axis: Axis,
    #[serde(default)]
    pub inverted: bool,
}

impl AxisSource {
    pub const fn straight(axis: Axis) -> Self {
        Self {
            axis,
            inverted: false,
        }
    }

    pub const fn inverted(axis: Axis) -> Self {
        Self {
            axis,
            inverted: true,
        }
    }

    fn pick(&self, a: &Acceleration) -> f64 {
        let v = match self.axis {
            Axis::X => a.x,
            Axis::Y => a.y,
            Axis::Z => a.z,
        };
        if self.inverted { -v } else { v }
    }
}

/// Device-to-vehicle axis mapping.  Defaults to identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisMap {
    pub x: AxisSource,
    pub y: AxisSource,
    pub z: AxisSource,
}

impl Default for AxisMap {
    fn default() -> Self {
        Self {
            x: AxisSource::straight(Axis::X),
            y: AxisSource::straight(Axis::Y),
            z: AxisSource::straight(Axis::Z),
        }
    }
}

impl AxisMap {
    /// Remap one sample.  Time and total magnitude are frame-independent.
    pub fn apply(&self, a: &Acceleration) -> Acceleration {
        Acceleration {
            time: a.time,
            x: self.x.pick(a),
            y: self.y.pick(a),
            z: self.z.pick(a),
            magnitude: a.magnitude,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Corrected feed
// ───────────────────────────────────────────────────────────────

/// Consumes raw samples, publishes corrected acceleration.
pub struct CorrectedFeed {
    bus: EventBus<Event>,
}

impl Default for CorrectedFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrectedFeed {
    pub fn new() -> Self {
        Self {
            bus: EventBus::new("corrected"),
        }
    }

    pub fn bus(&self) -> &EventBus<Event> {
        &self.bus
    }

    pub async fn subscribe(&self, name: impl Into<String>) -> Subscription<Event> {
        self.bus.subscribe(name).await
    }

    pub async fn run(&self, raw: Subscription<Event>, map: AxisMap) {
        loop {
            if let Event::Raw(sample) = raw.recv().await.event {
                self.bus
                    .publish(Event::Corrected(map.apply(&sample.acceleration)))
                    .await;
            }
        }
    }
}
