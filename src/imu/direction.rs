//! Motion classifier: five trackers over the corrected stream.
//!
//! | Tracker          | Predicate (defaults)             | Window key                             |
//! |------------------|----------------------------------|----------------------------------------|
//! | LeftTurn         | lateral ≥ `left_turn_threshold`  | `turn_continuous_count_window`         |
//! | RightTurn        | lateral ≤ `right_turn_threshold` | `turn_continuous_count_window`         |
//! | HardAcceleration | longitudinal ≥ accelerator       | `acceleration_continuous_count_window` |
//! | HardDeceleration | longitudinal ≤ decelerator       | `deceleration_continuous_count_window` |
//! | Stop             | planar magnitude ≤ stop          | `stop_continuous_count_window`         |
//!
//! All five see every accepted sample in the same step, so one sample may
//! complete several windows.  Stop re-arms only after
//! `stop_end_continuous_count_window` consecutive non-stopped samples.

use chrono::{DateTime, Utc};
use log::{debug, info};

use super::trackers::{Predicate, Tracker};
use crate::app::events::{Event, MotionEvent, MotionKind};
use crate::bus::{EventBus, Subscription};
use crate::config::ImuConfig;
use crate::imu::Acceleration;

/// At most one event per tracker per sample.
pub type Emitted = heapless::Vec<MotionEvent, 5>;

pub struct MotionClassifier {
    trackers: [Tracker; 5],
    last: Option<DateTime<Utc>>,
    dropped: u64,
}

impl MotionClassifier {
    pub fn from_config(c: &ImuConfig) -> Self {
        Self {
            trackers: [
                Tracker::new(
                    MotionKind::LeftTurn,
                    Predicate::at_least(c.turn_signal, c.left_turn_threshold),
                    c.turn_continuous_count_window,
                ),
                Tracker::new(
                    MotionKind::RightTurn,
                    Predicate::at_most(c.turn_signal, c.right_turn_threshold),
                    c.turn_continuous_count_window,
                ),
                Tracker::new(
                    MotionKind::HardAcceleration,
                    Predicate::at_least(c.longitudinal_signal, c.g_force_accelerator_threshold),
                    c.acceleration_continuous_count_window,
                ),
                Tracker::new(
                    MotionKind::HardDeceleration,
                    Predicate::at_most(c.longitudinal_signal, c.g_force_decelerator_threshold),
                    c.deceleration_continuous_count_window,
                ),
                Tracker::with_rearm_window(
                    MotionKind::Stop,
                    Predicate::at_most(c.stop_signal, c.stop_magnitude_threshold),
                    c.stop_continuous_count_window,
                    c.stop_end_continuous_count_window,
                ),
            ],
            last: None,
            dropped: 0,
        }
    }

    /// Samples rejected as out-of-order or non-finite.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn tracker(&self, kind: MotionKind) -> Option<&Tracker> {
        self.trackers.iter().find(|t| t.kind() == kind)
    }

    /// Run every tracker against one corrected sample.
    ///
    /// A sample whose time does not advance past the last accepted one, or
    /// whose axes are not finite, is dropped without touching any counter.
    pub fn classify(&mut self, a: &Acceleration) -> Emitted {
        let mut emitted = Emitted::new();

        if !a.is_finite() || self.last.is_some_and(|last| a.time <= last) {
            self.dropped += 1;
            debug!("Dropped sample at {} (out of order or non-finite)", a.time);
            return emitted;
        }
        self.last = Some(a.time);

        for tracker in &mut self.trackers {
            if let Some(event) = tracker.track(a.time, a.x, a.y) {
                // Capacity equals the tracker count.
                let _ = emitted.push(event);
            }
        }
        emitted
    }
}

// ───────────────────────────────────────────────────────────────
// Direction feed
// ───────────────────────────────────────────────────────────────

/// Consumes corrected samples, publishes motion events.
pub struct DirectionFeed {
    bus: EventBus<Event>,
}

impl Default for DirectionFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectionFeed {
    pub fn new() -> Self {
        Self {
            bus: EventBus::new("direction"),
        }
    }

    pub fn bus(&self) -> &EventBus<Event> {
        &self.bus
    }

    pub async fn subscribe(&self, name: impl Into<String>) -> Subscription<Event> {
        self.bus.subscribe(name).await
    }

    pub async fn run(&self, corrected: Subscription<Event>, mut classifier: MotionClassifier) {
        loop {
            let Event::Corrected(sample) = corrected.recv().await.event else {
                continue;
            };
            for event in classifier.classify(&sample) {
                info!(
                    "MOTION | {} at {} ({:.3} g)",
                    event.kind, event.occurred_at, event.triggering_magnitude
                );
                self.bus.publish(Event::Motion(event)).await;
            }
        }
    }
}
