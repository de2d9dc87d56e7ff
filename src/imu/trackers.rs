//! Debounced-threshold motion trackers.
//!
//! Each [`Tracker`] watches one [`Predicate`] over the corrected (x, y)
//! stream.  A run of `window` consecutive qualifying samples emits exactly
//! one [`MotionEvent`] and disarms the tracker; it re-arms once the
//! predicate has failed for `rearm_window` consecutive samples.
//!
//! ```text
//!            qualifying (count < W)
//!              ┌──────┐
//!              ▼      │
//!  ┌─────────────────────┐  count == W / emit  ┌─────────────────────┐
//!  │       ARMED         │────────────────────▶│      DISARMED       │
//!  │  count consecutive  │                     │  count misses       │
//!  └─────────────────────┘◀────────────────────└─────────────────────┘
//!              ▲      │    misses == rearm_window     │      ▲
//!              └──────┘                               └──────┘
//!       non-qualifying (count = 0)           qualifying (misses = 0)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::events::{MotionEvent, MotionKind};

/// Which quantity of the corrected sample a predicate looks at.
///
/// The corrected frame has `x` pointing forward and `y` pointing left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Forward acceleration (x).
    Longitudinal,
    /// Leftward acceleration (y).
    Lateral,
    /// Horizontal-plane magnitude, `sqrt(x² + y²)`.
    PlanarMagnitude,
}

impl Signal {
    pub fn value(self, x: f64, y: f64) -> f64 {
        match self {
            Self::Longitudinal => x,
            Self::Lateral => y,
            Self::PlanarMagnitude => x.hypot(y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    AtLeast,
    AtMost,
}

/// `signal <comparison> threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predicate {
    pub signal: Signal,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl Predicate {
    pub fn at_least(signal: Signal, threshold: f64) -> Self {
        Self {
            signal,
            comparison: Comparison::AtLeast,
            threshold,
        }
    }

    pub fn at_most(signal: Signal, threshold: f64) -> Self {
        Self {
            signal,
            comparison: Comparison::AtMost,
            threshold,
        }
    }

    /// Evaluate against a sample; returns the signal value when it qualifies.
    pub fn evaluate(&self, x: f64, y: f64) -> Option<f64> {
        let value = self.signal.value(x, y);
        let holds = match self.comparison {
            Comparison::AtLeast => value >= self.threshold,
            Comparison::AtMost => value <= self.threshold,
        };
        holds.then_some(value)
    }
}

/// One debounced-threshold state machine.
#[derive(Debug, Clone)]
pub struct Tracker {
    kind: MotionKind,
    predicate: Predicate,
    window: u32,
    rearm_window: u32,
    /// Consecutive qualifying samples while armed.
    count: u32,
    /// Consecutive non-qualifying samples while disarmed.
    misses: u32,
    armed: bool,
}

impl Tracker {
    /// A tracker that re-arms on the first non-qualifying sample.
    pub fn new(kind: MotionKind, predicate: Predicate, window: u32) -> Self {
        Self::with_rearm_window(kind, predicate, window, 1)
    }

    /// A tracker that needs `rearm_window` consecutive misses to re-arm.
    pub fn with_rearm_window(
        kind: MotionKind,
        predicate: Predicate,
        window: u32,
        rearm_window: u32,
    ) -> Self {
        Self {
            kind,
            predicate,
            window: window.max(1),
            rearm_window: rearm_window.max(1),
            count: 0,
            misses: 0,
            armed: true,
        }
    }

    pub fn kind(&self) -> MotionKind {
        self.kind
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Feed one corrected sample.  Returns the event when this sample
    /// completes a qualifying window.
    pub fn track(&mut self, at: DateTime<Utc>, x: f64, y: f64) -> Option<MotionEvent> {
        match self.predicate.evaluate(x, y) {
            Some(value) => {
                self.misses = 0;
                if !self.armed {
                    return None;
                }
                self.count += 1;
                if self.count < self.window {
                    return None;
                }
                self.count = 0;
                self.armed = false;
                Some(MotionEvent {
                    kind: self.kind,
                    occurred_at: at,
                    triggering_magnitude: value,
                })
            }
            None => {
                self.count = 0;
                if !self.armed {
                    self.misses += 1;
                    if self.misses >= self.rearm_window {
                        self.misses = 0;
                        self.armed = true;
                    }
                }
                None
            }
        }
    }
}
