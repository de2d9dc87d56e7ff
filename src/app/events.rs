//! Pipeline events.
//!
//! Every bus carries the closed [`Event`] variant; consumers match on the
//! kind instead of inspecting types at runtime.  Each delivery is wrapped
//! in [`Published`], which records when the event was published.

use core::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gnss::PositionFix;
use crate::imu::{Acceleration, RawSample};

/// The five classified motion kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionKind {
    LeftTurn,
    RightTurn,
    HardAcceleration,
    HardDeceleration,
    Stop,
}

impl MotionKind {
    pub const ALL: [MotionKind; 5] = [
        Self::LeftTurn,
        Self::RightTurn,
        Self::HardAcceleration,
        Self::HardDeceleration,
        Self::Stop,
    ];

    /// Stable name used in logs and the `direction_events` table.
    pub fn name(self) -> &'static str {
        match self {
            Self::LeftTurn => "left_turn",
            Self::RightTurn => "right_turn",
            Self::HardAcceleration => "acceleration",
            Self::HardDeceleration => "deceleration",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for MotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified motion event.  Immutable once emitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    pub kind: MotionKind,
    /// Acquisition time of the sample that completed the window.
    pub occurred_at: DateTime<Utc>,
    /// Signal value of that sample (g).
    pub triggering_magnitude: f64,
}

/// Everything that travels on a pipeline bus.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Uncorrected sample straight from the source.
    Raw(RawSample),
    /// Acceleration after the orientation transform.
    Corrected(Acceleration),
    /// Output of a motion tracker.
    Motion(MotionEvent),
    /// A position fix from the positioning collaborator.
    Position(Arc<PositionFix>),
}

impl Event {
    /// Origin tag of the event.
    pub fn origin(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw",
            Self::Corrected(_) => "corrected",
            Self::Motion(_) => "motion",
            Self::Position(_) => "position",
        }
    }
}

/// An event as delivered to one subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct Published<T> {
    /// When `publish` was called on the owning bus.
    pub published_at: DateTime<Utc>,
    pub event: T,
}
