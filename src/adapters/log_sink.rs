//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing merged pipeline events to the
//! process logger.  Motion events are operator-visible at `info`; the
//! 40 Hz sample streams only show up at `trace`.

use log::{debug, info, trace};

use crate::app::events::{Event, Published};
use crate::app::ports::EventSink;

/// Adapter that logs every merged [`Event`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u64,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, delivered: &Published<Event>) {
        self.emitted += 1;
        match &delivered.event {
            Event::Raw(s) => {
                trace!(
                    "RAW    | acc=({:.3},{:.3},{:.3}) gyro=({:.1},{:.1},{:.1}) T={:.1}\u{00b0}C",
                    s.acceleration.x,
                    s.acceleration.y,
                    s.acceleration.z,
                    s.angular_rate.x,
                    s.angular_rate.y,
                    s.angular_rate.z,
                    s.temperature,
                );
            }
            Event::Corrected(a) => {
                trace!(
                    "CORR   | x={:.3} y={:.3} z={:.3} |a|={:.3}",
                    a.x, a.y, a.z, a.magnitude
                );
            }
            Event::Motion(m) => {
                info!(
                    "EVENT  | {} at {} ({:.3} g), published {}",
                    m.kind, m.occurred_at, m.triggering_magnitude, delivered.published_at
                );
            }
            Event::Position(f) => {
                debug!(
                    "FIX    | {} lat={:.6} lon={:.6} alt={:.1} sats={}/{}",
                    f.fix, f.latitude, f.longitude, f.altitude, f.satellites.used, f.satellites.seen
                );
            }
        }
    }
}
